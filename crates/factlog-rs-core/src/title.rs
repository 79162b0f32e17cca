//! Document title extraction keyed on file extension.

use std::path::Path;

use log::debug;

/// Markup formats with a recognizable document title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleFormat {
    /// reStructuredText: first underlined heading.
    ReStructuredText,
    /// Markdown: setext heading or a `# ` heading.
    Markdown,
    /// Org mode: first `* ` heading.
    Org,
    /// Python source: first line of the module docstring.
    Python,
}

impl TitleFormat {
    /// Format for a file extension, compared case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "rst" | "rest" => Some(Self::ReStructuredText),
            "md" | "markdown" => Some(Self::Markdown),
            "org" => Some(Self::Org),
            "py" => Some(Self::Python),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }
}

/// Read `path` and extract its title.
///
/// Unknown extensions and unreadable files yield `None`.
pub fn file_title(path: &Path) -> Option<String> {
    let format = TitleFormat::from_path(path)?;
    match std::fs::read_to_string(path) {
        Ok(content) => title_from_str(&content, format),
        Err(err) => {
            debug!(
                "title lookup skipped (path={}, err={})",
                path.display(),
                err
            );
            None
        }
    }
}

/// Extract the title of `content` written in `format`.
pub fn title_from_str(content: &str, format: TitleFormat) -> Option<String> {
    match format {
        TitleFormat::ReStructuredText => {
            first_heading(content, &[HeadingRule::Underline(is_rst_underline)])
        }
        TitleFormat::Markdown => first_heading(
            content,
            &[
                HeadingRule::Underline(is_md_underline),
                HeadingRule::Prefix('#'),
            ],
        ),
        TitleFormat::Org => first_heading(content, &[HeadingRule::Prefix('*')]),
        TitleFormat::Python => python_docstring_title(content),
    }
}

#[derive(Clone, Copy)]
enum HeadingRule {
    /// Line made of one repeated symbol; the title is the line above.
    Underline(fn(char) -> bool),
    /// Line starting with the marker followed by a space and text.
    Prefix(char),
}

impl HeadingRule {
    fn candidate<'a>(self, previous: Option<&'a str>, line: &'a str) -> Option<&'a str> {
        match self {
            HeadingRule::Underline(symbol) => {
                if is_underline(line, symbol) {
                    previous
                } else {
                    None
                }
            }
            HeadingRule::Prefix(marker) => {
                let rest = line.strip_prefix(marker)?.strip_prefix(' ')?;
                if rest.is_empty() {
                    return None;
                }
                Some(line.trim_matches(marker).trim())
            }
        }
    }
}

fn is_rst_underline(ch: char) -> bool {
    ch.is_ascii_punctuation()
}

fn is_md_underline(ch: char) -> bool {
    matches!(ch, '=' | '-')
}

fn is_underline(line: &str, symbol: fn(char) -> bool) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) if symbol(first) => chars.all(|ch| ch == first),
        _ => false,
    }
}

/// Scan lines top to bottom; on the first line where any rule yields a
/// non-empty title, return the first such title in rule order.
fn first_heading(content: &str, rules: &[HeadingRule]) -> Option<String> {
    let mut previous: Option<&str> = None;
    for line in content.lines().map(str::trim_end) {
        let found = rules
            .iter()
            .filter_map(|rule| rule.candidate(previous, line))
            .find(|title| !title.is_empty());
        if let Some(title) = found {
            return Some(title.to_string());
        }
        previous = Some(line);
    }
    None
}

fn python_docstring_title(content: &str) -> Option<String> {
    let docstring = module_docstring(content)?;
    first_docstring_line(&docstring)
}

/// Body of the string literal opening the module, if the first statement is
/// one. Blank lines and comments before it are skipped.
fn module_docstring(content: &str) -> Option<String> {
    let mut rest = content.trim_start_matches('\u{feff}');
    loop {
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n', '\x0c']);
        if let Some(comment) = trimmed.strip_prefix('#') {
            rest = comment.split_once('\n').map_or("", |(_, tail)| tail);
            continue;
        }
        rest = trimmed;
        break;
    }

    let prefix_len = rest
        .char_indices()
        .find(|(_, ch)| !matches!(ch, 'r' | 'R' | 'u' | 'U'))
        .map_or(rest.len(), |(index, _)| index);
    if prefix_len > 1 {
        return None;
    }
    let raw = rest[..prefix_len].eq_ignore_ascii_case("r");
    let rest = &rest[prefix_len..];

    let quote = ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find(|quote| rest.starts_with(quote))?;
    let body = &rest[quote.len()..];
    let end = find_closing_quote(body, quote)?;
    let literal = &body[..end];
    Some(if raw {
        literal.to_string()
    } else {
        unescape(literal)
    })
}

fn find_closing_quote(body: &str, quote: &str) -> Option<usize> {
    let single_line = quote.len() == 1;
    let mut chars = body.char_indices();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '\n' if single_line => return None,
            _ if body[index..].starts_with(quote) => return Some(index),
            _ => {}
        }
    }
    None
}

fn unescape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// First non-empty line of a docstring after indentation cleanup.
///
/// Continuation lines share a common indentation that is removed before the
/// first line with text is picked.
fn first_docstring_line(docstring: &str) -> Option<String> {
    let expanded = docstring.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    let (first, continuation) = lines.split_first()?;

    let first = first.trim();
    if !first.is_empty() {
        return Some(first.to_string());
    }

    let margin = continuation
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()?;
    continuation
        .iter()
        .find(|line| !line.trim().is_empty())
        .map(|line| line[margin..].trim_end().to_string())
}
