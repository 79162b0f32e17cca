//! Path and line helpers used by result formatting.

/// Strip the first of `prefixes` that `path` starts with.
///
/// Prefixes are tried in order; the first match wins even when a later one
/// is longer. Returns `path` unchanged when nothing matches.
pub fn remove_prefix<'a, P: AsRef<str>>(prefixes: &[P], path: &'a str) -> &'a str {
    prefixes
        .iter()
        .find_map(|prefix| path.strip_prefix(prefix.as_ref()))
        .unwrap_or(path)
}

/// Append the platform separator unless `path` already ends with one.
pub fn with_trailing_separator(mut path: String) -> String {
    if !path.ends_with(std::path::MAIN_SEPARATOR) {
        path.push(std::path::MAIN_SEPARATOR);
    }
    path
}

/// 1-based line number containing the 1-based character offset `point`.
pub fn lineno_at_point(content: &str, point: u64) -> usize {
    let before = usize::try_from(point.saturating_sub(1)).unwrap_or(usize::MAX);
    content
        .chars()
        .take(before)
        .filter(|ch| *ch == '\n')
        .count()
        + 1
}

/// Lines around `point`, as `(1-based line number, text)` pairs.
///
/// Covers `pre_lines` lines before and `post_lines` lines after the line at
/// `point`, clipped to the start and end of `content`. Line terminators are
/// not included.
pub fn lines_at_point(
    content: &str,
    point: u64,
    pre_lines: usize,
    post_lines: usize,
) -> Vec<(usize, &str)> {
    let line = lineno_at_point(content, point) - 1;
    let start = line.saturating_sub(pre_lines);
    let end = line.saturating_add(post_lines).saturating_add(1);
    content
        .lines()
        .enumerate()
        .skip(start)
        .take(end - start)
        .map(|(index, text)| (index + 1, text))
        .collect()
}
