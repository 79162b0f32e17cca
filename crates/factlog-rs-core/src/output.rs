//! Writers for search results.

use std::io::{self, Write};
use std::path::Path;

use factlog_rs_store::AccessInfo;
use log::debug;

use crate::error::SearchError;
use crate::text::lines_at_point;
use crate::title::file_title;

/// What is printed next to each result path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Annotation {
    /// Only the display path.
    #[default]
    Plain,
    /// Display path followed by the document title, when one is found.
    Title,
    /// Lines surrounding the recorded point, one output record per line.
    Context { before: usize, after: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub annotation: Annotation,
    /// Written after every record.
    pub terminator: String,
    /// Written between the fields of a record.
    pub separator: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            annotation: Annotation::Plain,
            terminator: "\n".to_string(),
            separator: ":".to_string(),
        }
    }
}

impl OutputOptions {
    /// Terminate records with NUL instead of newline.
    pub fn null_terminated(mut self) -> Self {
        self.terminator = "\0".to_string();
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = annotation;
        self
    }
}

/// Source of file contents used for annotations.
pub trait Annotator {
    /// Title of the document at `path`.
    fn title(&self, path: &Path) -> Option<String>;

    /// Full text of the file at `path`.
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Annotator reading from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAnnotator;

impl Annotator for FileAnnotator {
    fn title(&self, path: &Path) -> Option<String> {
        file_title(path)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Formats results into an output stream.
pub struct RowWriter<W: Write, A: Annotator = FileAnnotator> {
    out: W,
    annotator: A,
    options: OutputOptions,
}

impl<W: Write> RowWriter<W> {
    pub fn new(out: W, options: OutputOptions) -> Self {
        Self::with_annotator(out, options, FileAnnotator)
    }
}

impl<W: Write, A: Annotator> RowWriter<W, A> {
    pub fn with_annotator(out: W, options: OutputOptions, annotator: A) -> Self {
        Self {
            out,
            annotator,
            options,
        }
    }

    /// Write one result according to the configured annotation.
    pub fn write_row(&mut self, info: &AccessInfo) -> io::Result<()> {
        match self.options.annotation {
            Annotation::Plain => self.write_record(&[info.showpath.as_str()]),
            Annotation::Title => {
                let title = self.annotator.title(Path::new(&info.path));
                match title {
                    Some(title) => self.write_record(&[info.showpath.as_str(), title.as_str()]),
                    None => self.write_record(&[info.showpath.as_str()]),
                }
            }
            Annotation::Context { before, after } => self.write_context(info, before, after),
        }
    }

    /// Write every result, stopping at the first error.
    ///
    /// Returns the number of results consumed.
    pub fn write_all<I>(&mut self, rows: I) -> Result<usize, SearchError>
    where
        I: IntoIterator<Item = Result<AccessInfo, SearchError>>,
    {
        let mut count = 0;
        for row in rows {
            self.write_row(&row?)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_context(&mut self, info: &AccessInfo, before: usize, after: usize) -> io::Result<()> {
        let Some(point) = info.point else {
            return Ok(());
        };
        let content = match self.annotator.read(Path::new(&info.path)) {
            Ok(content) => content,
            Err(err) => {
                debug!(
                    "context skipped for unreadable file (path={}, err={})",
                    info.path, err
                );
                return Ok(());
            }
        };
        for (lineno, line) in lines_at_point(&content, point, before, after) {
            self.write_record(&[info.showpath.as_str(), lineno.to_string().as_str(), line])?;
        }
        Ok(())
    }

    fn write_record(&mut self, fields: &[&str]) -> io::Result<()> {
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                self.out.write_all(self.options.separator.as_bytes())?;
            }
            self.out.write_all(field.as_bytes())?;
        }
        self.out.write_all(self.options.terminator.as_bytes())
    }
}
