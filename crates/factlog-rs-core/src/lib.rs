//! Search pipeline and result formatting for FactLog.
//!
//! This crate turns a [`SearchRequest`] into a stream of results from the
//! activity store, applies the filters that need the live filesystem
//! (existence, scope-relative display paths), and writes annotated output.

pub mod error;
pub mod output;
pub mod pipeline;
pub mod text;
pub mod title;

/// Error type for search and output.
pub use error::SearchError;
/// Output annotation modes and writer.
pub use output::{Annotation, Annotator, FileAnnotator, OutputOptions, RowWriter};
/// Search entry point and request model.
pub use pipeline::{SearchRequest, SearchResults, search};
/// Title extraction by file format.
pub use title::{TitleFormat, file_title, title_from_str};

/// Re-export for convenience.
pub use factlog_rs_store as store;
