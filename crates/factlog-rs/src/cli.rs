//! Command-line options for the `factlog` binary.

use clap::{Args, Parser, Subcommand};
use factlog_rs_config::ListConfig;
use factlog_rs_core::{Annotation, OutputOptions, SearchRequest};
use factlog_rs_store::{AccessType, NewAccessRecord};
use std::path::PathBuf;

/// Record and search files you opened, edited, or closed.
#[derive(Debug, Parser)]
#[command(name = "factlog", version)]
pub struct Cli {
    /// Activity store file (defaults to the per-user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
    /// Path to a factlog.json5 config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record an access to a file
    Record(RecordArgs),
    /// List recently accessed files, most recent first
    List(ListArgs),
    /// Show store location and version
    Info,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Record(_) => "record",
            Command::List(_) => "list",
            Command::Info => "info",
        }
    }
}

fn parse_access_type(value: &str) -> Result<AccessType, String> {
    value.parse::<AccessType>().map_err(|err| err.to_string())
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// File that was accessed
    pub path: PathBuf,
    /// Kind of access: write, open, or close
    #[arg(
        long,
        short = 'a',
        default_value = "write",
        value_parser = parse_access_type
    )]
    pub access_type: AccessType,
    /// Cursor offset within the file (1-based characters)
    #[arg(long, short = 'p')]
    pub point: Option<u64>,
    /// Program that accessed the file
    #[arg(long)]
    pub program: Option<String>,
    /// Record the file as existing without checking
    #[arg(long, conflicts_with = "no_exists")]
    pub exists: bool,
    /// Record the file as missing without checking
    #[arg(long)]
    pub no_exists: bool,
}

impl RecordArgs {
    pub fn to_record(&self) -> NewAccessRecord {
        let mut record = NewAccessRecord::new(&self.path, self.access_type);
        record.file_point = self.point;
        record.file_exists = exists_flag(self.exists, self.no_exists);
        record.program = self.program.clone();
        record
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Maximum number of files to list (default from config, else 50)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
    /// Only this kind of access; repeatable
    #[arg(long, short = 'a', value_parser = parse_access_type)]
    pub access_type: Vec<AccessType>,
    /// Only accesses made by this program; repeatable
    #[arg(long)]
    pub program: Vec<String>,
    /// Only files that existed when recorded
    #[arg(long, conflicts_with = "no_exists")]
    pub exists: bool,
    /// Only files that were missing when recorded
    #[arg(long)]
    pub no_exists: bool,
    /// Only paths matching this glob; repeatable, any may match
    #[arg(long, short = 'g', value_name = "GLOB")]
    pub include_glob: Vec<String>,
    /// Skip paths matching this glob; repeatable
    #[arg(long, short = 'G', value_name = "GLOB")]
    pub exclude_glob: Vec<String>,
    /// Only files under this directory; repeatable
    #[arg(long, value_name = "PATH")]
    pub under: Vec<PathBuf>,
    /// Print paths relative to the matching --under directory
    #[arg(long, short = 'r')]
    pub relative: bool,
    /// List every access instead of the latest per file
    #[arg(long)]
    pub no_unique: bool,
    /// Keep files that no longer exist
    #[arg(long)]
    pub include_missing: bool,
    /// Append the document title
    #[arg(long, short = 't', conflicts_with_all = ["context", "before_context", "after_context"])]
    pub title: bool,
    /// Lines of context around the recorded point
    #[arg(long, short = 'C', value_name = "NUM", conflicts_with = "before_context")]
    pub context: Option<usize>,
    /// Lines of context before the recorded point
    #[arg(long, short = 'B', value_name = "NUM")]
    pub before_context: Option<usize>,
    /// Lines of context after the recorded point
    #[arg(long, short = 'A', value_name = "NUM")]
    pub after_context: Option<usize>,
    /// Terminate records with NUL instead of newline
    #[arg(long)]
    pub null: bool,
    /// Write results to this file instead of stdout ("-" for stdout)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ListArgs {
    pub fn to_request(&self, defaults: &ListConfig) -> SearchRequest {
        let mut request = SearchRequest::new(self.limit.unwrap_or(defaults.limit));
        request.access_types = self.access_type.clone();
        request.exists = exists_flag(self.exists, self.no_exists);
        request.programs = self.program.clone();
        request.include_glob = self.include_glob.clone();
        request.exclude_glob = self.exclude_glob.clone();
        request.unique = defaults.unique && !self.no_unique;
        request.only_existing = !(defaults.include_missing || self.include_missing);
        request.under = self.under.clone();
        request.relative = self.relative;
        request
    }

    pub fn output_options(&self) -> OutputOptions {
        let options = OutputOptions::default().with_annotation(self.annotation());
        if self.null {
            options.null_terminated()
        } else {
            options
        }
    }

    fn annotation(&self) -> Annotation {
        if self.title {
            return Annotation::Title;
        }
        if self.context.is_none() && self.before_context.is_none() && self.after_context.is_none()
        {
            return Annotation::Plain;
        }
        Annotation::Context {
            before: self.before_context.or(self.context).unwrap_or(0),
            after: self.after_context.or(self.context).unwrap_or(0),
        }
    }

    /// Output file, unless stdout was requested.
    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output.as_ref().filter(|path| path.as_os_str() != "-")
    }
}

fn exists_flag(exists: bool, no_exists: bool) -> Option<bool> {
    match (exists, no_exists) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
