//! Subcommand implementations.

use crate::cli::{Cli, Command, ListArgs, RecordArgs};
use anyhow::Context;
use factlog_rs_config::{ConfigPaths, FactlogConfig};
use factlog_rs_core::{RowWriter, SearchError, search};
use factlog_rs_store::ActivityStore;
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Settings resolved once at startup.
struct Settings {
    config: FactlogConfig,
    store_path: PathBuf,
}

impl Settings {
    /// Load config and decide the store location.
    ///
    /// `--config` replaces the per-user config file and anchors relative
    /// store paths at its directory; `--db` wins over any configured path.
    fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let (config, paths) = match cli.config.as_deref() {
            Some(path) => {
                let config =
                    FactlogConfig::load_from_path(path).context("failed to load config")?;
                let dir = path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                (config, ConfigPaths::from_dir(dir))
            }
            None => {
                let paths = ConfigPaths::resolve().context("failed to resolve config directory")?;
                let config = FactlogConfig::load(&paths).context("failed to load config")?;
                (config, paths)
            }
        };

        let store_path = match cli.db.clone() {
            Some(path) => path,
            None if config.store.path.is_none() => {
                let data_dir = paths
                    .ensure_data_dir()
                    .context("failed to create data directory")?;
                debug!("using default data directory: {}", data_dir.display());
                paths.default_store_path()
            }
            None => config.store_path(&paths),
        };
        Ok(Self { config, store_path })
    }

    fn open_store(&self) -> anyhow::Result<ActivityStore> {
        ActivityStore::open(&self.store_path).with_context(|| {
            format!(
                "failed to open activity store at {}",
                self.store_path.display()
            )
        })
    }
}

/// Dispatch the parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::resolve(&cli)?;
    match &cli.command {
        Command::Record(args) => record(&settings, args),
        Command::List(args) => list(&settings, args),
        Command::Info => show_info(&settings),
    }
}

fn record(settings: &Settings, args: &RecordArgs) -> anyhow::Result<()> {
    let store = settings.open_store()?;
    store
        .append(args.to_record())
        .with_context(|| format!("failed to record {}", args.path.display()))?;
    info!(
        "recorded access (path={}, type={})",
        args.path.display(),
        args.access_type
    );
    Ok(())
}

fn list(settings: &Settings, args: &ListArgs) -> anyhow::Result<()> {
    let store = settings.open_store()?;
    let request = args.to_request(&settings.config.list);
    let results = search(&store, request).context("invalid search")?;

    let out: Box<dyn Write> = match args.output_path() {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut writer = RowWriter::new(out, args.output_options());
    let written = writer.write_all(results).and_then(|count| {
        writer.flush()?;
        Ok(count)
    });
    match written {
        Ok(count) => {
            info!("listed files (count={count})");
            Ok(())
        }
        Err(SearchError::Io(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("output closed early");
            Ok(())
        }
        Err(err) => Err(err).context("failed to list files"),
    }
}

fn show_info(settings: &Settings) -> anyhow::Result<()> {
    let store = settings.open_store()?;
    let info = store.info().context("failed to read store metadata")?;
    let mut out = io::stdout().lock();
    writeln!(out, "path: {}", info.path.display())?;
    writeln!(out, "factlog_version: {}", info.factlog_version)?;
    writeln!(out, "schema_version: {}", info.schema_version)?;
    writeln!(out, "created: {}", info.created.to_rfc3339())?;
    Ok(())
}
