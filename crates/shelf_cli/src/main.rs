//! Console front end for the shelf catalog.
//!
//! ```bash
//! # In-memory catalog with demo rows
//! shelf
//!
//! # Start over from an empty snapshot file, with file logging
//! shelf --db catalog.db --fresh --log-dir ./logs
//! ```

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rustyline::DefaultEditor;
use shelf_core::{
    core_version, default_log_level, init_logging, load_demo_data, CatalogService,
    SqliteSnapshotStore,
};

mod console;
mod render;

use console::{Console, Exit, Piped};

/// Library catalog console
#[derive(Parser, Debug)]
#[command(
    name = "shelf",
    version = core_version(),
    about = "Interactive console for the shelf library catalog"
)]
struct Args {
    /// Snapshot file; the catalog stays in memory when omitted
    #[arg(long, value_name = "FILE", env = "SHELF_DB")]
    db: Option<PathBuf>,

    /// Delete the snapshot file before opening it
    #[arg(long, requires = "db")]
    fresh: bool,

    /// Do not load demo rows into an empty catalog
    #[arg(long)]
    no_demo: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SHELF_LOG_LEVEL", default_value = default_log_level())]
    log_level: String,

    /// Directory for rolling log files; logging is off when omitted
    #[arg(long, value_name = "DIR", env = "SHELF_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    if let Some(dir) = &args.log_dir {
        let dir = absolute_dir(dir)?;
        init_logging(&args.log_level, &dir.to_string_lossy())
            .context("failed to initialize logging")?;
    }
    info!("event=cli_start module=cli status=ok version={}", core_version());

    let mut service = open_service(&args)?;
    if !args.no_demo && service.stats().total() == 0 {
        let summary = load_demo_data(&mut service).context("failed to load demo data")?;
        println!(
            "Loaded demo catalog: {} authors, {} genres, {} books.",
            summary.authors, summary.genres, summary.books
        );
    }

    let exit = run_console(&mut service)?;
    info!("event=cli_exit module=cli status=ok exit={exit:?}");
    Ok(())
}

/// Line editing on a terminal, plain reads when stdin is piped.
fn run_console(service: &mut CatalogService) -> Result<Exit> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let exit = if stdin.is_terminal() {
        let editor = DefaultEditor::new().context("failed to start line editor")?;
        Console::new(service, editor, stdout.lock()).run()?
    } else {
        Console::new(service, Piped(stdin.lock()), stdout.lock()).run()?
    };
    Ok(exit)
}

/// Log directories resolve against the working directory.
fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    Ok(cwd.join(dir))
}

fn open_service(args: &Args) -> Result<CatalogService> {
    let Some(path) = &args.db else {
        return Ok(CatalogService::new());
    };
    if args.fresh {
        remove_snapshot(path)?;
    }

    let store = SqliteSnapshotStore::open(path)
        .with_context(|| format!("failed to open snapshot {}", path.display()))?;
    CatalogService::open(store)
        .with_context(|| format!("failed to load catalog from {}", path.display()))
}

fn remove_snapshot(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("event=snapshot_reset module=cli status=ok");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::{CommandFactory, Parser};
    use shelf_core::core_version;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn version_flag_reports_core_version() {
        assert_eq!(
            Args::command().get_version().map(ToString::to_string),
            Some(core_version().to_string())
        );
    }

    #[test]
    fn fresh_requires_db() {
        assert!(Args::try_parse_from(["shelf", "--fresh"]).is_err());
        let args =
            Args::try_parse_from(["shelf", "--db", "c.db", "--fresh", "--no-demo"]).unwrap();
        assert!(args.fresh && args.no_demo);
    }
}
