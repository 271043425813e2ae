//! Namespace restore - main entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use namespace_restore_rs::db::connection::{close_pool, create_pool};
use namespace_restore_rs::db::migrate::migrate;
use namespace_restore_rs::dump::{open_dump, DumpFormat};
use namespace_restore_rs::services::restore::restore_dump;
use namespace_restore_rs::store::SqliteStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dump file to replay
    dump_file: PathBuf,

    /// Dump format: "tsm" (backup log) or "yaml" (pool inventory)
    format: String,

    /// Namespace database to restore into
    db: String,

    /// Database user (unused by the SQLite backend)
    user: Option<String>,

    /// Database password (unused by the SQLite backend)
    password: Option<String>,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    let format = match args.format.parse::<DumpFormat>() {
        Ok(format) => format,
        Err(other) => {
            eprintln!("Unsupported format: {}", other);
            return ExitCode::from(2);
        }
    };

    match run(&args, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("restoration failed: {:#}", e);
            ExitCode::from(3)
        }
    }
}

fn run(args: &Args, format: DumpFormat) -> anyhow::Result<()> {
    if args.user.is_some() || args.password.is_some() {
        tracing::debug!("store credentials ignored by the SQLite backend");
    }

    tracing::info!(
        "Restoring {} ({:?} dump) into {}",
        args.dump_file.display(),
        format,
        args.db
    );

    let pool = create_pool(&args.db)?;
    migrate(&pool)?;

    let store = SqliteStore::new(pool.clone());
    let entries = open_dump(&args.dump_file, format)?;
    restore_dump(&store, entries)?;

    close_pool(&pool);
    Ok(())
}
