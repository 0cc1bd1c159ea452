//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `clientrepo_core` linkage and the configured backend.
//! - Print the client count of the configured storage.
//!
//! Configuration comes from `CLIENTREPO_BACKEND` / `CLIENTREPO_PATH`;
//! `CLIENTREPO_LOG_DIR` (absolute) enables file logging.

use clientrepo_core::{
    core_version, default_log_level, init_logging, PredicateSet, RecordKind, Repository,
    Storage, StorageConfig,
};
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "CLIENTREPO_LOG_DIR";

fn main() -> ExitCode {
    println!("clientrepo_core version={}", core_version());

    if let Some(log_dir) = std::env::var_os(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StorageConfig::from_env()?;
    let storage = Storage::open(&config)?;
    let repo = storage.repository(RecordKind::client())?;
    let total = repo.count(&PredicateSet::new())?;
    println!("backend={} clients={}", config.backend_name(), total);
    drop(repo);
    storage.close()?;
    Ok(())
}
