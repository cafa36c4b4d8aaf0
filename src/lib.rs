use std::env;
use log::LevelFilter;

use crate::cli::Args;
use crate::error::AppRunError;
use crate::session::run_async;

pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod measure;
pub mod os;
pub mod session;
pub mod sim;

pub fn init_logging(level: LevelFilter) -> Result<(), AppRunError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // btleplug is very chatty below info
        .level_for("btleplug", level.min(LevelFilter::Info))
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).map_err(|source| AppRunError::LogFile { source })?
        );
    }

    dispatch.apply()?;
    Ok(())
}

/// Runs until interrupted on a single threaded runtime.
pub fn run(args: Args) -> Result<(), AppRunError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| AppRunError::Runtime { source })?;

    runtime.block_on(run_async(args))
}
