use clap::Parser;
use log::{error, info};
use disto_keyboard::cli::Args;
use disto_keyboard::{init_logging, run};
use disto_keyboard::error::{AppRunError, ConfigError};

#[cfg(target_os = "macos")]
fn macos_init() {
    disto_keyboard::os::macos::warn_if_untrusted();
}

#[cfg(not(target_os = "macos"))]
fn macos_init() {}

fn main() -> Result<(), AppRunError> {
    let args = Args::parse();
    init_logging(args.log_level())?;
    info!(concat!("DISTO keyboard ", env!("CARGO_PKG_VERSION")));

    macos_init();

    match run(args) {
        Err(err @ AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            error!("This application has already been started");
            Err(err)
        },
        Err(err) => {
            error!("{}", err);
            Err(err)
        },
        Ok(_) => Ok(()),
    }
}
