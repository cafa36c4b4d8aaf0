use std::path::PathBuf;
use std::time::Duration;
use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::sim::types::KeystrokeBackend;

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Types distances measured by a Leica DISTO into the focused window.\n\nPress the measure button on the laser, aim while the laser is on, and the distance in millimeters is typed followed by Enter.", long_about = None)]
pub struct Args {
    /// Read settings from this JSON file instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Service UUID advertised by the laser
    #[arg(long)]
    pub service_uuid: Option<String>,

    /// Time between switching the laser on and measuring, e.g. "1500ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub aim_delay: Option<Duration>,

    /// Give up when no laser was found within this time, e.g. "30s"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub scan_timeout: Option<Duration>,

    /// Give up when connecting takes longer than this, e.g. "10s"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub connect_timeout: Option<Duration>,

    /// How keystrokes are sent to the OS
    #[arg(long, value_enum)]
    pub backend: Option<KeystrokeBackend>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Warn;
        }

        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
