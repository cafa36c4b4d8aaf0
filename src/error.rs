use std::io;
use std::process::ExitStatus;
use std::str::Utf8Error;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on {path}: {source}")]
    CanNotLock { path: String, source: io::Error },

    #[error("Failed to decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse config file: {source}")]
    JsonError { #[from] source: serde_json::Error },

    #[error("Invalid UUID {value:?}: {source}")]
    InvalidUuid { value: String, source: uuid::Error },
}

impl ConfigError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            ConfigError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter available")]
    NoAdapter,

    #[error("No device advertising service {service} was found")]
    DeviceNotFound { service: Uuid },

    #[error("Failed to connect to device: {source}")]
    Connection { source: btleplug::Error },

    #[error("{operation} did not complete within {timeout_ms}ms")]
    Timeout { operation: &'static str, timeout_ms: u64 },

    #[error("Required bluetooth characteristic {uuid} is not available")]
    MissingCharacteristic { uuid: Uuid },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Expected a 4 byte distance payload, got {len} bytes")]
    Malformed { len: usize },

    #[error("Distance payload is not a finite number")]
    NotFinite,
}

#[derive(Error, Debug)]
pub enum KeystrokeError {
    #[error("No key mapping for character {ch:?}")]
    UnsupportedCharacter { ch: char },

    #[error("Failed to simulate {event}")]
    Simulate { event: String },

    #[error("Failed to start {tool}: {source}")]
    Spawn { tool: &'static str, source: io::Error },

    #[error("{tool} exited with {status}")]
    ToolFailed { tool: &'static str, status: ExitStatus },
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Device session failed: {source}")]
    DeviceError { #[from] source: DeviceError },

    #[error("Failed to start async runtime: {source}")]
    Runtime { source: io::Error },

    #[error("Failed to open LOG_FILE: {source}")]
    LogFile { source: io::Error },

    #[error("Failed to initialize logger: {source}")]
    Logger { #[from] source: log::SetLoggerError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let err = DeviceError::Timeout { operation: "scan", timeout_ms: 1500 };
        assert_eq!(err.to_string(), "scan did not complete within 1500ms");
    }

    #[test]
    fn malformed_payload_display() {
        let err = PayloadError::Malformed { len: 3 };
        assert!(err.to_string().contains("got 3 bytes"));
    }

    #[test]
    fn not_found_config_detection() {
        let err = ConfigError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.is_file_not_found_error());
        assert!(!ConfigError::NoConfigPath.is_file_not_found_error());
    }
}
