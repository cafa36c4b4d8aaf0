use std::time::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cli::Args;
use crate::device::constants::{
    AIM_DELAY, CONNECT_TIMEOUT, DISTO_COMMAND_CHARACTERISTIC, DISTO_DISTANCE_CHARACTERISTIC, DISTO_SERVICE,
    SCAN_TIMEOUT, WRITE_DEADLINE,
};
use crate::device::types::DeviceSettings;
use crate::error::ConfigError;
use crate::sim::types::KeystrokeBackend;

/**
 * Pause (milliseconds) after each simulated key event.
 */
pub const KEY_DELAY: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub service_uuid: String,
    pub distance_characteristic_uuid: String,
    pub command_characteristic_uuid: String,
    pub aim_delay_ms: u64,
    pub scan_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub write_deadline_ms: u64,
    pub keystroke_backend: KeystrokeBackend,
    pub key_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service_uuid: DISTO_SERVICE.to_string(),
            distance_characteristic_uuid: DISTO_DISTANCE_CHARACTERISTIC.to_string(),
            command_characteristic_uuid: DISTO_COMMAND_CHARACTERISTIC.to_string(),
            aim_delay_ms: AIM_DELAY,
            scan_timeout_ms: SCAN_TIMEOUT,
            connect_timeout_ms: CONNECT_TIMEOUT,
            write_deadline_ms: WRITE_DEADLINE,
            keystroke_backend: KeystrokeBackend::default(),
            key_delay_ms: KEY_DELAY,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_uuid(value: &str) -> Result<Uuid, ConfigError> {
    Uuid::parse_str(value.trim()).map_err(|source| ConfigError::InvalidUuid { value: value.to_string(), source })
}

impl Config {
    /// Command line flags take precedence over the config file.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(service_uuid) = &args.service_uuid {
            self.service_uuid = service_uuid.clone();
        }
        if let Some(aim_delay) = args.aim_delay {
            self.aim_delay_ms = millis(aim_delay);
        }
        if let Some(scan_timeout) = args.scan_timeout {
            self.scan_timeout_ms = millis(scan_timeout);
        }
        if let Some(connect_timeout) = args.connect_timeout {
            self.connect_timeout_ms = millis(connect_timeout);
        }
        if let Some(backend) = args.backend {
            self.keystroke_backend = backend;
        }
    }

    pub fn device_settings(&self) -> Result<DeviceSettings, ConfigError> {
        Ok(DeviceSettings {
            service: parse_uuid(&self.service_uuid)?,
            distance_characteristic: parse_uuid(&self.distance_characteristic_uuid)?,
            command_characteristic: parse_uuid(&self.command_characteristic_uuid)?,
            aim_delay: Duration::from_millis(self.aim_delay_ms),
            scan_timeout: Duration::from_millis(self.scan_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            write_deadline: Duration::from_millis(self.write_deadline_ms),
        })
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn defaults_resolve_to_the_disto() {
        let settings = Config::default().device_settings().unwrap();
        assert_eq!(settings, DeviceSettings::default());
        assert_eq!(settings.aim_delay, Duration::from_millis(1500));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{ "aimDelayMs": 2500, "keystrokeBackend": "xdotool" }"#).unwrap();

        assert_eq!(config.aim_delay_ms, 2500);
        assert_eq!(config.keystroke_backend, KeystrokeBackend::Xdotool);
        assert_eq!(config.scan_timeout_ms, SCAN_TIMEOUT);
        assert_eq!(config.service_uuid, DISTO_SERVICE.to_string());
    }

    #[test]
    fn uppercase_uuids_are_accepted() {
        let config = Config {
            service_uuid: String::from("3AB10100-F831-4395-B29D-570977D5BF94"),
            ..Config::default()
        };
        assert_eq!(config.device_settings().unwrap().service, DISTO_SERVICE);
    }

    #[test]
    fn invalid_uuid_is_rejected() {
        let config = Config {
            command_characteristic_uuid: String::from("not-a-uuid"),
            ..Config::default()
        };
        let err = config.device_settings().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUuid { ref value, .. } if value == "not-a-uuid"));
    }

    #[test]
    fn args_override_file() {
        let mut config = Config { aim_delay_ms: 2500, scan_timeout_ms: 3000, ..Config::default() };
        let args = Args::try_parse_from(["disto-keyboard", "--aim-delay", "800ms", "--backend", "xdotool"]).unwrap();

        config.apply_args(&args);

        assert_eq!(config.aim_delay_ms, 800);
        assert_eq!(config.keystroke_backend, KeystrokeBackend::Xdotool);
        assert_eq!(config.scan_timeout_ms, 3000);
    }
}
