use std::env::current_exe;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::str;
use directories_next::ProjectDirs;
use fd_lock::{RwLock, RwLockWriteGuard};
use log::{debug, info};

use crate::config::types::Config;
use crate::error::ConfigError;

// creates a path to disto-keyboard.json in the same directory as the executable
// this could be useful for usb sticks
fn get_portable_config_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(mut path) => {
            // F:\disto-keyboard.exe => F:\disto-keyboard.json
            if !path.set_extension("json") {
                debug!("current exe has no filename: {}", path.to_string_lossy());
                return None;
            }

            Some(path)
        },
        Err(err) => {
            debug!("failed to get current exe path: {:?}", err);
            None
        },
    }
}

// creates a path to disto-keyboard.json in an os dependent standard directory, such as
// ~/.config/disto-keyboard on linux.
fn get_local_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "disto-keyboard", "disto-keyboard").map(|dirs| {
        dirs.config_dir().join("disto-keyboard.json")
    })
}

fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_portable_config_path() {
        if path.is_file() {
            return Ok(path);
        }
    }

    get_local_config_path().ok_or(ConfigError::NoConfigPath)
}

pub fn parse_config(content: &[u8]) -> Result<Config, ConfigError> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(Config::default());
    }

    let content = str::from_utf8(content)?;
    Ok(serde_json::from_str(content)?)
}

/// Holds the lock file; at most one instance of the application can lock it at a time.
pub struct InstanceLocker {
    path: PathBuf,
    rw_lock: RwLock<File>,
}

impl InstanceLocker {
    pub fn lock(&mut self) -> Result<RwLockWriteGuard<'_, File>, ConfigError> {
        match self.rw_lock.try_write() {
            Ok(guard) => Ok(guard),
            Err(source) => Err(ConfigError::CanNotLock {
                path: self.path.to_string_lossy().into_owned(),
                source,
            }),
        }
    }
}

/// Location of the (read only) config file and the lock file next to it. A config file named
/// on the command line has to exist; the default one is optional.
#[derive(Debug, Clone)]
pub struct ConfigIO {
    path: PathBuf,
    explicit: bool,
}

impl ConfigIO {
    pub fn new(explicit_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let (path, explicit) = match explicit_path {
            Some(path) => (path, true),
            None => (get_config_path()?, false),
        };
        info!("Using config file {}", path.to_string_lossy());

        Ok(ConfigIO { path, explicit })
    }

    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    pub fn locker(&self) -> Result<InstanceLocker, ConfigError> {
        let path = self.lock_path();
        if let Some(directory) = path.parent() {
            std::fs::create_dir_all(directory)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .create(true)
            .open(&path)?;

        Ok(InstanceLocker { path, rw_lock: RwLock::new(file) })
    }

    pub async fn read(&self) -> Result<Config, ConfigError> {
        debug!("Reading config file");
        let content = tokio::fs::read(&self.path).await?;
        parse_config(&content)
    }

    /// Like `read`, but an absent default config file means default settings.
    pub async fn read_or_default(&self) -> Result<Config, ConfigError> {
        match self.read().await {
            Ok(config) => Ok(config),
            Err(err) if err.is_file_not_found_error() && !self.explicit => {
                info!("Config file not found, using defaults");
                Ok(Config::default())
            },
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::process;

    use super::*;
    use crate::sim::types::KeystrokeBackend;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("disto-keyboard-test-{}-{}", process::id(), name))
    }

    #[test]
    fn empty_file_means_defaults() {
        assert_eq!(parse_config(b"").unwrap(), Config::default());
        assert_eq!(parse_config(b" \n").unwrap(), Config::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(parse_config(b"{ nope"), Err(ConfigError::JsonError { .. })));
        assert!(matches!(parse_config(&[0x7B, 0xFF]), Err(ConfigError::Utf8Error { .. })));
    }

    #[tokio::test]
    async fn reads_explicit_file() {
        let path = temp_path("explicit.json");
        std::fs::write(&path, r#"{ "keystrokeBackend": "xdotool" }"#).unwrap();

        let config_io = ConfigIO::new(Some(path.clone())).unwrap();
        let config = config_io.read_or_default().await.unwrap();
        assert_eq!(config.keystroke_backend, KeystrokeBackend::Xdotool);

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn missing_explicit_file_is_an_error() {
        let config_io = ConfigIO::new(Some(temp_path("missing.json"))).unwrap();
        let err = config_io.read_or_default().await.unwrap_err();
        assert!(err.is_file_not_found_error());
    }

    #[tokio::test]
    async fn missing_default_file_means_defaults() {
        let config_io = ConfigIO { path: temp_path("default.json"), explicit: false };
        assert_eq!(config_io.read_or_default().await.unwrap(), Config::default());
    }

    #[test]
    fn second_lock_fails() {
        let config_io = ConfigIO::new(Some(temp_path("locked.json"))).unwrap();
        let mut first = config_io.locker().unwrap();
        let mut second = config_io.locker().unwrap();

        let guard = first.lock().unwrap();
        assert!(matches!(second.lock(), Err(ConfigError::CanNotLock { .. })));

        drop(guard);
        assert!(second.lock().is_ok());
        std::fs::remove_file(config_io.lock_path()).unwrap();
    }
}
