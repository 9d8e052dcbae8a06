use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use serde::Deserialize;

use crate::error::Error;
use crate::probe::HostTarget;

pub const MAX_IGNORE_SECS: u64 = 60;

const DEFAULT_HOST: &str = "1.1.1.1";
const DEFAULT_IGNORE_SECS: u64 = 2;
const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorOptions,
    pub log: LogOptions,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorOptions {
    /// IPv4 literal to probe.
    pub host: String,
    /// Debounce window: seconds a changed state must persist before it is
    /// confirmed and logged. 0 confirms on the next tick.
    pub ignore_secs: u64,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            ignore_secs: DEFAULT_IGNORE_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Directory holding the per-host transition logs.
    pub dir: PathBuf,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl Config {
    /// Loads the config file, falling back to defaults when it is absent.
    ///
    /// `PINGWATCH_HOST` and `PINGWATCH_IGNORE_SECS` override the file, so a
    /// one-off run does not need a config edit.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e.into()),
        };

        if let Ok(host) = dotenvy::var("PINGWATCH_HOST") {
            config.monitor.host = host;
        }
        if let Ok(secs) = dotenvy::var("PINGWATCH_IGNORE_SECS") {
            config.monitor.ignore_secs = secs
                .parse()
                .map_err(|_| Error::Config(format!("PINGWATCH_IGNORE_SECS is not an integer: {secs}")))?;
        }

        Ok(config)
    }

    /// Default config location: `<config dir>/pingwatch/config.toml`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("pingwatch.toml"),
            |dir| dir.join("pingwatch").join("config.toml"),
        )
    }

    /// Validates into runtime settings. The monitor never starts from an
    /// invalid configuration; failures here surface before any socket opens.
    pub fn into_settings(self) -> Result<Settings, Error> {
        if self.monitor.ignore_secs > MAX_IGNORE_SECS {
            return Err(Error::IgnoreSecsOutOfRange(self.monitor.ignore_secs));
        }
        let target = HostTarget::parse(&self.monitor.host)?;
        Ok(Settings {
            target,
            window: Duration::from_secs(self.monitor.ignore_secs),
            log_dir: self.log.dir,
        })
    }
}

/// Validated runtime settings, constructed only through
/// [`Config::into_settings`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: HostTarget,
    pub window: Duration,
    pub log_dir: PathBuf,
}
