use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("invalid host '{0}': expected an IPv4 address in dotted-quad form")]
    InvalidHost(String),
    #[error("ignore_secs must be between 0 and 60, got {0}")]
    IgnoreSecsOutOfRange(u64),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("cannot write transition log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("monitor task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
