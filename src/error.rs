use crate::units::InvalidThresholdFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal before scanning starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("directory '{name}': {source}")]
    Threshold {
        name: String,
        #[source]
        source: InvalidThresholdFormat,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum MailSendError {
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("email build error: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
