use crate::error::ConfigError;
use crate::monitor::MonitoredTarget;
use crate::units::parse_size;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FILE_NAME: &str = "dirsize-alert.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default, rename = "directory")]
    pub directories: Vec<DirectoryConfig>,
    pub email: EmailConfig,
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub path: String,
    pub threshold: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub recipients: Recipients,
}

/// Either `"a@x, b@y"` or `["a@x", "b@y"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    List(Vec<String>),
    Csv(String),
}

impl Recipients {
    pub fn addresses(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Recipients::List(list) => list.iter().map(String::as_str).collect(),
            Recipients::Csv(csv) => csv.split(',').collect(),
        };

        let mut out: Vec<String> = Vec::new();
        for addr in raw.into_iter().map(str::trim).filter(|a| !a.is_empty()) {
            if !out.iter().any(|seen| seen == addr) {
                out.push(addr.to_string());
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    None,
    #[default]
    Starttls,
    Wrapper,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub tls: TlsMode,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout() -> u64 {
    30
}

impl SmtpConfig {
    /// `from` if set, otherwise the login name.
    pub fn sender(&self) -> Option<&str> {
        self.from
            .as_deref()
            .or(self.username.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub threads: usize,
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: 0,
            timeout_secs: 0,
        }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `./dirsize-alert.toml` when present, else the per-user config dir.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(DEFAULT_FILE_NAME);
        if local.exists() {
            return local;
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dirsize-alert")
            .join("config.toml")
    }

    pub fn recipients(&self) -> Vec<String> {
        self.email.recipients.addresses()
    }

    /// Resolves every directory entry into a target, in file order.
    pub fn validate(&self) -> Result<Vec<MonitoredTarget>, ConfigError> {
        if self.directories.is_empty() {
            return Err(ConfigError::Invalid(
                "no [[directory]] entries configured".to_string(),
            ));
        }
        if self.recipients().is_empty() {
            return Err(ConfigError::Invalid(
                "email.recipients is empty".to_string(),
            ));
        }
        if self.smtp.host.trim().is_empty() {
            return Err(ConfigError::Invalid("smtp.host is empty".to_string()));
        }
        if self.smtp.sender().is_none() {
            return Err(ConfigError::Invalid(
                "smtp.from or smtp.username must name a sender address".to_string(),
            ));
        }

        self.directories
            .iter()
            .map(|dir| {
                let name = dir
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| dir.path.clone());
                if dir.path.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "directory '{}' has an empty path",
                        name
                    )));
                }
                let threshold_bytes =
                    parse_size(&dir.threshold).map_err(|source| ConfigError::Threshold {
                        name: name.clone(),
                        source,
                    })?;
                Ok(MonitoredTarget::new(name, &dir.path, threshold_bytes)
                    .with_threshold_label(dir.threshold.trim()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[[directory]]
name = "data"
path = "/data"
threshold = "1GB"

[[directory]]
path = "/var/log"
threshold = "500 mb"

[email]
recipients = "ops@example.com, oncall@example.com ,"

[smtp]
host = "smtp.example.com"
username = "monitor@example.com"
password = "secret"
"#;

    fn parse(content: &str) -> Config {
        Config::from_toml(content, Path::new("test.toml")).unwrap()
    }

    #[test]
    fn test_parse_sample_with_defaults() {
        let config = parse(SAMPLE);

        assert_eq!(config.directories.len(), 2);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.tls, TlsMode::Starttls);
        assert_eq!(config.smtp.timeout(), Some(Duration::from_secs(30)));
        assert!(config.scan.parallel);
        assert_eq!(config.scan.timeout(), None);
        assert_eq!(
            config.recipients(),
            vec!["ops@example.com", "oncall@example.com"]
        );
    }

    #[test]
    fn test_validate_keeps_file_order() {
        let targets = parse(SAMPLE).validate().unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, "data");
        assert_eq!(targets[0].threshold_bytes, 1_073_741_824);
        assert_eq!(targets[0].threshold_label, "1GB");
        assert_eq!(targets[1].name, "/var/log");
        assert_eq!(targets[1].path, PathBuf::from("/var/log"));
        assert_eq!(targets[1].threshold_bytes, 500 * 1024 * 1024);
    }

    #[test]
    fn test_recipient_list_form() {
        let content = SAMPLE.replace(
            r#"recipients = "ops@example.com, oncall@example.com ,""#,
            r#"recipients = ["a@example.com", " b@example.com", "a@example.com"]"#,
        );
        assert_eq!(
            parse(&content).recipients(),
            vec!["a@example.com", "b@example.com"]
        );
    }

    #[test]
    fn test_invalid_threshold_is_fatal() {
        let content = SAMPLE.replace("500 mb", "lots");
        let err = parse(&content).validate().unwrap_err();
        match err {
            ConfigError::Threshold { name, source } => {
                assert_eq!(name, "/var/log");
                assert_eq!(source.input, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_recipients_rejected() {
        let content = SAMPLE.replace("ops@example.com, oncall@example.com ,", " , ");
        assert!(matches!(
            parse(&content).validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_sender_rejected() {
        let content = SAMPLE.replace("username = \"monitor@example.com\"\n", "");
        let config = parse(&content);
        assert!(config.smtp.sender().is_none());
        assert!(config.smtp.credentials().is_none());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_no_directories_rejected() {
        let content = r#"
[email]
recipients = "ops@example.com"

[smtp]
host = "localhost"
from = "monitor@localhost"
"#;
        assert!(matches!(
            parse(content).validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_tls_and_scan_options() {
        let content = format!(
            "{SAMPLE}from = \"alerts@example.com\"\ntls = \"wrapper\"\nport = 465\n\n[scan]\nparallel = false\nthreads = 2\ntimeout_secs = 60\n"
        );
        let config = parse(&content);

        assert_eq!(config.smtp.tls, TlsMode::Wrapper);
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.smtp.sender(), Some("alerts@example.com"));
        assert!(!config.scan.parallel);
        assert_eq!(config.scan.threads, 2);
        assert_eq!(config.scan.timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[[directory]\npath = ").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
