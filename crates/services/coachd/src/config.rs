//! Server configuration from the environment and an optional TOML file.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use coach_sheets::{broker::PollPolicy, group::GroupMapping};
use serde::Deserialize;
use tracing::info;

use crate::prelude::*;

pub const DEFAULT_BIND: &str = "127.0.0.1:5055";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_MEDIA_URL: &str = "/media/";

/// The `[polling]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PollingFile {
    pub attempts: Option<u32>,
    pub interval_secs: Option<u64>,
}

/// Contents of the file named by `COACHD_CONFIG`.
///
/// ```toml
/// [groups]
/// F = "Level 4 Accounting"
///
/// [polling]
/// attempts = 20
/// interval_secs = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub groups: HashMap<String, String>,
    #[serde(default)]
    pub polling: PollingFile,
}

impl FileConfig {
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(file_path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(value: &str) -> Result<Self> {
        Ok(toml::from_str(value)?)
    }

    /// The default group table with this file's codes added or remapped.
    pub fn groups(&self) -> GroupMapping {
        GroupMapping::default().with_overrides(self.groups.clone())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        let default = PollPolicy::default();
        PollPolicy {
            attempts: self.polling.attempts.unwrap_or(default.attempts),
            interval: self
                .polling
                .interval_secs
                .map_or(default.interval, Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub media_root: PathBuf,
    pub media_url: String,
    pub spreadsheet_id: String,
    pub service_account: PathBuf,
    pub groups: GroupMapping,
    pub poll: PollPolicy,
}

fn required(name: &'static str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(Error::MissingEnv(name))
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| String::from(default))
}

fn parse_bind(value: &str) -> Result<SocketAddr> {
    value.trim().parse().map_err(|_| Error::InvalidEnv {
        name: "COACHD_BIND",
        value: value.to_string(),
    })
}

impl ServerConfig {
    /// Reads the `COACHD_*` variables and the optional `COACHD_CONFIG` file.
    pub fn from_env() -> Result<Self> {
        let file = match std::env::var("COACHD_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                info!("Loading configuration from {path}");
                FileConfig::from_file(Path::new(&path))?
            }
            _ => FileConfig::default(),
        };

        Ok(Self {
            bind: parse_bind(&optional("COACHD_BIND", DEFAULT_BIND))?,
            media_root: PathBuf::from(optional("COACHD_MEDIA_ROOT", DEFAULT_MEDIA_ROOT)),
            media_url: optional("COACHD_MEDIA_URL", DEFAULT_MEDIA_URL),
            spreadsheet_id: required("COACHD_SPREADSHEET_ID")?,
            service_account: PathBuf::from(required("COACHD_SERVICE_ACCOUNT")?),
            groups: file.groups(),
            poll: file.poll_policy(),
        })
    }
}

#[cfg(test)]
mod tests {
    use coach_sheets::gateway::TabInfo;

    use super::*;

    #[test]
    fn file_extends_default_groups() -> Result<()> {
        let file = FileConfig::from_toml(
            r#"
            [groups]
            F = "Level 4 Accounting"
            A = "Level 3 CM (2025)"
            "#,
        )?;
        let groups = file.groups();
        assert_eq!(groups.tab_for("F"), "Level 4 Accounting");
        assert_eq!(groups.tab_for("A"), "Level 3 CM (2025)");
        assert_eq!(groups.tab_for("B"), "Level 5 LO");
        let tabs = [TabInfo {
            title: String::from("Level 4 Accounting"),
            sheet_id: 1,
            index: 0,
        }];
        assert_eq!(groups.resolve("F", &tabs).unwrap(), "Level 4 Accounting");
        Ok(())
    }

    #[test]
    fn polling_defaults_fill_gaps() -> Result<()> {
        let file = FileConfig::from_toml("[polling]\ninterval_secs = 1\n")?;
        assert_eq!(
            file.poll_policy(),
            PollPolicy {
                attempts: 20,
                interval: Duration::from_secs(1)
            }
        );
        assert_eq!(FileConfig::from_toml("")?.poll_policy(), PollPolicy::default());
        Ok(())
    }

    #[test]
    fn bind_must_be_a_socket_address() {
        assert_eq!(parse_bind(DEFAULT_BIND).unwrap().port(), 5055);
        assert!(matches!(
            parse_bind("localhost"),
            Err(Error::InvalidEnv { name: "COACHD_BIND", .. })
        ));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(
            FileConfig::from_toml("[polling]\nattempts = \"many\""),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    #[serial_test::serial]
    fn missing_spreadsheet_is_reported() {
        unsafe {
            std::env::remove_var("COACHD_CONFIG");
            std::env::remove_var("COACHD_SPREADSHEET_ID");
            std::env::set_var("COACHD_SERVICE_ACCOUNT", "key.json");
        }
        assert!(matches!(
            ServerConfig::from_env(),
            Err(Error::MissingEnv("COACHD_SPREADSHEET_ID"))
        ));

        unsafe { std::env::set_var("COACHD_SPREADSHEET_ID", "sheet-1") };
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.spreadsheet_id, "sheet-1");
        assert_eq!(config.media_url, DEFAULT_MEDIA_URL);
        assert_eq!(config.poll, PollPolicy::default());
    }
}
