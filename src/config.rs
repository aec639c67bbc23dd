use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timekeeping::TimezoneTable;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Unknown timezone in config: {0}")]
    UnknownZone(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub platform: PlatformConfig,
    /// Timezone group name -> participant identities assigned to it.
    pub timezones: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfig {
    pub token: String,
    pub application_id: String,
    pub guild_id: String,
    pub forum_channel_id: String,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("muster")
            .join("config.toml")
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .expect("Failed to serialize config");
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Builds the immutable timezone table, rejecting group names
    /// chrono-tz cannot resolve.
    pub fn timezone_table(&self) -> Result<TimezoneTable, ConfigError> {
        let mut groups = Vec::with_capacity(self.timezones.len());
        for (name, members) in &self.timezones {
            let zone = name
                .parse()
                .map_err(|_| ConfigError::UnknownZone(name.clone()))?;
            groups.push((zone, members.clone()));
        }
        Ok(TimezoneTable::new(groups))
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut timezones = BTreeMap::new();
        for zone in ["US/Pacific", "US/Central", "US/Eastern", "Europe/Oslo"] {
            timezones.insert(zone.to_string(), Vec::new());
        }

        Self {
            platform: PlatformConfig {
                token: String::new(),
                application_id: String::new(),
                guild_id: String::new(),
                forum_channel_id: String::new(),
            },
            timezones,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [platform]
        token = "secret"
        application_id = "app-1"
        guild_id = "guild-1"
        forum_channel_id = "forum-1"

        [timezones]
        "US/Eastern" = ["Alice", "Bob"]
        "Europe/Oslo" = ["Ole"]
    "#;

    #[test]
    fn default_config_lists_the_four_groups() {
        let config = Config::default();
        let groups: Vec<&str> = config.timezones.keys().map(String::as_str).collect();
        assert_eq!(
            groups,
            vec!["Europe/Oslo", "US/Central", "US/Eastern", "US/Pacific"]
        );
    }

    #[test]
    fn parse_valid_toml_config() {
        let config = Config::from_toml(SAMPLE).unwrap();

        assert_eq!(config.platform.guild_id, "guild-1");
        assert_eq!(
            config.timezones["US/Eastern"],
            vec!["Alice".to_string(), "Bob".to_string()]
        );
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let result = Config::from_toml("this is not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn timezone_table_resolves_members() {
        let table = Config::from_toml(SAMPLE).unwrap().timezone_table().unwrap();
        assert_eq!(table.zone_for("Bob"), Some(chrono_tz::US::Eastern));
        assert_eq!(table.zone_for("Ole"), Some(chrono_tz::Europe::Oslo));
        assert_eq!(table.zone_for("Nobody"), None);
    }

    #[test]
    fn unknown_zone_name_is_rejected() {
        let config = Config::from_toml(
            r#"
            [platform]
            token = ""
            application_id = ""
            guild_id = ""
            forum_channel_id = ""

            [timezones]
            "Atlantis/Lost" = ["Alice"]
        "#,
        )
        .unwrap();

        let err = config.timezone_table().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownZone(name) if name == "Atlantis/Lost"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let serialized = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&serialized).unwrap(), config);
    }
}
