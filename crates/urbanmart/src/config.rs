use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use urbanmart_core::{DashboardSettings, FilterCriteria};

pub const DATA_ENV_VAR: &str = "URBANMART_DATA";
pub const DEFAULT_DATA_FILE: &str = "transactions_1000.csv";

/// Optional TOML file with a default data path, chart settings and a filter preset.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: Option<PathBuf>,
    pub settings: DashboardSettings,
    pub filters: FilterCriteria,
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// `--data` wins, then `URBANMART_DATA`, then the config file, then the default file name.
    pub fn resolve_data_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| env::var_os(DATA_ENV_VAR).map(PathBuf::from))
            .or_else(|| self.data_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urbanmart_core::{ChannelSelection, SortOrder};

    #[test]
    fn parses_full_config() {
        let config: DashboardConfig = toml::from_str(
            r#"
            data_path = "data/transactions.csv"

            [settings]
            top_n = 3
            channel_order = "descending"

            [filters]
            stores = ["Downtown", "Uptown"]
            channel = "Online"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.data_path.as_deref(),
            Some(Path::new("data/transactions.csv"))
        );
        assert_eq!(config.settings.top_n, 3);
        assert_eq!(config.settings.channel_order, SortOrder::Descending);
        assert_eq!(config.settings.preview_rows, 20);
        assert_eq!(config.filters.stores.len(), 2);
        assert_eq!(
            config.filters.channel,
            ChannelSelection::Only("Online".to_string())
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: DashboardConfig = toml::from_str("").unwrap();
        assert!(config.data_path.is_none());
        assert!(config.filters.is_unrestricted());
        assert_eq!(config.settings, DashboardSettings::default());
    }

    #[test]
    fn data_flag_takes_precedence() {
        let config = DashboardConfig {
            data_path: Some(PathBuf::from("from-config.csv")),
            ..DashboardConfig::default()
        };
        assert_eq!(
            config.resolve_data_path(Some(PathBuf::from("flag.csv"))),
            PathBuf::from("flag.csv")
        );
    }
}
