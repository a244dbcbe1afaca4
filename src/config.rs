use std::fs;
use std::path::Path;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use log::warn;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::DataListError;
use crate::params::ListParams;

pub static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub datalist: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const DATALIST_LEVEL: &str = "info";

    fn ensure_valid(&mut self) {
        let str_original = self.datalist.clone();
        self.datalist = self.datalist.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.datalist.as_str()) {
            warn!(
                "Config error: datalist log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::DATALIST_LEVEL
            );
            self.datalist = Self::DATALIST_LEVEL.to_owned();
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            datalist: Self::DATALIST_LEVEL.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
    pub default_page_size: u32,
    pub page_size_options: Vec<u32>,
    pub search_debounce_ms: u64,
}

impl ListConfig {
    const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 25, 50, 100];
    const SEARCH_DEBOUNCE_MS: u64 = 300;

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    fn ensure_valid(&mut self) {
        self.page_size_options.retain(|&size| size > 0);
        if self.page_size_options.is_empty() {
            warn!("Config error: page_size_options is empty - using defaults");
            self.page_size_options = Self::PAGE_SIZE_OPTIONS.to_vec();
        }

        if self.default_page_size == 0 {
            warn!(
                "Config error: default_page_size of 0 is invalid - using default of '{}'",
                ListParams::DEFAULT_PAGE_SIZE
            );
            self.default_page_size = ListParams::DEFAULT_PAGE_SIZE;
        }

        if !self.page_size_options.contains(&self.default_page_size) {
            self.page_size_options.push(self.default_page_size);
        }
        self.page_size_options.sort_unstable();
        self.page_size_options.dedup();
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        ListConfig {
            default_page_size: ListParams::DEFAULT_PAGE_SIZE,
            page_size_options: Self::PAGE_SIZE_OPTIONS.to_vec(),
            search_debounce_ms: Self::SEARCH_DEBOUNCE_MS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub list: ListConfig,
}

impl Config {
    pub const ENV_PREFIX: &str = "DATALIST_";

    /// Loads the configuration from `config.toml` in the app's data directory.
    /// Writes the default config to disk if no file exists yet.
    pub fn load_config(project_dirs: &ProjectDirs) -> Result<Self, DataListError> {
        let config_path = project_dirs.data_local_dir().join("config.toml");

        if !config_path.exists() {
            Self::write_default(&config_path);
        }

        Self::load_from(&config_path)
    }

    /// Defaults, merged with the TOML file at `config_path` (if it exists),
    /// merged with `DATALIST_` environment variables. Nested keys use `__`,
    /// e.g. `DATALIST_LIST__DEFAULT_PAGE_SIZE=25`.
    pub fn load_from(config_path: &Path) -> Result<Self, DataListError> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"));

        let mut config: Config = figment.extract()?;
        config.ensure_valid();

        Ok(config)
    }

    /// Returns the global config, loading defaults if none was installed.
    pub fn global() -> &'static Config {
        CONFIG.get_or_init(|| {
            let mut config = Config::default();
            config.ensure_valid();
            config
        })
    }

    fn write_default(config_path: &Path) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
                return;
            }
        }

        match toml::to_string_pretty(&Config::default()) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    warn!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(e) => warn!("Failed to serialize default config: {e}"),
        }
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.list.ensure_valid();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_when_file_missing() {
        Jail::expect_with(|jail| {
            let config = Config::load_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            assert_eq!(config.list.search_debounce(), Duration::from_millis(300));
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [logging]
                datalist = " DEBUG "

                [list]
                default_page_size = 20
                page_size_options = [50, 10, 0]
                search_debounce_ms = 150
                "#,
            )?;
            jail.set_env("DATALIST_LIST__SEARCH_DEBOUNCE_MS", "500");

            let config = Config::load_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.logging.datalist, "debug");
            assert_eq!(config.list.default_page_size, 20);
            assert_eq!(config.list.page_size_options, vec![10, 20, 50]);
            assert_eq!(config.list.search_debounce_ms, 500);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_fall_back() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [logging]
                datalist = "loud"

                [list]
                default_page_size = 0
                page_size_options = []
                search_debounce_ms = 300
                "#,
            )?;

            let config = Config::load_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.logging.datalist, "info");
            assert_eq!(config.list.default_page_size, 10);
            assert_eq!(config.list.page_size_options, vec![10, 25, 50, 100]);
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[list]\ndefault_page_size = \"many\"\n")?;

            let result = Config::load_from(&jail.directory().join("config.toml"));
            assert!(matches!(result, Err(DataListError::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn test_write_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::write_default(&path);
        assert!(path.exists());

        let text = fs::read_to_string(&path).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
