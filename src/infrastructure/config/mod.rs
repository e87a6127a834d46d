//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub snippets: SnippetsConfig,
    pub lifecycle: LifecycleConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub dsn: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SnippetsConfig {
    /// Groups the snippets module listens to
    pub groups: Vec<i64>,
    pub image_dir: PathBuf,
    pub add_prefix: String,
    pub random_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LifecycleConfig {
    /// How long shutdown waits for modules to stop; 0 waits forever
    pub stop_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AdaptersConfig {
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Group id that console input is attributed to
    pub group: i64,
    pub uin: i64,
    pub display_name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "snippets-bot".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: "snippets.db".to_string(),
        }
    }
}

impl Default for SnippetsConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            image_dir: PathBuf::from("images"),
            add_prefix: "!添加语录".to_string(),
            random_prefix: "!随机语录".to_string(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: 30,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            group: 10000,
            uin: 10001,
            display_name: "console".to_string(),
        }
    }
}

impl LifecycleConfig {
    pub fn stop_timeout(&self) -> Option<Duration> {
        match self.stop_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Config {
    /// Read a YAML file, then apply `SNIPPETS_*` environment overrides
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML only; the environment is not consulted
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Result<Self, ConfigError> {
        // Defaults, then environment overrides
        let mut config = Config::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(dsn) = std::env::var("SNIPPETS_DATABASE_DSN") {
            self.database.dsn = dsn;
        }

        if let Ok(groups) = std::env::var("SNIPPETS_GROUPS") {
            self.snippets.groups = parse_groups(&groups)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.dsn.trim().is_empty() {
            return Err(ConfigError::MissingField("database.dsn".to_string()));
        }
        if self.snippets.add_prefix.is_empty() || self.snippets.random_prefix.is_empty() {
            return Err(ConfigError::InvalidValue("snippets command prefixes must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Parse a comma-separated list of group ids
pub fn parse_groups(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ConfigError::InvalidValue(format!("group id '{}' is not an integer", s)))
        })
        .collect()
}
