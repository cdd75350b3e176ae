use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Poll intervals below this are clamped up.
pub const MIN_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_audit_interval_secs")]
    pub audit_interval_secs: u64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default = "CategoryConfig::movies")]
    pub movies: CategoryConfig,
    #[serde(default = "CategoryConfig::tv")]
    pub tv: CategoryConfig,
    #[serde(default = "CategoryConfig::music")]
    pub music: CategoryConfig,
}

/// Scoring constants for release and directory matching.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_entity_threshold")]
    pub entity_threshold: f64,
    #[serde(default = "default_directory_threshold")]
    pub directory_threshold: f64,
    #[serde(default = "default_music_threshold")]
    pub artist_threshold: f64,
    #[serde(default = "default_music_threshold")]
    pub album_threshold: f64,
    #[serde(default = "default_year_bonus")]
    pub year_bonus: f64,
    #[serde(default = "default_year_penalty")]
    pub year_penalty: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Download-client category tag this reconciler consumes.
    #[serde(default)]
    pub category: String,
    /// Library root on the read-only mount.
    #[serde(default)]
    pub root: PathBuf,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    /// Manager database, required for the categories registered by direct mutation.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_audit_interval_secs() -> u64 {
    3600
}

fn default_cooldown_secs() -> u64 {
    6 * 3600
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_entity_threshold() -> f64 {
    0.6
}

fn default_directory_threshold() -> f64 {
    0.7
}

fn default_music_threshold() -> f64 {
    0.5
}

fn default_year_bonus() -> f64 {
    0.2
}

fn default_year_penalty() -> f64 {
    0.3
}

fn default_history_limit() -> u32 {
    200
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            entity_threshold: default_entity_threshold(),
            directory_threshold: default_directory_threshold(),
            artist_threshold: default_music_threshold(),
            album_threshold: default_music_threshold(),
            year_bonus: default_year_bonus(),
            year_penalty: default_year_penalty(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            limit: default_history_limit(),
        }
    }
}

impl CategoryConfig {
    fn disabled(category: &str) -> Self {
        Self {
            enabled: false,
            category: category.to_string(),
            root: PathBuf::new(),
            url: String::new(),
            api_key: String::new(),
            database_path: None,
        }
    }

    pub fn movies() -> Self {
        Self::disabled("movies")
    }

    pub fn tv() -> Self {
        Self::disabled("tv")
    }

    pub fn music() -> Self {
        Self::disabled("music")
    }

    fn validate(&self, name: &str, needs_database: bool) -> Result<(), Error> {
        if !self.enabled {
            return Ok(());
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidConfig(format!("{}.category is required", name)));
        }
        if self.root.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(format!("{}.root is required", name)));
        }
        if self.url.trim().is_empty() || self.api_key.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "{}.url and {}.api_key are required",
                name, name
            )));
        }
        if needs_database && self.database_path.is_none() {
            return Err(Error::InvalidConfig(format!(
                "{}.database_path is required",
                name
            )));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            audit_interval_secs: default_audit_interval_secs(),
            cooldown_secs: default_cooldown_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            dry_run: false,
            matching: MatchingConfig::default(),
            history: HistoryConfig::default(),
            movies: CategoryConfig::movies(),
            tv: CategoryConfig::tv(),
            music: CategoryConfig::music(),
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    pub fn audit_interval(&self) -> Duration {
        Duration::from_secs(self.audit_interval_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Startup checks. The CLI exits on any failure.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.movies.enabled || self.tv.enabled || self.music.enabled) {
            return Err(Error::InvalidConfig(
                "no category enabled (movies, tv, music)".to_string(),
            ));
        }
        if self.history.url.trim().is_empty() || self.history.api_key.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "history.url and history.api_key are required".to_string(),
            ));
        }
        self.movies.validate("movies", false)?;
        self.tv.validate("tv", true)?;
        self.music.validate("music", true)?;
        Ok(())
    }
}

/// Load `Config.toml` (or the given file) and `MEDIARECON__*` environment overrides.
pub fn load_configuration(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let file_source = match path {
        Some(path) => ConfigFile::with_name(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };
    let builder = Config::builder()
        .add_source(file_source)
        .add_source(Environment::with_prefix("MEDIARECON").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
