use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Text shown at the bottom of every card
    #[serde(default = "default_footer")]
    pub footer: String,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_mal_client_id")]
    pub mal_client_id: String,
    #[serde(default = "default_true")]
    pub anilist: bool,
    #[serde(default = "default_true")]
    pub kitsu: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_mal_client_id() -> String {
    "".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600 // one hour
}

fn default_footer() -> String {
    "{anime}, <manga>, ]LN[ | [Source](https://github.com/dashwav/Discordoragi)".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            footer: default_footer(),
            bot: BotConfig::default(),
            metadata: MetadataConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            mal_client_id: default_mal_client_id(),
            anilist: true,
            kitsu: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "oragi")
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()
        .ok_or(Error::NoConfigDir)?
        .config_dir()
        .to_path_buf())
}

pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()
        .ok_or(Error::NoDataDir)?
        .data_dir()
        .to_path_buf())
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

impl Config {
    /// Read the config at `path`, writing the defaults there first if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The bot token, or an error pointing at the file to edit
    pub fn token(&self, path: &Path) -> Result<&str> {
        let token = self.bot.token.trim();
        if token.is_empty() {
            return Err(Error::MissingToken(path.to_path_buf()));
        }
        Ok(token)
    }
}
