use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Data directory not found")]
    NoDataDir,

    #[error("Bot token missing, set [bot] token in {0}")]
    MissingToken(PathBuf),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("Metadata provider error: {0}")]
    Metadata(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Entry must have either a MAL or AniList record")]
    MissingData,

    #[error("Failed to render card: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
