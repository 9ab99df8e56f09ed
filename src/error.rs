use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlbumPickerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Spotify authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Spotify API error: {0}")]
    SpotifyApiError(String),

    #[error("Not authenticated with Spotify")]
    NotAuthenticated,

    #[error("UI error: {0}")]
    UIError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Keyring error: {0}")]
    KeyringError(#[from] keyring::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse grouping of failures, used to label notices shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Network,
    Data,
    Local,
}

impl ErrorClass {
    pub fn label(self) -> &'static str {
        match self {
            ErrorClass::Configuration => "configuration",
            ErrorClass::Network => "network",
            ErrorClass::Data => "data",
            ErrorClass::Local => "local",
        }
    }
}

impl AlbumPickerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AlbumPickerError::ConfigError(_)
            | AlbumPickerError::AuthenticationFailed(_)
            | AlbumPickerError::NotAuthenticated
            | AlbumPickerError::KeyringError(_) => ErrorClass::Configuration,
            AlbumPickerError::SpotifyApiError(_) => ErrorClass::Network,
            AlbumPickerError::UIError(_) | AlbumPickerError::IoError(_) => ErrorClass::Local,
            AlbumPickerError::NetworkError(e) if e.is_decode() => ErrorClass::Data,
            AlbumPickerError::NetworkError(_) => ErrorClass::Network,
            AlbumPickerError::SerializationError(_) => ErrorClass::Data,
        }
    }
}

pub type Result<T> = std::result::Result<T, AlbumPickerError>;
