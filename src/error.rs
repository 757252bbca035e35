//! Error types for the card pipeline and the auction gateway

use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading auctions or exporting the card
#[derive(Error, Debug)]
pub enum Error {
    /// The card could not be drawn to a bitmap (tainted canvas, bad geometry)
    #[error("Rasterization failed: {0}")]
    RasterizationFailed(String),

    /// The bitmap could not be encoded to PNG
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// The user dismissed or denied the native share sheet
    #[error("Share was dismissed")]
    ShareRejected,

    /// No delivery mechanism applies to the current platform
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Failed to obtain a bearer token from the gateway
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The gateway answered with a non-success status
    #[error("Gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Response payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this failure should be shown to the user.
    ///
    /// Dismissing the share sheet is a normal outcome and stays silent.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Error::ShareRejected)
    }
}

#[cfg(feature = "gateway")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}
