//! Native share sheet surface

use crate::export::asset::ImageAsset;
use crate::Result;
use async_trait::async_trait;

/// Payload handed to the native share sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareData {
    pub title: Option<String>,
    pub text: Option<String>,
    pub files: Vec<ImageAsset>,
}

impl ShareData {
    /// Payload with files only, as used for the can-share probe
    pub fn files(files: Vec<ImageAsset>) -> Self {
        Self { files, ..Default::default() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// System share capability.
///
/// `can_share` returns `None` when the platform offers no shareability
/// check at all; callers must not treat that as a refusal.
#[async_trait]
pub trait ShareApi: Send + Sync {
    fn can_share(&self, data: &ShareData) -> Option<bool>;

    /// Resolves once the sheet is dismissed. A user cancel is reported as
    /// [`crate::Error::ShareRejected`].
    async fn share(&self, data: ShareData) -> Result<()>;
}

/// Fonts-loaded signal
#[async_trait]
pub trait FontsReady: Send + Sync {
    async fn ready(&self) -> Result<()>;
}
