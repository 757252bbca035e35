//! Platform API surface: share sheet, object URLs, tabs, anchors, frames
//!
//! The export pipeline never reads browser globals directly. Every runtime
//! capability it needs goes through [`Platform`], and capabilities that may
//! be missing on a given runtime are exposed as `Option` accessors.

pub mod capability;
pub mod device;
pub mod headless;
pub mod share;

pub use capability::Capabilities;
pub use device::{DeviceMetrics, DeviceProfile};
pub use headless::{HeadlessPlatform, PlatformEvent, ShareBehavior, ShareSupport};
pub use share::{FontsReady, ShareApi, ShareData};

use crate::export::asset::ImageAsset;
use crate::Result;
use async_trait::async_trait;

/// Handle to a synthesized anchor element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// Runtime capabilities the export pipeline depends on.
#[async_trait]
pub trait Platform: Send + Sync {
    fn user_agent(&self) -> String;

    /// Native share capability, if the runtime has one
    fn share(&self) -> Option<&dyn ShareApi>;

    /// Fonts-loaded signal, if the runtime has one
    fn fonts(&self) -> Option<&dyn FontsReady>;

    /// Current vertical scroll of the window in logical pixels
    fn scroll_y(&self) -> f32;

    /// Resolves at the next animation frame boundary
    async fn next_animation_frame(&self);

    fn create_object_url(&self, asset: &ImageAsset) -> Result<String>;

    fn revoke_object_url(&self, url: &str);

    fn open_window(&self, url: &str, target: &str, features: &str) -> Result<()>;

    fn create_anchor(&self, href: &str, download: &str) -> AnchorId;

    fn append_anchor(&self, anchor: AnchorId);

    fn click_anchor(&self, anchor: AnchorId) -> Result<()>;

    fn remove_anchor(&self, anchor: AnchorId);

    /// Blocking user notice
    fn alert(&self, message: &str);
}
