//! Device presets for the headless platform

use super::ShareSupport;

pub const DESKTOP_CHROME_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_8 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.2 Mobile/15E148 Safari/604.1";
pub const ANDROID_CHROME_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMetrics {
    pub width: u32,
    pub height: u32,
    pub dpr: f32,
    pub touch: bool,
}

/// A named device: metrics, user agent and share support
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub user_agent: &'static str,
    pub metrics: DeviceMetrics,
    pub share: ShareSupport,
}

impl DeviceProfile {
    /// Desktop Chrome on Linux, no share sheet
    pub fn desktop_chrome() -> Self {
        Self {
            name: "desktop",
            user_agent: DESKTOP_CHROME_UA,
            metrics: DeviceMetrics { width: 1280, height: 720, dpr: 1.0, touch: false },
            share: ShareSupport::None,
        }
    }

    /// iPhone on an iOS release without file sharing
    pub fn iphone() -> Self {
        Self {
            name: "iphone",
            user_agent: IPHONE_UA,
            metrics: DeviceMetrics { width: 390, height: 844, dpr: 3.0, touch: true },
            share: ShareSupport::None,
        }
    }

    pub fn android_chrome() -> Self {
        Self {
            name: "android",
            user_agent: ANDROID_CHROME_UA,
            metrics: DeviceMetrics { width: 412, height: 915, dpr: 2.625, touch: true },
            share: ShareSupport::Checked { accepts: true },
        }
    }

    pub fn presets() -> Vec<Self> {
        vec![Self::desktop_chrome(), Self::iphone(), Self::android_chrome()]
    }

    /// Look up a preset by name
    pub fn named(name: &str) -> Option<Self> {
        Self::presets().into_iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::desktop_chrome()
    }
}
