use crate::platform::Capabilities;
use std::fmt;

/// How a packaged image reaches the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryStrategy {
    NativeShare,
    OpenInNewTab,
    ProgrammaticDownload,
}

impl DeliveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStrategy::NativeShare => "native-share",
            DeliveryStrategy::OpenInNewTab => "open-in-new-tab",
            DeliveryStrategy::ProgrammaticDownload => "programmatic-download",
        }
    }
}

impl fmt::Display for DeliveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the strategy for one attempt: native share, then the iOS new-tab
/// workaround, then a programmatic download.
pub fn select(caps: &Capabilities) -> DeliveryStrategy {
    if caps.native_share_available() {
        DeliveryStrategy::NativeShare
    } else if caps.is_ios {
        DeliveryStrategy::OpenInNewTab
    } else {
        DeliveryStrategy::ProgrammaticDownload
    }
}
