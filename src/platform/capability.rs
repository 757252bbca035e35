//! Capability probes used to pick a delivery strategy

use super::{Platform, ShareData};
use crate::export::asset::ImageAsset;

const IOS_MARKERS: [&str; 3] = ["iPad", "iPhone", "iPod"];

pub fn has_native_share(platform: &dyn Platform) -> bool {
    platform.share().is_some()
}

/// Whether the platform accepts a share payload carrying `file`.
///
/// A platform without a shareability check does not block sharing.
pub fn can_share_file(platform: &dyn Platform, file: &ImageAsset) -> bool {
    shareability_check(platform, file).unwrap_or(true)
}

/// Outcome of the platform's shareability check, if it has one
fn shareability_check(platform: &dyn Platform, file: &ImageAsset) -> Option<bool> {
    let data = ShareData::files(vec![file.clone()]);
    platform.share().and_then(|s| s.can_share(&data))
}

pub fn is_ios_family(user_agent: &str) -> bool {
    IOS_MARKERS.iter().any(|m| user_agent.contains(m))
}

/// Capabilities resolved for one export attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub has_share: bool,
    pub can_check_shareability: bool,
    /// Result of the shareability check, `true` when there is none
    pub file_shareable: bool,
    pub is_ios: bool,
}

impl Capabilities {
    pub fn probe(platform: &dyn Platform, file: &ImageAsset) -> Self {
        Self {
            has_share: has_native_share(platform),
            can_check_shareability: shareability_check(platform, file).is_some(),
            file_shareable: can_share_file(platform, file),
            is_ios: is_ios_family(&platform.user_agent()),
        }
    }

    pub fn native_share_available(&self) -> bool {
        self.has_share && self.file_shareable
    }
}
