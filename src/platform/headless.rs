//! Headless platform: records every interaction and writes delivered files
//! to an optional output directory.

use super::device::{DeviceMetrics, DeviceProfile};
use super::{AnchorId, FontsReady, Platform, ShareApi, ShareData};
use crate::export::asset::ImageAsset;
use crate::{Error, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// How the emulated runtime exposes native sharing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareSupport {
    /// No share capability
    #[default]
    None,
    /// Share exists but there is no shareability check
    Unchecked,
    /// Share exists and the check answers `accepts`
    Checked { accepts: bool },
}

/// What the emulated user does with the share sheet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShareBehavior {
    #[default]
    Complete,
    Dismiss,
    Fail(String),
}

/// Observable platform interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    FrameAwaited,
    FontsAwaited,
    ObjectUrlCreated { url: String, name: String },
    ObjectUrlRevoked { url: String },
    TabOpened { url: String, target: String, features: String },
    TabBlocked { url: String },
    AnchorCreated { anchor: AnchorId, href: String, download: String },
    AnchorAppended(AnchorId),
    AnchorClicked(AnchorId),
    AnchorRemoved(AnchorId),
    Shared { title: Option<String>, text: Option<String>, files: Vec<String> },
    ShareDismissed,
    Alert(String),
}

#[derive(Debug)]
struct Anchor {
    href: String,
    download: String,
    attached: bool,
}

#[derive(Default)]
struct Journal {
    events: Vec<(Instant, PlatformEvent)>,
    urls: HashMap<String, ImageAsset>,
    next_url: u64,
    anchors: HashMap<AnchorId, Anchor>,
    next_anchor: u64,
    delivered: Vec<ImageAsset>,
    saved: Vec<PathBuf>,
}

struct Shared {
    journal: Mutex<Journal>,
    output_dir: Option<PathBuf>,
}

impl Shared {
    fn with<R>(&self, f: impl FnOnce(&mut Journal) -> R) -> R {
        let mut j = self.journal.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut j)
    }

    fn record(&self, event: PlatformEvent) {
        debug!("platform: {:?}", event);
        self.with(|j| j.events.push((Instant::now(), event)));
    }

    /// Mark `asset` as delivered to the user and save it when an output
    /// directory is configured
    fn deliver(&self, asset: ImageAsset) -> Result<()> {
        let saved = match &self.output_dir {
            Some(dir) => Some(write_file(dir, &asset)?),
            None => None,
        };
        self.with(|j| {
            j.saved.extend(saved);
            j.delivered.push(asset);
        });
        Ok(())
    }
}

fn write_file(dir: &Path, asset: &ImageAsset) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let name = Path::new(&asset.name)
        .file_name()
        .ok_or_else(|| Error::Other(format!("invalid file name '{}'", asset.name)))?;
    let path = dir.join(name);
    std::fs::write(&path, &asset.bytes)?;
    debug!("saved {} ({} bytes)", path.display(), asset.len());
    Ok(path)
}

struct HeadlessShare {
    support: ShareSupport,
    behavior: ShareBehavior,
    shared: Arc<Shared>,
}

#[async_trait]
impl ShareApi for HeadlessShare {
    fn can_share(&self, data: &ShareData) -> Option<bool> {
        match self.support {
            ShareSupport::Checked { accepts } => Some(accepts && !data.files.is_empty()),
            _ => None,
        }
    }

    async fn share(&self, data: ShareData) -> Result<()> {
        match &self.behavior {
            ShareBehavior::Complete => {
                self.shared.record(PlatformEvent::Shared {
                    title: data.title.clone(),
                    text: data.text.clone(),
                    files: data.files.iter().map(|f| f.name.clone()).collect(),
                });
                for file in data.files {
                    self.shared.deliver(file)?;
                }
                Ok(())
            }
            ShareBehavior::Dismiss => {
                self.shared.record(PlatformEvent::ShareDismissed);
                Err(Error::ShareRejected)
            }
            ShareBehavior::Fail(reason) => Err(Error::Other(format!("share failed: {}", reason))),
        }
    }
}

struct HeadlessFonts {
    shared: Arc<Shared>,
}

#[async_trait]
impl FontsReady for HeadlessFonts {
    async fn ready(&self) -> Result<()> {
        self.shared.record(PlatformEvent::FontsAwaited);
        Ok(())
    }
}

/// Builder for [`HeadlessPlatform`]
#[derive(Debug, Clone)]
pub struct HeadlessBuilder {
    user_agent: String,
    metrics: DeviceMetrics,
    share: ShareSupport,
    behavior: ShareBehavior,
    fonts: bool,
    scroll_y: f32,
    frame_interval: Duration,
    block_popups: bool,
    output_dir: Option<PathBuf>,
}

impl Default for HeadlessBuilder {
    fn default() -> Self {
        Self::from_profile(&DeviceProfile::default())
    }
}

impl HeadlessBuilder {
    pub fn from_profile(profile: &DeviceProfile) -> Self {
        Self {
            user_agent: profile.user_agent.to_string(),
            metrics: profile.metrics.clone(),
            share: profile.share,
            behavior: ShareBehavior::Complete,
            fonts: true,
            scroll_y: 0.0,
            frame_interval: Duration::from_millis(16),
            block_popups: false,
            output_dir: None,
        }
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn share(mut self, support: ShareSupport) -> Self {
        self.share = support;
        self
    }

    pub fn share_behavior(mut self, behavior: ShareBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn fonts(mut self, enabled: bool) -> Self {
        self.fonts = enabled;
        self
    }

    pub fn scroll_y(mut self, y: f32) -> Self {
        self.scroll_y = y;
        self
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn block_popups(mut self, block: bool) -> Self {
        self.block_popups = block;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> HeadlessPlatform {
        let shared = Arc::new(Shared { journal: Mutex::new(Journal::default()), output_dir: self.output_dir });
        let share = match self.share {
            ShareSupport::None => None,
            support => Some(HeadlessShare { support, behavior: self.behavior, shared: Arc::clone(&shared) }),
        };
        let fonts = self.fonts.then(|| HeadlessFonts { shared: Arc::clone(&shared) });
        HeadlessPlatform {
            user_agent: self.user_agent,
            metrics: self.metrics,
            scroll_y: self.scroll_y,
            frame_interval: self.frame_interval,
            block_popups: self.block_popups,
            share,
            fonts,
            shared,
        }
    }
}

/// A [`Platform`] without a browser.
///
/// Object URLs are `blob:headless/<n>` handles onto the registered asset.
/// Files reach the user through a completed share, an opened tab or a
/// clicked download anchor; each delivery is kept in memory and, with an
/// output directory, written to disk under the asset's file name.
pub struct HeadlessPlatform {
    user_agent: String,
    metrics: DeviceMetrics,
    scroll_y: f32,
    frame_interval: Duration,
    block_popups: bool,
    share: Option<HeadlessShare>,
    fonts: Option<HeadlessFonts>,
    shared: Arc<Shared>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HeadlessPlatform {
    pub fn builder() -> HeadlessBuilder {
        HeadlessBuilder::default()
    }

    pub fn metrics(&self) -> &DeviceMetrics {
        &self.metrics
    }

    /// Recorded interactions, oldest first
    pub fn events(&self) -> Vec<PlatformEvent> {
        self.shared.with(|j| j.events.iter().map(|(_, e)| e.clone()).collect())
    }

    /// Recorded interactions with the tokio instant they happened at
    pub fn timeline(&self) -> Vec<(Instant, PlatformEvent)> {
        self.shared.with(|j| j.events.clone())
    }

    pub fn count(&self, pred: impl Fn(&PlatformEvent) -> bool) -> usize {
        self.shared.with(|j| j.events.iter().filter(|(_, e)| pred(e)).count())
    }

    /// Object URLs created and not yet revoked
    pub fn live_object_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.shared.with(|j| j.urls.keys().cloned().collect());
        urls.sort();
        urls
    }

    /// Anchors still attached to the document
    pub fn attached_anchors(&self) -> usize {
        self.shared.with(|j| j.anchors.values().filter(|a| a.attached).count())
    }

    pub fn delivered(&self) -> Vec<ImageAsset> {
        self.shared.with(|j| j.delivered.clone())
    }

    pub fn saved_files(&self) -> Vec<PathBuf> {
        self.shared.with(|j| j.saved.clone())
    }

    pub fn alerts(&self) -> Vec<String> {
        self.shared.with(|j| {
            j.events
                .iter()
                .filter_map(|(_, e)| match e {
                    PlatformEvent::Alert(msg) => Some(msg.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    fn asset_for(&self, url: &str) -> Option<ImageAsset> {
        self.shared.with(|j| j.urls.get(url).cloned())
    }
}

#[async_trait]
impl Platform for HeadlessPlatform {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn share(&self) -> Option<&dyn ShareApi> {
        self.share.as_ref().map(|s| s as &dyn ShareApi)
    }

    fn fonts(&self) -> Option<&dyn FontsReady> {
        self.fonts.as_ref().map(|f| f as &dyn FontsReady)
    }

    fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    async fn next_animation_frame(&self) {
        tokio::time::sleep(self.frame_interval).await;
        self.shared.record(PlatformEvent::FrameAwaited);
    }

    fn create_object_url(&self, asset: &ImageAsset) -> Result<String> {
        let url = self.shared.with(|j| {
            j.next_url += 1;
            let url = format!("blob:headless/{}", j.next_url);
            j.urls.insert(url.clone(), asset.clone());
            url
        });
        self.shared.record(PlatformEvent::ObjectUrlCreated { url: url.clone(), name: asset.name.clone() });
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        if self.shared.with(|j| j.urls.remove(url)).is_none() {
            warn!("revoking unknown object URL {}", url);
        }
        self.shared.record(PlatformEvent::ObjectUrlRevoked { url: url.to_string() });
    }

    fn open_window(&self, url: &str, target: &str, features: &str) -> Result<()> {
        if self.block_popups {
            self.shared.record(PlatformEvent::TabBlocked { url: url.to_string() });
            return Err(Error::UnsupportedPlatform("popup blocked".into()));
        }
        self.shared.record(PlatformEvent::TabOpened {
            url: url.to_string(),
            target: target.to_string(),
            features: features.to_string(),
        });
        if let Some(asset) = self.asset_for(url) {
            self.shared.deliver(asset)?;
        }
        Ok(())
    }

    fn create_anchor(&self, href: &str, download: &str) -> AnchorId {
        let anchor = self.shared.with(|j| {
            j.next_anchor += 1;
            let id = AnchorId(j.next_anchor);
            j.anchors.insert(id, Anchor { href: href.to_string(), download: download.to_string(), attached: false });
            id
        });
        self.shared.record(PlatformEvent::AnchorCreated {
            anchor,
            href: href.to_string(),
            download: download.to_string(),
        });
        anchor
    }

    fn append_anchor(&self, anchor: AnchorId) {
        self.shared.with(|j| {
            if let Some(a) = j.anchors.get_mut(&anchor) {
                a.attached = true;
            }
        });
        self.shared.record(PlatformEvent::AnchorAppended(anchor));
    }

    fn click_anchor(&self, anchor: AnchorId) -> Result<()> {
        let (href, download) = self
            .shared
            .with(|j| j.anchors.get(&anchor).map(|a| (a.href.clone(), a.download.clone())))
            .ok_or_else(|| Error::Other(format!("unknown anchor {:?}", anchor)))?;
        self.shared.record(PlatformEvent::AnchorClicked(anchor));
        let mut asset = self
            .asset_for(&href)
            .ok_or_else(|| Error::Other(format!("object URL {} is not live", href)))?;
        if !download.is_empty() {
            asset.name = download;
        }
        self.shared.deliver(asset)
    }

    fn remove_anchor(&self, anchor: AnchorId) {
        self.shared.with(|j| j.anchors.remove(&anchor));
        self.shared.record(PlatformEvent::AnchorRemoved(anchor));
    }

    fn alert(&self, message: &str) {
        warn!("alert: {}", message);
        self.shared.record(PlatformEvent::Alert(message.to_string()));
    }
}
