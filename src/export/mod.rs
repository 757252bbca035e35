//! Export pipeline: rasterize the card, package a PNG and hand it to the
//! user through the best delivery path the platform offers.
//!
//! # Example
//!
//! ```no_run
//! use leilao_cartaz::card::{CartazResumo, RenderTarget};
//! use leilao_cartaz::platform::HeadlessPlatform;
//! use leilao_cartaz::{new_exporter, ExportConfig, ExportOutcome};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = Arc::new(HeadlessPlatform::builder().output_dir("out").build());
//! let exporter = new_exporter(platform, ExportConfig::default())?;
//! let outcome = exporter.export_and_share(&RenderTarget::new(CartazResumo::default())).await;
//! assert!(matches!(outcome, ExportOutcome::Delivered(_)));
//! exporter.drain_cleanup().await;
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod cleanup;
pub mod strategy;

pub use asset::{ImageAsset, DEFAULT_FILE_NAME, PNG_MIME};
pub use cleanup::CleanupScope;
pub use strategy::DeliveryStrategy;

use crate::card::RenderTarget;
use crate::platform::{Capabilities, Platform, ShareData};
use crate::rendering::{RasterOptions, Rasterizer};
use crate::{Error, ExportConfig, Result};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

type StateHandler = Arc<dyn Fn(ExportState) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Busy,
}

/// What happened to one export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The image reached the user through `strategy`
    Delivered(DeliveryStrategy),
    /// The user closed the share sheet
    Dismissed,
    /// Something failed; the user was alerted
    Failed(String),
    /// Another export for this card was still running
    Busy,
}

/// Drives exports for one card.
///
/// At most one export runs at a time. Object URLs created on the way are
/// revoked by a [`CleanupScope`] owned by the exporter, so dropping the
/// exporter releases them early.
pub struct Exporter {
    platform: Arc<dyn Platform>,
    rasterizer: Arc<dyn Rasterizer>,
    config: ExportConfig,
    busy: AtomicBool,
    on_state_change: Option<StateHandler>,
    cleanup: CleanupScope,
}

struct BusyGuard<'a> {
    exporter: &'a Exporter,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.exporter.busy.store(false, Ordering::SeqCst);
        self.exporter.notify(ExportState::Idle);
    }
}

impl Exporter {
    pub fn new(platform: Arc<dyn Platform>, rasterizer: Arc<dyn Rasterizer>, config: ExportConfig) -> Self {
        Self {
            platform,
            rasterizer,
            config,
            busy: AtomicBool::new(false),
            on_state_change: None,
            cleanup: CleanupScope::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn state(&self) -> ExportState {
        if self.busy.load(Ordering::SeqCst) {
            ExportState::Busy
        } else {
            ExportState::Idle
        }
    }

    /// Register a callback invoked on every busy/idle transition
    pub fn on_state_change<F>(&mut self, cb: F)
    where
        F: Fn(ExportState) + Send + Sync + 'static,
    {
        self.on_state_change = Some(Arc::new(cb));
    }

    pub fn clear_on_state_change(&mut self) {
        self.on_state_change = None;
    }

    /// Revocations still waiting for their deadline
    pub fn pending_cleanup(&self) -> usize {
        self.cleanup.pending()
    }

    /// Wait for every scheduled revocation to run
    pub async fn drain_cleanup(&self) {
        self.cleanup.drain().await
    }

    fn notify(&self, state: ExportState) {
        if let Some(cb) = &self.on_state_change {
            cb(state);
        }
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        self.notify(ExportState::Busy);
        Some(BusyGuard { exporter: self })
    }

    /// Export `target` as a PNG and deliver it.
    ///
    /// Never fails: errors are logged and reported to the user with one
    /// alert, except a dismissed share sheet which is silent.
    pub async fn export_and_share(&self, target: &RenderTarget) -> ExportOutcome {
        let Some(_guard) = self.try_begin() else {
            warn!("export already in progress");
            return ExportOutcome::Busy;
        };

        match self.run(target).await {
            Ok(strategy) => {
                info!("card delivered via {}", strategy);
                ExportOutcome::Delivered(strategy)
            }
            Err(e) if !e.is_user_visible() => {
                debug!("export ended quietly: {}", e);
                ExportOutcome::Dismissed
            }
            Err(e) => {
                error!("export failed: {}", e);
                self.platform.alert(&self.config.failure_message);
                ExportOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run(&self, target: &RenderTarget) -> Result<DeliveryStrategy> {
        self.platform.next_animation_frame().await;
        if let Some(fonts) = self.platform.fonts() {
            if let Err(e) = fonts.ready().await {
                warn!("fonts not ready, rasterizing anyway: {}", e);
            }
        }

        let options = RasterOptions {
            use_cors: self.config.use_cors,
            scale: self.config.scale,
            background: Some(self.config.background),
            ..Default::default()
        }
        .compensating_scroll(self.platform.scroll_y());
        let raster = self.rasterizer.rasterize(target, &options).await?;
        debug!("rasterized {}x{}", raster.width, raster.height);

        let asset = asset::package(&raster, &self.config.file_name)?;
        drop(raster);

        let caps = Capabilities::probe(self.platform.as_ref(), &asset);
        let chosen = strategy::select(&caps);
        debug!("capabilities {:?} -> {}", caps, chosen);
        self.deliver(chosen, asset).await
    }

    async fn deliver(&self, chosen: DeliveryStrategy, asset: ImageAsset) -> Result<DeliveryStrategy> {
        match chosen {
            DeliveryStrategy::NativeShare => {
                let share = self
                    .platform
                    .share()
                    .ok_or_else(|| Error::UnsupportedPlatform("share capability went away".into()))?;
                let data = ShareData::files(vec![asset])
                    .with_title(self.config.share_title.clone())
                    .with_text(self.config.share_text.clone());
                share.share(data).await?;
                Ok(DeliveryStrategy::NativeShare)
            }
            DeliveryStrategy::OpenInNewTab => {
                let url = self.platform.create_object_url(&asset)?;
                match self.platform.open_window(&url, "_blank", "noopener") {
                    Ok(()) => {
                        self.schedule_revoke(url, self.config.new_tab_revoke);
                        Ok(DeliveryStrategy::OpenInNewTab)
                    }
                    Err(Error::UnsupportedPlatform(reason)) => {
                        warn!("new tab unavailable ({}), downloading instead", reason);
                        let clicked = self.click_download(&url, &asset.name);
                        self.schedule_revoke(url, self.config.download_revoke);
                        clicked.map(|_| DeliveryStrategy::ProgrammaticDownload)
                    }
                    Err(e) => {
                        self.schedule_revoke(url, self.config.new_tab_revoke);
                        Err(e)
                    }
                }
            }
            DeliveryStrategy::ProgrammaticDownload => {
                let url = self.platform.create_object_url(&asset)?;
                let clicked = self.click_download(&url, &asset.name);
                self.schedule_revoke(url, self.config.download_revoke);
                clicked.map(|_| DeliveryStrategy::ProgrammaticDownload)
            }
        }
    }

    /// Temporary anchor with a `download` attribute; removed right after the
    /// click whatever the click returned
    fn click_download(&self, url: &str, file_name: &str) -> Result<()> {
        let anchor = self.platform.create_anchor(url, file_name);
        self.platform.append_anchor(anchor);
        let clicked = self.platform.click_anchor(anchor);
        self.platform.remove_anchor(anchor);
        clicked
    }

    fn schedule_revoke(&self, url: String, delay: Duration) {
        let platform = Arc::clone(&self.platform);
        self.cleanup.defer(format!("revoke {}", url), delay, move || {
            platform.revoke_object_url(&url);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CartazResumo;
    use crate::platform::{HeadlessPlatform, PlatformEvent};
    use crate::rendering::CardRasterizer;
    use std::sync::Mutex;

    fn exporter(platform: Arc<HeadlessPlatform>) -> Exporter {
        Exporter::new(platform, Arc::new(CardRasterizer::new()), ExportConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn state_callback_sees_one_busy_idle_cycle() {
        let platform = Arc::new(HeadlessPlatform::default());
        let mut exp = exporter(Arc::clone(&platform));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        exp.on_state_change(move |st| s.lock().unwrap().push(st));

        let outcome = exp.export_and_share(&RenderTarget::new(CartazResumo::default())).await;
        assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::ProgrammaticDownload));
        assert_eq!(*seen.lock().unwrap(), vec![ExportState::Busy, ExportState::Idle]);
        assert_eq!(exp.state(), ExportState::Idle);

        exp.clear_on_state_change();
        exp.export_and_share(&RenderTarget::new(CartazResumo::default())).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_frame_and_fonts_before_delivery() {
        let platform = Arc::new(HeadlessPlatform::default());
        let exp = exporter(Arc::clone(&platform));
        exp.export_and_share(&RenderTarget::new(CartazResumo::default())).await;
        let events = platform.events();
        assert_eq!(events[0], PlatformEvent::FrameAwaited);
        assert_eq!(events[1], PlatformEvent::FontsAwaited);
        assert!(matches!(events[2], PlatformEvent::ObjectUrlCreated { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_tab_falls_back_to_download() {
        let platform = Arc::new(
            HeadlessPlatform::builder()
                .user_agent(crate::platform::device::IPHONE_UA)
                .block_popups(true)
                .build(),
        );
        let exp = exporter(Arc::clone(&platform));
        let outcome = exp.export_and_share(&RenderTarget::new(CartazResumo::default())).await;
        assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::ProgrammaticDownload));
        assert_eq!(platform.count(|e| matches!(e, PlatformEvent::ObjectUrlCreated { .. })), 1);
        assert!(platform.alerts().is_empty());
        exp.drain_cleanup().await;
        assert!(platform.live_object_urls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_exporter_revokes_pending_urls() {
        let platform = Arc::new(HeadlessPlatform::default());
        let exp = exporter(Arc::clone(&platform));
        exp.export_and_share(&RenderTarget::new(CartazResumo::default())).await;
        assert_eq!(platform.live_object_urls().len(), 1);
        assert_eq!(exp.pending_cleanup(), 1);
        drop(exp);
        assert!(platform.live_object_urls().is_empty());
    }
}
