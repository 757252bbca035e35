//! Leilão Cartaz
//!
//! Reads auction events from the Leilões PB backend, builds the promotional
//! summary card ("cartaz de resumo") and exports it as a PNG through the
//! best delivery path a platform offers.
//!
//! # Features
//!
//! - **Export pipeline**: frame wait, rasterization at 2x, PNG packaging and
//!   delivery by native share, new tab (iOS) or programmatic download
//! - **Headless platform**: records platform interactions and writes
//!   delivered files to disk
//! - **Gateway** (default `gateway` feature): authenticated read-only client
//!   for auction lists, details and summary reports
//!
//! # Example
//!
//! ```no_run
//! use leilao_cartaz::card::{CartazResumo, RenderTarget};
//! use leilao_cartaz::platform::{device::DeviceProfile, headless::HeadlessBuilder};
//! use leilao_cartaz::{new_exporter, ExportConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = HeadlessBuilder::from_profile(&DeviceProfile::iphone())
//!     .output_dir("cartazes")
//!     .build();
//! let exporter = new_exporter(Arc::new(platform), ExportConfig::default())?;
//!
//! let outcome = exporter.export_and_share(&RenderTarget::new(CartazResumo::default())).await;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod card;
pub mod format;
pub mod model;

// Layout, paint and tiny-skia rasterization of the card
pub mod rendering;

// Packaging, delivery strategies and the export orchestrator
pub mod export;

// Runtime capability surface (share sheet, object URLs, anchors)
pub mod platform;

#[cfg(feature = "gateway")]
pub mod gateway;

pub use export::{DeliveryStrategy, ExportOutcome, ExportState, Exporter};
pub use rendering::{RasterImage, RasterOptions, Rasterizer, Rgba};

/// Configuration for [`Exporter`]
///
/// The defaults produce `resumo-leilao.png` at 2x over `#0f0f10`.
///
/// # Examples
///
/// ```
/// let cfg = leilao_cartaz::ExportConfig::default();
/// assert_eq!(cfg.file_name, "resumo-leilao.png");
/// assert_eq!(cfg.scale, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Name of the exported file
    pub file_name: String,
    /// Device scale multiplier for rasterization
    pub scale: f32,
    /// Opaque canvas background
    pub background: Rgba,
    /// Read cross-origin images served with CORS headers
    pub use_cors: bool,
    /// Title passed to the native share sheet
    pub share_title: String,
    /// Text passed to the native share sheet
    pub share_text: String,
    /// Lifetime of the object URL opened in a new tab
    pub new_tab_revoke: Duration,
    /// Lifetime of the object URL behind a download anchor
    pub download_revoke: Duration,
    /// Alert shown when an export fails
    pub failure_message: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: export::DEFAULT_FILE_NAME.to_string(),
            scale: 2.0,
            background: rendering::CARD_BACKGROUND,
            use_cors: true,
            share_title: "Resumo do Leilão".to_string(),
            share_text: "Confira o resumo do leilão".to_string(),
            new_tab_revoke: Duration::from_secs(60),
            download_revoke: Duration::from_secs(10),
            failure_message: "Não foi possível gerar a imagem. Tente novamente.".to_string(),
        }
    }
}

/// Logical size of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    /// The 4:5 summary card
    fn default() -> Self {
        Self { width: 540, height: 675 }
    }
}

/// Create an exporter for `platform` backed by a rasterization worker thread
pub fn new_exporter(platform: Arc<dyn platform::Platform>, config: ExportConfig) -> Result<Exporter> {
    let worker = rendering::RasterWorker::spawn()?;
    Ok(Exporter::new(platform, Arc::new(worker), config))
}
