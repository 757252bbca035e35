//! Rendering of the summary card to a bitmap.
//!
//! The pipeline is layout → paint commands → raster:
//!
//! 1. [`layout::layout_card`] places every element of the card in logical
//!    (CSS pixel) coordinates
//! 2. [`paint::paint_card`] turns the layout into a flat list of
//!    [`paint::PaintCommand`]s
//! 3. [`raster::CardRasterizer`] executes the commands on a `tiny-skia`
//!    pixmap at the requested scale, shaping text with `swash` in the
//!    embedded [`font`] and decoding card photos with `image`
//!
//! [`worker::RasterWorker`] runs the rasterizer on a dedicated thread and is
//! what the exporter uses by default.

pub mod font;
pub mod layout;
pub mod paint;
pub mod raster;
pub mod worker;

pub use raster::CardRasterizer;
pub use worker::RasterWorker;

use crate::card::RenderTarget;
use crate::{Error, Result};
use async_trait::async_trait;
use tiny_skia::Pixmap;

/// Straight (non-premultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha scaled by `opacity` (0.0..=1.0)
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`
    pub fn parse_hex(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| Error::Config(format!("invalid color: {}", s)))
        };
        match hex.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(Error::Config(format!("invalid color: {}", s))),
        }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Card background and export canvas color (`#0f0f10`)
pub const CARD_BACKGROUND: Rgba = Rgba::rgb(0x0f, 0x0f, 0x10);
/// Accent gold used for values and the donut arc (`#d9b55b`)
pub const GOLD: Rgba = Rgba::rgb(0xd9, 0xb5, 0x5b);

/// Options passed to a [`Rasterizer`]
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Read cross-origin images that were served with CORS headers
    pub use_cors: bool,
    /// Device scale multiplier applied to the logical geometry
    pub scale: f32,
    /// Opaque canvas background; `None` leaves the canvas transparent
    pub background: Option<Rgba>,
    /// Vertical offset added to the capture origin
    pub scroll_y: f32,
    /// Current page scroll at capture time
    pub window_scroll_y: f32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            use_cors: true,
            scale: 2.0,
            background: Some(CARD_BACKGROUND),
            scroll_y: 0.0,
            window_scroll_y: 0.0,
        }
    }
}

impl RasterOptions {
    /// Options that cancel out the page scroll so the capture is not offset
    pub fn compensating_scroll(mut self, window_scroll_y: f32) -> Self {
        self.window_scroll_y = window_scroll_y;
        self.scroll_y = -window_scroll_y;
        self
    }

    /// Net vertical translation applied to the content, in logical pixels
    pub fn content_offset_y(&self) -> f32 {
        -(self.window_scroll_y + self.scroll_y)
    }
}

/// In-memory bitmap produced by rasterizing a render target
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixmap: Pixmap,
}

impl RasterImage {
    /// RGBA of one physical pixel (demultiplied)
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::rgba(p.red(), p.green(), p.blue(), p.alpha()))
    }
}

/// Anything that can turn a render target into a bitmap
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, target: &RenderTarget, options: &RasterOptions) -> Result<RasterImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgba::parse_hex("#0f0f10").unwrap(), CARD_BACKGROUND);
        assert_eq!(Rgba::parse_hex("d9b55b80").unwrap(), GOLD.with_opacity(128.0 / 255.0));
        assert!(Rgba::parse_hex("#12").is_err());
        assert!(Rgba::parse_hex("#zzzzzz").is_err());
    }

    #[test]
    fn scroll_compensation_cancels_offset() {
        let naive = RasterOptions { window_scroll_y: 300.0, ..Default::default() };
        assert_eq!(naive.content_offset_y(), -300.0);
        let comp = RasterOptions::default().compensating_scroll(300.0);
        assert_eq!(comp.scroll_y, -300.0);
        assert_eq!(comp.content_offset_y(), 0.0);
    }
}
