//! Embedded card typeface and single-line text metrics.
//!
//! Every text run on the card is set in DejaVu Sans Bold, shipped with the
//! crate so that layout and rasterization never depend on system fonts.

use std::cell::RefCell;
use swash::shape::ShapeContext;
use swash::FontRef;

static CARD_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Average advance per character, as a fraction of the font size. Only
/// used for measuring when the embedded face cannot be parsed.
const FALLBACK_ADVANCE: f32 = 0.6;

thread_local! {
    static SHAPER: RefCell<ShapeContext> = RefCell::new(ShapeContext::new());
}

/// The typeface of the card
pub fn card_font() -> Option<FontRef<'static>> {
    FontRef::from_index(CARD_FONT, 0)
}

/// Shaped advance width of a single-line run
pub fn text_width(text: &str, font_size: f32) -> f32 {
    match card_font() {
        Some(font) => SHAPER.with(|cx| shaped_width(&mut cx.borrow_mut(), font, text, font_size)),
        None => text.chars().count() as f32 * font_size * FALLBACK_ADVANCE,
    }
}

pub(crate) fn shaped_width(cx: &mut ShapeContext, font: FontRef<'_>, text: &str, font_size: f32) -> f32 {
    let mut shaper = cx.builder(font).size(font_size).build();
    shaper.add_str(text);
    let mut width = 0.0;
    shaper.shape_with(|cluster| {
        for glyph in cluster.glyphs {
            width += glyph.advance;
        }
    });
    width
}

/// Baseline of a run whose line box starts at `top` and is `font_size` tall.
///
/// The ascent/descent box is centered on the line box.
pub fn baseline(font: FontRef<'_>, top: f32, font_size: f32) -> f32 {
    let metrics = font.metrics(&[]).scale(font_size);
    let extent = metrics.ascent + metrics.descent.abs();
    top + (font_size - extent) / 2.0 + metrics.ascent
}
