//! Card rasterizer built on `tiny-skia`.
//!
//! Text runs are shaped with `swash` at device resolution and composited as
//! coverage masks. Card photos are decoded with `image` (PNG or JPEG).

use crate::card::{CardImage, RenderTarget};
use crate::rendering::font::{self, card_font};
use crate::rendering::layout::{layout_card, ImageSlot, Rect};
use crate::rendering::paint::{paint_card, PaintCommand};
use crate::rendering::{RasterImage, RasterOptions, Rasterizer, Rgba};
use crate::{Error, Result};
use async_trait::async_trait;
use log::{debug, warn};
use swash::scale::image::Image as GlyphImage;
use swash::scale::{Render, ScaleContext, Source};
use swash::shape::ShapeContext;
use swash::zeno::{Format, Vector};
use swash::FontRef;
use tiny_skia::{
    FillRule, FilterQuality, GradientStop, IntSize, LineCap, LinearGradient, Paint, Path, PathBuilder,
    Pixmap, PixmapPaint, Point, PremultipliedColorU8, RadialGradient, Shader, SpreadMode, Stroke,
    StrokeDash, Transform,
};

/// Synchronous rasterizer for [`RenderTarget`]s
#[derive(Debug, Default, Clone)]
pub struct CardRasterizer;

impl CardRasterizer {
    pub fn new() -> Self {
        CardRasterizer
    }

    /// Draw the target into a new bitmap.
    ///
    /// Fails with [`Error::RasterizationFailed`] when the geometry is empty,
    /// the scale is not a positive number, or the card references a
    /// cross-origin image that was not cleared for CORS (tainted canvas).
    pub fn render(&self, target: &RenderTarget, options: &RasterOptions) -> Result<RasterImage> {
        let scale = options.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::RasterizationFailed(format!("invalid scale {}", scale)));
        }
        let (lw, lh) = (target.viewport.width, target.viewport.height);
        if lw == 0 || lh == 0 {
            return Err(Error::RasterizationFailed(format!("empty render target {}x{}", lw, lh)));
        }
        if options.use_cors && target.images().any(|img| !img.cors_cleared) {
            return Err(Error::RasterizationFailed(
                "tainted canvas: cross-origin image served without CORS headers".into(),
            ));
        }

        let width = (lw as f32 * scale).round() as u32;
        let height = (lh as f32 * scale).round() as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::RasterizationFailed(format!("cannot allocate {}x{} canvas", width, height))
        })?;
        if let Some(bg) = options.background {
            pixmap.fill(bg.to_skia());
        }

        let base = Transform::from_scale(scale, scale).pre_translate(0.0, options.content_offset_y());
        let commands = paint_card(&layout_card(target));
        debug!("rasterizing card: {} commands at {}x{}", commands.len(), width, height);

        let mut text = TextPainter::new()?;
        for cmd in &commands {
            self.execute(&mut pixmap, &mut text, cmd, target, options, base);
        }

        Ok(RasterImage { width, height, pixmap })
    }

    fn execute(
        &self,
        pixmap: &mut Pixmap,
        text_painter: &mut TextPainter,
        cmd: &PaintCommand,
        target: &RenderTarget,
        options: &RasterOptions,
        base: Transform,
    ) {
        match cmd {
            PaintCommand::RoundedRect { rect, radius, fill, stroke } => {
                if let Some(path) = rounded_rect_path(rect, *radius) {
                    pixmap.fill_path(&path, &solid(*fill), FillRule::Winding, base, None);
                    if let Some((color, width)) = stroke {
                        let stroke = Stroke { width: *width, ..Stroke::default() };
                        pixmap.stroke_path(&path, &solid(*color), &stroke, base, None);
                    }
                }
            }
            PaintCommand::VerticalGradient { rect, top, bottom } => {
                let shader = LinearGradient::new(
                    Point::from_xy(rect.x, rect.y),
                    Point::from_xy(rect.x, rect.bottom()),
                    vec![GradientStop::new(0.0, top.to_skia()), GradientStop::new(1.0, bottom.to_skia())],
                    SpreadMode::Pad,
                    Transform::identity(),
                );
                fill_rect_with(pixmap, rect, shader, base);
            }
            PaintCommand::HorizontalFade { rect, left, stop } => {
                let clear = left.with_opacity(0.0);
                let shader = LinearGradient::new(
                    Point::from_xy(rect.x, rect.y),
                    Point::from_xy(rect.right(), rect.y),
                    vec![
                        GradientStop::new(0.0, left.to_skia()),
                        GradientStop::new(stop.clamp(0.0, 1.0), clear.to_skia()),
                    ],
                    SpreadMode::Pad,
                    Transform::identity(),
                );
                fill_rect_with(pixmap, rect, shader, base);
            }
            PaintCommand::Glow { cx, cy, radius, rgba } => {
                let center = Point::from_xy(*cx, *cy);
                let shader = RadialGradient::new(
                    center,
                    center,
                    *radius,
                    vec![
                        GradientStop::new(0.0, rgba.to_skia()),
                        GradientStop::new(1.0, rgba.with_opacity(0.0).to_skia()),
                    ],
                    SpreadMode::Pad,
                    Transform::identity(),
                );
                let card = Rect::new(0.0, 0.0, target.viewport.width as f32, target.viewport.height as f32);
                fill_rect_with(pixmap, &card, shader, base);
            }
            PaintCommand::Circle { cx, cy, radius, rgba } => {
                if let Some(path) = PathBuilder::from_circle(*cx, *cy, *radius) {
                    pixmap.fill_path(&path, &solid(*rgba), FillRule::Winding, base, None);
                }
            }
            PaintCommand::Ring { cx, cy, radius, thickness, rgba } => {
                if let Some(path) = PathBuilder::from_circle(*cx, *cy, *radius) {
                    let stroke = Stroke { width: *thickness, ..Stroke::default() };
                    pixmap.stroke_path(&path, &solid(*rgba), &stroke, base, None);
                }
            }
            PaintCommand::Arc { cx, cy, radius, thickness, sweep_degrees, rgba } => {
                if let Some(path) = arc_path(*cx, *cy, *radius, *sweep_degrees) {
                    let stroke = Stroke { width: *thickness, line_cap: LineCap::Round, ..Stroke::default() };
                    pixmap.stroke_path(&path, &solid(*rgba), &stroke, base, None);
                }
            }
            PaintCommand::DottedLine { x1, x2, y, rgba } => {
                let mut pb = PathBuilder::new();
                pb.move_to(*x1, *y);
                pb.line_to(*x2, *y);
                if let Some(path) = pb.finish() {
                    let stroke = Stroke {
                        width: 1.0,
                        line_cap: LineCap::Round,
                        dash: StrokeDash::new(vec![1.0, 3.0], 0.0),
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &solid(*rgba), &stroke, base, None);
                }
            }
            PaintCommand::Text { x, y, font_size, text, rgba } => {
                text_painter.draw(pixmap, text, *x, *y, *font_size, *rgba, base);
            }
            PaintCommand::Image { rect, slot, opacity, cover } => {
                let image = match slot {
                    ImageSlot::Fundo => target.fundo.as_ref(),
                    ImageSlot::Logo => target.logo.as_ref(),
                };
                if let Some(image) = image {
                    draw_image(pixmap, image, rect, *opacity, *cover, options, base);
                }
            }
        }
    }
}

#[async_trait]
impl Rasterizer for CardRasterizer {
    async fn rasterize(&self, target: &RenderTarget, options: &RasterOptions) -> Result<RasterImage> {
        self.render(target, options)
    }
}

fn solid(rgba: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(rgba.to_skia());
    paint.anti_alias = true;
    paint
}

fn fill_rect_with(pixmap: &mut Pixmap, rect: &Rect, shader: Option<Shader<'static>>, base: Transform) {
    let (Some(shader), Some(r)) = (shader, tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height))
    else {
        return;
    };
    let mut paint = Paint::default();
    paint.shader = shader;
    paint.anti_alias = true;
    pixmap.fill_rect(r, &paint, base, None);
}

fn rounded_rect_path(rect: &Rect, radius: f32) -> Option<Path> {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let (x, y, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.quad_to(right, y, right, y + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.quad_to(x, bottom, x, bottom - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Polyline arc, clockwise from 12 o'clock (screen coordinates, y down)
fn arc_path(cx: f32, cy: f32, radius: f32, sweep_degrees: f32) -> Option<Path> {
    let sweep = sweep_degrees.clamp(0.0, 360.0);
    if sweep <= 0.0 {
        return None;
    }
    let steps = (sweep.ceil() as usize).max(2);
    let start = -std::f32::consts::FRAC_PI_2;
    let mut pb = PathBuilder::new();
    for i in 0..=steps {
        let theta = start + sweep.to_radians() * i as f32 / steps as f32;
        let (px, py) = (cx + radius * theta.cos(), cy + radius * theta.sin());
        if i == 0 {
            pb.move_to(px, py);
        } else {
            pb.line_to(px, py);
        }
    }
    pb.finish()
}

/// Shapes and draws text runs in the card font.
///
/// Glyphs are rasterized at the device size of the run (logical size times
/// the transform scale) so text stays sharp at 2x.
struct TextPainter {
    font: FontRef<'static>,
    shape: ShapeContext,
    scale: ScaleContext,
}

impl TextPainter {
    fn new() -> Result<Self> {
        let font = card_font()
            .ok_or_else(|| Error::RasterizationFailed("embedded card font is unreadable".into()))?;
        Ok(Self { font, shape: ShapeContext::new(), scale: ScaleContext::new() })
    }

    /// Draw a single-line run whose line box has its top-left at (x, y)
    fn draw(&mut self, pixmap: &mut Pixmap, text: &str, x: f32, y: f32, font_size: f32, rgba: Rgba, base: Transform) {
        let ppem = font_size * base.sy;
        if text.is_empty() || ppem <= 0.0 {
            return;
        }
        let mut origin = [Point::from_xy(x, font::baseline(self.font, y, font_size))];
        base.map_points(&mut origin);
        let mut pen_x = origin[0].x;
        let pen_y = origin[0].y.round();

        let mut shaper = self.shape.builder(self.font).size(ppem).build();
        shaper.add_str(text);
        let mut scaler = self.scale.builder(self.font).size(ppem).hint(true).build();

        shaper.shape_with(|cluster| {
            for glyph in cluster.glyphs {
                let gx = pen_x + glyph.x;
                let whole = gx.floor();
                let rendered = Render::new(&[Source::Outline])
                    .format(Format::Alpha)
                    .offset(Vector::new(gx - whole, 0.0))
                    .render(&mut scaler, glyph.id);
                if let Some(mask) = rendered {
                    let left = whole as i32 + mask.placement.left;
                    let top = (pen_y - glyph.y) as i32 - mask.placement.top;
                    if let Some(tinted) = tint_mask(&mask, rgba) {
                        pixmap.draw_pixmap(left, top, tinted.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
                    }
                }
                pen_x += glyph.advance;
            }
        });
    }
}

/// Premultiplied pixmap of a glyph coverage mask filled with `rgba`
fn tint_mask(mask: &GlyphImage, rgba: Rgba) -> Option<Pixmap> {
    let mut tinted = Pixmap::new(mask.placement.width, mask.placement.height)?;
    for (px, &coverage) in tinted.pixels_mut().iter_mut().zip(mask.data.iter()) {
        let alpha = coverage as u32 * rgba.a as u32 / 255;
        let premul = |c: u8| (c as u32 * alpha / 255) as u8;
        if let Some(color) = PremultipliedColorU8::from_rgba(premul(rgba.r), premul(rgba.g), premul(rgba.b), alpha as u8) {
            *px = color;
        }
    }
    Some(tinted)
}

/// Decode a PNG or JPEG card image into a premultiplied pixmap
fn decode_card_image(card_image: &CardImage) -> Result<Pixmap> {
    let rgba = image::load_from_memory(&card_image.bytes)
        .map_err(|e| Error::Decode(format!("{} image: {}", card_image.content_type, e)))?
        .to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = (*c as u16 * a / 255) as u8;
        }
    }
    let size = IntSize::from_wh(w, h).ok_or_else(|| Error::Decode(format!("empty image {}x{}", w, h)))?;
    Pixmap::from_vec(data, size).ok_or_else(|| Error::Decode("image buffer size mismatch".into()))
}

fn draw_image(
    pixmap: &mut Pixmap,
    card_image: &CardImage,
    rect: &Rect,
    opacity: f32,
    cover: bool,
    options: &RasterOptions,
    base: Transform,
) {
    if !card_image.cors_cleared && !options.use_cors {
        // Cross-origin images are not loaded at all without CORS mode
        debug!("skipping cross-origin image without CORS mode");
        return;
    }
    let decoded = match decode_card_image(card_image) {
        Ok(p) => p,
        Err(e) => {
            warn!("skipping undecodable card image: {}", e);
            return;
        }
    };
    let (iw, ih) = (decoded.width() as f32, decoded.height() as f32);
    let sx = rect.width / iw;
    let sy = rect.height / ih;
    let s = if cover { sx.max(sy) } else { sx.min(sy) };
    let ox = rect.x + (rect.width - iw * s) / 2.0;
    let oy = rect.y + (rect.height - ih * s) / 2.0;
    let paint = PixmapPaint {
        opacity: opacity.clamp(0.0, 1.0),
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    let transform = base.pre_translate(ox, oy).pre_scale(s, s);
    pixmap.draw_pixmap(0, 0, decoded.as_ref(), &paint, transform, None);
}
