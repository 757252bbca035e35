//! Fixed block layout of the summary card, in logical pixels

use crate::card::{CartazResumo, RenderTarget, MARCA};
pub use crate::rendering::font::text_width;

const PADDING: f32 = 32.0;
const GAP: f32 = 24.0;
/// Shortest dotted leader left between a metric label and its value
const MIN_LEADER: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right() + 0.01
            && other.bottom() <= self.bottom() + 0.01
    }
}

/// Which card image a node displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Fundo,
    Logo,
}

/// Visual role of a text run, which decides its color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Headline,
    Strong,
    Muted,
    Faint,
    Accent,
    AccentMuted,
    Dark,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    /// Full-card background layers
    Backdrop { has_image: bool },
    Image(ImageSlot),
    Text { role: TextRole, font_size: f32 },
    /// Progress ring with the percent sold
    Donut { percent: u8, thickness: f32 },
    /// Dark disc behind the percent text
    Badge,
    /// Light rounded box holding the consignor logo
    LogoBox,
    /// Placeholder mark used when there is no logo image
    LogoMark,
    /// Dotted leader between a metric label and its value
    Leader,
    /// Square brand mark in the footer
    BrandMark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub text: String,
    pub elem_type: ElementType,
}

impl LayoutNode {
    fn boxed(rect: Rect, elem_type: ElementType) -> Self {
        Self { rect, text: String::new(), elem_type }
    }

    fn text(x: f32, y: f32, text: &str, font_size: f32, role: TextRole) -> Self {
        Self {
            rect: Rect::new(x, y, text_width(text, font_size), font_size),
            text: text.to_string(),
            elem_type: ElementType::Text { role, font_size },
        }
    }
}

/// Largest font size up to `preferred` that keeps `text` within `max_width`
pub fn fit_font_size(text: &str, preferred: f32, max_width: f32) -> f32 {
    let width = text_width(text, preferred);
    if width <= max_width || width <= 0.0 {
        return preferred;
    }
    // Shaped advances grow linearly with the size
    (preferred * max_width / width).max(1.0)
}

fn text_right(right: f32, y: f32, text: &str, font_size: f32, role: TextRole) -> LayoutNode {
    let mut node = LayoutNode::text(0.0, y, text, font_size, role);
    node.rect.x = right - node.rect.width;
    node
}

/// Lay out the card inside the target's viewport.
///
/// Nodes come back in paint order (back to front).
pub fn layout_card(target: &RenderTarget) -> Vec<LayoutNode> {
    let card: &CartazResumo = &target.card;
    let width = target.viewport.width as f32;
    let height = target.viewport.height as f32;
    let content_right = width - PADDING;
    let content_width = width - PADDING * 2.0;
    let mut nodes = Vec::new();

    nodes.push(LayoutNode::boxed(
        Rect::new(0.0, 0.0, width, height),
        ElementType::Backdrop { has_image: target.fundo.is_some() },
    ));
    if target.fundo.is_some() {
        nodes.push(LayoutNode::boxed(
            Rect::new(0.0, 0.0, width, height),
            ElementType::Image(ImageSlot::Fundo),
        ));
    }

    // Header
    let mut y = PADDING;
    nodes.push(LayoutNode::text(PADDING, y, "LEILÃO", 60.0, TextRole::Headline));
    let site_size = fit_font_size(&card.site_texto, 14.0, content_width / 2.0);
    nodes.push(text_right(content_right, y + 8.0, &card.site_texto, site_size, TextRole::Faint));
    y += 60.0 + 8.0;

    let date_size = fit_font_size(&card.data_texto, 30.0, content_width);
    nodes.push(LayoutNode::text(PADDING, y, &card.data_texto, date_size, TextRole::Strong));
    y += 30.0 + 4.0;

    let weekday_size = fit_font_size(&card.dia_semana_texto, 24.0, content_width);
    nodes.push(LayoutNode::text(PADDING, y, &card.dia_semana_texto, weekday_size, TextRole::Faint));
    y += 24.0 + 32.0;

    // Middle: donut on the left, status and consignor on the right
    let left_col = ((content_width - GAP) * 5.0 / 12.0).floor();
    let donut_size = 180.0_f32.min(left_col);
    let donut = Rect::new(PADDING, y + 24.0, donut_size, donut_size);
    nodes.push(LayoutNode::boxed(
        donut,
        ElementType::Donut { percent: card.percentual_vendido.min(100), thickness: 20.0 },
    ));
    let (cx, cy) = donut.center();
    let badge_r = donut_size * 0.31;
    nodes.push(LayoutNode::boxed(
        Rect::new(cx - badge_r, cy - badge_r, badge_r * 2.0, badge_r * 2.0),
        ElementType::Badge,
    ));
    let pct = format!("{}%", card.percentual_vendido.min(100));
    let pct_size = fit_font_size(&pct, 48.0, badge_r * 1.6);
    let mut pct_node = LayoutNode::text(0.0, cy - pct_size / 2.0, &pct, pct_size, TextRole::Headline);
    pct_node.rect.x = cx - pct_node.rect.width / 2.0;
    nodes.push(pct_node);

    let right_x = PADDING + left_col + GAP;
    let right_w = content_right - right_x;
    let mut ry = y + 40.0;
    let status_size = fit_font_size(&card.titulo_direita, 60.0, right_w);
    nodes.push(LayoutNode::text(right_x, ry, &card.titulo_direita, status_size, TextRole::Headline));
    ry += 60.0 + 4.0;
    let sub_size = fit_font_size(&card.subtitulo_direita, 14.0, right_w);
    nodes.push(LayoutNode::text(right_x, ry, &card.subtitulo_direita, sub_size, TextRole::Muted));
    ry += 14.0 + 20.0;

    let logo_box = Rect::new(right_x, ry, right_w, 80.0);
    nodes.push(LayoutNode::boxed(logo_box, ElementType::LogoBox));
    let inner = Rect::new(logo_box.x + 16.0, logo_box.y + 16.0, logo_box.width - 32.0, 48.0);
    if target.logo.is_some() {
        nodes.push(LayoutNode::boxed(inner, ElementType::Image(ImageSlot::Logo)));
    } else {
        nodes.push(LayoutNode::boxed(Rect::new(inner.x, inner.y, 48.0, 48.0), ElementType::LogoMark));
        let name_x = inner.x + 48.0 + 12.0;
        let name_size = fit_font_size(&card.subtitulo_direita, 20.0, inner.right() - name_x);
        nodes.push(LayoutNode::text(
            name_x,
            inner.y + (48.0 - name_size) / 2.0,
            &card.subtitulo_direita,
            name_size,
            TextRole::Dark,
        ));
    }

    // Metrics
    let mut my = donut.bottom().max(logo_box.bottom()) + 22.0;
    let label_w = 220.0;
    let mut rows: Vec<(String, String)> = card
        .metricas()
        .into_iter()
        .map(|(label, value)| (label.to_string(), value))
        .collect();
    rows.push(("ARRECADAÇÃO".to_string(), card.arrecadacao.clone()));
    let last = rows.len() - 1;
    for (i, (label, value)) in rows.iter().enumerate() {
        if i == last {
            my += 6.0;
        }
        let row_h = 36.0;
        let label_size = fit_font_size(label, 18.0, label_w);
        nodes.push(LayoutNode::text(PADDING, my + row_h - label_size, label, label_size, TextRole::Strong));

        let leader_x = PADDING + label_w + 12.0;
        let value_room = content_right - (leader_x + MIN_LEADER + 12.0);
        let value_size = fit_font_size(value, 36.0, value_room);
        let value_node = text_right(content_right, my + row_h - value_size, value, value_size, TextRole::Accent);
        let leader_end = value_node.rect.x - 12.0;
        if leader_end > leader_x {
            nodes.push(LayoutNode::boxed(
                Rect::new(leader_x, my + row_h - 8.0, leader_end - leader_x, 1.0),
                ElementType::Leader,
            ));
        }
        nodes.push(value_node);
        my += row_h + 6.0;
    }

    // Footer brand, anchored bottom-right
    let brand_size = 24.0;
    let tagline = "CASA DE LEILÕES";
    let text_w = text_width(MARCA, brand_size).max(text_width(tagline, 12.0));
    let text_x = content_right - text_w;
    let mark = Rect::new(text_x - 16.0 - 48.0, height - 24.0 - 48.0, 48.0, 48.0);
    nodes.push(LayoutNode::boxed(mark, ElementType::BrandMark));
    nodes.push(LayoutNode::text(text_x, mark.y + 2.0, MARCA, brand_size, TextRole::Accent));
    nodes.push(LayoutNode::text(text_x, mark.y + 32.0, tagline, 12.0, TextRole::AccentMuted));

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CartazResumo;

    fn target() -> RenderTarget {
        RenderTarget::new(CartazResumo::default())
    }

    #[test]
    fn all_nodes_stay_inside_the_card() {
        let t = target();
        let bounds = Rect::new(0.0, 0.0, 540.0, 675.0);
        for node in layout_card(&t) {
            assert!(bounds.contains(&node.rect), "{:?} escapes the card", node);
        }
    }

    #[test]
    fn long_texts_shrink_to_fit() {
        let mut t = target();
        t.card.arrecadacao = "R$ 123.456.789.012,00".into();
        t.card.subtitulo_direita = "COMPANHIA NACIONAL DE SEGUROS GERAIS DO NORDESTE".into();
        let bounds = Rect::new(0.0, 0.0, 540.0, 675.0);
        let nodes = layout_card(&t);
        let value = nodes.iter().find(|n| n.text == t.card.arrecadacao).unwrap();
        assert!(bounds.contains(&value.rect));
        match value.elem_type {
            ElementType::Text { font_size, .. } => assert!(font_size < 36.0),
            _ => panic!("unexpected"),
        }
    }

    #[test]
    fn logo_placeholder_only_without_image() {
        let nodes = layout_card(&target());
        assert!(nodes.iter().any(|n| n.elem_type == ElementType::LogoMark));
        assert!(!nodes.iter().any(|n| n.elem_type == ElementType::Image(ImageSlot::Logo)));

        let with_logo = target().with_logo(crate::card::CardImage::proxied(vec![], "image/png"));
        let nodes = layout_card(&with_logo);
        assert!(nodes.iter().any(|n| n.elem_type == ElementType::Image(ImageSlot::Logo)));
        assert!(!nodes.iter().any(|n| n.elem_type == ElementType::LogoMark));
    }

    #[test]
    fn every_metric_keeps_a_leader() {
        let mut t = target();
        t.card.arrecadacao = "R$ 123.456.789.012,00".into();
        let nodes = layout_card(&t);
        let leaders: Vec<_> = nodes.iter().filter(|n| n.elem_type == ElementType::Leader).collect();
        assert_eq!(leaders.len(), 4);
        assert!(leaders.iter().all(|l| l.rect.width >= MIN_LEADER - 0.01));
    }

    #[test]
    fn metrics_are_in_display_order() {
        let nodes = layout_card(&target());
        let labels: Vec<_> = nodes
            .iter()
            .filter(|n| n.text.starts_with("LOTES") || n.text == "CONDICIONAIS" || n.text == "ARRECADAÇÃO")
            .map(|n| n.text.as_str())
            .collect();
        assert_eq!(labels, vec!["LOTES DISPONIBILIZADOS", "LOTES VENDIDOS", "CONDICIONAIS", "ARRECADAÇÃO"]);
    }
}
