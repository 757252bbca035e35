//! Paint command set for the card, in logical pixels

use crate::rendering::layout::{ElementType, ImageSlot, LayoutNode, Rect, TextRole};
use crate::rendering::{Rgba, CARD_BACKGROUND, GOLD};

const WHITE: Rgba = Rgba::rgb(255, 255, 255);
const BLACK: Rgba = Rgba::rgb(0, 0, 0);
const EMERALD: Rgba = Rgba::rgb(0x05, 0x96, 0x69);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    RoundedRect {
        rect: Rect,
        radius: f32,
        fill: Rgba,
        stroke: Option<(Rgba, f32)>,
    },
    /// Top-to-bottom gradient between two colors
    VerticalGradient {
        rect: Rect,
        top: Rgba,
        bottom: Rgba,
    },
    /// Left-to-right gradient that fades out at `stop` (0..1 of the width)
    HorizontalFade {
        rect: Rect,
        left: Rgba,
        stop: f32,
    },
    /// Soft radial light, transparent at `radius`
    Glow {
        cx: f32,
        cy: f32,
        radius: f32,
        rgba: Rgba,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        rgba: Rgba,
    },
    /// Stroked circle outline
    Ring {
        cx: f32,
        cy: f32,
        radius: f32,
        thickness: f32,
        rgba: Rgba,
    },
    /// Clockwise arc starting at 12 o'clock, round caps
    Arc {
        cx: f32,
        cy: f32,
        radius: f32,
        thickness: f32,
        sweep_degrees: f32,
        rgba: Rgba,
    },
    DottedLine {
        x1: f32,
        x2: f32,
        y: f32,
        rgba: Rgba,
    },
    Text {
        x: f32,
        y: f32,
        font_size: f32,
        text: String,
        rgba: Rgba,
    },
    Image {
        rect: Rect,
        slot: ImageSlot,
        opacity: f32,
        cover: bool,
    },
}

fn role_color(role: TextRole) -> Rgba {
    match role {
        TextRole::Headline | TextRole::Strong => WHITE,
        TextRole::Muted => WHITE.with_opacity(0.55),
        TextRole::Faint => WHITE.with_opacity(0.42),
        TextRole::Accent => GOLD,
        TextRole::AccentMuted => GOLD.with_opacity(0.7),
        TextRole::Dark => BLACK,
    }
}

/// Translate laid out nodes into paint commands, keeping their order
pub fn paint_card(nodes: &[LayoutNode]) -> Vec<PaintCommand> {
    let mut cmds = Vec::with_capacity(nodes.len() + 4);
    for node in nodes {
        let rect = node.rect;
        match &node.elem_type {
            ElementType::Backdrop { has_image } => {
                cmds.push(PaintCommand::RoundedRect {
                    rect,
                    radius: 24.0,
                    fill: CARD_BACKGROUND,
                    stroke: None,
                });
                if !has_image {
                    cmds.push(PaintCommand::Glow {
                        cx: rect.x + rect.width * 0.7,
                        cy: rect.y + rect.height * 0.6,
                        radius: rect.width * 0.9,
                        rgba: WHITE.with_opacity(0.10),
                    });
                    cmds.push(PaintCommand::Glow {
                        cx: rect.x + rect.width * 0.2,
                        cy: rect.y + rect.height * 0.7,
                        radius: rect.width * 0.75,
                        rgba: GOLD.with_opacity(0.10),
                    });
                }
            }
            ElementType::Image(slot) => {
                let fundo = *slot == ImageSlot::Fundo;
                cmds.push(PaintCommand::Image {
                    rect,
                    slot: *slot,
                    opacity: if fundo { 0.35 } else { 1.0 },
                    cover: fundo,
                });
                if fundo {
                    cmds.push(PaintCommand::VerticalGradient {
                        rect,
                        top: BLACK.with_opacity(0.35),
                        bottom: BLACK.with_opacity(0.75),
                    });
                    cmds.push(PaintCommand::HorizontalFade {
                        rect,
                        left: BLACK.with_opacity(0.60),
                        stop: 0.55,
                    });
                }
            }
            ElementType::Text { role, font_size } => cmds.push(PaintCommand::Text {
                x: rect.x,
                y: rect.y,
                font_size: *font_size,
                text: node.text.clone(),
                rgba: role_color(*role),
            }),
            ElementType::Donut { percent, thickness } => {
                let (cx, cy) = rect.center();
                let radius = (rect.width.min(rect.height) - thickness) / 2.0;
                cmds.push(PaintCommand::Ring {
                    cx,
                    cy,
                    radius,
                    thickness: *thickness,
                    rgba: WHITE.with_opacity(0.16),
                });
                if *percent > 0 {
                    cmds.push(PaintCommand::Arc {
                        cx,
                        cy,
                        radius,
                        thickness: *thickness,
                        sweep_degrees: 360.0 * (*percent).min(100) as f32 / 100.0,
                        rgba: GOLD,
                    });
                }
            }
            ElementType::Badge => {
                let (cx, cy) = rect.center();
                cmds.push(PaintCommand::Circle {
                    cx,
                    cy,
                    radius: rect.width / 2.0,
                    rgba: BLACK.with_opacity(0.65),
                });
            }
            ElementType::LogoBox => cmds.push(PaintCommand::RoundedRect {
                rect,
                radius: 16.0,
                fill: WHITE.with_opacity(0.92),
                stroke: None,
            }),
            ElementType::LogoMark => {
                let (cx, cy) = rect.center();
                cmds.push(PaintCommand::Circle { cx, cy, radius: rect.width / 2.0, rgba: EMERALD });
            }
            ElementType::Leader => cmds.push(PaintCommand::DottedLine {
                x1: rect.x,
                x2: rect.right(),
                y: rect.y,
                rgba: WHITE.with_opacity(0.35),
            }),
            ElementType::BrandMark => cmds.push(PaintCommand::RoundedRect {
                rect,
                radius: 16.0,
                fill: GOLD.with_opacity(0.10),
                stroke: Some((GOLD.with_opacity(0.45), 1.0)),
            }),
        }
    }
    cmds
}
