//! Promotional summary card ("cartaz") and the offscreen render target.
//!
//! `CartazResumo` is the view model of the card; `RenderTarget` is the hidden
//! copy of the card the exporter rasterizes. Images on the render target are
//! always loaded through the image proxy so the rasterizer may read them.

use crate::format::{dois_digitos, format_brl, parse_api_date, texto_data_cartaz, texto_dia_semana};
use crate::model::{Leilao, LeilaoStats};
use crate::Viewport;
use chrono::NaiveDateTime;

pub const SITE_TEXTO: &str = "www.leiloespb.com.br";
pub const TITULO_DIREITA: &str = "LEILOADO";
pub const MARCA: &str = "LEILÕES PB";

/// View model of the summary card
#[derive(Debug, Clone, PartialEq)]
pub struct CartazResumo {
    /// Percent of available lots that were sold (0..=100)
    pub percentual_vendido: u8,
    pub lotes_disponibilizados: u64,
    pub lotes_vendidos: u64,
    pub condicionais: u64,
    /// Total raised, already formatted as currency
    pub arrecadacao: String,

    pub data_texto: String,
    pub dia_semana_texto: String,
    pub site_texto: String,

    pub titulo_direita: String,
    pub subtitulo_direita: String,

    pub fundo_url: Option<String>,
    pub logo_url: Option<String>,
}

impl Default for CartazResumo {
    fn default() -> Self {
        Self {
            percentual_vendido: 81,
            lotes_disponibilizados: 53,
            lotes_vendidos: 37,
            condicionais: 6,
            arrecadacao: "R$ 1.262.400,00".to_string(),
            data_texto: "DIA 11 DE FEVEREIRO 2026".to_string(),
            dia_semana_texto: "(QUARTA-FEIRA)".to_string(),
            site_texto: SITE_TEXTO.to_string(),
            titulo_direita: TITULO_DIREITA.to_string(),
            subtitulo_direita: "TOKIO MARINE SEGURADORA".to_string(),
            fundo_url: None,
            logo_url: None,
        }
    }
}

/// Percent of lots sold, rounded; zero when nothing was offered
pub fn percentual_vendido(stats: &LeilaoStats) -> u8 {
    if stats.lotes_disponiveis <= 0.0 {
        return 0;
    }
    let pct = (stats.vendidos / stats.lotes_disponiveis * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

fn contador(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.round() as u64
    } else {
        0
    }
}

impl CartazResumo {
    /// Build the card for an auction and its summary report.
    ///
    /// `agora` stands in for the auction date when the backend has none.
    pub fn from_relatorio(leilao: &Leilao, stats: &LeilaoStats, agora: NaiveDateTime) -> Self {
        let data = leilao
            .data_proximo_leilao
            .as_ref()
            .and_then(|d| d.date.as_deref())
            .and_then(parse_api_date)
            .unwrap_or(agora);

        let principal = leilao.comitente_principal();
        let subtitulo = principal
            .and_then(|c| c.apelido.as_deref().filter(|s| !s.trim().is_empty()))
            .or_else(|| {
                principal
                    .and_then(|c| c.pessoa.as_ref())
                    .and_then(|p| p.name.as_deref())
                    .filter(|s| !s.trim().is_empty())
            })
            .unwrap_or(MARCA);

        Self {
            percentual_vendido: percentual_vendido(stats),
            lotes_disponibilizados: contador(stats.lotes_disponiveis),
            lotes_vendidos: contador(stats.vendidos),
            condicionais: stats.condicionais().len() as u64,
            arrecadacao: format_brl(stats.total_vendido),
            data_texto: texto_data_cartaz(data),
            dia_semana_texto: texto_dia_semana(data),
            site_texto: SITE_TEXTO.to_string(),
            titulo_direita: TITULO_DIREITA.to_string(),
            subtitulo_direita: subtitulo.to_uppercase(),
            fundo_url: leilao
                .image
                .as_ref()
                .and_then(|i| i.full.as_ref())
                .and_then(|v| v.url.clone()),
            logo_url: principal
                .and_then(|c| c.image.as_ref())
                .and_then(|i| i.thumb.clone()),
        }
    }

    /// Metric rows in display order: label and value text
    pub fn metricas(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LOTES DISPONIBILIZADOS", dois_digitos(self.lotes_disponibilizados)),
            ("LOTES VENDIDOS", dois_digitos(self.lotes_vendidos)),
            ("CONDICIONAIS", dois_digitos(self.condicionais)),
        ]
    }
}

/// An image placed on the card, already fetched
#[derive(Debug, Clone, PartialEq)]
pub struct CardImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Whether the bytes came through the CORS-enabled image proxy.
    /// Reading an uncleared cross-origin image taints the canvas.
    pub cors_cleared: bool,
}

impl CardImage {
    pub fn proxied(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self { bytes, content_type: content_type.into(), cors_cleared: true }
    }

    pub fn cross_origin(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self { bytes, content_type: content_type.into(), cors_cleared: false }
    }
}

/// Hidden, fixed-geometry copy of the card handed to the rasterizer
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    pub card: CartazResumo,
    /// Logical size in CSS pixels
    pub viewport: Viewport,
    pub fundo: Option<CardImage>,
    pub logo: Option<CardImage>,
}

impl RenderTarget {
    pub fn new(card: CartazResumo) -> Self {
        Self { card, viewport: Viewport::default(), fundo: None, logo: None }
    }

    pub fn with_fundo(mut self, image: CardImage) -> Self {
        self.fundo = Some(image);
        self
    }

    pub fn with_logo(mut self, image: CardImage) -> Self {
        self.logo = Some(image);
        self
    }

    pub fn images(&self) -> impl Iterator<Item = &CardImage> {
        self.fundo.iter().chain(self.logo.iter())
    }
}
