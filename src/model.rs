//! Auction records as returned by the backend gateway.
//!
//! The backend is loose with types: counters sometimes arrive as numbers and
//! sometimes as numeric strings, and most fields may be absent or `null`.
//! Everything here is therefore optional or defaulted.

use serde::{Deserialize, Deserializer, Serialize};

/// Date wrapper used by the backend (`{"date": "2026-02-11 09:00:00.000000", ...}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDate {
    pub date: Option<String>,
    pub timezone: Option<String>,
    #[serde(rename = "timezone_type")]
    pub timezone_type: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageVariant {
    pub url: Option<String>,
    pub resolution: Option<Resolution>,
}

/// Cover image variants of an auction (or of a lot's asset)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagemLeilao {
    pub full: Option<ImageVariant>,
    pub thumb: Option<ImageVariant>,
    pub min: Option<ImageVariant>,
}

/// Consignor logo, given as plain URLs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagemComitente {
    pub thumb: Option<String>,
    pub full: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pessoa {
    pub id: i64,
    pub name: Option<String>,
}

/// Consignor ("comitente") attached to an auction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comitente {
    pub id: i64,
    pub apelido: Option<String>,
    pub pessoa: Option<Pessoa>,
    pub image: Option<ImagemComitente>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bem {
    pub site_titulo: Option<String>,
    pub cidade: Option<String>,
    pub uf: Option<String>,
    pub image: Option<ImagemLeilao>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lote {
    pub numero: Option<i64>,
    pub bem: Option<Bem>,
}

/// Highlight stats embedded in list entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResumo {
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub lances: Option<f64>,
    pub lote: Option<Lote>,
}

/// A single auction event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leilao {
    pub id: i64,
    pub slug: Option<String>,
    pub codigo: Option<String>,
    pub numero: Option<i64>,
    pub ano: Option<i32>,
    pub titulo: Option<String>,
    pub descricao_interna: Option<String>,
    pub destaque: Option<bool>,

    pub total_lotes: Option<i64>,
    pub status: Option<i32>,
    pub status_message: Option<String>,

    pub data_proximo_leilao: Option<ApiDate>,
    pub data_abertura: Option<ApiDate>,
    pub data1: Option<ApiDate>,

    pub image: Option<ImagemLeilao>,
    pub comitentes: Option<Vec<Comitente>>,

    pub habilitados: Option<i64>,
    pub stats_visitas: Option<i64>,
    pub stats: Option<StatsResumo>,

    pub timezone: Option<String>,
    pub venda_direta: Option<bool>,

    // Detail-only fields with shapes the backend does not pin down
    pub leiloeiro: Option<serde_json::Value>,
    pub classificacao: Option<serde_json::Value>,
    pub sistema_taxa: Option<serde_json::Value>,
}

impl Leilao {
    /// First consignor, which drives the card subtitle and logo
    pub fn comitente_principal(&self) -> Option<&Comitente> {
        self.comitentes.as_ref().and_then(|c| c.first())
    }
}

/// List payload: auctions happening today plus the requested page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeilaoResponse {
    #[serde(default)]
    pub hoje: Vec<Leilao>,
    #[serde(default)]
    pub result: Vec<Leilao>,
}

/// Financial and lot report of one auction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeilaoStats {
    #[serde(deserialize_with = "lenient_f64")]
    pub lotes_disponiveis: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub vendidos: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub nao_vendidos: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lances_online: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lances_presencial: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub vendas_online: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub vendas_presencial: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_vendido: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_comissao: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_taxas: f64,
    #[serde(rename = "valorTotalAReceber", deserialize_with = "lenient_f64")]
    pub valor_total_a_receber: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub valor_total_recebido: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub saldo: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lotes_vendidos: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lotes_nao_vendidos: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lotes_condicionais: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lotes_retirados: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_previa_vendas: String,
    #[serde(deserialize_with = "lenient_string")]
    pub status_message: String,
}

impl LeilaoStats {
    /// Lots sold under condition, parsed from the comma separated list
    pub fn condicionais(&self) -> Vec<&str> {
        self.lotes_condicionais
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Number of withdrawn lots (the backend sends it as text)
    pub fn retirados(&self) -> u32 {
        self.lotes_retirados.trim().parse().unwrap_or(0)
    }

    /// Whether the auction is closed and totals are final
    pub fn encerrado(&self) -> bool {
        self.status_message == "Encerrado"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatorioData {
    pub stats: Option<LeilaoStats>,
}

/// Envelope of the summary report endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeilaoRelatorioResumo {
    pub data: Option<RelatorioData>,
}

impl LeilaoRelatorioResumo {
    pub fn stats(&self) -> Option<&LeilaoStats> {
        self.data.as_ref().and_then(|d| d.stats.as_ref())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(f64),
    Text(String),
    Bool(bool),
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumOrText>::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumOrText::Num(n)) => Some(n),
        Some(NumOrText::Text(s)) => s.trim().replace(',', ".").parse().ok(),
        Some(NumOrText::Bool(_)) | None => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_f64(deserializer)?.unwrap_or(0.0))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumOrText>::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumOrText::Text(s)) => s,
        Some(NumOrText::Num(n)) if n.fract() == 0.0 => format!("{}", n as i64),
        Some(NumOrText::Num(n)) => n.to_string(),
        Some(NumOrText::Bool(b)) => b.to_string(),
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_accept_numbers_and_numeric_strings() {
        let json = r#"{
            "data": { "stats": {
                "lotesDisponiveis": "53", "vendidos": 37, "naoVendidos": 16,
                "totalVendido": "1262400.50", "lotesCondicionais": "4, 9, 12",
                "lotesRetirados": 2, "statusMessage": "Encerrado", "saldo": null
            } }
        }"#;
        let resumo: LeilaoRelatorioResumo = serde_json::from_str(json).unwrap();
        let stats = resumo.stats().unwrap();
        assert_eq!(stats.lotes_disponiveis, 53.0);
        assert_eq!(stats.vendidos, 37.0);
        assert_eq!(stats.total_vendido, 1262400.5);
        assert_eq!(stats.condicionais(), vec!["4", "9", "12"]);
        assert_eq!(stats.retirados(), 2);
        assert_eq!(stats.saldo, "");
        assert!(stats.encerrado());
    }

    #[test]
    fn list_payload_tolerates_missing_fields() {
        let json = r#"{ "result": [ { "id": 7, "titulo": "Veículos", "comitentes": [
            { "id": 1, "apelido": "Tokio Marine", "image": { "thumb": "https://x/logo.png" } }
        ], "dataProximoLeilao": { "date": "2026-02-11 09:00:00.000000", "timezone_type": 3 } } ] }"#;
        let res: LeilaoResponse = serde_json::from_str(json).unwrap();
        assert!(res.hoje.is_empty());
        let l = &res.result[0];
        assert_eq!(l.id, 7);
        assert_eq!(l.comitente_principal().unwrap().apelido.as_deref(), Some("Tokio Marine"));
        assert_eq!(l.data_proximo_leilao.as_ref().unwrap().timezone_type, Some(3));
    }

    #[test]
    fn empty_conditional_list_has_no_entries() {
        let stats = LeilaoStats::default();
        assert!(stats.condicionais().is_empty());
        assert_eq!(stats.retirados(), 0);
    }
}
