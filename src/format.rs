//! Display helpers shared by the CLI and the card view model (pt-BR).

use crate::card::percentual_vendido;
use crate::model::{ApiDate, Leilao, LeilaoStats};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};

const MESES: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

/// Parse a backend date (`YYYY-MM-DD HH:mm:ss.ffffff`, ISO 8601 or a bare date)
pub fn parse_api_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `dd/MM/yyyy HH:mm`, `-` when absent, the raw text when unparseable
pub fn formatar_data(date: Option<&ApiDate>) -> String {
    let Some(raw) = date.and_then(|d| d.date.as_deref()) else {
        return "-".to_string();
    };
    match parse_api_date(raw) {
        Some(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        None => raw.to_string(),
    }
}

pub fn nome_mes(month: u32) -> &'static str {
    MESES[(month.clamp(1, 12) - 1) as usize]
}

pub fn dia_da_semana(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// Card headline date, e.g. `DIA 11 DE FEVEREIRO 2026`
pub fn texto_data_cartaz(date: NaiveDateTime) -> String {
    format!(
        "DIA {} DE {} {}",
        date.day(),
        nome_mes(date.month()).to_uppercase(),
        date.year()
    )
}

/// Card weekday line, e.g. `(QUARTA-FEIRA)`
pub fn texto_dia_semana(date: NaiveDateTime) -> String {
    format!("({})", dia_da_semana(date.weekday()).to_uppercase())
}

/// Brazilian currency, e.g. `R$ 1.262.400,00`
pub fn format_brl(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let inteiro = (cents / 100).to_string();
    let mut agrupado = String::with_capacity(inteiro.len() + inteiro.len() / 3);
    for (i, ch) in inteiro.chars().enumerate() {
        if i > 0 && (inteiro.len() - i) % 3 == 0 {
            agrupado.push('.');
        }
        agrupado.push(ch);
    }
    let sinal = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sinal, agrupado, cents % 100)
}

/// Same as [`format_brl`] for amounts the backend sends as text
pub fn format_brl_text(value: &str) -> String {
    format_brl(value.trim().parse().unwrap_or(0.0))
}

/// Total sold as shown in the summary: the final total once the auction is
/// closed, the running preview otherwise
pub fn total_vendido_texto(stats: &LeilaoStats) -> String {
    if stats.encerrado() {
        format_brl(stats.total_vendido)
    } else {
        format_brl_text(&stats.total_previa_vendas)
    }
}

/// Label and value rows of the summary report. Withdrawn lots are listed
/// only when there are any.
pub fn linhas_resumo(stats: &LeilaoStats) -> Vec<(&'static str, String)> {
    let mut linhas = vec![
        ("Lotes disponíveis", stats.lotes_disponiveis.to_string()),
        ("Vendidos", format!("{} ({}%)", stats.vendidos, percentual_vendido(stats))),
        ("Não vendidos", stats.nao_vendidos.to_string()),
        ("Condicionais", stats.condicionais().len().to_string()),
    ];
    let retirados = stats.lotes_retirados.trim();
    if !retirados.is_empty() && retirados != "0" {
        linhas.push(("Retirados", retirados.to_string()));
    }
    linhas.extend([
        ("Total vendido", total_vendido_texto(stats)),
        ("Comissão", format_brl(stats.total_comissao)),
        ("Taxas", format_brl(stats.total_taxas)),
        ("A receber", format_brl(stats.valor_total_a_receber)),
        ("Lances online/pres", format!("{}/{}", stats.lances_online, stats.lances_presencial)),
    ]);
    linhas
}

/// Cover image: auction min > thumb > full, then the highlighted lot's asset
pub fn pegar_imagem_capa(leilao: &Leilao) -> Option<&str> {
    fn pick(img: Option<&crate::model::ImagemLeilao>) -> Option<&str> {
        let img = img?;
        [&img.min, &img.thumb, &img.full]
            .into_iter()
            .find_map(|v| v.as_ref().and_then(|v| v.url.as_deref()))
    }

    pick(leilao.image.as_ref()).or_else(|| {
        let bem = leilao.stats.as_ref()?.lote.as_ref()?.bem.as_ref()?;
        pick(bem.image.as_ref())
    })
}

/// Pad a counter to at least two digits, as the card metrics show them
pub fn dois_digitos(n: u64) -> String {
    format!("{:02}", n)
}

/// Status label shown in listings
pub fn status_texto(leilao: &Leilao) -> String {
    match (&leilao.status_message, leilao.status) {
        (Some(msg), _) if !msg.trim().is_empty() => msg.clone(),
        (_, Some(code)) => format!("Status: {}", code),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bem, ImageVariant, ImagemLeilao, Lote, StatsResumo};

    fn stats(status: &str, retirados: &str) -> LeilaoStats {
        LeilaoStats {
            lotes_disponiveis: 53.0,
            vendidos: 37.0,
            total_vendido: 1262400.0,
            total_previa_vendas: "980000.5".into(),
            lotes_retirados: retirados.into(),
            status_message: status.into(),
            ..Default::default()
        }
    }

    fn valor<'a>(linhas: &'a [(&'static str, String)], label: &str) -> Option<&'a str> {
        linhas.iter().find(|(l, _)| *l == label).map(|(_, v)| v.as_str())
    }

    #[test]
    fn total_sold_is_final_only_when_closed() {
        assert_eq!(total_vendido_texto(&stats("Encerrado", "0")), "R$ 1.262.400,00");
        assert_eq!(total_vendido_texto(&stats("Em andamento", "0")), "R$ 980.000,50");
        assert_eq!(total_vendido_texto(&stats("", "0")), "R$ 980.000,50");
    }

    #[test]
    fn summary_rows_hide_zero_withdrawn() {
        let linhas = linhas_resumo(&stats("Encerrado", "0"));
        assert_eq!(valor(&linhas, "Retirados"), None);
        assert_eq!(valor(&linhas, "Vendidos"), Some("37 (70%)"));
        assert_eq!(valor(&linhas, "Total vendido"), Some("R$ 1.262.400,00"));

        let linhas = linhas_resumo(&stats("Em andamento", "4"));
        assert_eq!(valor(&linhas, "Retirados"), Some("4"));
        assert_eq!(valor(&linhas, "Total vendido"), Some("R$ 980.000,50"));
        let labels: Vec<_> = linhas.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels[4], "Retirados");
        assert_eq!(labels[5], "Total vendido");
    }

    #[test]
    fn status_label_fallbacks() {
        let mut l = Leilao { status: Some(3), ..Default::default() };
        assert_eq!(status_texto(&l), "Status: 3");
        l.status_message = Some("Em loteamento".into());
        assert_eq!(status_texto(&l), "Em loteamento");
        assert_eq!(status_texto(&Leilao::default()), "-");
    }

    #[test]
    fn formats_backend_dates() {
        let d = ApiDate { date: Some("2026-02-11 09:30:00.000000".into()), ..Default::default() };
        assert_eq!(formatar_data(Some(&d)), "11/02/2026 09:30");
        assert_eq!(formatar_data(None), "-");
        let bad = ApiDate { date: Some("amanhã".into()), ..Default::default() };
        assert_eq!(formatar_data(Some(&bad)), "amanhã");
    }

    #[test]
    fn card_date_texts() {
        let dt = parse_api_date("2026-02-11 09:00:00.000000").unwrap();
        assert_eq!(texto_data_cartaz(dt), "DIA 11 DE FEVEREIRO 2026");
        assert_eq!(texto_dia_semana(dt), "(QUARTA-FEIRA)");
        let sab = parse_api_date("2026-03-07").unwrap();
        assert_eq!(texto_dia_semana(sab), "(SÁBADO)");
        assert_eq!(texto_data_cartaz(sab), "DIA 7 DE MARÇO 2026");
    }

    #[test]
    fn brl_grouping_and_cents() {
        assert_eq!(format_brl(1262400.0), "R$ 1.262.400,00");
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(999.999), "R$ 1.000,00");
        assert_eq!(format_brl(-12.5), "-R$ 12,50");
        assert_eq!(format_brl(f64::NAN), "R$ 0,00");
        assert_eq!(format_brl_text("abc"), "R$ 0,00");
        assert_eq!(format_brl_text("150.25"), "R$ 150,25");
    }

    #[test]
    fn cover_prefers_auction_then_lot_image() {
        let mut l = Leilao::default();
        assert_eq!(pegar_imagem_capa(&l), None);

        l.stats = Some(StatsResumo {
            lances: None,
            lote: Some(Lote {
                numero: Some(1),
                bem: Some(Bem {
                    image: Some(ImagemLeilao {
                        full: Some(ImageVariant { url: Some("bem-full".into()), resolution: None }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
            }),
        });
        assert_eq!(pegar_imagem_capa(&l), Some("bem-full"));

        l.image = Some(ImagemLeilao {
            thumb: Some(ImageVariant { url: Some("thumb".into()), resolution: None }),
            full: Some(ImageVariant { url: Some("full".into()), resolution: None }),
            min: None,
        });
        assert_eq!(pegar_imagem_capa(&l), Some("thumb"));
    }

    #[test]
    fn pads_metrics() {
        assert_eq!(dois_digitos(6), "06");
        assert_eq!(dois_digitos(53), "53");
        assert_eq!(dois_digitos(120), "120");
    }
}
