//! Read-only client for the Leilões PB auction backend.
//!
//! Every request obtains a fresh bearer token from `POST /api/auth` and
//! sends the browser-like `Origin`/`Referer` pair the backend expects.

use crate::card::{CardImage, CartazResumo, RenderTarget};
use crate::model::{Leilao, LeilaoRelatorioResumo, LeilaoResponse, LeilaoStats};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN, REFERER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ORIGIN: &str = "https://erp.leiloespb.com.br";
pub const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";
const ERROR_BODY_LIMIT: usize = 100;
const TOKEN_FIELDS: [&str; 3] = ["token", "access_token", "accessToken"];

/// Gateway connection settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub user: String,
    pub pass: String,
    /// Sent as `Origin`, and with a trailing slash as `Referer`
    pub origin: String,
    pub timeout: Duration,
    /// Page size for list requests
    pub page_size: u32,
}

impl GatewayConfig {
    pub fn new(base_url: &str, user: impl Into<String>, pass: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid API_BASE_URL '{}': {}", base_url, e)))?;
        Ok(Self {
            base_url,
            user: user.into(),
            pass: pass.into(),
            origin: DEFAULT_ORIGIN.to_string(),
            timeout: Duration::from_secs(30),
            page_size: 20,
        })
    }

    /// Read `API_BASE_URL`, `API_USER`, `API_PASS` and the optional
    /// `API_ORIGIN` and `API_TIMEOUT_MS` from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} is not set", key)))
        };
        let mut cfg = Self::new(&required("API_BASE_URL")?, required("API_USER")?, required("API_PASS")?)?;
        if let Some(origin) = get("API_ORIGIN").filter(|v| !v.is_empty()) {
            cfg.origin = origin;
        }
        if let Some(ms) = get("API_TIMEOUT_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("API_TIMEOUT_MS must be a number of milliseconds, got '{}'", ms)))?;
            cfg.timeout = Duration::from_millis(ms);
        }
        Ok(cfg)
    }

    pub fn referer(&self) -> String {
        format!("{}/", self.origin.trim_end_matches('/'))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", path, e)))
    }
}

/// Query parameters of `GET /api/leiloes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_by: String,
    pub descending: bool,
    pub search: String,
    pub status: Vec<u16>,
}

impl ListQuery {
    /// Upcoming and running auctions, soonest first
    pub fn abertos(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            sort_by: "dataProximoLeilao".into(),
            descending: false,
            search: String::new(),
            status: vec![0, 1, 2, 3, 4],
        }
    }

    /// Closed auctions, most recent first
    pub fn finalizados(limit: u32) -> Self {
        Self { descending: true, status: vec![96, 97, 98, 99], ..Self::abertos(limit) }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let status: Vec<String> = self.status.iter().map(|s| s.to_string()).collect();
        vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.clone()),
            ("descending", self.descending.to_string()),
            ("search", self.search.clone()),
            ("status", status.join(",")),
        ]
    }
}

/// Raw image bytes as served by the origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Exchange the configured credentials for an `Authorization` value
    pub async fn authenticate(&self) -> Result<String> {
        let res = self
            .http
            .post(self.config.endpoint("api/auth")?)
            .header(ACCEPT, "application/json")
            .header(ORIGIN, self.config.origin.as_str())
            .header(REFERER, self.config.referer())
            .form(&[("user", self.config.user.as_str()), ("pass", self.config.pass.as_str())])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Auth(format!("token request returned {}", status.as_u16())));
        }
        let body: serde_json::Value = res.json().await?;
        let token = TOKEN_FIELDS
            .iter()
            .find_map(|k| body.get(*k).and_then(|v| v.as_str()).filter(|t| !t.is_empty()))
            .ok_or_else(|| Error::Auth("no token in auth response".into()))?;
        debug!("obtained token ({} chars)", token.len());
        Ok(format!("Bearer {}", token))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let token = self.authenticate().await?;
        debug!("GET {}", url);
        let res = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, token)
            .header(ORIGIN, self.config.origin.as_str())
            .header(REFERER, self.config.referer())
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Gateway { status: status.as_u16(), body: truncate(&body, ERROR_BODY_LIMIT) });
        }
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<LeilaoResponse> {
        let mut url = self.config.endpoint("api/leiloes")?;
        url.query_pairs_mut().extend_pairs(query.pairs());
        self.get_json(url).await
    }

    pub async fn list_open(&self) -> Result<LeilaoResponse> {
        self.list(&ListQuery::abertos(self.config.page_size)).await
    }

    pub async fn list_finalized(&self) -> Result<LeilaoResponse> {
        self.list(&ListQuery::finalizados(self.config.page_size)).await
    }

    pub async fn get_leilao(&self, id: u64) -> Result<Leilao> {
        self.get_json(self.config.endpoint(&format!("api/leiloes/{}", id))?).await
    }

    pub async fn get_resumo(&self, id: u64) -> Result<LeilaoRelatorioResumo> {
        self.get_json(self.config.endpoint(&format!("api/leiloes/{}/relatorios/resumo", id))?)
            .await
    }

    /// Fetch an image the way the CORS image proxy does
    pub async fn fetch_image(&self, url: &str) -> Result<FetchedImage> {
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Gateway { status: status.as_u16(), body: truncate(&body, ERROR_BODY_LIMIT) });
        }
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_IMAGE_TYPE)
            .to_string();
        let bytes = res.bytes().await?.to_vec();
        Ok(FetchedImage { bytes, content_type })
    }

    async fn proxied(&self, url: Option<&str>) -> Option<CardImage> {
        let url = url?;
        match self.fetch_image(url).await {
            Ok(img) => Some(CardImage::proxied(img.bytes, img.content_type)),
            Err(e) => {
                warn!("card image {} unavailable: {}", url, e);
                None
            }
        }
    }

    /// Build the card for auction `id` with its images fetched through the
    /// proxy. Missing images leave the card without them.
    pub async fn load_render_target(&self, id: u64, agora: NaiveDateTime) -> Result<RenderTarget> {
        let (leilao, resumo) = futures::try_join!(self.get_leilao(id), self.get_resumo(id))?;
        let stats = match resumo.stats() {
            Some(stats) => stats.clone(),
            None => {
                warn!("auction {} has no summary stats", id);
                LeilaoStats::default()
            }
        };
        let card = CartazResumo::from_relatorio(&leilao, &stats, agora);
        let (fundo, logo) = futures::join!(
            self.proxied(card.fundo_url.as_deref()),
            self.proxied(card.logo_url.as_deref())
        );

        let mut target = RenderTarget::new(card);
        target.fundo = fundo;
        target.logo = logo;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn config_from_vars() {
        let cfg = GatewayConfig::from_vars(vars(&[
            ("API_BASE_URL", "https://api.example.com/"),
            ("API_USER", "u"),
            ("API_PASS", "p"),
            ("API_TIMEOUT_MS", "1500"),
        ]))
        .unwrap();
        assert_eq!(cfg.timeout, Duration::from_millis(1500));
        assert_eq!(cfg.origin, DEFAULT_ORIGIN);
        assert_eq!(cfg.referer(), "https://erp.leiloespb.com.br/");
        assert_eq!(cfg.endpoint("api/auth").unwrap().as_str(), "https://api.example.com/api/auth");
    }

    #[test]
    fn config_requires_credentials() {
        let err = GatewayConfig::from_vars(vars(&[("API_BASE_URL", "https://x.test")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("API_USER")));
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let cfg = GatewayConfig::new("http://host/backend", "u", "p").unwrap();
        assert_eq!(cfg.endpoint("api/leiloes/7").unwrap().as_str(), "http://host/backend/api/leiloes/7");
    }

    #[test]
    fn finalized_query_differs_in_order_and_status() {
        let q = ListQuery::finalizados(20);
        let pairs = q.pairs();
        assert!(pairs.contains(&("descending", "true".to_string())));
        assert!(pairs.contains(&("status", "96,97,98,99".to_string())));
        assert_eq!(ListQuery::abertos(20).pairs()[5].1, "0,1,2,3,4");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("leilão", 5), "leilã");
        assert_eq!(truncate(&"x".repeat(300), ERROR_BODY_LIMIT).len(), 100);
    }
}
