//! IsThereAnyDeal (ITAD) catalog client.
//!
//! The catalog is the authority for historical-low prices. Its stable game
//! id ("gid") is distinct from the Steam AppID and must be resolved through
//! `lookup` before any price data can be fetched. As with the storefront
//! client, every call degrades to an empty result on failure.

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{HTTP_TIMEOUT, ITAD_API_BASE, ITAD_STEAM_SHOP_ID};

// === Wire types ===

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CatalogAssets {
    pub banner145: Option<String>,
    pub boxart: Option<String>,
    pub banner300: Option<String>,
    pub banner400: Option<String>,
    pub banner600: Option<String>,
}

impl CatalogAssets {
    /// Smallest available art first; the chat surface favors small images.
    pub fn smallest(&self) -> Option<&str> {
        self.banner145
            .as_deref()
            .or(self.boxart.as_deref())
            .or(self.banner300.as_deref())
            .or(self.banner400.as_deref())
            .or(self.banner600.as_deref())
    }
}

/// One hit from the catalog title search.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogHit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub assets: CatalogAssets,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    found: bool,
    game: Option<LookupGame>,
}

#[derive(Deserialize)]
struct LookupGame {
    id: String,
}

#[derive(Deserialize)]
struct PricesEntry {
    #[serde(default)]
    deals: Vec<Deal>,
    #[serde(rename = "historyLow", default)]
    history_low: HistoryLow,
}

#[derive(Deserialize)]
struct Deal {
    shop: Shop,
    price: Option<Amount>,
    regular: Option<Amount>,
}

#[derive(Deserialize)]
struct Shop {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct Amount {
    amount: f64,
    currency: Option<String>,
}

#[derive(Deserialize, Default)]
struct HistoryLow {
    m3: Option<Amount>,
    y1: Option<Amount>,
    all: Option<Amount>,
}

#[derive(Deserialize)]
struct InfoResponse {
    title: Option<String>,
    #[serde(default)]
    reviews: Vec<Review>,
}

#[derive(Deserialize)]
struct Review {
    #[serde(default)]
    source: String,
    score: Option<f64>,
}

// === Normalized results ===

/// Steam-shop price data plus the catalog's historical low for one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPrices {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub regular: Option<f64>,
    /// Narrowest available low window wins: 3-month, then 1-year, then all-time
    pub history_low: Option<f64>,
}

/// Catalog metadata used to enrich reports.
#[derive(Debug, Clone, Default)]
pub struct CatalogInfo {
    pub title: Option<String>,
    /// Steam review score rendered as "NN%"
    pub steam_review: Option<String>,
}

// === Client ===

pub struct ItadClient {
    http: reqwest::Client,
    api_key: String,
}

impl ItadClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_key: api_key.to_string(),
        }
    }

    /// Title search; returns the ranked hit list (may be empty).
    pub async fn search(&self, title: &str, limit: u32) -> Vec<CatalogHit> {
        let url = format!("{}/games/search/v1", ITAD_API_BASE);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("title", title),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!("[ITAD] search request failed for '{}': {}", title, e);
                return vec![];
            }
        };

        match resp.json::<Vec<CatalogHit>>().await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("[ITAD] search parse failed for '{}': {}", title, e);
                vec![]
            }
        }
    }

    /// Resolve a Steam AppID to the catalog's gid. `None` when unmapped.
    pub async fn lookup(&self, appid: &str) -> Option<String> {
        let url = format!("{}/games/lookup/v1", ITAD_API_BASE);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("appid", appid)])
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!("[ITAD] lookup request failed for {}: {}", appid, e);
                return None;
            }
        };

        let body: LookupResponse = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[ITAD] lookup parse failed for {}: {}", appid, e);
                return None;
            }
        };

        if !body.found {
            info!("[ITAD] no catalog mapping for appid {}", appid);
            return None;
        }
        body.game.map(|g| g.id)
    }

    /// Steam-shop price and historical low for `gid` in `country`.
    pub async fn prices(&self, gid: &str, country: &str) -> Option<CatalogPrices> {
        let url = format!("{}/games/prices/v3", ITAD_API_BASE);
        let resp = self
            .http
            .post(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("country", country),
                ("shops", &ITAD_STEAM_SHOP_ID.to_string()),
            ])
            .json(&[gid])
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!("[ITAD] prices request failed for {}: {}", gid, e);
                return None;
            }
        };

        let body: Vec<PricesEntry> = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[ITAD] prices parse failed for {}: {}", gid, e);
                return None;
            }
        };

        let entry = match body.into_iter().next() {
            Some(e) if !e.deals.is_empty() => e,
            _ => {
                info!("[ITAD] no price data for {} in {}", gid, country);
                return None;
            }
        };

        let mut out = CatalogPrices::default();
        for deal in &entry.deals {
            if deal.shop.name.to_lowercase() == "steam" {
                if let Some(p) = &deal.price {
                    out.price = Some(p.amount);
                    out.currency = p.currency.clone();
                }
                out.regular = deal.regular.as_ref().map(|r| r.amount);
                break;
            }
        }
        out.history_low = [
            &entry.history_low.m3,
            &entry.history_low.y1,
            &entry.history_low.all,
        ]
        .iter()
        .find_map(|w| w.as_ref().map(|a| a.amount));

        Some(out)
    }

    /// Catalog metadata (title, Steam review score). Best-effort enrichment.
    pub async fn game_info(&self, gid: &str) -> Option<CatalogInfo> {
        let url = format!("{}/games/info/v2", ITAD_API_BASE);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("id", gid)])
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!("[ITAD] info request failed for {}: {}", gid, e);
                return None;
            }
        };

        let body: InfoResponse = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[ITAD] info parse failed for {}: {}", gid, e);
                return None;
            }
        };

        let steam_review = body
            .reviews
            .iter()
            .find(|r| r.source == "Steam")
            .and_then(|r| r.score)
            .map(|s| format!("{:.0}%", s));

        Some(CatalogInfo {
            title: body.title,
            steam_review,
        })
    }
}
