//! Steam storefront API client.
//!
//! Wraps the two public storefront endpoints used by the bot: `appdetails`
//! (per-title detail with an optional `price_overview`) and `storesearch`
//! (ranked free-text search). Every call is best-effort: transport, status
//! and parse failures are logged and downgraded to an empty result at the
//! call site, never propagated.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{HTTP_TIMEOUT, STEAM_STORE_API_BASE};
use crate::types::MonitorPrice;

// === Wire types ===

#[derive(Deserialize)]
struct DetailsEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<DetailsData>,
}

#[derive(Deserialize)]
struct DetailsData {
    name: Option<String>,
    header_image: Option<String>,
    #[serde(default)]
    is_free: bool,
    price_overview: Option<PriceOverview>,
}

#[derive(Deserialize)]
struct PriceOverview {
    /// Current price in integer cents
    #[serde(rename = "final")]
    final_cents: i64,
    /// Undiscounted price in integer cents
    #[serde(default)]
    initial: i64,
    #[serde(default)]
    discount_percent: u32,
    currency: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u32,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: u64,
    name: String,
}

// === Normalized results ===

/// Live storefront price, cents already converted to major units.
#[derive(Debug, Clone, PartialEq)]
pub struct StorePrice {
    pub amount: f64,
    pub initial: f64,
    pub discount_percent: u32,
    pub currency: String,
}

/// Storefront detail for one title in one region.
///
/// A missing `price` on a non-free title means "not for sale in this
/// region", which is a valid state rather than an error.
#[derive(Debug, Clone)]
pub struct AppDetails {
    pub name: Option<String>,
    pub header_image: Option<String>,
    pub is_free: bool,
    pub price: Option<StorePrice>,
}

/// One ranked search hit; the first hit is always taken as the match.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub appid: String,
    pub name: String,
}

// === Client ===

pub struct SteamClient {
    http: reqwest::Client,
}

impl SteamClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Fetch storefront detail for `appid` in the given region and locale.
    pub async fn app_details(&self, appid: &str, cc: &str, lang: &str) -> Option<AppDetails> {
        let url = format!("{}/appdetails", STEAM_STORE_API_BASE);
        let resp = self
            .http
            .get(&url)
            .query(&[("appids", appid), ("cc", cc), ("l", lang)])
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!("[STEAM] appdetails request failed for {}: {}", appid, e);
                return None;
            }
        };

        let body: HashMap<String, DetailsEnvelope> = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[STEAM] appdetails parse failed for {}: {}", appid, e);
                return None;
            }
        };

        let envelope = body.get(appid)?;
        if !envelope.success {
            info!("[STEAM] appdetails reported failure for {} ({})", appid, cc);
            return None;
        }
        let data = envelope.data.as_ref()?;

        Some(AppDetails {
            name: data.name.clone(),
            header_image: data.header_image.clone(),
            is_free: data.is_free,
            price: data.price_overview.as_ref().map(|p| StorePrice {
                amount: p.final_cents as f64 / 100.0,
                initial: p.initial as f64 / 100.0,
                discount_percent: p.discount_percent,
                currency: p.currency.clone(),
            }),
        })
    }

    /// Free-text storefront search; returns the ranked hit list (may be empty).
    pub async fn store_search(&self, term: &str, lang: &str, cc: &str) -> Vec<SearchHit> {
        let url = format!("{}/storesearch/", STEAM_STORE_API_BASE);
        let resp = self
            .http
            .get(&url)
            .query(&[("term", term), ("l", lang), ("cc", cc)])
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!("[STEAM] storesearch request failed for '{}': {}", term, e);
                return vec![];
            }
        };

        let body: SearchResponse = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[STEAM] storesearch parse failed for '{}': {}", term, e);
                return vec![];
            }
        };

        if body.total == 0 {
            return vec![];
        }
        body.items
            .into_iter()
            .map(|item| SearchHit {
                appid: item.id.to_string(),
                name: item.name,
            })
            .collect()
    }

    /// Single home-region fetch used by the monitor sweep.
    ///
    /// Free titles come back as the distinguished free snapshot (price 0,
    /// discount 100, currency "FREE"); a missing `price_overview` on a paid
    /// title yields `None`.
    pub async fn monitor_price(&self, appid: &str) -> Option<MonitorPrice> {
        let details = self.app_details(appid, "cn", "zh-cn").await?;
        let name = details
            .name
            .clone()
            .unwrap_or_else(|| format!("AppID: {}", appid));

        if details.is_free {
            return Some(MonitorPrice {
                is_free: true,
                current_price: 0.0,
                original_price: 0.0,
                discount: 100,
                currency: "FREE".to_string(),
                name,
            });
        }

        let price = match details.price {
            Some(p) => p,
            None => {
                info!("[STEAM] no price info for monitored title {}", appid);
                return None;
            }
        };

        Some(MonitorPrice {
            is_free: false,
            current_price: price.amount,
            original_price: price.initial,
            discount: price.discount_percent,
            currency: price.currency,
            name,
        })
    }

    /// Prefer the small capsule variant of a header image when it exists.
    pub async fn capsule_image(&self, header_image: &str) -> String {
        let capsule = header_image.replace("_header.jpg", "_capsule_184x69.jpg");
        if capsule == header_image {
            return header_image.to_string();
        }
        match self
            .http
            .get(&capsule)
            .timeout(Duration::from_secs(8))
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => capsule,
            _ => header_image.to_string(),
        }
    }
}

impl Default for SteamClient {
    fn default() -> Self {
        Self::new()
    }
}
