//! Price aggregation: concurrent multi-source fetch and reconciliation.
//!
//! Three independent fetches run concurrently (home-region storefront
//! detail, catalog lookup, comparison-region detail) so perceived latency is
//! bounded by the slowest call rather than their sum. The catalog prices
//! call follows sequentially because it needs the gid from the lookup.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join3;
use tracing::info;

use crate::config::{Config, HOME_COUNTRY};
use crate::itad::{CatalogPrices, ItadClient};
use crate::steam::{AppDetails, SteamClient};
use crate::types::{Comparison, PriceQuote, PriceReport};
use crate::currency::to_cny;

pub struct PriceAggregator {
    steam: Arc<SteamClient>,
    itad: Arc<ItadClient>,
    compare_region: String,
    compare_disabled: bool,
}

impl PriceAggregator {
    pub fn new(steam: Arc<SteamClient>, itad: Arc<ItadClient>, cfg: &Config) -> Self {
        Self {
            steam,
            itad,
            compare_region: cfg.compare_region.clone(),
            compare_disabled: cfg.compare_disabled(),
        }
    }

    /// Build a merged price report for `appid`.
    ///
    /// A missing catalog mapping is a hard stop: the historical low cannot
    /// be obtained without the gid, so the report comes back flagged instead
    /// of partially filled.
    pub async fn aggregate(&self, appid: &str) -> PriceReport {
        let (detail, gid, compare) = join3(
            self.steam.app_details(appid, "cn", "schinese"),
            self.itad.lookup(appid),
            self.fetch_compare(appid),
        )
        .await;

        let prices = match &gid {
            Some(gid) => self.itad.prices(gid, HOME_COUNTRY).await,
            None => None,
        };

        let mut report = merge_report(
            appid,
            detail,
            gid,
            compare,
            prices,
            &self.compare_region,
        );

        if report.catalog_missing {
            return report;
        }

        // Best-effort enrichment: review score, small capsule image.
        if let Some(gid) = &report.catalog_id {
            if let Some(info) = self.itad.game_info(gid).await {
                if report.display_name.is_empty() {
                    if let Some(title) = info.title {
                        report.display_name = title;
                    }
                }
                report.review_score = info.steam_review;
            }
        }
        if let Some(header) = report.image_url.clone() {
            report.image_url = Some(self.steam.capsule_image(&header).await);
        }

        info!(
            "[AGGREGATE] {} home={:?} low={:?} compare={}",
            appid,
            report.home.amount,
            report.history_low,
            match &report.compare {
                Comparison::Disabled => "disabled".to_string(),
                Comparison::Quote(q) => format!("{:?}", q.amount),
            }
        );
        report
    }

    /// Comparison-region fetch; skipped entirely under the "NONE" sentinel.
    async fn fetch_compare(&self, appid: &str) -> Comparison {
        if self.compare_disabled {
            return Comparison::Disabled;
        }
        let cc = self.compare_region.to_lowercase();
        let quote = match self.steam.app_details(appid, &cc, "en").await {
            Some(AppDetails {
                price: Some(p), ..
            }) => PriceQuote {
                amount: Some(p.amount),
                currency: Some(p.currency),
                discount_percent: p.discount_percent,
                captured_at: Utc::now(),
            },
            _ => PriceQuote::unavailable(),
        };
        Comparison::Quote(quote)
    }
}

/// Pure merge of the fetched pieces into one report.
///
/// Reconciliation policy:
/// - live home price: catalog figure preferred, storefront detail as fallback;
/// - historical low: catalog only, never backfilled from the storefront;
/// - home discount: the storefront's own discount field when > 0;
/// - CNY normalization of both regions where currency and amount are known.
pub fn merge_report(
    appid: &str,
    detail: Option<AppDetails>,
    gid: Option<String>,
    compare: Comparison,
    prices: Option<CatalogPrices>,
    compare_region: &str,
) -> PriceReport {
    let display_name = detail
        .as_ref()
        .and_then(|d| d.name.clone())
        .unwrap_or_default();
    let image_url = detail.as_ref().and_then(|d| d.header_image.clone());

    let gid = match gid {
        Some(g) => g,
        None => {
            return PriceReport::no_catalog_mapping(appid, &display_name, image_url);
        }
    };

    let store_price = detail.as_ref().and_then(|d| d.price.as_ref());
    let catalog = prices.unwrap_or_default();

    // Catalog is preferred for the live figure; the storefront fills in only
    // when the catalog has none.
    let (amount, currency) = match (&catalog.price, &catalog.currency) {
        (Some(p), c) => (Some(*p), c.clone()),
        _ => (
            store_price.map(|p| p.amount),
            store_price.map(|p| p.currency.clone()),
        ),
    };

    let home = PriceQuote {
        amount,
        currency,
        discount_percent: store_price
            .map(|p| p.discount_percent)
            .filter(|d| *d > 0)
            .unwrap_or(0),
        captured_at: Utc::now(),
    };

    let home_cny = to_cny(home.amount, home.currency.as_deref());
    let compare_cny = match &compare {
        Comparison::Quote(q) => to_cny(q.amount, q.currency.as_deref()),
        Comparison::Disabled => None,
    };

    PriceReport {
        appid: appid.to_string(),
        display_name,
        image_url,
        catalog_id: Some(gid),
        catalog_missing: false,
        home,
        history_low: catalog.history_low,
        regular_price: catalog.regular,
        compare,
        compare_region: compare_region.to_string(),
        home_cny,
        compare_cny,
        review_score: None,
    }
}
