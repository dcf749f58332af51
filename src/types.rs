//! Core type definitions for price lookup, aggregation and monitoring.
//!
//! This module provides the domain types shared across the resolution,
//! aggregation and monitoring subsystems. The Steam AppID (a numeric string)
//! is the primary key everywhere; the ITAD catalog id ("gid") is resolved
//! lazily and may legitimately be absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// === Identity ===

/// A resolved game identity.
///
/// `catalog_id` is the IsThereAnyDeal id, required for historical-low data;
/// a failed catalog lookup is a valid, non-fatal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameIdentity {
    pub appid: String,
    pub canonical_name: String,
    pub catalog_id: Option<String>,
}

// === Quotes and reports ===

/// A price quote scoped to one region.
///
/// `amount == None` means "not available for this region", which is distinct
/// from an amount of zero (free).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub discount_percent: u32,
    pub captured_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn unavailable() -> Self {
        Self {
            amount: None,
            currency: None,
            discount_percent: 0,
            captured_at: Utc::now(),
        }
    }
}

/// Comparison-region side of a report.
#[derive(Debug, Clone)]
pub enum Comparison {
    /// Operator configured the sentinel region "NONE"
    Disabled,
    /// Live quote from the comparison region (amount may still be unknown)
    Quote(PriceQuote),
}

/// Merged price report built per query.
///
/// The historical low is always sourced from the catalog and is never
/// backfilled from the storefront. It is also allowed to exceed the live
/// price: upstream currency/region drift is surfaced, not suppressed.
#[derive(Debug, Clone)]
pub struct PriceReport {
    pub appid: String,
    pub display_name: String,
    pub image_url: Option<String>,
    pub catalog_id: Option<String>,
    /// Set when the catalog has no mapping for this appid; the historical
    /// low is unobtainable and the report carries no price data.
    pub catalog_missing: bool,
    /// Home-region live quote (catalog figure preferred, storefront fallback)
    pub home: PriceQuote,
    /// Historical low in the home region, catalog-authoritative
    pub history_low: Option<f64>,
    /// Regular (undiscounted) price, used as the preferred percent-drop basis
    pub regular_price: Option<f64>,
    pub compare: Comparison,
    pub compare_region: String,
    /// CNY-normalized home amount, None when conversion is impossible
    pub home_cny: Option<f64>,
    /// CNY-normalized comparison amount
    pub compare_cny: Option<f64>,
    /// Steam review score from the catalog, e.g. "92%"
    pub review_score: Option<String>,
}

impl PriceReport {
    /// Empty report for an appid whose catalog mapping is missing.
    pub fn no_catalog_mapping(appid: &str, display_name: &str, image_url: Option<String>) -> Self {
        Self {
            appid: appid.to_string(),
            display_name: display_name.to_string(),
            image_url,
            catalog_id: None,
            catalog_missing: true,
            home: PriceQuote::unavailable(),
            history_low: None,
            regular_price: None,
            compare: Comparison::Disabled,
            compare_region: String::new(),
            home_cny: None,
            compare_cny: None,
            review_score: None,
        }
    }
}

// === Monitoring ===

/// One monitored title. Created on first subscription, deleted when the last
/// subscriber leaves. `last_price == None` means no baseline has been
/// recorded yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEntry {
    pub name: String,
    /// Opaque origin strings; insertion order irrelevant, duplicates rejected
    pub subscribers: Vec<String>,
    pub last_price: Option<f64>,
    pub last_original_price: Option<f64>,
    pub last_discount: Option<u32>,
}

impl MonitorEntry {
    pub fn new(name: &str, origin: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: vec![origin.to_string()],
            last_price: None,
            last_original_price: None,
            last_discount: None,
        }
    }
}

/// Single-region price snapshot used by the monitor sweep.
///
/// Free titles report `is_free = true` with price 0, discount 100 and the
/// "FREE" currency marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorPrice {
    pub is_free: bool,
    pub current_price: f64,
    pub original_price: f64,
    pub discount: u32,
    pub currency: String,
    pub name: String,
}

// === Price history ===

/// One price observation, appended on every successful price query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistorySample {
    pub timestamp: DateTime<Utc>,
    pub current_price: f64,
    pub currency: String,
    pub lowest_price: Option<f64>,
    pub cny_price: Option<f64>,
}

// === Error taxonomy ===

/// Resolution cascade exhausted; user-facing, no retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("game not found")]
    NotFound,
}

/// Chart production failures. `Unavailable` is a feature toggle, not an
/// error condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("not enough samples in the requested window")]
    InsufficientData,
    #[error("chart rendering is not available")]
    Unavailable,
    #[error("chart rendering failed: {0}")]
    Render(String),
}
