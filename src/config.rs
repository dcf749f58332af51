//! System configuration: API endpoints, timeouts and operator settings.
//!
//! Constants cover the fixed upstream surface; everything an operator can
//! tune is read from the environment in [`Config::from_env`].

use std::time::Duration;

/// Steam storefront API base URL
pub const STEAM_STORE_API_BASE: &str = "https://store.steampowered.com/api";

/// Steam storefront web base URL (used for user-facing links)
pub const STEAM_STORE_WEB_BASE: &str = "https://store.steampowered.com";

/// ITAD shop id for Steam (filters the deals list to the Steam shop)
pub const ITAD_STEAM_SHOP_ID: u32 = 61;

/// IsThereAnyDeal API base URL
pub const ITAD_API_BASE: &str = "https://api.isthereanydeal.com";

/// Per-request timeout for storefront and catalog calls
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-request timeout for the translation provider
pub const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(15);

/// Home region country code (primary market)
pub const HOME_COUNTRY: &str = "CN";

/// Sentinel value disabling the comparison region
pub const COMPARE_REGION_NONE: &str = "NONE";

/// Max samples retained per title in the price history
pub const HISTORY_CAP: usize = 100;

/// Result limit passed to the catalog title search
pub const CATALOG_SEARCH_LIMIT: u32 = 5;

/// Result limit for the game-search command
pub const GAME_SEARCH_LIMIT: u32 = 8;

/// Operator configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// IsThereAnyDeal API key
    pub itad_api_key: String,
    /// Comparison region country code, or "NONE" to disable
    pub compare_region: String,
    /// Whether the periodic price monitor runs
    pub enable_price_monitor: bool,
    /// Sweep interval in minutes
    pub monitor_interval_mins: u64,
    /// Translation provider endpoint (OpenAI-compatible); empty disables translation
    pub translate_api_base: String,
    /// Translation provider API key
    pub translate_api_key: String,
    /// Translation model name
    pub translate_model: String,
    /// Directory holding the persisted monitor list and price history
    pub data_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            itad_api_key: std::env::var("ITAD_API_KEY").unwrap_or_default(),

            compare_region: std::env::var("STEAM_COMPARE_REGION")
                .map(|v| v.trim().to_uppercase())
                .unwrap_or_else(|_| "UA".to_string()),

            enable_price_monitor: std::env::var("ENABLE_PRICE_MONITOR")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(true),

            monitor_interval_mins: std::env::var("PRICE_MONITOR_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),

            translate_api_base: std::env::var("TRANSLATE_API_BASE").unwrap_or_default(),
            translate_api_key: std::env::var("TRANSLATE_API_KEY").unwrap_or_default(),
            translate_model: std::env::var("TRANSLATE_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),

            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        }
    }

    /// True when the operator disabled the comparison region.
    pub fn compare_disabled(&self) -> bool {
        self.compare_region == COMPARE_REGION_NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_region_sentinel() {
        let mut cfg = Config {
            itad_api_key: String::new(),
            compare_region: "UA".to_string(),
            enable_price_monitor: true,
            monitor_interval_mins: 30,
            translate_api_base: String::new(),
            translate_api_key: String::new(),
            translate_model: String::new(),
            data_dir: "data".to_string(),
        };
        assert!(!cfg.compare_disabled());
        cfg.compare_region = "NONE".to_string();
        assert!(cfg.compare_disabled());
    }
}
