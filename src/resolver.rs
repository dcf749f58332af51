//! Game resolution: free-form text or store link -> Steam AppID.
//!
//! A single ordered cascade shared by every command. Store links and bare
//! AppIDs short-circuit without any network call; everything else walks the
//! search steps in a fixed order, stopping at the first hit. Each step is
//! best-effort with its own timeout; nothing is cached between calls.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::CATALOG_SEARCH_LIMIT;
use crate::itad::{CatalogHit, ItadClient};
use crate::steam::{SearchHit, SteamClient};
use crate::translate::Translator;
use crate::types::ResolveError;

const STORE_APP_PATH: &str = "store.steampowered.com/app/";

/// Extract a Steam AppID from any string containing a store app link.
pub fn extract_appid_from_url(input: &str) -> Option<String> {
    let start = input.find(STORE_APP_PATH)? + STORE_APP_PATH.len();
    let digits: String = input[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// CJK heuristic: any code point in the CJK Unified Ideographs block.
pub fn contains_cjk(s: &str) -> bool {
    s.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// Storefront search step of the cascade. Split out so the cascade can be
/// driven in tests without a live storefront.
#[async_trait]
pub trait StorefrontSearch: Send + Sync {
    async fn store_search(&self, term: &str, lang: &str, cc: &str) -> Vec<SearchHit>;
}

#[async_trait]
impl StorefrontSearch for SteamClient {
    async fn store_search(&self, term: &str, lang: &str, cc: &str) -> Vec<SearchHit> {
        SteamClient::store_search(self, term, lang, cc).await
    }
}

/// Catalog search step of the cascade.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(&self, title: &str, limit: u32) -> Vec<CatalogHit>;
}

#[async_trait]
impl CatalogSearch for ItadClient {
    async fn search(&self, title: &str, limit: u32) -> Vec<CatalogHit> {
        ItadClient::search(self, title, limit).await
    }
}

/// Successful resolution. The name is carried along when a search step
/// produced one; link and AppID inputs resolve without a name.
#[derive(Debug, Clone)]
pub struct ResolvedGame {
    pub appid: String,
    pub name: Option<String>,
}

pub struct GameResolver {
    steam: Arc<dyn StorefrontSearch>,
    itad: Arc<dyn CatalogSearch>,
    translator: Option<Arc<dyn Translator>>,
}

impl GameResolver {
    pub fn new(
        steam: Arc<dyn StorefrontSearch>,
        itad: Arc<dyn CatalogSearch>,
        translator: Option<Arc<dyn Translator>>,
    ) -> Self {
        Self {
            steam,
            itad,
            translator,
        }
    }

    /// Resolve free-form input to an AppID, or `NotFound` once the cascade
    /// is exhausted. Callers turn `NotFound` into a plain-language message.
    pub async fn resolve(&self, input: &str) -> Result<ResolvedGame, ResolveError> {
        let input = input.trim();

        // Store links always short-circuit the cascade.
        if let Some(appid) = extract_appid_from_url(input) {
            info!("[RESOLVE] store link -> appid {}", appid);
            return Ok(ResolvedGame { appid, name: None });
        }

        // Bare AppIDs are accepted as-is.
        if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
            return Ok(ResolvedGame {
                appid: input.to_string(),
                name: None,
            });
        }

        let is_chinese = contains_cjk(input);

        // Translation failure is non-fatal: fall through with the raw text.
        let term = if is_chinese {
            match &self.translator {
                Some(t) => t.translate_title(input).await.unwrap_or_else(|| {
                    warn!("[RESOLVE] translation failed, searching with raw input");
                    input.to_string()
                }),
                None => input.to_string(),
            }
        } else {
            input.to_string()
        };

        // (a) storefront search, English locale
        if let Some(hit) = self.steam.store_search(&term, "english", "US").await.first() {
            info!("[RESOLVE] storefront(en) '{}' -> {} ({})", term, hit.appid, hit.name);
            return Ok(ResolvedGame {
                appid: hit.appid.clone(),
                name: Some(hit.name.clone()),
            });
        }

        // (b) storefront search, Chinese locale, only for CJK input
        if is_chinese {
            if let Some(hit) = self.steam.store_search(input, "schinese", "CN").await.first() {
                info!("[RESOLVE] storefront(zh) '{}' -> {} ({})", input, hit.appid, hit.name);
                return Ok(ResolvedGame {
                    appid: hit.appid.clone(),
                    name: Some(hit.name.clone()),
                });
            }
        }

        // (c) catalog title search; the AppID hides inside the hit's urls
        for hit in self.itad.search(&term, CATALOG_SEARCH_LIMIT).await {
            if let Some(appid) = hit.urls.iter().find_map(|u| extract_appid_from_url(u)) {
                info!("[RESOLVE] catalog '{}' -> {} ({})", term, appid, hit.title);
                return Ok(ResolvedGame {
                    appid,
                    name: Some(hit.title),
                });
            }
        }

        // (d) last resort: English storefront search with the untranslated text
        if term != input {
            if let Some(hit) = self.steam.store_search(input, "english", "US").await.first() {
                info!("[RESOLVE] storefront(raw) '{}' -> {} ({})", input, hit.appid, hit.name);
                return Ok(ResolvedGame {
                    appid: hit.appid.clone(),
                    name: Some(hit.name.clone()),
                });
            }
        }

        info!("[RESOLVE] cascade exhausted for '{}'", input);
        Err(ResolveError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_appid_from_store_links() {
        assert_eq!(
            extract_appid_from_url("https://store.steampowered.com/app/1091500"),
            Some("1091500".to_string())
        );
        assert_eq!(
            extract_appid_from_url("https://store.steampowered.com/app/1091500/Cyberpunk_2077/"),
            Some("1091500".to_string())
        );
        assert_eq!(extract_appid_from_url("https://example.com/app/123"), None);
        assert_eq!(
            extract_appid_from_url("https://store.steampowered.com/app/"),
            None
        );
    }

    #[test]
    fn cjk_detection() {
        assert!(contains_cjk("赛博朋克2077"));
        assert!(contains_cjk("Cyberpunk 赛博"));
        assert!(!contains_cjk("Cyberpunk 2077"));
        assert!(!contains_cjk(""));
    }

    #[tokio::test]
    async fn store_link_short_circuits_without_network() {
        // No API keys, no reachable upstream: a link input must still resolve.
        let resolver = GameResolver::new(
            Arc::new(SteamClient::new()),
            Arc::new(ItadClient::new("")),
            None,
        );
        let resolved = resolver
            .resolve("https://store.steampowered.com/app/1091500?utm_source=x")
            .await
            .unwrap();
        assert_eq!(resolved.appid, "1091500");
    }

    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Search source that never finds anything, counting the calls made.
    #[derive(Default)]
    struct EmptySearch {
        storefront_calls: AtomicUsize,
        catalog_calls: AtomicUsize,
    }

    #[async_trait]
    impl StorefrontSearch for EmptySearch {
        async fn store_search(&self, _term: &str, _lang: &str, _cc: &str) -> Vec<SearchHit> {
            self.storefront_calls.fetch_add(1, Ordering::SeqCst);
            vec![]
        }
    }

    #[async_trait]
    impl CatalogSearch for EmptySearch {
        async fn search(&self, _title: &str, _limit: u32) -> Vec<CatalogHit> {
            self.catalog_calls.fetch_add(1, Ordering::SeqCst);
            vec![]
        }
    }

    #[tokio::test]
    async fn exhausted_cascade_is_not_found() {
        let search = Arc::new(EmptySearch::default());
        let resolver = GameResolver::new(search.clone(), search.clone(), None);

        let result = resolver.resolve("some unknown indie game").await;
        assert_eq!(result.unwrap_err(), ResolveError::NotFound);

        // non-CJK input without a translation: exactly one storefront
        // search and one catalog search, nothing more
        assert_eq!(search.storefront_calls.load(Ordering::SeqCst), 1);
        assert_eq!(search.catalog_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cjk_input_walks_both_storefront_locales() {
        let search = Arc::new(EmptySearch::default());
        let resolver = GameResolver::new(search.clone(), search.clone(), None);

        let result = resolver.resolve("赛博朋克2077").await;
        assert_eq!(result.unwrap_err(), ResolveError::NotFound);

        // English then Chinese storefront search, then the catalog; the raw
        // retry is skipped because no translation changed the term
        assert_eq!(search.storefront_calls.load(Ordering::SeqCst), 2);
        assert_eq!(search.catalog_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bare_appid_resolves_directly() {
        let resolver = GameResolver::new(
            Arc::new(SteamClient::new()),
            Arc::new(ItadClient::new("")),
            None,
        );
        let resolved = resolver.resolve("1091500").await.unwrap();
        assert_eq!(resolved.appid, "1091500");
        assert!(resolved.name.is_none());
    }
}
