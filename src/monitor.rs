//! Durable subscription store for price monitoring.
//!
//! One mutex guards the whole collection and is held across the full
//! load-mutate-persist unit, so concurrent subscribe/unsubscribe/sweep
//! updates cannot interleave and lose writes. Every mutation rewrites the
//! persisted JSON document in full before returning.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::types::{MonitorEntry, MonitorPrice};

#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeOutcome {
    Subscribed,
    /// Re-subscribing the same origin is a no-op, reported back to the user
    AlreadySubscribed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnsubscribeOutcome {
    Removed { name: String },
    NotSubscribed { name: String },
    NoMatch,
    /// Multiple titles matched; the store refuses to act and returns the
    /// candidates so the caller can follow up with an ordinal index.
    Ambiguous(Vec<(String, String)>),
    InvalidIndex { count: usize },
}

struct Inner {
    entries: FxHashMap<String, MonitorEntry>,
    /// Ambiguous candidate lists awaiting an ordinal follow-up, per origin
    pending: FxHashMap<String, Vec<(String, String)>>,
}

pub struct MonitorStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl MonitorStore {
    /// Load the persisted mapping, or create an empty document.
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("create data directory")?;
        }

        let entries = match tokio::fs::read_to_string(path).await {
            Ok(data) => {
                let entries: FxHashMap<String, MonitorEntry> =
                    serde_json::from_str(&data).context("parse monitor list")?;
                info!("[MONITOR] loaded {} monitored titles", entries.len());
                entries
            }
            Err(_) => {
                let empty = FxHashMap::default();
                tokio::fs::write(path, serde_json::to_string_pretty(&empty)?)
                    .await
                    .context("create monitor list")?;
                info!("[MONITOR] created new monitor list at {}", path.display());
                empty
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner {
                entries,
                pending: FxHashMap::default(),
            }),
        })
    }

    async fn persist(&self, entries: &FxHashMap<String, MonitorEntry>) -> Result<()> {
        let data = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, data)
            .await
            .context("write monitor list")?;
        Ok(())
    }

    /// Subscribe an origin to a title. Idempotent.
    pub async fn subscribe(
        &self,
        appid: &str,
        name: &str,
        origin: &str,
    ) -> Result<SubscribeOutcome> {
        let mut inner = self.inner.lock().await;
        let already = inner
            .entries
            .get(appid)
            .map_or(false, |e| e.subscribers.iter().any(|s| s == origin));
        if already {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        inner
            .entries
            .entry(appid.to_string())
            .and_modify(|e| e.subscribers.push(origin.to_string()))
            .or_insert_with(|| MonitorEntry::new(name, origin));
        self.persist(&inner.entries).await?;
        info!("[MONITOR] {} subscribed to {} ({})", origin, name, appid);
        Ok(SubscribeOutcome::Subscribed)
    }

    /// Unsubscribe by AppID, display-name substring, or ordinal follow-up
    /// after an ambiguous result.
    pub async fn unsubscribe(&self, query: &str, origin: &str) -> Result<UnsubscribeOutcome> {
        let query = query.trim();
        let numeric = !query.is_empty() && query.chars().all(|c| c.is_ascii_digit());
        let mut inner = self.inner.lock().await;

        let target: Option<String> = if numeric && inner.entries.contains_key(query) {
            Some(query.to_string())
        } else if numeric {
            // Ordinal into the candidate list from the previous ambiguous call
            match inner.pending.get(origin) {
                Some(candidates) => {
                    let idx: usize = query.parse().unwrap_or(0);
                    if idx >= 1 && idx <= candidates.len() {
                        Some(candidates[idx - 1].0.clone())
                    } else {
                        return Ok(UnsubscribeOutcome::InvalidIndex {
                            count: candidates.len(),
                        });
                    }
                }
                None => None,
            }
        } else {
            let needle = query.to_lowercase();
            let mut matches: Vec<(String, String)> = inner
                .entries
                .iter()
                .filter(|(_, e)| e.name.to_lowercase().contains(&needle))
                .map(|(appid, e)| (appid.clone(), e.name.clone()))
                .collect();
            matches.sort();
            match matches.len() {
                0 => None,
                1 => Some(matches[0].0.clone()),
                _ => {
                    inner.pending.insert(origin.to_string(), matches.clone());
                    return Ok(UnsubscribeOutcome::Ambiguous(matches));
                }
            }
        };

        let appid = match target {
            Some(a) => a,
            None => return Ok(UnsubscribeOutcome::NoMatch),
        };
        inner.pending.remove(origin);

        let entry = match inner.entries.get_mut(&appid) {
            Some(e) => e,
            None => return Ok(UnsubscribeOutcome::NoMatch),
        };
        let name = entry.name.clone();

        let before = entry.subscribers.len();
        entry.subscribers.retain(|s| s != origin);
        if entry.subscribers.len() == before {
            return Ok(UnsubscribeOutcome::NotSubscribed { name });
        }

        // Last subscriber out deletes the whole entry.
        if entry.subscribers.is_empty() {
            inner.entries.remove(&appid);
        }
        self.persist(&inner.entries).await?;
        info!("[MONITOR] {} unsubscribed from {} ({})", origin, name, appid);
        Ok(UnsubscribeOutcome::Removed { name })
    }

    /// Titles this origin is subscribed to: (appid, name, last price).
    pub async fn list(&self, origin: &str) -> Vec<(String, String, Option<f64>)> {
        let inner = self.inner.lock().await;
        let mut out: Vec<_> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.subscribers.iter().any(|s| s == origin))
            .map(|(appid, e)| (appid.clone(), e.name.clone(), e.last_price))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Snapshot for the sweep, so store mutations during the sweep are safe.
    pub async fn snapshot(&self) -> Vec<(String, MonitorEntry)> {
        let inner = self.inner.lock().await;
        inner
            .entries
            .iter()
            .map(|(appid, e)| (appid.clone(), e.clone()))
            .collect()
    }

    /// Record a new price baseline after a sweep observation. A no-op when
    /// the entry disappeared between snapshot and update.
    pub async fn update_baseline(&self, appid: &str, price: &MonitorPrice) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let entry = match inner.entries.get_mut(appid) {
            Some(e) => e,
            None => return Ok(()),
        };
        entry.last_price = Some(price.current_price);
        entry.last_original_price = Some(price.original_price);
        entry.last_discount = Some(price.discount);
        self.persist(&inner.entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, MonitorStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MonitorStore::load_or_create(&dir.path().join("monitor.json"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn subscribe_is_idempotent() {
        let (_dir, store) = store().await;
        let first = store.subscribe("10", "Half-Life", "qq:FriendMessage:1").await.unwrap();
        assert_eq!(first, SubscribeOutcome::Subscribed);
        let second = store.subscribe("10", "Half-Life", "qq:FriendMessage:1").await.unwrap();
        assert_eq!(second, SubscribeOutcome::AlreadySubscribed);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].1.subscribers.len(), 1);
    }

    #[tokio::test]
    async fn last_subscriber_removes_entry_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        let store = MonitorStore::load_or_create(&path).await.unwrap();

        store.subscribe("10", "Half-Life", "a").await.unwrap();
        store.subscribe("10", "Half-Life", "b").await.unwrap();

        let out = store.unsubscribe("10", "a").await.unwrap();
        assert_eq!(out, UnsubscribeOutcome::Removed { name: "Half-Life".to_string() });
        assert_eq!(store.snapshot().await.len(), 1);

        let out = store.unsubscribe("10", "b").await.unwrap();
        assert_eq!(out, UnsubscribeOutcome::Removed { name: "Half-Life".to_string() });
        assert!(store.snapshot().await.is_empty());

        // persisted document no longer contains the entry
        let data = std::fs::read_to_string(&path).unwrap();
        let parsed: FxHashMap<String, MonitorEntry> = serde_json::from_str(&data).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn ambiguous_match_refuses_and_accepts_ordinal() {
        let (_dir, store) = store().await;
        store.subscribe("10", "Half-Life", "a").await.unwrap();
        store.subscribe("70", "Half-Life 2", "a").await.unwrap();

        let out = store.unsubscribe("half", "a").await.unwrap();
        let candidates = match out {
            UnsubscribeOutcome::Ambiguous(c) => c,
            other => panic!("expected ambiguous, got {:?}", other),
        };
        assert_eq!(candidates.len(), 2);
        // nothing was removed
        assert_eq!(store.snapshot().await.len(), 2);

        // ordinal follow-up resolves against the returned list
        let out = store.unsubscribe("1", "a").await.unwrap();
        assert!(matches!(out, UnsubscribeOutcome::Removed { .. }));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_unknown_origin_reports_not_subscribed() {
        let (_dir, store) = store().await;
        store.subscribe("10", "Half-Life", "a").await.unwrap();
        let out = store.unsubscribe("10", "stranger").await.unwrap();
        assert_eq!(
            out,
            UnsubscribeOutcome::NotSubscribed { name: "Half-Life".to_string() }
        );
    }

    #[tokio::test]
    async fn list_filters_by_origin() {
        let (_dir, store) = store().await;
        store.subscribe("10", "Half-Life", "a").await.unwrap();
        store.subscribe("70", "Half-Life 2", "b").await.unwrap();
        let mine = store.list("a").await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].0, "10");
    }

    #[tokio::test]
    async fn list_orders_by_appid_with_mixed_baselines() {
        let (_dir, store) = store().await;
        store.subscribe("70", "Half-Life 2", "a").await.unwrap();
        store.subscribe("10", "Half-Life", "a").await.unwrap();
        store.subscribe("220", "Half-Life 2 Episode One", "a").await.unwrap();

        // one entry has a baseline, the others do not
        let price = MonitorPrice {
            is_free: false,
            current_price: 36.0,
            original_price: 36.0,
            discount: 0,
            currency: "CNY".to_string(),
            name: "Half-Life".to_string(),
        };
        store.update_baseline("10", &price).await.unwrap();

        let mine = store.list("a").await;
        let appids: Vec<&str> = mine.iter().map(|(a, _, _)| a.as_str()).collect();
        assert_eq!(appids, vec!["10", "220", "70"]);
        assert_eq!(mine[0].2, Some(36.0));
        assert_eq!(mine[2].2, None);
    }
}
