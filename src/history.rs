//! Bounded per-title price history with an injectable chart backend.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::HISTORY_CAP;
use crate::types::{ChartError, PriceHistorySample};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    pub samples: VecDeque<PriceHistorySample>,
}

/// Chart backend boundary. The store only decides what data goes on a
/// chart, never how it is drawn; implementations return something the
/// messenger can send (a file path or URL).
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(
        &self,
        title: &str,
        samples: &[PriceHistorySample],
    ) -> std::result::Result<String, ChartError>;
}

/// Whole-document JSON store, same discipline as the monitor list: one
/// mutex across load-mutate-persist.
pub struct PriceHistoryStore {
    path: PathBuf,
    inner: Mutex<FxHashMap<String, HistoryEntry>>,
}

impl PriceHistoryStore {
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("create data directory")?;
        }

        let entries = match tokio::fs::read_to_string(path).await {
            Ok(data) => {
                let entries: FxHashMap<String, HistoryEntry> =
                    serde_json::from_str(&data).context("parse price history")?;
                info!("[HISTORY] loaded history for {} titles", entries.len());
                entries
            }
            Err(_) => FxHashMap::default(),
        };

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &FxHashMap<String, HistoryEntry>) -> Result<()> {
        let data = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, data)
            .await
            .context("write price history")?;
        Ok(())
    }

    /// Append a sample, evicting the oldest once the per-title cap is hit.
    pub async fn record(&self, appid: &str, name: &str, sample: PriceHistorySample) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let entry = inner.entry(appid.to_string()).or_insert_with(|| HistoryEntry {
            name: name.to_string(),
            samples: VecDeque::new(),
        });
        entry.name = name.to_string();
        entry.samples.push_back(sample);
        while entry.samples.len() > HISTORY_CAP {
            entry.samples.pop_front();
        }
        self.persist(&inner).await
    }

    /// Samples for a title within the last `days` days (all when `None`),
    /// oldest first, plus the stored display name.
    pub async fn samples_within(
        &self,
        appid: &str,
        days: Option<i64>,
    ) -> Option<(String, Vec<PriceHistorySample>)> {
        let inner = self.inner.lock().await;
        let entry = inner.get(appid)?;
        let samples = match days {
            Some(d) => {
                let cutoff = Utc::now() - Duration::days(d);
                entry
                    .samples
                    .iter()
                    .filter(|s| s.timestamp >= cutoff)
                    .cloned()
                    .collect()
            }
            None => entry.samples.iter().cloned().collect(),
        };
        Some((entry.name.clone(), samples))
    }

    /// Render a trend chart for a title. Fewer than two points in the
    /// window is not enough to draw a line.
    pub async fn chart(
        &self,
        appid: &str,
        days: Option<i64>,
        renderer: &dyn ChartRenderer,
    ) -> std::result::Result<String, ChartError> {
        let (name, samples) = self
            .samples_within(appid, days)
            .await
            .ok_or(ChartError::InsufficientData)?;
        if samples.len() < 2 {
            return Err(ChartError::InsufficientData);
        }
        renderer.render(&name, &samples).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(price: f64) -> PriceHistorySample {
        PriceHistorySample {
            timestamp: Utc::now(),
            current_price: price,
            currency: "CNY".to_string(),
            lowest_price: Some(price),
            cny_price: Some(price),
        }
    }

    async fn store() -> (tempfile::TempDir, PriceHistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceHistoryStore::load_or_create(&dir.path().join("history.json"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn cap_evicts_oldest_sample() {
        let (_dir, store) = store().await;
        for i in 0..(HISTORY_CAP + 1) {
            store.record("10", "Half-Life", sample(i as f64)).await.unwrap();
        }
        let (_, samples) = store.samples_within("10", None).await.unwrap();
        assert_eq!(samples.len(), HISTORY_CAP);
        // the very first sample (price 0.0) fell off the front
        assert_eq!(samples[0].current_price, 1.0);
        assert_eq!(samples.last().unwrap().current_price, HISTORY_CAP as f64);
    }

    #[tokio::test]
    async fn window_filters_old_samples() {
        let (_dir, store) = store().await;
        let mut old = sample(10.0);
        old.timestamp = Utc::now() - Duration::days(30);
        store.record("10", "Half-Life", old).await.unwrap();
        store.record("10", "Half-Life", sample(5.0)).await.unwrap();

        let (_, all) = store.samples_within("10", None).await.unwrap();
        assert_eq!(all.len(), 2);
        let (_, recent) = store.samples_within("10", Some(7)).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].current_price, 5.0);
    }

    struct NoopRenderer;

    #[async_trait]
    impl ChartRenderer for NoopRenderer {
        async fn render(
            &self,
            _title: &str,
            samples: &[PriceHistorySample],
        ) -> std::result::Result<String, ChartError> {
            Ok(format!("chart:{}", samples.len()))
        }
    }

    #[tokio::test]
    async fn chart_needs_two_points() {
        let (_dir, store) = store().await;
        store.record("10", "Half-Life", sample(10.0)).await.unwrap();
        let err = store.chart("10", None, &NoopRenderer).await.unwrap_err();
        assert!(matches!(err, ChartError::InsufficientData));

        store.record("10", "Half-Life", sample(5.0)).await.unwrap();
        let out = store.chart("10", None, &NoopRenderer).await.unwrap();
        assert_eq!(out, "chart:2");
    }

    #[tokio::test]
    async fn unknown_title_is_insufficient_data() {
        let (_dir, store) = store().await;
        let err = store.chart("999", None, &NoopRenderer).await.unwrap_err();
        assert!(matches!(err, ChartError::InsufficientData));
    }
}
