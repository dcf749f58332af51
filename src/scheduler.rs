//! Periodic price sweep over the monitored titles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tracing::{info, warn};

use crate::monitor::MonitorStore;
use crate::notify::Notifier;
use crate::report::fmt_price;
use crate::steam::SteamClient;
use crate::types::{MonitorEntry, MonitorPrice};

/// Price source for the sweep. Split out so the sweep logic can be driven
/// in tests without a live storefront.
#[async_trait]
pub trait MonitorPriceFetcher: Send + Sync {
    async fn fetch(&self, appid: &str) -> Option<MonitorPrice>;
}

#[async_trait]
impl MonitorPriceFetcher for SteamClient {
    async fn fetch(&self, appid: &str) -> Option<MonitorPrice> {
        self.monitor_price(appid).await
    }
}

/// What a freshly observed price means for an entry, as a ready-to-send
/// message. `None` when there is nothing to tell the subscribers: first
/// observation (baseline) or an unchanged price.
pub fn change_message(entry: &MonitorEntry, price: &MonitorPrice) -> Option<String> {
    let last = entry.last_price?;

    if price.is_free {
        if last > 0.0 {
            return Some(format!(
                "🎉 {} is free to claim on Steam right now!",
                price.name
            ));
        }
        return None;
    }

    // Only an actual price movement counts; a discount flag flipping while
    // the price stays put is not a change.
    if price.current_price == last {
        return None;
    }

    let currency = Some(price.currency.as_str());
    let old = fmt_price(Some(last), currency);
    let new = fmt_price(Some(price.current_price), currency);
    if price.current_price < last {
        let mut msg = format!("📉 Price drop: {}\n{} -> {}", price.name, old, new);
        if price.discount > 0 {
            msg.push_str(&format!(" (-{}%)", price.discount));
        }
        Some(msg)
    } else {
        Some(format!(
            "📈 Price back up: {}\n{} -> {}",
            price.name, old, new
        ))
    }
}

pub struct MonitorScheduler {
    store: Arc<MonitorStore>,
    fetcher: Arc<dyn MonitorPriceFetcher>,
    notifier: Arc<Notifier>,
    interval_minutes: u64,
}

impl MonitorScheduler {
    pub fn new(
        store: Arc<MonitorStore>,
        fetcher: Arc<dyn MonitorPriceFetcher>,
        notifier: Arc<Notifier>,
        interval_minutes: u64,
    ) -> Self {
        Self {
            store,
            fetcher,
            notifier,
            interval_minutes,
        }
    }

    /// Run forever. The first tick of `tokio::time::interval` fires
    /// immediately, which doubles as a startup baseline pass.
    pub async fn run(&self) {
        let mut ticker = time::interval(Duration::from_secs(self.interval_minutes * 60));
        info!(
            "[SCHEDULER] price monitor running every {} min",
            self.interval_minutes
        );
        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// One pass over a snapshot of the store. Per-entry failures are
    /// logged and do not stop the rest of the sweep.
    pub async fn sweep(&self) {
        let entries = self.store.snapshot().await;
        if entries.is_empty() {
            return;
        }
        info!("[SCHEDULER] sweeping {} monitored titles", entries.len());

        for (appid, entry) in entries {
            let price = match self.fetcher.fetch(&appid).await {
                Some(p) => p,
                None => {
                    warn!("[SCHEDULER] price fetch failed for {}, skipping", appid);
                    continue;
                }
            };

            let message = change_message(&entry, &price);
            if let Some(text) = &message {
                for origin in &entry.subscribers {
                    self.notifier.notify(origin, text, None).await;
                }
            }

            // Persist only on first observation or an actual change.
            if entry.last_price.is_none() || message.is_some() {
                if let Err(e) = self.store.update_baseline(&appid, &price).await {
                    warn!("[SCHEDULER] baseline update failed for {}: {:#}", appid, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(last: Option<f64>, discount: Option<u32>) -> MonitorEntry {
        let mut e = MonitorEntry::new("Hades", "qq:FriendMessage:1");
        e.last_price = last;
        e.last_discount = discount;
        e
    }

    fn price(current: f64, discount: u32) -> MonitorPrice {
        MonitorPrice {
            is_free: false,
            current_price: current,
            original_price: 98.0,
            discount,
            currency: "CNY".to_string(),
            name: "Hades".to_string(),
        }
    }

    #[test]
    fn first_observation_is_silent() {
        assert_eq!(change_message(&entry(None, None), &price(49.0, 50)), None);
    }

    #[test]
    fn unchanged_price_is_silent() {
        assert_eq!(change_message(&entry(Some(98.0), Some(0)), &price(98.0, 0)), None);
    }

    #[test]
    fn discount_flip_without_price_movement_is_silent() {
        // a sale ending at the same shelf price must not notify
        assert_eq!(change_message(&entry(Some(98.0), Some(50)), &price(98.0, 0)), None);
        assert_eq!(change_message(&entry(Some(98.0), Some(0)), &price(98.0, 50)), None);
    }

    #[test]
    fn drop_mentions_old_new_and_discount() {
        let msg = change_message(&entry(Some(98.0), Some(0)), &price(49.0, 50));
        let msg = msg.expect("drop should notify");
        assert!(msg.contains("￥98"));
        assert!(msg.contains("￥49"));
        assert!(msg.contains("-50%"));
    }

    #[test]
    fn rise_is_reported_without_discount() {
        let msg = change_message(&entry(Some(49.0), Some(50)), &price(98.0, 0));
        assert!(msg.expect("rise should notify").starts_with("📈"));
    }

    #[test]
    fn going_free_celebrates_once() {
        let free = MonitorPrice {
            is_free: true,
            current_price: 0.0,
            original_price: 0.0,
            discount: 100,
            currency: "FREE".to_string(),
            name: "Hades".to_string(),
        };
        let msg = change_message(&entry(Some(98.0), Some(0)), &free);
        assert!(msg.expect("free transition should notify").starts_with("🎉"));
        // already free last time we looked
        assert_eq!(change_message(&entry(Some(0.0), Some(100)), &free), None);
    }
}
