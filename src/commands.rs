//! Command handlers: free-form user input in, outbound messages out.
//!
//! Every failure path produces a plain-language message. Errors never cross
//! this boundary as error values, only as text.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::aggregator::PriceAggregator;
use crate::config::{Config, GAME_SEARCH_LIMIT, HOME_COUNTRY};
use crate::history::{ChartRenderer, PriceHistoryStore};
use crate::itad::ItadClient;
use crate::monitor::{MonitorStore, SubscribeOutcome, UnsubscribeOutcome};
use crate::report::{self, fmt_price};
use crate::resolver::{contains_cjk, GameResolver, ResolvedGame};
use crate::steam::SteamClient;
use crate::translate::Translator;
use crate::types::{ChartError, PriceHistorySample};

/// A message headed back to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Image(String),
}

pub struct CommandHandler {
    resolver: GameResolver,
    aggregator: PriceAggregator,
    steam: Arc<SteamClient>,
    itad: Arc<ItadClient>,
    translator: Option<Arc<dyn Translator>>,
    monitor: Arc<MonitorStore>,
    history: Arc<PriceHistoryStore>,
    chart: Option<Arc<dyn ChartRenderer>>,
}

impl CommandHandler {
    pub fn new(
        cfg: &Config,
        steam: Arc<SteamClient>,
        itad: Arc<ItadClient>,
        translator: Option<Arc<dyn Translator>>,
        monitor: Arc<MonitorStore>,
        history: Arc<PriceHistoryStore>,
        chart: Option<Arc<dyn ChartRenderer>>,
    ) -> Self {
        Self {
            resolver: GameResolver::new(steam.clone(), itad.clone(), translator.clone()),
            aggregator: PriceAggregator::new(steam.clone(), itad.clone(), cfg),
            steam,
            itad,
            translator,
            monitor,
            history,
            chart,
        }
    }

    async fn resolve_or_message(&self, query: &str) -> Result<ResolvedGame, Vec<Outbound>> {
        match self.resolver.resolve(query).await {
            Ok(game) => Ok(game),
            Err(_) => Err(vec![Outbound::Text(format!(
                "Could not find a game matching \"{}\". Try the exact Steam \
                 store name, a store link, or an AppID.",
                query.trim()
            ))]),
        }
    }

    /// Full price report for one title.
    pub async fn price_lookup(&self, query: &str) -> Vec<Outbound> {
        let game = match self.resolve_or_message(query).await {
            Ok(g) => g,
            Err(out) => return out,
        };

        let report = self.aggregator.aggregate(&game.appid).await;

        if let Some(amount) = report.home.amount {
            let sample = PriceHistorySample {
                timestamp: Utc::now(),
                current_price: amount,
                currency: report
                    .home
                    .currency
                    .clone()
                    .unwrap_or_else(|| "CNY".to_string()),
                lowest_price: report.history_low,
                cny_price: report.home_cny,
            };
            if let Err(e) = self
                .history
                .record(&report.appid, &report.display_name, sample)
                .await
            {
                warn!("[COMMAND] history append failed for {}: {:#}", report.appid, e);
            }
        }

        let (text, image) = report::render(&report);
        let mut out = vec![Outbound::Text(text)];
        if let Some(url) = image {
            out.push(Outbound::Image(url));
        }
        out
    }

    /// Catalog title search, up to eight hits with home-region prices.
    pub async fn game_search(&self, query: &str) -> Vec<Outbound> {
        let query = query.trim();
        let mut term = query.to_string();
        if contains_cjk(query) {
            if let Some(t) = &self.translator {
                if let Some(english) = t.translate_title(query).await {
                    term = english;
                }
            }
        }

        let hits = self.itad.search(&term, GAME_SEARCH_LIMIT).await;
        if hits.is_empty() {
            return vec![Outbound::Text(format!(
                "No titles found for \"{}\".",
                query
            ))];
        }

        let mut lines = vec![format!("Search results for \"{}\":", query)];
        let mut image = None;
        for (i, hit) in hits.iter().enumerate() {
            let price = match self.itad.prices(&hit.id, HOME_COUNTRY).await {
                Some(p) => fmt_price(p.price, p.currency.as_deref()),
                None => "unknown".to_string(),
            };
            lines.push(format!("{}. {} - {}", i + 1, hit.title, price));
            if image.is_none() {
                image = hit.assets.smallest().map(str::to_string);
            }
        }

        let mut out = vec![Outbound::Text(lines.join("\n"))];
        if let Some(url) = image {
            out.push(Outbound::Image(url));
        }
        out
    }

    /// Subscribe `origin` to price alerts for a title.
    pub async fn subscribe(&self, query: &str, origin: &str) -> Vec<Outbound> {
        let game = match self.resolve_or_message(query).await {
            Ok(g) => g,
            Err(out) => return out,
        };

        let name = match game.name {
            Some(n) => n,
            None => self
                .steam
                .app_details(&game.appid, "cn", "schinese")
                .await
                .and_then(|d| d.name)
                .unwrap_or_else(|| format!("App {}", game.appid)),
        };

        match self.monitor.subscribe(&game.appid, &name, origin).await {
            Ok(SubscribeOutcome::Subscribed) => vec![Outbound::Text(format!(
                "Now watching {} for price changes. You will be notified here.",
                name
            ))],
            Ok(SubscribeOutcome::AlreadySubscribed) => vec![Outbound::Text(format!(
                "You are already watching {}.",
                name
            ))],
            Err(e) => {
                warn!("[COMMAND] subscribe failed for {}: {:#}", game.appid, e);
                vec![Outbound::Text(
                    "Could not save the subscription, please try again.".to_string(),
                )]
            }
        }
    }

    /// Stop watching a title, by name fragment, AppID, or an ordinal from a
    /// previous ambiguous answer.
    pub async fn unsubscribe(&self, query: &str, origin: &str) -> Vec<Outbound> {
        match self.monitor.unsubscribe(query, origin).await {
            Ok(UnsubscribeOutcome::Removed { name }) => vec![Outbound::Text(format!(
                "Stopped watching {}.",
                name
            ))],
            Ok(UnsubscribeOutcome::NotSubscribed { name }) => vec![Outbound::Text(format!(
                "You are not watching {}.",
                name
            ))],
            Ok(UnsubscribeOutcome::NoMatch) => vec![Outbound::Text(
                "No watched title matches that. Use the exact name, an AppID, \
                 or check your watch list."
                    .to_string(),
            )],
            Ok(UnsubscribeOutcome::Ambiguous(candidates)) => {
                let mut lines =
                    vec!["Several watched titles match. Reply with a number:".to_string()];
                for (i, (_, name)) in candidates.iter().enumerate() {
                    lines.push(format!("{}. {}", i + 1, name));
                }
                vec![Outbound::Text(lines.join("\n"))]
            }
            Ok(UnsubscribeOutcome::InvalidIndex { count }) => vec![Outbound::Text(format!(
                "Pick a number between 1 and {}.",
                count
            ))],
            Err(e) => {
                warn!("[COMMAND] unsubscribe failed: {:#}", e);
                vec![Outbound::Text(
                    "Could not update the subscription, please try again.".to_string(),
                )]
            }
        }
    }

    /// Titles this origin is watching.
    pub async fn list_subscriptions(&self, origin: &str) -> Vec<Outbound> {
        let entries = self.monitor.list(origin).await;
        if entries.is_empty() {
            return vec![Outbound::Text(
                "You are not watching any titles yet.".to_string(),
            )];
        }
        let mut lines = vec!["Your watched titles:".to_string()];
        for (i, (appid, name, last_price)) in entries.iter().enumerate() {
            let price = match last_price {
                Some(p) => fmt_price(Some(*p), Some("CNY")),
                None => "no baseline yet".to_string(),
            };
            lines.push(format!("{}. {} ({}) - {}", i + 1, name, appid, price));
        }
        vec![Outbound::Text(lines.join("\n"))]
    }

    /// Price trend chart over the trailing `days` days.
    pub async fn price_trend(&self, query: &str, days: Option<i64>) -> Vec<Outbound> {
        let game = match self.resolve_or_message(query).await {
            Ok(g) => g,
            Err(out) => return out,
        };

        let renderer = match &self.chart {
            Some(r) => r,
            None => {
                return vec![Outbound::Text(
                    "Price charts are not enabled on this bot.".to_string(),
                )]
            }
        };

        match self.history.chart(&game.appid, days, renderer.as_ref()).await {
            Ok(artifact) => vec![Outbound::Image(artifact)],
            Err(ChartError::InsufficientData) => vec![Outbound::Text(
                "Not enough price history yet. Look the game up a few more \
                 times over the coming days and try again."
                    .to_string(),
            )],
            Err(ChartError::Unavailable) => vec![Outbound::Text(
                "Price charts are not enabled on this bot.".to_string(),
            )],
            Err(ChartError::Render(e)) => {
                warn!("[COMMAND] chart render failed for {}: {}", game.appid, e);
                vec![Outbound::Text(
                    "Could not draw the chart, please try again later.".to_string(),
                )]
            }
        }
    }

    /// Recorded price observations, most recent last.
    pub async fn price_history(&self, query: &str) -> Vec<Outbound> {
        let game = match self.resolve_or_message(query).await {
            Ok(g) => g,
            Err(out) => return out,
        };

        let (name, samples) = match self.history.samples_within(&game.appid, None).await {
            Some(found) if !found.1.is_empty() => found,
            _ => {
                return vec![Outbound::Text(
                    "No price history recorded for that title yet.".to_string(),
                )]
            }
        };

        let mut lines = vec![format!("Price history for {}:", name)];
        // keep the message readable, only the ten most recent samples
        let start = samples.len().saturating_sub(10);
        for s in &samples[start..] {
            lines.push(format!(
                "{}  {}",
                s.timestamp.format("%Y-%m-%d %H:%M"),
                fmt_price(Some(s.current_price), Some(&s.currency)),
            ));
        }
        vec![Outbound::Text(lines.join("\n"))]
    }
}
