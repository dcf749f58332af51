//! Steam Price Bot
//!
//! Interactive console front end for the price bot core. Reads commands from
//! stdin, prints reports to stdout, and runs the subscription price monitor
//! in the background.
//!
//! Commands:
//!
//! ```text
//! price <query>          full price report (link, AppID, or title)
//! search <query>         catalog title search with prices
//! sub <query>            watch a title for price changes
//! unsub <query|number>   stop watching
//! list                   your watched titles
//! trend <query> [days]   price trend chart
//! history <query>        recorded price observations
//! quit
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use steam_price_bot::commands::{CommandHandler, Outbound};
use steam_price_bot::config::Config;
use steam_price_bot::history::PriceHistoryStore;
use steam_price_bot::itad::ItadClient;
use steam_price_bot::monitor::MonitorStore;
use steam_price_bot::notify::{ConsoleMessenger, Notifier};
use steam_price_bot::scheduler::MonitorScheduler;
use steam_price_bot::steam::SteamClient;
use steam_price_bot::translate::{LlmTranslator, Translator};

/// Origin recorded for subscriptions made from the console
const CONSOLE_ORIGIN: &str = "console:FriendMessage:local";

#[tokio::main]
async fn main() -> Result<()> {
    // Logging with both stdout and file output
    let file_appender = tracing_appender::rolling::never(".", "steam-price-bot.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("steam_price_bot=info".parse()?);

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    dotenvy::dotenv().ok();
    let cfg = Config::from_env();

    info!("🎮 Steam Price Bot");
    info!("   Comparison region: {}", cfg.compare_region);
    if cfg.itad_api_key.is_empty() {
        warn!("   ITAD_API_KEY not set, historical lows will be unavailable");
    }

    let steam = Arc::new(SteamClient::new());
    let itad = Arc::new(ItadClient::new(&cfg.itad_api_key));
    let translator: Option<Arc<dyn Translator>> = LlmTranslator::from_config(&cfg)
        .map(|t| Arc::new(t) as Arc<dyn Translator>);
    if translator.is_none() {
        info!("   Translation disabled (TRANSLATE_API_BASE not set)");
    }

    let data_dir = Path::new(&cfg.data_dir);
    let monitor = Arc::new(MonitorStore::load_or_create(&data_dir.join("monitor.json")).await?);
    let history =
        Arc::new(PriceHistoryStore::load_or_create(&data_dir.join("price_history.json")).await?);

    if cfg.enable_price_monitor {
        let notifier = Arc::new(Notifier::new(Arc::new(ConsoleMessenger)));
        let scheduler = MonitorScheduler::new(
            monitor.clone(),
            steam.clone(),
            notifier,
            cfg.monitor_interval_mins,
        );
        tokio::spawn(async move { scheduler.run().await });
    } else {
        info!("   Price monitor disabled");
    }

    let handler = CommandHandler::new(
        &cfg,
        steam,
        itad,
        translator,
        monitor,
        history,
        None, // no chart backend wired into the console build
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Ready. Type `price <game>` to look something up, `quit` to exit.");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        let out = match cmd {
            "quit" | "exit" => break,
            "price" | "p" => handler.price_lookup(rest).await,
            "search" | "s" => handler.game_search(rest).await,
            "sub" | "watch" => handler.subscribe(rest, CONSOLE_ORIGIN).await,
            "unsub" | "unwatch" => handler.unsubscribe(rest, CONSOLE_ORIGIN).await,
            "list" => handler.list_subscriptions(CONSOLE_ORIGIN).await,
            "trend" => {
                let (query, days) = split_trailing_days(rest);
                handler.price_trend(query, days).await
            }
            "history" => handler.price_history(rest).await,
            _ => vec![Outbound::Text(
                "Unknown command. Try: price, search, sub, unsub, list, trend, history."
                    .to_string(),
            )],
        };

        for msg in out {
            match msg {
                Outbound::Text(text) => println!("{}\n", text),
                Outbound::Image(url) => println!("[image] {}\n", url),
            }
        }
    }

    info!("Shutting down");
    Ok(())
}

/// `"hades 30"` -> `("hades", Some(30))`; a trailing token is only taken as
/// a window when it parses as a number, so bare AppIDs stay intact.
fn split_trailing_days(rest: &str) -> (&str, Option<i64>) {
    if let Some((head, tail)) = rest.rsplit_once(char::is_whitespace) {
        if let Ok(days) = tail.parse::<i64>() {
            return (head.trim(), Some(days));
        }
    }
    (rest, None)
}
