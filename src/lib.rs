//! Steam Price Bot
//!
//! A chat-oriented Steam price assistant: resolves free-form game queries
//! (links, AppIDs, English or CJK titles) to a Steam AppID, aggregates live
//! storefront and catalog pricing with historical lows, formats chat-ready
//! reports, and runs a persistent subscription monitor that notifies
//! subscribers when a watched title changes price or goes free.

pub mod aggregator;
pub mod commands;
pub mod config;
pub mod currency;
pub mod history;
pub mod itad;
pub mod monitor;
pub mod notify;
pub mod report;
pub mod resolver;
pub mod scheduler;
pub mod steam;
pub mod translate;
pub mod types;
