//! Outbound notification dispatch.
//!
//! Subscriptions record where they came from as a colon-delimited origin
//! string, `platform:messageType:identifiers`. This module turns an origin
//! back into a concrete send target and pushes messages through a
//! [`Messenger`] behind a global send throttle, so a sweep that finds many
//! discounts does not burst the chat platform.

use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::{info, warn};

/// Where a message should be delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum SendTarget {
    Friend {
        platform: String,
        user_id: String,
    },
    Group {
        platform: String,
        group_id: String,
        /// Subscriber to @-mention so the alert is attributable in a group
        mention: Option<String>,
    },
}

/// Parse a stored origin string. Group identifiers come in two shapes,
/// `userId_groupId` and a bare `groupId`.
pub fn parse_origin(origin: &str) -> Option<SendTarget> {
    let mut parts = origin.splitn(3, ':');
    let platform = parts.next()?.to_string();
    let kind = parts.next()?;
    let ids = parts.next()?;
    if platform.is_empty() || ids.is_empty() {
        return None;
    }

    match kind {
        "FriendMessage" => Some(SendTarget::Friend {
            platform,
            user_id: ids.to_string(),
        }),
        "GroupMessage" => match ids.split_once('_') {
            Some((user_id, group_id)) if !user_id.is_empty() && !group_id.is_empty() => {
                Some(SendTarget::Group {
                    platform,
                    group_id: group_id.to_string(),
                    mention: Some(user_id.to_string()),
                })
            }
            _ => Some(SendTarget::Group {
                platform,
                group_id: ids.to_string(),
                mention: None,
            }),
        },
        _ => None,
    }
}

/// Transport boundary. The bot core never talks to a chat platform
/// directly; implementations adapt to whatever backend is wired in.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, target: &SendTarget, text: &str) -> Result<()>;
    async fn send_image(&self, target: &SendTarget, image_url: &str) -> Result<()>;
}

/// Messenger that prints to stdout, used by the interactive console loop.
pub struct ConsoleMessenger;

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send_text(&self, target: &SendTarget, text: &str) -> Result<()> {
        println!("[{:?}]\n{}", target, text);
        Ok(())
    }

    async fn send_image(&self, target: &SendTarget, image_url: &str) -> Result<()> {
        println!("[{:?}] image: {}", target, image_url);
        Ok(())
    }
}

/// Throttled fan-out over a [`Messenger`]. One message per second across
/// all targets.
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    limiter: DefaultDirectRateLimiter,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self {
            messenger,
            limiter: RateLimiter::direct(Quota::per_second(NonZeroU32::MIN)),
        }
    }

    /// Deliver a text (and optional image) to the target encoded in
    /// `origin`. Unparseable origins are logged and skipped.
    pub async fn notify(&self, origin: &str, text: &str, image_url: Option<&str>) {
        let target = match parse_origin(origin) {
            Some(t) => t,
            None => {
                warn!("[NOTIFY] unparseable origin, skipping: {}", origin);
                return;
            }
        };

        self.limiter.until_ready().await;
        if let Err(e) = self.messenger.send_text(&target, text).await {
            warn!("[NOTIFY] text send failed for {}: {:#}", origin, e);
            return;
        }
        if let Some(url) = image_url {
            self.limiter.until_ready().await;
            if let Err(e) = self.messenger.send_image(&target, url).await {
                warn!("[NOTIFY] image send failed for {}: {:#}", origin, e);
            }
        }
        info!("[NOTIFY] delivered to {}", origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friend_origin_parses() {
        assert_eq!(
            parse_origin("qq:FriendMessage:12345"),
            Some(SendTarget::Friend {
                platform: "qq".to_string(),
                user_id: "12345".to_string(),
            })
        );
    }

    #[test]
    fn group_origin_with_user_carries_mention() {
        assert_eq!(
            parse_origin("qq:GroupMessage:111_222"),
            Some(SendTarget::Group {
                platform: "qq".to_string(),
                group_id: "222".to_string(),
                mention: Some("111".to_string()),
            })
        );
    }

    #[test]
    fn bare_group_origin_has_no_mention() {
        assert_eq!(
            parse_origin("qq:GroupMessage:222"),
            Some(SendTarget::Group {
                platform: "qq".to_string(),
                group_id: "222".to_string(),
                mention: None,
            })
        );
    }

    #[test]
    fn malformed_origins_are_rejected() {
        assert_eq!(parse_origin(""), None);
        assert_eq!(parse_origin("qq"), None);
        assert_eq!(parse_origin("qq:FriendMessage"), None);
        assert_eq!(parse_origin("qq:ChannelMessage:1"), None);
        assert_eq!(parse_origin(":FriendMessage:1"), None);
    }
}
