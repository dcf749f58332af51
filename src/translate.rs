//! LLM-assisted title translation.
//!
//! Chinese input is translated to the official English Steam store title
//! before the search cascade runs. The provider is treated as unreliable:
//! the completion is used verbatim after trimming, and any failure turns
//! into `None` so the caller falls back to the raw input.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{Config, TRANSLATE_TIMEOUT};

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a (probably Chinese) game title to its English store title.
    /// `None` means translation is unavailable or failed; never an error.
    async fn translate_title(&self, title: &str) -> Option<String>;
}

// === OpenAI-compatible chat-completion provider ===

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct LlmTranslator {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl LlmTranslator {
    /// `None` when no provider endpoint is configured.
    pub fn from_config(cfg: &Config) -> Option<Self> {
        if cfg.translate_api_base.is_empty() {
            info!("[TRANSLATE] no provider configured, translation disabled");
            return None;
        }
        Some(Self {
            http: reqwest::Client::builder()
                .timeout(TRANSLATE_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_base: cfg.translate_api_base.trim_end_matches('/').to_string(),
            api_key: cfg.translate_api_key.clone(),
            model: cfg.translate_model.clone(),
        })
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate_title(&self, title: &str) -> Option<String> {
        let prompt = format!(
            "Translate the following game name to its official English title \
             on the Steam store page. Output only the English name, nothing \
             else: {}",
            title
        );
        let req = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!("[TRANSLATE] request failed for '{}': {}", title, e);
                return None;
            }
        };

        let body: ChatResponse = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[TRANSLATE] parse failed for '{}': {}", title, e);
                return None;
            }
        };

        let out = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if let Some(en) = &out {
            info!("[TRANSLATE] '{}' -> '{}'", title, en);
        }
        out
    }
}
