use async_trait::async_trait;
use serde_json::json;
use std::env;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::TelegramConfig;
use crate::error::HunterError;
use crate::report::{split_message, strip_markdown};

pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Delivers a formatted payload. Failures are logged and reported as
/// `false`, never raised.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn deliver(&self, text: &str) -> bool;
}

#[derive(Clone)]
struct Credentials {
    bot_token: String,
    chat_id: String,
}

#[derive(Clone)]
pub struct TelegramMessenger {
    client: reqwest::Client,
    api_base: String,
    credentials: Option<Credentials>,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl TelegramMessenger {
    pub fn from_env(config: &TelegramConfig) -> Result<Self, HunterError> {
        let bot_token = env::var(BOT_TOKEN_VAR).ok().filter(|value| !value.trim().is_empty());
        let chat_id = env::var(CHAT_ID_VAR).ok().filter(|value| !value.trim().is_empty());
        Self::new(config, bot_token.zip(chat_id))
    }

    pub fn new(config: &TelegramConfig, credentials: Option<(String, String)>) -> Result<Self, HunterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            credentials: credentials.map(|(bot_token, chat_id)| Credentials { bot_token, chat_id }),
            chunk_size: config.chunk_size.max(1),
            chunk_delay: Duration::from_millis(config.chunk_delay_ms),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send_chunk(&self, credentials: &Credentials, chunk: &str) -> Result<(), HunterError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            credentials.bot_token
        );

        let markdown = json!({
            "chat_id": credentials.chat_id,
            "text": chunk,
            "parse_mode": "MarkdownV2",
            "disable_web_page_preview": true,
        });
        match self.post(&url, &markdown).await {
            Ok(()) => return Ok(()),
            Err(err) => warn!(error = %err, "MarkdownV2 send failed; retrying as plain text"),
        }

        let plain = json!({
            "chat_id": credentials.chat_id,
            "text": strip_markdown(chunk),
            "disable_web_page_preview": true,
        });
        self.post(&url, &plain).await
    }

    async fn post(&self, url: &str, payload: &serde_json::Value) -> Result<(), HunterError> {
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HunterError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn deliver(&self, text: &str) -> bool {
        let Some(credentials) = self.credentials.as_ref() else {
            error!("{} or {} not set; message not sent", BOT_TOKEN_VAR, CHAT_ID_VAR);
            info!(preview = %strip_markdown(text), "telegram preview");
            return false;
        };

        let chunks = split_message(text, self.chunk_size);
        let total = chunks.len();
        for (idx, chunk) in chunks.iter().enumerate() {
            if let Err(err) = self.send_chunk(credentials, chunk).await {
                error!(chunk = idx + 1, total, error = %err, "telegram delivery failed");
                return false;
            }
            info!(chunk = idx + 1, total, "telegram message sent");
            if total > 1 {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }
        true
    }
}
