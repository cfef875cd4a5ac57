use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::HunterError;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Debug, Clone)]
pub struct Completion<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl LlmClient {
    pub fn from_env(config: &LlmConfig) -> Result<Self, HunterError> {
        let api_key = env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| HunterError::Config(format!("{} is not set", API_KEY_VAR)))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, HunterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, completion: Completion<'_>) -> Result<String, HunterError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: completion.temperature,
            max_tokens: completion.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: completion.system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: completion.user.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HunterError::Api {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| HunterError::Parse(format!("chat response parse failed: {}", err)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| HunterError::Parse("chat response missing content".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
