//! OpenAI chat-completions provider for cluster names

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::error::{Error, Result};

use super::naming::NamingProvider;
use super::prompt::{clean_cluster_name, NamingPrompt};
use super::retry::retry_request;

/// Cluster namer backed by OpenAI chat completions
pub struct OpenAiNamer {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiNamer {
    /// Create a new OpenAI namer
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::naming("OpenAI API key is not configured"))
    }

    async fn complete(&self, api_key: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: NamingPrompt::system(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::naming(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::naming(format!(
                "OpenAI completion failed ({}): {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::naming(format!("Failed to parse OpenAI response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::naming("OpenAI response contained no choices"))
    }
}

#[async_trait]
impl NamingProvider for OpenAiNamer {
    async fn name_cluster(&self, texts: &[String]) -> Result<String> {
        let api_key = self.api_key()?;
        let user_prompt = NamingPrompt::user(texts);
        let prompt = user_prompt.as_str();

        let raw = retry_request(
            "openai",
            self.config.max_retries,
            Duration::from_secs(1),
            || self.complete(api_key, prompt),
        )
        .await?;

        clean_cluster_name(&raw)
    }

    async fn health_check(&self) -> Result<bool> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) => key,
            None => return Ok(false),
        };

        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        match self.client.get(&url).bearer_auth(api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}
