// Client for the generative-AI concierge endpoint. Model identifiers are tried
// in priority order and the first success wins; rate-limit responses are
// classified separately so the UI can show a dedicated "too many requests"
// message. Conversation history is persisted as a bounded JSON array.

use crate::storage::{StateStore, CHAT_HISTORY_KEY};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Assistant error: {status_code} - {message}")]
    Response { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Model returned no answer")]
    EmptyAnswer,
}

impl AssistantError {
    // Text shown to the guest; everything but rate limiting is generic
    pub fn user_message(&self) -> &'static str {
        match self {
            AssistantError::RateLimited => {
                "Too many requests right now. Please try again in a moment."
            }
            _ => "Sorry, I couldn't answer that. Please try again.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub base_url: String,
    pub api_key: String,
    // Tried in order; the first model that answers wins
    pub models: Vec<String>,
    // Messages sent along with each prompt
    pub history_window: usize,
    // Messages retained in the persisted log
    pub max_history: usize,
    pub timeout_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            models: vec![
                "gemini-2.0-flash".to_string(),
                "gemini-2.0-flash-lite".to_string(),
                "gemini-1.5-flash".to_string(),
            ],
            history_window: 8,
            max_history: 50,
            timeout_ms: 30_000,
        }
    }
}

// Transport seam so the fallback logic is testable without a network
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String, AssistantError>;
}

// Wire structures for the generateContent endpoint
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<WireContent>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: WireCandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireCandidateContent {
    parts: Vec<WirePart>,
}

pub struct HttpChatTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpChatTransport {
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AssistantError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn build_request(prompt: &str, history: &[ChatMessage]) -> GenerateRequest {
        let mut contents: Vec<WireContent> = history
            .iter()
            .map(|message| WireContent {
                role: match message.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                },
                parts: vec![WirePart {
                    text: message.content.clone(),
                }],
            })
            .collect();
        contents.push(WireContent {
            role: "user",
            parts: vec![WirePart {
                text: prompt.to_string(),
            }],
        });
        GenerateRequest { contents }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String, AssistantError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = Self::build_request(prompt, history);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AssistantError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssistantError::Response {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Decode(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or(AssistantError::EmptyAnswer)
    }
}

// Conversation history persisted under the chat-history key, bounded to the
// configured maximum of messages
pub struct ChatLog {
    messages: RwLock<Vec<ChatMessage>>,
    store: Arc<dyn StateStore>,
    max_history: usize,
}

impl ChatLog {
    pub fn new(store: Arc<dyn StateStore>, max_history: usize) -> Self {
        let messages = match store.get(CHAT_HISTORY_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<ChatMessage>>(&raw) {
                Ok(messages) => messages,
                Err(e) => {
                    warn!("Persisted chat history unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Self {
            messages: RwLock::new(messages),
            store,
            max_history,
        }
    }

    pub fn push(&self, message: ChatMessage) {
        let mut messages = self.messages.write();
        messages.push(message);
        let excess = messages.len().saturating_sub(self.max_history);
        if excess > 0 {
            messages.drain(..excess);
        }
        self.persist(&messages);
    }

    // The most recent `window` messages, oldest first
    pub fn tail(&self, window: usize) -> Vec<ChatMessage> {
        let messages = self.messages.read();
        let skip = messages.len().saturating_sub(window);
        messages[skip..].to_vec()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().clone()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
        self.store.remove(CHAT_HISTORY_KEY);
    }

    fn persist(&self, messages: &[ChatMessage]) {
        match serde_json::to_string(messages) {
            Ok(json) => self.store.set(CHAT_HISTORY_KEY, &json),
            Err(e) => warn!("Failed to serialize chat history: {}", e),
        }
    }
}

pub struct Assistant {
    transport: Arc<dyn ChatTransport>,
    models: Vec<String>,
    history_window: usize,
    log: ChatLog,
}

impl Assistant {
    pub fn new(config: AssistantConfig, store: Arc<dyn StateStore>) -> Result<Self, AssistantError> {
        let transport = Arc::new(HttpChatTransport::new(&config)?);
        Ok(Self::with_transport(transport, config, store))
    }

    pub fn with_transport(
        transport: Arc<dyn ChatTransport>,
        config: AssistantConfig,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let log = ChatLog::new(store, config.max_history);
        Self {
            transport,
            models: config.models,
            history_window: config.history_window,
            log,
        }
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    // Ask the concierge. Models are tried in priority order; on success the
    // exchange is appended to the persisted log. A rate limit seen on any
    // attempt wins over other failures so the UI can say so explicitly.
    pub async fn ask(&self, prompt: &str) -> Result<String, AssistantError> {
        let history = self.log.tail(self.history_window);
        let mut rate_limited = false;
        let mut last_error: Option<AssistantError> = None;

        for model in &self.models {
            match self.transport.complete(model, prompt, &history).await {
                Ok(answer) => {
                    debug!("Model {} answered", model);
                    self.log.push(ChatMessage::user(prompt));
                    self.log.push(ChatMessage::assistant(answer.clone()));
                    return Ok(answer);
                }
                Err(AssistantError::RateLimited) => {
                    warn!("Model {} rate limited, trying next", model);
                    rate_limited = true;
                }
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        if rate_limited {
            return Err(AssistantError::RateLimited);
        }
        Err(last_error
            .unwrap_or_else(|| AssistantError::Network("No models configured".to_string())))
    }
}
