//! Productivity assistant backed by an OpenAI-compatible chat endpoint.
//!
//! The relay appends a summary of the user's tasks to each question and
//! forwards the conversation to `{base_url}/chat/completions`.

use indoc::indoc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::ChatError;
use crate::storage::ChatConfig;
use crate::task::{format_due, Task};

pub const SYSTEM_PROMPT: &str = indoc! {"
    You are FocusFlow's friendly productivity assistant.
    - If the user greets you (e.g., says \"hi\", \"hello\"), greet them back in a friendly way.
    - If the user asks for help or what you can do, briefly explain your features and offer to assist.
    - Otherwise, answer their question or help with productivity, tasks, or study advice as usual.
    Always be concise, positive, and helpful.
"};

/// Quick prompts offered to the user.
pub const SUGGESTIONS: [&str; 5] = [
    "What should I do next?",
    "How to avoid burnout?",
    "Tips for maximum productivity",
    "How to plan my day?",
    "How to stay focused?",
];

pub const ALL_DONE_REPLY: &str = "You have done all your tasks!";
pub const EMPTY_REPLY: &str = "No reply received.";
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again in a moment.";

const CONTEXT_INSTRUCTION: &str = "Based on my current and completed tasks, please suggest what I should focus on next or how to improve my productivity. Please keep your response concise.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Task summary appended to the user's question.
pub fn build_task_context(current: &[Task], completed: &[Task]) -> String {
    let mut context = String::new();
    let current_list: Vec<String> = current.iter().map(Task::summary).collect();
    context.push_str(&format!("\n\nCurrent tasks: {}", current_list.join("; ")));

    if !completed.is_empty() {
        let done: Vec<String> = completed
            .iter()
            .map(|t| match &t.due_date {
                Some(due) => format!("{} ({} sessions, due {})", t.name, t.total_sessions, format_due(due)),
                None => format!("{} ({} sessions)", t.name, t.total_sessions),
            })
            .collect();
        context.push_str(&format!("\n\nCompleted tasks: {}", done.join("; ")));
    }
    context.push_str("\n\n");
    context.push_str(CONTEXT_INSTRUCTION);
    context
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the chat completions endpoint.
pub struct ChatRelay {
    http_client: Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl ChatRelay {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let invalid = |message: String| ChatError::InvalidEndpoint {
            url: base_url.to_string(),
            message,
        };
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let endpoint = Url::parse(&base)
            .and_then(|u| u.join("chat/completions"))
            .map_err(|e| invalid(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", endpoint.scheme())));
        }

        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint,
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a relay from config, reading the key from the configured env var.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ChatError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(
            &config.base_url,
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Ask about the user's tasks. Short-circuits when nothing is left to do.
    pub async fn ask(
        &self,
        history: &[ChatMessage],
        question: &str,
        current: &[Task],
        completed: &[Task],
    ) -> Result<String, ChatError> {
        if current.is_empty() {
            return Ok(ALL_DONE_REPLY.to_string());
        }
        let prompt = format!("{question}{}", build_task_context(current, completed));
        self.send(history, &prompt).await
    }

    /// Send the system prompt, `history`, then `prompt` as the user turn.
    pub async fn send(&self, history: &[ChatMessage], prompt: &str) -> Result<String, ChatError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(prompt));

        let body = CompletionRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "sending chat request");
        let resp = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "chat endpoint returned an error");
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = resp.json().await?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string());
        Ok(reply)
    }
}
