use async_trait::async_trait;
use serde_json::Value;

use crate::error::EvalError;

#[derive(Debug, Clone)]
pub struct ChatMessage {
	pub role: String,
	pub content: String,
}

impl ChatMessage {
	pub fn system(content: impl Into<String>) -> Self {
		Self { role: "system".to_string(), content: content.into() }
	}

	pub fn user(content: impl Into<String>) -> Self {
		Self { role: "user".to_string(), content: content.into() }
	}
}

/// One structured-judgment request. The engine resolves the model,
/// credential, and temperature before dispatch; the capability only has
/// to execute it.
#[derive(Debug, Clone)]
pub struct JudgeRequest {
	pub model: String,
	pub api_key: String,
	pub messages: Vec<ChatMessage>,
	pub temperature: f32,
}

/// Injected chat-completion capability returning a structured JSON
/// judgment. Consumed by the `LlmSimilarity` comparison strategy. The
/// implementation must enforce its own request timeout.
#[async_trait]
pub trait JudgeModel: Send + Sync {
	async fn json_completion(&self, request: JudgeRequest) -> Result<Value, EvalError>;
}
