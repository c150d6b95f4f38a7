// OpenAI API Types
// These types are designed to be compatible with the OpenAI Chat Completions API.
// Reference: https://platform.openai.com/docs/api-reference/chat

use crate::tokens::TokenUsage;
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
    Tool,
}

/// A message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Chat completion request
///
/// `temperature` and `max_tokens` are accepted for compatibility only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, deserialize_with = "crate::provider::null_as_false")]
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            stream: false,
        }
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<TokenUsage> for Usage {
    fn from(usage: TokenUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt,
            completion_tokens: usage.completion,
            total_tokens: usage.total,
        }
    }
}

/// A choice in the completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    pub finish_reason: String,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatCompletionResponse {
    pub fn new(model: String, content: String, usage: Usage) -> Self {
        Self {
            id: new_completion_id(),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model,
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage,
        }
    }
}

/// Generate a completion id ("chatcmpl-<uuid>")
pub fn new_completion_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4())
}

/// Delta content in streaming response
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A choice in streaming response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub delta: ChunkDelta,
    pub index: u32,
    pub finish_reason: Option<String>,
}

/// Streaming chat completion chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    pub fn new(id: String, model: String, created: i64) -> Self {
        Self {
            id,
            object: "chat.completion.chunk".to_string(),
            created,
            model,
            choices: vec![],
        }
    }

    fn with_choice(mut self, delta: ChunkDelta, finish_reason: Option<String>) -> Self {
        self.choices = vec![ChunkChoice {
            delta,
            index: 0,
            finish_reason,
        }];
        self
    }

    /// Opening frame: announces the assistant role with empty content
    pub fn with_role(self) -> Self {
        self.with_choice(
            ChunkDelta {
                role: Some(Role::Assistant),
                content: Some(String::new()),
            },
            None,
        )
    }

    pub fn with_content(self, content: String) -> Self {
        self.with_choice(
            ChunkDelta {
                role: None,
                content: Some(content),
            },
            None,
        )
    }

    /// Closing frame: empty delta plus a finish reason
    pub fn with_finish(self, reason: String) -> Self {
        self.with_choice(ChunkDelta::default(), Some(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("Hello!");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Hello!"}"#);
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{
            "model": "gpt-4",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "Hello!"}
            ],
            "temperature": 0.7,
            "max_tokens": 150
        }"#;

        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(150));
        assert!(!request.stream);
    }

    #[test]
    fn test_request_stream_null_means_false() {
        let json = r#"{
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "Hello!"}],
            "stream": null
        }"#;
        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        assert!(!request.stream);

        let json = r#"{"model": "gpt-4", "messages": [], "stream": true}"#;
        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        assert!(request.stream);
    }

    #[test]
    fn test_request_rejects_non_numeric_temperature() {
        let json = r#"{"model": "gpt-4", "messages": [], "temperature": "hot"}"#;
        assert!(serde_json::from_str::<ChatCompletionRequest>(json).is_err());
    }

    #[test]
    fn test_response_shape() {
        let usage = Usage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        };
        let response =
            ChatCompletionResponse::new("gpt-4".to_string(), "Hello there!".to_string(), usage);
        let value = serde_json::to_value(&response).unwrap();

        assert!(value["id"].as_str().unwrap().starts_with("chatcmpl-"));
        assert_eq!(value["object"], "chat.completion");
        assert_eq!(value["model"], "gpt-4");
        assert_eq!(value["choices"][0]["index"], 0);
        assert_eq!(value["choices"][0]["message"]["role"], "assistant");
        assert_eq!(value["choices"][0]["message"]["content"], "Hello there!");
        assert_eq!(value["choices"][0]["finish_reason"], "stop");
        assert_eq!(value["usage"]["total_tokens"], 30);
    }

    #[test]
    fn test_chunk_frames() {
        let base = || ChatCompletionChunk::new("id".to_string(), "gpt-4".to_string(), 1);

        let role = serde_json::to_value(base().with_role()).unwrap();
        assert_eq!(role["object"], "chat.completion.chunk");
        assert_eq!(role["choices"][0]["delta"]["role"], "assistant");
        assert_eq!(role["choices"][0]["delta"]["content"], "");
        assert!(role["choices"][0]["finish_reason"].is_null());

        let content = serde_json::to_value(base().with_content("Hi".to_string())).unwrap();
        assert_eq!(content["choices"][0]["delta"]["content"], "Hi");
        assert!(content["choices"][0]["delta"].get("role").is_none());

        let finish = serde_json::to_value(base().with_finish("stop".to_string())).unwrap();
        assert_eq!(finish["choices"][0]["delta"], serde_json::json!({}));
        assert_eq!(finish["choices"][0]["finish_reason"], "stop");
    }
}
