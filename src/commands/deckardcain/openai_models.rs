use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub choices: Vec<ChatCompletionResponseChoice>
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponseChoice {
    pub index: i32,
    pub message: ChatCompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    pub temperature: f32,
    pub max_tokens: u32
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub content: Option<String>
}

impl ChatCompletionMessage {
    pub fn new(role: &str, content: &str) -> Self {
        ChatCompletionMessage { role: role.to_string(), content: Some(content.to_string()) }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiError
}

#[derive(Debug, Deserialize)]
pub struct OpenAiError {
    pub message: String
}
