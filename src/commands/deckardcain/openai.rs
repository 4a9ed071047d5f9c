use reqwest::Client;

use crate::{Error, USER_AGENT};
use super::openai_models::*;

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub async fn create_chat_completion(api_key: &str, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, Error> {
    let response = Client::new()
        .post(COMPLETIONS_URL)
        .header("User-Agent", USER_AGENT)
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let message = match response.json::<OpenAiErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("OpenAI returned HTTP {}", status.as_u16())
        };
        return Err(message.into());
    }

    Ok(response.json::<ChatCompletionResponse>().await?)
}

/// Pulls the first reply out of a completion.
pub fn first_reply(response: &ChatCompletionResponse) -> Option<String> {
    response.choices.first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  Stay a while and listen.\n"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 6, "total_tokens": 26}
        }"#).unwrap();

        assert_eq!(first_reply(&response).as_deref(), Some("Stay a while and listen."));
    }

    #[test]
    fn empty_choices_have_no_reply() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"id": "x", "object": "chat.completion", "created": 0, "choices": []}"#
        ).unwrap();

        assert_eq!(first_reply(&response), None);
    }

    #[test]
    fn request_serializes_sampling_options() {
        let request = ChatCompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatCompletionMessage::new("user", "hello")],
            temperature: 0.7,
            max_tokens: 50
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 50);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
