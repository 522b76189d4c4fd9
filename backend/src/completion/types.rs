//! Chat-completion wire types
//!
//! Structs that mirror the chat-completions JSON format. Only the fields
//! this service reads are modeled; everything else is ignored.

use serde::{Deserialize, Serialize};

/// Request body for `/chat/completions`
#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Conversation; always a single user message here
    pub messages: Vec<ChatMessage<'a>>,
}

/// A single chat message in a request
#[derive(Serialize, Debug)]
pub struct ChatMessage<'a> {
    /// Message role ("user")
    pub role: &'a str,
    /// Message text
    pub content: &'a str,
}

/// Top-level chat-completion response
#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    /// Completion choices; the first one is used
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A single completion choice
#[derive(Deserialize, Debug)]
pub struct Choice {
    /// The generated message
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    /// Why the model stopped generating (if applicable)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice
#[derive(Deserialize, Debug)]
pub struct ResponseMessage {
    /// Reply text; null for refusals and tool calls
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice's message, if present
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }

    /// Finish reason of the first choice, if reported
    pub fn first_finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage {
                role: "user",
                content: "Hello",
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "Hello"}]
            })
        );
    }

    #[test]
    fn test_first_content() {
        let json = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hi there"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"total_tokens": 3}
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_content(), Some("Hi there"));
    }

    #[test]
    fn test_first_content_missing_paths() {
        for json in [
            r#"{}"#,
            r#"{"choices": []}"#,
            r#"{"choices": [{"index": 0}]}"#,
            r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#,
        ] {
            let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
            assert_eq!(response.first_content(), None, "payload: {}", json);
        }
    }
}
