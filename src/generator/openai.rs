use super::{ChatMessage, ChatRequest, Collaborator};
use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gpt-4o-2024-08-06";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Credentials and endpoint for the chat completion service
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Read `OPENAI_API_KEY`, `POLYGLOT_MODEL` and `POLYGLOT_API_BASE` once
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: std::env::var("POLYGLOT_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("POLYGLOT_API_BASE").unwrap_or(defaults.base_url),
        }
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionReply {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiClient {
    config: ClientConfig,
    http: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::blocking::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl Collaborator for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;

        let body = CompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            response_format: ResponseFormat { kind: "json_object" },
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "chat completion request"
        );

        let response = self.http.post(self.endpoint()).bearer_auth(api_key).json(&body).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let reply: CompletionReply = response.json()?;
        extract_content(reply)
    }
}

fn extract_content(reply: CompletionReply) -> Result<String, GenerationError> {
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GenerationError::Malformed("reply has no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ChatMessage;
    use assert_matches::assert_matches;

    #[test]
    fn missing_key_fails_before_any_request() {
        let client = OpenAiClient::new(ClientConfig::default());
        let request = ChatRequest {
            messages: vec![ChatMessage::user("hello")],
            temperature: None,
            max_tokens: None,
        };
        assert_matches!(client.complete(&request), Err(GenerationError::MissingCredential));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = OpenAiClient::new(ClientConfig {
            base_url: "http://localhost:8080/v1/".into(),
            ..Default::default()
        });
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn body_serializes_roles_and_skips_unset_params() {
        let messages = vec![ChatMessage::system("rules"), ChatMessage::user("question")];
        let body = CompletionBody {
            model: "m",
            messages: &messages,
            response_format: ResponseFormat { kind: "json_object" },
            temperature: Some(0.5),
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["temperature"], 0.5);
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn content_is_taken_from_first_choice() {
        let reply: CompletionReply = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"words\": []}"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(reply).unwrap(), r#"{"words": []}"#);

        let empty: CompletionReply = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_matches!(extract_content(empty), Err(GenerationError::Malformed(_)));
    }
}
