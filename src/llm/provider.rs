use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use super::PromptPart;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rate limited or quota exhausted")]
    RateLimited,
    #[error("request rejected by model endpoint: {0}")]
    BadRequest(String),
    #[error("malformed completion reply: {0}")]
    MalformedReply(String),
}

/// One completion call: a system instruction, ordered text/image parts,
/// and an optional schema constraining the output shape. Stateless
/// between calls; no retries here.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        parts: &[PromptPart],
        response_format: Option<&Value>,
    ) -> Result<String, CompletionError>;
}

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    fn content_parts(parts: &[PromptPart]) -> Vec<Value> {
        parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => json!({ "type": "text", "text": text }),
                PromptPart::InlineImage { media_type, base64 } => json!({
                    "type": "image_url",
                    "image_url": { "url": format!("data:{};base64,{}", media_type, base64) }
                }),
            })
            .collect()
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        parts: &[PromptPart],
        response_format: Option<&Value>,
    ) -> Result<String, CompletionError> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": Self::content_parts(parts) },
            ],
            "temperature": 0.0,
        });
        if let Some(format) = response_format {
            body["response_format"] = format.clone();
        }

        let mut request = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited);
        }
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompletionError::BadRequest(detail));
        }
        let response = response.error_for_status()?;

        let reply: Value = response.json().await?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                CompletionError::MalformedReply("reply carries no message content".to_string())
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_parts_preserve_order() {
        let parts = vec![
            PromptPart::Text("before".to_string()),
            PromptPart::InlineImage {
                media_type: "image/png".to_string(),
                base64: "QUJD".to_string(),
            },
            PromptPart::Text("after".to_string()),
        ];
        let rendered = OpenAiProvider::content_parts(&parts);
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0]["type"], "text");
        assert_eq!(rendered[1]["type"], "image_url");
        assert_eq!(
            rendered[1]["image_url"]["url"],
            "data:image/png;base64,QUJD"
        );
        assert_eq!(rendered[2]["text"], "after");
    }
}
