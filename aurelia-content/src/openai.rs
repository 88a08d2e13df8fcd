use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("OpenAI API key not configured")]
    MissingApiKey,

    #[error("Content service unavailable: {0}")]
    Unavailable(String),

    #[error("Content service returned malformed payload: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Thin chat-completions client. Consumed as an opaque external service; the
/// interesting logic lives in the prompt builders around it.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Point at a different endpoint (proxies, test doubles).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// One system + one user turn, assistant text back.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, ContentError> {
        if self.api_key.is_empty() {
            return Err(ContentError::MissingApiKey);
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system", content: system.to_string() },
                ChatMessage { role: "user", content: user.to_string() },
            ],
            temperature: 0.7,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ContentError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| ContentError::Unavailable(e.to_string()))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ContentError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ContentError::MalformedResponse("empty choices".to_string()))
    }
}

/// Strip an optional Markdown code fence the model sometimes wraps JSON in.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches('\n')
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = OpenAiClient::new("", "gpt-4o-mini");
        let err = client.chat("system", "user").await.unwrap_err();
        assert!(matches!(err, ContentError::MissingApiKey));
    }

    #[test]
    fn strips_json_code_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }
}
