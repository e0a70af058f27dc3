// Gemini generateContent client (reqwest)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use super::{DiagnosticsError, ReportGenerator};
use crate::config::DiagnosticsConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";
const ERROR_BODY_LIMIT: usize = 512;

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if any.
    fn text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl GeminiClient {
    pub fn new(config: &DiagnosticsConfig, api_key: Option<String>) -> Result<Self, DiagnosticsError> {
        let client = Client::builder()
            .user_agent(concat!("sentinel/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: config.api_key_env.clone(),
        })
    }

    /// Reads the key from the environment variable named by `config.api_key_env`.
    pub fn from_env(config: &DiagnosticsConfig) -> Result<Self, DiagnosticsError> {
        Self::new(config, std::env::var(&config.api_key_env).ok())
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl ReportGenerator for GeminiClient {
    fn ensure_configured(&self) -> Result<(), DiagnosticsError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(DiagnosticsError::missing_credential(&self.api_key_env)),
        }
    }

    #[instrument(skip_all, fields(operation = "generate_content"))]
    async fn generate(&self, prompt: &str) -> Result<String, DiagnosticsError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DiagnosticsError::missing_credential(&self.api_key_env))?;

        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting report");
        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > ERROR_BODY_LIMIT {
                let cut = (0..=ERROR_BODY_LIMIT)
                    .rev()
                    .find(|i| message.is_char_boundary(*i))
                    .unwrap_or(0);
                message.truncate(cut);
            }
            return Err(DiagnosticsError::api(status.as_u16(), message));
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.text().ok_or(DiagnosticsError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"- all "},{"text":"good"}]}},
            {"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("- all good"));
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(parsed.text().is_none());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let client = GeminiClient::new(&DiagnosticsConfig::default(), Some("  ".into())).unwrap();
        let err = client.ensure_configured().unwrap_err();
        assert!(err.to_string().contains("API_KEY"));
    }
}
