//! OpenAI-compatible `/chat/completions` generator.

use crate::error::GenerationError;
use crate::generator::{GenerationRequest, Generator};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

const JSON_ONLY_SYSTEM_PROMPT: &str =
    "You must output ONLY valid JSON. No markdown, no commentary.";

/// Connection settings for the HTTP generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the bearer key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: 0.2,
        }
    }
}

pub struct OpenAiGenerator {
    client: Client,
    config: GeneratorConfig,
    api_key: String,
}

impl OpenAiGenerator {
    /// Build a generator, reading the key from `config.api_key_env`.
    pub fn from_env(config: GeneratorConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                GenerationError::Fatal(format!("missing env var: {}", config.api_key_env))
            })?;
        Self::new(config, api_key)
    }

    pub fn new(config: GeneratorConfig, api_key: String) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Fatal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl Generator for OpenAiGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "system", "content": JSON_ONLY_SYSTEM_PROMPT },
                { "role": "user", "content": request.prompt },
            ],
        });

        tracing::debug!(section = %request.section, model = %self.config.model, "requesting rewrite");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            let snippet: String = text.chars().take(300).collect();
            return Err(classify_status(status, &snippet));
        }

        let payload: Value = response
            .json()
            .map_err(|e| GenerationError::Malformed(format!("response body: {e}")))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                GenerationError::Malformed("no message content in response".to_string())
            })?;
        parse_json_content(content)
    }
}

fn classify_status(status: StatusCode, snippet: &str) -> GenerationError {
    let message = format!("HTTP {}: {snippet}", status.as_u16());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        GenerationError::Transient(message)
    } else {
        GenerationError::Fatal(message)
    }
}

/// Parse message content as a JSON object, tolerating a ```json fence.
pub fn parse_json_content(content: &str) -> Result<Value, GenerationError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    let value: Value = serde_json::from_str(unfenced.trim()).map_err(|e| {
        let raw: String = unfenced.chars().take(300).collect();
        GenerationError::Malformed(format!("JSON parse failed: {e}. Raw: {raw}"))
    })?;
    if !value.is_object() {
        return Err(GenerationError::Malformed(
            "response JSON is not an object".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_and_server_errors_are_transient() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            GenerationError::Transient(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            GenerationError::Transient(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "bad key"),
            GenerationError::Fatal(m) if m == "HTTP 401: bad key"
        ));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let value = parse_json_content("```json\n{\"section_markdown\": \"x\"}\n```").expect("parse");
        assert_eq!(value["section_markdown"], "x");
        assert!(parse_json_content("sure! here you go").is_err());
        assert!(parse_json_content("[1, 2]").is_err());
    }

    #[test]
    fn missing_key_env_is_fatal() {
        let config = GeneratorConfig {
            api_key_env: "SOMATIC_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            OpenAiGenerator::from_env(config),
            Err(GenerationError::Fatal(_))
        ));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let config = GeneratorConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..GeneratorConfig::default()
        };
        let generator = OpenAiGenerator::new(config, "k".to_string()).expect("client");
        assert_eq!(generator.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
