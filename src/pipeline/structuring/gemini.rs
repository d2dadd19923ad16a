use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::StructuringError;

/// Gemini `generateContent` client over the public REST API.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StructuringError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StructuringError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout,
        })
    }
}

/// Request body for `models/{model}:generateContent`
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response body from `generateContent`
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl LlmClient for GeminiClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, StructuringError> {
        if self.api_key.is_empty() {
            return Err(StructuringError::InvalidApiKey(
                "Gemini API key not configured".into(),
            ));
        }

        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    StructuringError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    StructuringError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    StructuringError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_gemini_failure(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.to_string()))?;

        Ok(response_text(parsed))
    }
}

fn classify_gemini_failure(status: u16, body: String) -> StructuringError {
    match status {
        429 => StructuringError::QuotaExceeded(body),
        400 | 401 | 403 if body.contains("API key") => StructuringError::InvalidApiKey(body),
        _ => StructuringError::ServiceError { status, body },
    }
}

/// Concatenated text of the first candidate; empty when the model returned nothing.
fn response_text(parsed: GenerateContentResponse) -> String {
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Mock LLM client for testing — returns a configurable response.
pub struct MockLlmClient {
    response: Result<String, MockLlmFailure>,
}

/// Failure modes the mock can reproduce.
#[derive(Debug, Clone, Copy)]
pub enum MockLlmFailure {
    Quota,
    InvalidKey,
    Server,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    pub fn failing(failure: MockLlmFailure) -> Self {
        Self {
            response: Err(failure),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, _prompt: &str) -> Result<String, StructuringError> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(MockLlmFailure::Quota) => Err(StructuringError::QuotaExceeded(
                "RESOURCE_EXHAUSTED".into(),
            )),
            Err(MockLlmFailure::InvalidKey) => Err(StructuringError::InvalidApiKey(
                "API key not valid".into(),
            )),
            Err(MockLlmFailure::Server) => Err(StructuringError::ServiceError {
                status: 500,
                body: "internal".into(),
            }),
        }
    }
}
