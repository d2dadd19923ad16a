use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::types::{OcrEngine, OcrResult};
use super::ExtractionError;

/// Google Cloud Vision document text detection over its REST API.
pub struct GoogleVisionOcr {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl GoogleVisionOcr {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout,
        })
    }
}

/// Request body for `images:annotate`
#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

/// Response body from `images:annotate`
#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct VisionStatus {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl OcrEngine for GoogleVisionOcr {
    fn detect_text(&self, image_bytes: &[u8]) -> Result<OcrResult, ExtractionError> {
        if self.api_key.is_empty() {
            return Err(ExtractionError::OcrAuthentication(
                "Vision API key not configured".into(),
            ));
        }

        let url = format!("{}/images:annotate", self.base_url);
        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image_bytes),
                },
                features: vec![Feature {
                    kind: "DOCUMENT_TEXT_DETECTION",
                }],
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
                    ExtractionError::OcrConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    ExtractionError::HttpClient(format!(
                        "OCR request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    ExtractionError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_vision_failure(status.as_u16(), body));
        }

        let parsed: AnnotateResponse = response
            .json()
            .map_err(|e| ExtractionError::ResponseParsing(e.to_string()))?;

        into_ocr_result(parsed)
    }
}

/// Vision reports bad keys as 400/403 with "API key" in the message.
fn classify_vision_failure(status: u16, body: String) -> ExtractionError {
    if matches!(status, 400 | 401 | 403) && body.contains("API key") {
        ExtractionError::OcrAuthentication(body)
    } else {
        ExtractionError::OcrService { status, body }
    }
}

fn into_ocr_result(parsed: AnnotateResponse) -> Result<OcrResult, ExtractionError> {
    let Some(first) = parsed.responses.into_iter().next() else {
        return Ok(OcrResult::default());
    };

    if let Some(error) = first.error {
        return Err(ExtractionError::OcrService {
            status: error.code,
            body: error.message,
        });
    }

    Ok(OcrResult::new(
        first.full_text_annotation.map(|a| a.text).unwrap_or_default(),
    ))
}

/// Mock OCR engine for unit testing without network access.
pub struct MockOcrEngine {
    text: String,
    fail: bool,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn detect_text(&self, _image_bytes: &[u8]) -> Result<OcrResult, ExtractionError> {
        if self.fail {
            return Err(ExtractionError::OcrService {
                status: 500,
                body: "Mock OCR failure".into(),
            });
        }
        Ok(OcrResult::new(self.text.clone()))
    }
}
