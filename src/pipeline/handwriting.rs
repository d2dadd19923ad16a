//! End-to-end handwriting recognition: image → text → fields → corrected record.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::correction::{MedicationCorrector, RxNavClient, TerminologyError};
use super::extraction::{
    parse_data_uri, ExtractionError, GoogleVisionOcr, HandwritingEnhancer, ImageEnhancer,
    OcrEngine,
};
use super::structuring::{
    build_interpretation_prompt, parse_structured_response, synthesize_title, GeminiClient,
    InterpretedFields, LlmClient, StructuringError,
};
use crate::config::ServiceConfig;

pub const NO_TEXT_MESSAGE: &str = "No text recognized in the image.";
pub const QUOTA_EXCEEDED_MESSAGE: &str =
    "Quota exceeded for Gemini API. Please enable billing or try again later.";
pub const INVALID_API_KEY_MESSAGE: &str =
    "Invalid or missing API key. Please contact the administrator.";
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to recognize handwriting. Please ensure the image is clear and try again.";

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Structuring(#[from] StructuringError),

    #[error(transparent)]
    Terminology(#[from] TerminologyError),
}

impl RecognitionError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Structuring(StructuringError::QuotaExceeded(_)))
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Structuring(StructuringError::InvalidApiKey(_))
                | Self::Extraction(ExtractionError::OcrAuthentication(_))
        )
    }

    /// Advisory text shown in place of a record.
    pub fn user_message(&self) -> &'static str {
        if self.is_quota_exceeded() {
            QUOTA_EXCEEDED_MESSAGE
        } else if self.is_auth_failure() {
            INVALID_API_KEY_MESSAGE
        } else {
            GENERIC_FAILURE_MESSAGE
        }
    }
}

/// Pipeline output. Advisory outcomes carry only `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PipelineResult {
    pub fn advisory(message: &str) -> Self {
        Self {
            text: message.to_string(),
            provider: None,
            title: None,
        }
    }

    pub fn is_advisory(&self) -> bool {
        self.title.is_none()
    }
}

/// Recognized text block stored as the record body.
pub fn format_record_text(fields: &InterpretedFields, corrected_medications: &str) -> String {
    format!(
        "Disease/Symptoms: {}\nMedications: {}\nAdditional Notes: {}",
        fields.disease, corrected_medications, fields.notes
    )
}

/// Handwriting recognition pipeline with injected collaborators.
pub struct HandwritingPipeline {
    enhancer: Box<dyn ImageEnhancer>,
    ocr: Box<dyn OcrEngine>,
    llm: Box<dyn LlmClient>,
    corrector: MedicationCorrector,
    model: String,
}

impl HandwritingPipeline {
    pub fn new(
        enhancer: Box<dyn ImageEnhancer>,
        ocr: Box<dyn OcrEngine>,
        llm: Box<dyn LlmClient>,
        corrector: MedicationCorrector,
        model: &str,
    ) -> Self {
        Self {
            enhancer,
            ocr,
            llm,
            corrector,
            model: model.to_string(),
        }
    }

    /// Production wiring: Vision OCR, Gemini, RxNav.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, RecognitionError> {
        let ocr = GoogleVisionOcr::new(
            &config.vision_base_url,
            &config.vision_api_key,
            config.service_timeout,
        )?;
        let llm = GeminiClient::new(
            &config.gemini_base_url,
            &config.gemini_api_key,
            config.service_timeout,
        )?;
        let terminology = RxNavClient::new(&config.rxnav_base_url, config.terminology_timeout)?;

        Ok(Self::new(
            Box::new(HandwritingEnhancer::default()),
            Box::new(ocr),
            Box::new(llm),
            MedicationCorrector::standard(Arc::new(terminology)),
            &config.gemini_model,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Recognize a data-URI image. Never fails: errors become advisory text.
    pub fn recognize(&self, payload: &str) -> PipelineResult {
        self.recognize_on(payload, chrono::Local::now().date_naive())
    }

    /// Same as [`recognize`](Self::recognize) with an explicit title date.
    pub fn recognize_on(&self, payload: &str, date: NaiveDate) -> PipelineResult {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("recognize", request_id = %request_id);
        let _guard = span.enter();
        let start = Instant::now();

        match self.run(payload, date) {
            Ok(result) => {
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    has_title = result.title.is_some(),
                    "Recognition complete"
                );
                tracing::debug!(text = %result.text, "Recognized record");
                result
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    quota = e.is_quota_exceeded(),
                    auth = e.is_auth_failure(),
                    "Recognition failed"
                );
                PipelineResult::advisory(e.user_message())
            }
        }
    }

    fn run(&self, payload: &str, date: NaiveDate) -> Result<PipelineResult, RecognitionError> {
        // Step 1: Decode and enhance
        let input = parse_data_uri(payload)?;
        let enhanced = self.enhancer.enhance(&input.bytes)?;
        tracing::info!(
            mime_type = %input.mime_type,
            width = enhanced.width,
            height = enhanced.height,
            "Image enhanced"
        );

        // Step 2: OCR
        let ocr = self.ocr.detect_text(&enhanced.png_bytes)?;
        tracing::info!(chars = ocr.text.len(), "OCR complete");
        if ocr.is_empty() {
            tracing::warn!("No text recognized, stopping");
            return Ok(PipelineResult::advisory(NO_TEXT_MESSAGE));
        }
        tracing::debug!(text = %ocr.text, "OCR text");

        // Step 3: Interpretation
        let prompt = build_interpretation_prompt(&ocr.text);
        let response = self.llm.generate(&self.model, &prompt)?;
        tracing::info!(model = %self.model, chars = response.len(), "Model response received");
        tracing::debug!(response = %response, "Model response");

        // Step 4: Field parsing
        let fields = parse_structured_response(&response);
        tracing::info!(
            known_disease = fields.has_known_disease(),
            has_medications = fields.has_medications(),
            has_provider = !fields.provider.is_empty(),
            "Fields parsed"
        );

        // Step 5: Medication correction
        let medications = self
            .corrector
            .correct_list(&fields.medications, &fields.disease);

        Ok(PipelineResult {
            text: format_record_text(&fields, &medications),
            title: Some(synthesize_title(&fields, date)),
            provider: Some(fields.provider),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::correction::MockTerminologyClient;
    use crate::pipeline::extraction::{MockOcrEngine, PassthroughEnhancer};
    use crate::pipeline::structuring::{MockLlmClient, MockLlmFailure};

    const PAYLOAD: &str = "data:image/png;base64,aGFuZHdyaXRpbmc=";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    fn pipeline(ocr: MockOcrEngine, llm: MockLlmClient) -> HandwritingPipeline {
        HandwritingPipeline::new(
            Box::new(PassthroughEnhancer::new()),
            Box::new(ocr),
            Box::new(llm),
            MedicationCorrector::standard(Arc::new(MockTerminologyClient::empty())),
            "gemini-1.5-pro",
        )
    }

    fn amenorrhea_response() -> &'static str {
        "- Disease/Symptoms: Secondary amenorrhea\n\
         - Medications: Diane 1 tab daily, Penichet 1+1+1 (possibly)\n\
         - Additional Notes: 19-year-old female\n\
         - Healthcare Provider: Dr. Smith"
    }

    #[test]
    fn full_flow_produces_corrected_record() {
        let p = pipeline(
            MockOcrEngine::new("Rx Diane 1 tab daily"),
            MockLlmClient::new(amenorrhea_response()),
        );
        let result = p.recognize_on(PAYLOAD, date());
        assert_eq!(
            result.text,
            "Disease/Symptoms: Secondary amenorrhea\n\
             Medications: Diane-35 1 tab daily, Penicillin 1+1+1\n\
             Additional Notes: 19-year-old female"
        );
        assert_eq!(result.title.as_deref(), Some("Secondary amenorrhea - 3/7/2024"));
        assert_eq!(result.provider.as_deref(), Some("Dr. Smith"));
        assert!(!result.is_advisory());
    }

    #[test]
    fn empty_ocr_stops_with_advisory() {
        let p = pipeline(MockOcrEngine::new(""), MockLlmClient::new(amenorrhea_response()));
        let result = p.recognize_on(PAYLOAD, date());
        assert_eq!(result, PipelineResult::advisory(NO_TEXT_MESSAGE));
        assert!(result.provider.is_none());
        assert!(result.title.is_none());
    }

    #[test]
    fn whitespace_ocr_counts_as_empty() {
        let p = pipeline(MockOcrEngine::new("  \n "), MockLlmClient::new("unused"));
        assert_eq!(p.recognize_on(PAYLOAD, date()).text, NO_TEXT_MESSAGE);
    }

    #[test]
    fn quota_failure_maps_to_quota_message() {
        let p = pipeline(
            MockOcrEngine::new("text"),
            MockLlmClient::failing(MockLlmFailure::Quota),
        );
        assert_eq!(p.recognize_on(PAYLOAD, date()).text, QUOTA_EXCEEDED_MESSAGE);
    }

    #[test]
    fn invalid_key_maps_to_key_message() {
        let p = pipeline(
            MockOcrEngine::new("text"),
            MockLlmClient::failing(MockLlmFailure::InvalidKey),
        );
        assert_eq!(p.recognize_on(PAYLOAD, date()).text, INVALID_API_KEY_MESSAGE);
    }

    #[test]
    fn other_failures_map_to_generic_message() {
        let p = pipeline(
            MockOcrEngine::new("text"),
            MockLlmClient::failing(MockLlmFailure::Server),
        );
        assert_eq!(p.recognize_on(PAYLOAD, date()).text, GENERIC_FAILURE_MESSAGE);

        let p = pipeline(MockOcrEngine::failing(), MockLlmClient::new("x"));
        assert_eq!(p.recognize_on(PAYLOAD, date()).text, GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn undecodable_payload_is_generic_failure() {
        let p = pipeline(MockOcrEngine::new("text"), MockLlmClient::new("x"));
        let result = p.recognize_on("data:image/png;base64,@@@", date());
        assert_eq!(result.text, GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn enhancer_failure_is_generic_failure() {
        let p = HandwritingPipeline::new(
            Box::new(PassthroughEnhancer::failing()),
            Box::new(MockOcrEngine::new("text")),
            Box::new(MockLlmClient::new(amenorrhea_response())),
            MedicationCorrector::standard(Arc::new(MockTerminologyClient::empty())),
            "m",
        );
        assert_eq!(p.recognize_on(PAYLOAD, date()).text, GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn unstructured_answer_still_yields_record() {
        let p = pipeline(
            MockOcrEngine::new("scribbles"),
            MockLlmClient::new("The note mentions Penicillin twice daily."),
        );
        let result = p.recognize_on(PAYLOAD, date());
        assert_eq!(
            result.text,
            "Disease/Symptoms: Unknown\nMedications: Penicillin\nAdditional Notes: None"
        );
        assert_eq!(result.title.as_deref(), Some("Prescription - 3/7/2024"));
        assert_eq!(result.provider.as_deref(), Some(""));
    }

    #[test]
    fn advisory_result_omits_absent_fields_in_json() {
        let json = serde_json::to_value(PipelineResult::advisory(NO_TEXT_MESSAGE)).unwrap();
        assert_eq!(json, serde_json::json!({ "text": NO_TEXT_MESSAGE }));
    }

    #[test]
    fn error_classification() {
        let quota: RecognitionError = StructuringError::QuotaExceeded("429".into()).into();
        assert!(quota.is_quota_exceeded());
        assert!(!quota.is_auth_failure());

        let ocr_key: RecognitionError = ExtractionError::OcrAuthentication("bad".into()).into();
        assert!(ocr_key.is_auth_failure());
        assert_eq!(ocr_key.user_message(), INVALID_API_KEY_MESSAGE);

        let other: RecognitionError = ExtractionError::InvalidInput("x".into()).into();
        assert_eq!(other.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn from_config_builds_with_defaults() {
        let p = HandwritingPipeline::from_config(&ServiceConfig::default()).unwrap();
        assert_eq!(p.model(), "gemini-1.5-pro");
    }
}
