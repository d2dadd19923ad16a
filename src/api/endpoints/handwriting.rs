//! Handwriting recognition endpoint.
//!
//! `POST /api/handwriting/recognize` — receives a data-URI photo of a handwritten
//! note and returns the recognized record draft. The pipeline is blocking (HTTP
//! clients, image processing, scoped threads) so it runs on the blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::extraction::{declared_mime_type, is_supported_image_mime};
use crate::pipeline::handwriting::PipelineResult;
use crate::pipeline::record::{suggest_for_result, MedicalRecordType};

#[derive(Deserialize)]
pub struct RecognizeRequest {
    /// Base64 data URL (e.g., `data:image/jpeg;base64,/9j/...`) or bare base64.
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecognizeResponse {
    #[serde(flatten)]
    pub result: PipelineResult,
    pub suggested_record_type: MedicalRecordType,
}

/// `POST /api/handwriting/recognize`
pub async fn recognize(
    State(ctx): State<ApiContext>,
    payload: Result<Json<RecognizeRequest>, JsonRejection>,
) -> Result<Json<RecognizeResponse>, ApiError> {
    let Json(payload) = payload?;
    let image = payload.image.trim().to_string();
    if image.is_empty() {
        return Err(ApiError::BadRequest("No image provided".into()));
    }
    if let Some(mime) = declared_mime_type(&image) {
        if !is_supported_image_mime(&mime) {
            return Err(ApiError::UnsupportedMediaType(mime));
        }
    }

    tracing::info!(payload_bytes = image.len(), "Handwriting recognition requested");

    let pipeline = ctx.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.recognize(&image)).await?;
    let suggested_record_type = suggest_for_result(&result);

    Ok(Json(RecognizeResponse {
        result,
        suggested_record_type,
    }))
}
