use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// MIME type assumed when a payload carries no `data:` prefix.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// A single uploaded image, decoded and ready for enhancement.
#[derive(Debug, Clone)]
pub struct RecognitionInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Text detected on a page. Empty text is a valid result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
}

impl OcrResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Whitespace-only output counts as "nothing recognized".
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Enhanced image produced by an `ImageEnhancer`.
#[derive(Debug)]
pub struct EnhancedImage {
    /// Grayscale PNG bytes, ready for OCR.
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Prepares raw upload bytes for OCR (contrast, sharpening, grayscale).
///
/// Pure image-to-image transform, no I/O.
pub trait ImageEnhancer: Send + Sync {
    fn enhance(&self, image_bytes: &[u8]) -> Result<EnhancedImage, ExtractionError>;
}

/// Document text detection service abstraction (allows mocking for tests)
pub trait OcrEngine: Send + Sync {
    fn detect_text(&self, image_bytes: &[u8]) -> Result<OcrResult, ExtractionError>;
}
