pub mod types;
pub mod input;
pub mod preprocess;
pub mod ocr;

pub use types::*;
pub use input::*;
pub use preprocess::*;
pub use ocr::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Invalid image data: {0}")]
    InvalidInput(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR service is not reachable: {0}")]
    OcrConnection(String),

    #[error("OCR service rejected the API key: {0}")]
    OcrAuthentication(String),

    #[error("OCR service returned error (status {status}): {body}")]
    OcrService { status: u16, body: String },

    #[error("OCR response parsing error: {0}")]
    ResponseParsing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
