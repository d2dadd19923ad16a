pub mod types;
pub mod prompt;
pub mod parser;
pub mod gemini;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use gemini::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Language model service is not reachable at {0}")]
    Connection(String),

    #[error("Language model quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid or missing API key: {0}")]
    InvalidApiKey(String),

    #[error("Language model returned error (status {status}): {body}")]
    ServiceError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
