//! Handwriting-to-record pipeline.
//!
//! extraction (decode, enhance, OCR) → structuring (prompt, model, field parsing)
//! → correction (medication names) → handwriting (orchestration) → record (type hint).

pub mod extraction;
pub mod structuring;
pub mod correction;
pub mod handwriting;
pub mod record;
