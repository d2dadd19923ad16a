//! HTTP surface for handwriting recognition.
//!
//! `api_router()` returns a `Router` with every endpoint nested under `/api/`;
//! `server::serve()` binds it and runs until Ctrl-C.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::serve;
pub use types::ApiContext;
