//! Medication name correction.
//!
//! Each entry of the model's medication list is split into name + dosage and the name
//! is run through an ordered chain of resolvers (first hit wins):
//! disease dictionary → RxNav terminology lookup → static corrections → unchanged.
//! Nothing in here ever fails the caller.

pub mod types;
pub mod dictionary;
pub mod medication;
pub mod resolvers;
pub mod rxnorm;

pub use types::*;
pub use dictionary::*;
pub use medication::*;
pub use resolvers::*;
pub use rxnorm::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerminologyError {
    #[error("Terminology service is not reachable at {0}")]
    Connection(String),

    #[error("Terminology lookup timed out")]
    Timeout,

    #[error("Terminology service returned status {0}")]
    Service(u16),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Terminology response parsing error: {0}")]
    ResponseParsing(String),
}
