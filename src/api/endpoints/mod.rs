//! API endpoint handlers.

pub mod handwriting;
pub mod health;
