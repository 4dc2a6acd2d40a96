//! Utilities
//!
//! Error types and path helpers shared by the application layer.

pub mod error;
pub mod paths;
