//! Application Models

pub mod input;
pub mod settings;
