//! Storage
//!
//! Configuration file persistence.

pub mod config;
