//! Integration Tests Module
//!
//! End-to-end tests of the public API: the aggregator driven by scripted
//! inference clients, the heuristic-only path, and a full run against a local
//! chat-completions endpoint.

// Shared client doubles and fixtures
mod support;

// Aggregated runs with scripted model replies
mod pipeline_test;

// Heuristic-only runs and determinism
mod fallback_test;

// Runs against a local HTTP endpoint
mod http_test;
