//! # Logging — Tracing Subscriber Setup for Embedders
//!
//! Structured logging setup for embedding applications.
//!
//! This crate never calls `init` itself — only the binary that links it
//! should install a global subscriber. Splits between human-readable
//! stderr output and a JSON mode for log aggregators.

/// Install a global `tracing` subscriber. `json` selects
/// `tracing_subscriber::fmt().json()`; otherwise human-readable output is
/// written to stderr. Safe to call at most once per process.
pub fn init(json: bool) {
    if json {
        tracing_subscriber::fmt().json().with_target(false).init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
