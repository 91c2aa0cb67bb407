//! HTTP networking module
//!
//! Provides the HTTP client and retry pacing used for every backend call.

mod backoff;
mod client;

pub use backoff::{Backoff, RetriesExhausted};
pub use client::{BackendResponse, HttpClient};
