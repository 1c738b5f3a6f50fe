//! Client for the external text-generation service.
//!
//! Backends perform single requests; [`GenerationClient`] owns the retry and
//! recovery contract and the shared [`RateLimiter`].
mod backend;
mod client;
mod gemini;
mod rate_limit;
mod response;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{GenerationClient, Structured};
pub use rate_limit::RateLimiter;
pub use response::{extract_json, plain_text, ResponseShape};
