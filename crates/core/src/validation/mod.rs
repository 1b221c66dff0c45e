//! Ordered request validation.
//!
//! A [`Pipeline`] runs named steps in order. Each step receives the request
//! input and the context built so far, and returns the next context or the
//! first error. Later steps never run once one fails.

mod pipeline;

pub use pipeline::{Pipeline, ValidationError};
