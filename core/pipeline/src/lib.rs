//! Recognition pipeline for driveocr.
//!
//! Sequences upload → export → delete against a `DocumentService` for a
//! single local file.

pub mod pipeline;

pub use pipeline::{recognize, Pipeline, PipelineState, Recognition};
