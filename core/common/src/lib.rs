//! Common utilities and types shared across driveocr crates.
//!
//! This module provides the error taxonomy and the small value types that
//! flow between the credential store, the Drive client and the pipeline.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{OcrConfig, RemoteHandle, RemoteStep};
