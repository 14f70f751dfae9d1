//! Document service abstraction for driveocr.
//!
//! Recognition is delegated to a remote document service: the file is
//! uploaded with a conversion-triggering mime type, the converted document is
//! exported as plain text, and the remote copy is deleted.
//!
//! # Design Principles
//! - Provider isolation: the pipeline only sees the `DocumentService` trait
//! - Injectable seams: token exchange and the authorization prompt are traits
//! - Unified error semantics: every failure names the step that produced it

pub mod gdrive;
pub mod memory;
pub mod provider;

pub use memory::MemoryDocumentService;
pub use provider::DocumentService;
