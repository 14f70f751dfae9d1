//! Document service trait definition.

use async_trait::async_trait;
use std::path::Path;

use driveocr_common::{RemoteHandle, Result};

/// Mime type that makes Google Drive convert an upload into a Google Doc.
pub const CONVERSION_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Remote document service that performs OCR as a side effect of conversion.
///
/// Implementations handle their own authentication. None of the operations
/// retry.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Get the service name (e.g., "gdrive", "memory").
    fn name(&self) -> &str;

    /// Upload a local file with a conversion-triggering mime type.
    ///
    /// # Postconditions
    /// - A remote object exists and must later be passed to `delete`
    ///
    /// # Errors
    /// - `Error::LocalIo` if the file cannot be read; no remote call is made
    /// - `Error::Remote` with step `Upload` if the create call fails
    async fn upload(&self, local_path: &Path) -> Result<RemoteHandle>;

    /// Export the converted object as plain text.
    ///
    /// The text is returned exactly as the service produced it.
    ///
    /// # Errors
    /// - `Error::Remote` with step `Export`
    async fn export(&self, handle: &RemoteHandle) -> Result<String>;

    /// Remove the remote object.
    ///
    /// # Errors
    /// - `Error::Remote` with step `Delete`
    async fn delete(&self, handle: &RemoteHandle) -> Result<()>;
}

/// Guess the media type of a local file from its extension.
///
/// Drive needs an image or PDF media type on the upload body to run OCR.
pub fn guess_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
