//! Google Drive document service implementation.

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

use driveocr_common::{Error, RemoteHandle, Result};

use crate::provider::{guess_media_type, DocumentService};

use super::client::DriveClient;

/// Google Drive document service.
///
/// Implements the DocumentService trait on top of `DriveClient`.
pub struct GDriveService {
    client: DriveClient,
    ocr_language: Option<String>,
}

impl GDriveService {
    pub fn new(client: DriveClient) -> Self {
        Self {
            client,
            ocr_language: None,
        }
    }

    /// Pass a language hint to the OCR conversion.
    pub fn with_ocr_language(mut self, language: Option<String>) -> Self {
        self.ocr_language = language;
        self
    }
}

#[async_trait]
impl DocumentService for GDriveService {
    fn name(&self) -> &str {
        "gdrive"
    }

    async fn upload(&self, local_path: &Path) -> Result<RemoteHandle> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|source| Error::LocalIo {
                path: local_path.to_path_buf(),
                source,
            })?;

        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let media_type = guess_media_type(local_path);

        debug!("Uploading {} ({} bytes, {})", name, data.len(), media_type);

        let file = self
            .client
            .create_converted(&name, media_type, &data, self.ocr_language.as_deref())
            .await?;

        if !file.is_converted() {
            warn!(
                "Drive stored {} as {:?} instead of a document; export may fail",
                file.name, file.mime_type
            );
        }

        Ok(RemoteHandle::new(file.id, file.name))
    }

    async fn export(&self, handle: &RemoteHandle) -> Result<String> {
        self.client.export_text(&handle.id).await
    }

    async fn delete(&self, handle: &RemoteHandle) -> Result<()> {
        self.client.delete(&handle.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdrive::auth::Tokens;

    #[tokio::test]
    async fn test_missing_file_fails_before_network() {
        let tokens = Tokens {
            access_token: "unused".to_string(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_at: chrono::Utc::now(),
        };
        let service = GDriveService::new(DriveClient::new(&tokens).unwrap());
        let dir = tempfile::TempDir::new().unwrap();

        let err = service
            .upload(&dir.path().join("notes.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LocalIo { .. }));
    }
}
