//! Google Drive API client.

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use driveocr_common::{Error, RemoteStep, Result};

use super::auth::Tokens;
use crate::provider::CONVERSION_MIME_TYPE;

/// Google Drive API base URL.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
/// Google Drive upload API base URL.
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Multipart boundary for metadata + media uploads.
const BOUNDARY: &str = "driveocr_boundary";

/// Google Drive file metadata from API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID.
    pub id: String,
    /// File name.
    pub name: String,
    /// MIME type after conversion.
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl DriveFile {
    /// Whether Drive converted the upload into a Google Doc.
    pub fn is_converted(&self) -> bool {
        self.mime_type.as_deref() == Some(CONVERSION_MIME_TYPE)
    }
}

/// Google Drive API client holding a bearer token.
pub struct DriveClient {
    http: Client,
    auth: String,
}

impl DriveClient {
    /// Create a new Drive client.
    ///
    /// # Errors
    /// - `Error::Config` if the HTTP client cannot be built
    pub fn new(tokens: &Tokens) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("driveocr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            auth: format!("{} {}", tokens.token_type, tokens.access_token),
        })
    }

    /// Create a file whose content Drive converts into a Google Doc.
    ///
    /// `media_type` describes `data`; `ocr_language` is an ISO 639-1 hint.
    pub async fn create_converted(
        &self,
        name: &str,
        media_type: &str,
        data: &[u8],
        ocr_language: Option<&str>,
    ) -> Result<DriveFile> {
        let url = format!("{}/files?uploadType=multipart", DRIVE_UPLOAD_BASE);

        let metadata = serde_json::json!({
            "name": name,
            "mimeType": CONVERSION_MIME_TYPE,
        });
        let body = multipart_body(&metadata, media_type, data)?;

        let mut request = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, &self.auth)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", BOUNDARY),
            )
            .query(&[("fields", "id,name,mimeType")]);

        if let Some(language) = ocr_language {
            request = request.query(&[("ocrLanguage", language)]);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| Error::remote(RemoteStep::Upload, e.to_string()))?;

        let response = check_status(RemoteStep::Upload, response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::remote(RemoteStep::Upload, format!("Failed to parse response: {}", e)))
    }

    /// Export a Google Doc as plain text.
    pub async fn export_text(&self, file_id: &str) -> Result<String> {
        let url = format!("{}/files/{}/export", DRIVE_API_BASE, file_id);

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, &self.auth)
            .query(&[("mimeType", "text/plain")])
            .send()
            .await
            .map_err(|e| Error::remote(RemoteStep::Export, e.to_string()))?;

        let response = check_status(RemoteStep::Export, response).await?;
        response.text().await.map_err(|e| {
            Error::remote(
                RemoteStep::Export,
                format!("Failed to read export response: {}", e),
            )
        })
    }

    /// Delete a file.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        let url = format!("{}/files/{}", DRIVE_API_BASE, file_id);

        let response = self
            .http
            .delete(&url)
            .header(header::AUTHORIZATION, &self.auth)
            .send()
            .await
            .map_err(|e| Error::remote(RemoteStep::Delete, e.to_string()))?;

        check_status(RemoteStep::Delete, response).await?;
        Ok(())
    }
}

/// Build a `multipart/related` body: JSON metadata part, then the media part.
fn multipart_body(
    metadata: &serde_json::Value,
    media_type: &str,
    data: &[u8],
) -> Result<Vec<u8>> {
    let metadata_json = serde_json::to_string(metadata)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize metadata: {}", e)))?;

    let mut body = Vec::with_capacity(data.len() + metadata_json.len() + 256);

    // Metadata part
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json.as_bytes());
    body.extend_from_slice(b"\r\n");

    // Data part
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", media_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}--", BOUNDARY).as_bytes());

    Ok(body)
}

/// Turn a non-success response into a remote error for `step`.
async fn check_status(step: RemoteStep, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = match status {
        StatusCode::UNAUTHORIZED => "invalid or expired token",
        StatusCode::FORBIDDEN => "access denied",
        StatusCode::NOT_FOUND => "resource not found",
        _ => "API error",
    };

    Err(Error::remote(
        step,
        format!("{} ({}) - {}", reason, status, body.trim()),
    ))
}
