//! Google Drive document service for driveocr.
//!
//! This module provides:
//! - OAuth2 authorization-code flow with a cached, refreshable token
//! - Multipart upload with conversion to a Google Doc (OCR)
//! - Plain-text export and deletion of the temporary document

pub mod auth;
pub mod cache;
pub mod client;
pub mod prompt;
pub mod provider;
pub mod store;

use std::sync::Arc;

use driveocr_common::{OcrConfig, Result};

pub use auth::{AuthManager, ClientSecrets, TokenExchange, Tokens};
pub use cache::TokenCache;
pub use client::{DriveClient, DriveFile};
pub use prompt::{CodeSource, StdinCodeSource};
pub use provider::GDriveService;
pub use store::CredentialStore;

/// Build an authorized Drive document service for `config`.
///
/// # Errors
/// - `Error::Config` if the credentials file is unreadable or invalid
/// - `Error::Authentication` if no token could be obtained
pub async fn obtain_client(
    config: &OcrConfig,
    code_source: Arc<dyn CodeSource>,
) -> Result<GDriveService> {
    let secrets = ClientSecrets::from_file(config.credentials_path()).await?;
    let exchange = Arc::new(AuthManager::new(&secrets)?);

    let store = CredentialStore::new(
        TokenCache::new(config.token_path()),
        exchange,
        code_source,
    );
    let ocr_language = config.ocr_language().map(str::to_string);

    store
        .connect(|tokens| {
            let client = DriveClient::new(tokens)?;
            Ok(GDriveService::new(client).with_ocr_language(ocr_language))
        })
        .await
}
