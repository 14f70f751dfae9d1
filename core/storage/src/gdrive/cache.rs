//! On-disk token cache.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

use driveocr_common::{Error, Result};

use super::auth::Tokens;

/// File permissions for the token cache (owner read/write only).
#[cfg(unix)]
const TOKEN_FILE_MODE: u32 = 0o600;

/// JSON token cache persisted across runs.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the cached tokens.
    ///
    /// # Errors
    /// - `Error::Io` if the file is missing or unreadable
    /// - `Error::Serialization` if the content is not a token record
    pub async fn load(&self) -> Result<Tokens> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let tokens = serde_json::from_str(&content)?;
        Ok(tokens)
    }

    /// Write the tokens, replacing any previous content.
    ///
    /// # Postconditions
    /// - On Unix the file mode is `0600`, also when the file already existed
    ///
    /// # Errors
    /// - `Error::CacheWrite` on any failure
    pub async fn save(&self, tokens: &Tokens) -> Result<()> {
        info!("Saving credential file to: {}", self.path.display());

        self.write(tokens)
            .await
            .map_err(|e| Error::CacheWrite(format!("{}: {}", self.path.display(), e)))
    }

    async fn write(&self, tokens: &Tokens) -> std::io::Result<()> {
        let content = serde_json::to_vec_pretty(tokens)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(TOKEN_FILE_MODE);

        let mut file = options.open(&self.path).await?;

        // mode() only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(TOKEN_FILE_MODE))
                .await?;
        }

        file.write_all(&content).await?;
        file.flush().await?;
        Ok(())
    }
}
