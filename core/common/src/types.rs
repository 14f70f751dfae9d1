//! Common types used throughout driveocr.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the OAuth client secret file.
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
/// Default location of the token cache.
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Run configuration, built once by the front-end and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    credentials_path: PathBuf,
    token_path: PathBuf,
    ocr_language: Option<String>,
    auth_timeout: Option<Duration>,
    open_browser: bool,
}

impl OcrConfig {
    /// Create a configuration from the two file-system paths.
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            ocr_language: None,
            auth_timeout: None,
            open_browser: false,
        }
    }

    /// Set the language hint passed to the OCR conversion (ISO 639-1).
    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.ocr_language = Some(language.into());
        self
    }

    /// Bound the wait for a pasted authorization code.
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = Some(timeout);
        self
    }

    /// Launch the authorization URL in the default browser.
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    pub fn ocr_language(&self) -> Option<&str> {
        self.ocr_language.as_deref()
    }

    pub fn auth_timeout(&self) -> Option<Duration> {
        self.auth_timeout
    }

    pub fn open_browser(&self) -> bool {
        self.open_browser
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIALS_PATH, DEFAULT_TOKEN_PATH)
    }
}

/// Identifier of an uploaded object on the document service.
///
/// Exists for the duration of one pipeline run only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteHandle {
    /// Service-assigned object id.
    pub id: String,
    /// Object name as stored remotely.
    pub name: String,
}

impl RemoteHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// The remote call a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteStep {
    Upload,
    Export,
    Delete,
}

impl RemoteStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Export => "export",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for RemoteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_paths() {
        let config = OcrConfig::default();
        assert_eq!(config.credentials_path(), Path::new("credentials.json"));
        assert_eq!(config.token_path(), Path::new("token.json"));
        assert!(config.ocr_language().is_none());
        assert!(config.auth_timeout().is_none());
        assert!(!config.open_browser());
    }

    #[test]
    fn test_config_builder() {
        let config = OcrConfig::new("/etc/ocr/creds.json", "/tmp/tok.json")
            .with_ocr_language("ja")
            .with_auth_timeout(Duration::from_secs(30))
            .with_open_browser(true);

        assert_eq!(config.token_path(), Path::new("/tmp/tok.json"));
        assert_eq!(config.ocr_language(), Some("ja"));
        assert_eq!(config.auth_timeout(), Some(Duration::from_secs(30)));
        assert!(config.open_browser());
    }

    #[test]
    fn test_remote_handle_display() {
        let handle = RemoteHandle::new("1AbC", "notes.png");
        assert_eq!(handle.to_string(), "notes.png (1AbC)");
    }
}
