//! OAuth2 client configuration and token exchange for Google Drive.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::{BasicClient, BasicTokenResponse},
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use driveocr_common::{Error, Result};

/// OAuth2 authorization endpoint.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// OAuth2 token endpoint.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Access to files created by this application only.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// OAuth2 tokens with expiration tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    /// Access token for API requests.
    pub access_token: String,
    /// Refresh token for obtaining new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// When the access token expires.
    #[serde(alias = "expiry")]
    pub expires_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Tokens {
    /// Check if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        // Consider expired if less than 5 minutes remaining
        self.expires_at < Utc::now() + Duration::minutes(5)
    }

    fn from_response(response: &BasicTokenResponse, previous_refresh: Option<&str>) -> Self {
        let expires_in = response
            .expires_in()
            .unwrap_or_else(|| std::time::Duration::from_secs(3600));
        let expires_at =
            Utc::now() + Duration::from_std(expires_in).unwrap_or_else(|_| Duration::hours(1));

        // Refresh responses usually omit the refresh token
        let refresh_token = response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous_refresh.map(str::to_string));

        Self {
            access_token: response.access_token().secret().clone(),
            refresh_token,
            token_type: default_token_type(),
            expires_at,
        }
    }
}

/// OAuth2 client configuration as downloaded from the Google Cloud console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a client secret document with an `installed` or `web` section.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Unable to parse client secret file: {}", e)))?;

        file.installed.or(file.web).ok_or_else(|| {
            Error::Config("Client secret file has no 'installed' or 'web' section".to_string())
        })
    }

    /// Read and parse the client secret file.
    ///
    /// # Errors
    /// - `Error::Config` if the file is unreadable or malformed
    pub async fn from_file(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!(
                "Unable to read client secret file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&json)
    }
}

/// Server side of the authorization-code flow.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// URL the operator visits to grant access.
    fn authorization_url(&self) -> String;

    /// Exchange a pasted authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> Result<Tokens>;

    /// Obtain a fresh access token from the refresh token in `tokens`.
    async fn refresh(&self, tokens: &Tokens) -> Result<Tokens>;
}

type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// OAuth2 authentication manager for Google Drive.
pub struct AuthManager {
    client: GoogleClient,
    http: oauth2::reqwest::Client,
}

impl AuthManager {
    /// Create a new authentication manager from client secrets.
    ///
    /// The first redirect URI is used; installed-app secrets list the
    /// out-of-band or loopback URI there.
    ///
    /// # Errors
    /// - `Error::Config` for missing redirect URIs or malformed endpoints
    pub fn new(secrets: &ClientSecrets) -> Result<Self> {
        let redirect_uri = secrets
            .redirect_uris
            .first()
            .ok_or_else(|| Error::Config("Client secret file has no redirect_uris".to_string()))?;

        let client = BasicClient::new(ClientId::new(secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(secrets.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(secrets.auth_uri.clone())
                    .map_err(|e| Error::Config(format!("Invalid auth URL: {}", e)))?,
            )
            .set_token_uri(
                TokenUrl::new(secrets.token_uri.clone())
                    .map_err(|e| Error::Config(format!("Invalid token URL: {}", e)))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.clone())
                    .map_err(|e| Error::Config(format!("Invalid redirect URL: {}", e)))?,
            );

        let http = oauth2::reqwest::ClientBuilder::new()
            .redirect(oauth2::reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, http })
    }
}

#[async_trait]
impl TokenExchange for AuthManager {
    fn authorization_url(&self) -> String {
        let (auth_url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_FILE_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        auth_url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<Tokens> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                Error::Authentication(format!("Unable to retrieve token from web: {}", e))
            })?;

        Ok(Tokens::from_response(&response, None))
    }

    async fn refresh(&self, tokens: &Tokens) -> Result<Tokens> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or_else(|| Error::Authentication("No refresh token cached".to_string()))?;

        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| Error::Authentication(format!("Token refresh failed: {}", e)))?;

        Ok(Tokens::from_response(&response, Some(refresh_token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALLED_SECRETS: &str = r#"{
        "installed": {
            "client_id": "test_id.apps.googleusercontent.com",
            "project_id": "ocr-test",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_secret": "test_secret",
            "redirect_uris": ["urn:ietf:wg:oauth:2.0:oob", "http://localhost"]
        }
    }"#;

    #[test]
    fn test_tokens_expiration() {
        let tokens = Tokens {
            access_token: "test".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now() - Duration::hours(1),
        };

        assert!(tokens.is_expired());

        let valid_tokens = Tokens {
            expires_at: Utc::now() + Duration::hours(1),
            ..tokens
        };

        assert!(!valid_tokens.is_expired());
    }

    #[test]
    fn test_tokens_near_expiration() {
        // Token expiring in 4 minutes should be considered expired (5 min buffer)
        let tokens = Tokens {
            access_token: "test".to_string(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_at: Utc::now() + Duration::minutes(4),
        };

        assert!(tokens.is_expired());
    }

    #[test]
    fn test_tokens_accept_expiry_alias() {
        let json = r#"{
            "access_token": "ya29.a0",
            "token_type": "Bearer",
            "refresh_token": "1//0g",
            "expiry": "2030-01-02T03:04:05.123456+09:00"
        }"#;

        let tokens: Tokens = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//0g"));
        assert!(!tokens.is_expired());
    }

    #[test]
    fn test_client_secrets_installed() {
        let secrets = ClientSecrets::from_json(INSTALLED_SECRETS).unwrap();
        assert_eq!(secrets.client_id, "test_id.apps.googleusercontent.com");
        assert_eq!(secrets.redirect_uris[0], "urn:ietf:wg:oauth:2.0:oob");
    }

    #[test]
    fn test_client_secrets_web_with_default_endpoints() {
        let json = r#"{"web": {"client_id": "id", "client_secret": "s", "redirect_uris": ["http://localhost:8080"]}}"#;
        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.token_uri, GOOGLE_TOKEN_URL);
        assert_eq!(secrets.auth_uri, GOOGLE_AUTH_URL);
    }

    #[test]
    fn test_client_secrets_rejects_unknown_layout() {
        let err = ClientSecrets::from_json(r#"{"client_id": "id"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ClientSecrets::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_client_secrets_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ClientSecrets::from_file(&dir.path().join("credentials.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_auth_manager_requires_redirect_uri() {
        let mut secrets = ClientSecrets::from_json(INSTALLED_SECRETS).unwrap();
        secrets.redirect_uris.clear();
        assert!(matches!(AuthManager::new(&secrets), Err(Error::Config(_))));
    }

    #[test]
    fn test_authorization_url_generation() {
        let secrets = ClientSecrets::from_json(INSTALLED_SECRETS).unwrap();
        let manager = AuthManager::new(&secrets).unwrap();
        let url = manager.authorization_url();

        assert!(url.contains("accounts.google.com"));
        assert!(url.contains("client_id=test_id.apps.googleusercontent.com"));
        assert!(url.contains("drive.file"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("response_type=code"));
    }
}
