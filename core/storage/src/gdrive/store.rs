//! Credential store: cached tokens with an interactive fallback.

use std::sync::Arc;
use tracing::{debug, info, warn};

use driveocr_common::Result;

use super::auth::{TokenExchange, Tokens};
use super::cache::TokenCache;
use super::prompt::CodeSource;

/// Produces a usable token, from the cache when possible.
pub struct CredentialStore {
    cache: TokenCache,
    exchange: Arc<dyn TokenExchange>,
    code_source: Arc<dyn CodeSource>,
}

impl CredentialStore {
    pub fn new(
        cache: TokenCache,
        exchange: Arc<dyn TokenExchange>,
        code_source: Arc<dyn CodeSource>,
    ) -> Self {
        Self {
            cache,
            exchange,
            code_source,
        }
    }

    /// Get a valid token.
    ///
    /// An unreadable or malformed cache, or an expired token that cannot be
    /// refreshed, falls through to the interactive exchange. Every freshly
    /// obtained token is written back to the cache before it is returned.
    ///
    /// # Errors
    /// - `Error::Authentication` if the code cannot be read or exchanged
    pub async fn authorize(&self) -> Result<Tokens> {
        match self.cache.load().await {
            Ok(tokens) if !tokens.is_expired() => {
                debug!("Using cached token from {}", self.cache.path().display());
                return Ok(tokens);
            }
            Ok(tokens) if tokens.refresh_token.is_some() => {
                info!("Refreshing expired access token");
                match self.exchange.refresh(&tokens).await {
                    Ok(fresh) => {
                        self.persist(&fresh).await;
                        return Ok(fresh);
                    }
                    Err(e) => warn!("{}; requesting a new authorization", e),
                }
            }
            Ok(_) => debug!("Cached token expired and has no refresh token"),
            Err(e) => debug!(
                "No usable token cache at {}: {}",
                self.cache.path().display(),
                e
            ),
        }

        let url = self.exchange.authorization_url();
        let code = self.code_source.read_code(&url).await?;
        let tokens = self.exchange.exchange_code(&code).await?;

        self.persist(&tokens).await;
        Ok(tokens)
    }

    /// Authorize, then build a client from the token.
    ///
    /// `build` runs only after the token has been written back to the cache,
    /// so no document call can precede the cache update.
    pub async fn connect<S, F>(&self, build: F) -> Result<S>
    where
        F: FnOnce(&Tokens) -> Result<S>,
    {
        let tokens = self.authorize().await?;
        build(&tokens)
    }

    async fn persist(&self, tokens: &Tokens) {
        // Next run re-authorizes, this one can continue
        if let Err(e) = self.cache.save(tokens).await {
            warn!("{}", e);
        }
    }
}
