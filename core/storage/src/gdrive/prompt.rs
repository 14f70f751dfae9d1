//! Operator prompt for the out-of-band authorization code.

use async_trait::async_trait;
use std::fmt;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use driveocr_common::{Error, Result};

/// Source of the authorization code the operator obtains in a browser.
///
/// This is the only point where a run suspends on the outside world.
#[async_trait]
pub trait CodeSource: Send + Sync {
    /// Present `authorization_url` and wait for the pasted code.
    async fn read_code(&self, authorization_url: &str) -> Result<String>;
}

/// Opens the line reader the code is read from.
pub type ReaderFactory = Arc<dyn Fn() -> Box<dyn BufRead + Send> + Send + Sync>;

/// Reads the code from the first whitespace-delimited word of one line.
///
/// The line is read on a detached thread, so a timed-out read never keeps
/// the runtime from shutting down.
#[derive(Clone)]
pub struct StdinCodeSource {
    reader: ReaderFactory,
    timeout: Option<Duration>,
    open_browser: bool,
}

impl StdinCodeSource {
    pub fn new() -> Self {
        Self::with_reader(|| Box::new(BufReader::new(std::io::stdin())))
    }

    /// Read from `reader` instead of stdin.
    pub fn with_reader<F>(reader: F) -> Self
    where
        F: Fn() -> Box<dyn BufRead + Send> + Send + Sync + 'static,
    {
        Self {
            reader: Arc::new(reader),
            timeout: None,
            open_browser: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    async fn read_line(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let reader = self.reader.clone();

        std::thread::Builder::new()
            .name("auth-code-reader".to_string())
            .spawn(move || {
                let mut line = String::new();
                let result = reader().read_line(&mut line).map(|_| line);
                // Receiver is gone once the prompt timed out
                let _ = tx.send(result);
            })
            .map_err(|e| Error::Authentication(format!("Unable to read authorization code: {}", e)))?;

        rx.await
            .map_err(|_| Error::Authentication("Authorization code reader stopped".to_string()))?
            .map_err(|e| Error::Authentication(format!("Unable to read authorization code: {}", e)))
    }
}

impl Default for StdinCodeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdinCodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdinCodeSource")
            .field("timeout", &self.timeout)
            .field("open_browser", &self.open_browser)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CodeSource for StdinCodeSource {
    async fn read_code(&self, authorization_url: &str) -> Result<String> {
        eprintln!(
            "Go to the following link in your browser then type the authorization code:\n{}",
            authorization_url
        );

        if self.open_browser {
            if let Err(e) = open::that(authorization_url) {
                warn!("Failed to open browser: {}", e);
            }
        }

        let line = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.read_line())
                .await
                .map_err(|_| {
                    Error::Authentication(format!(
                        "No authorization code entered within {}s",
                        timeout.as_secs()
                    ))
                })??,
            None => self.read_line().await?,
        };

        let code = parse_code(&line)?;
        debug!("Read authorization code ({} chars)", code.len());
        Ok(code)
    }
}

fn parse_code(line: &str) -> Result<String> {
    line.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| Error::Authentication("Empty authorization code".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::time::Instant;

    /// Never yields a byte, like a terminal nobody types into.
    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            loop {
                std::thread::park();
            }
        }
    }

    fn silent_source() -> StdinCodeSource {
        StdinCodeSource::with_reader(|| Box::new(BufReader::new(Silent)))
    }

    #[test]
    fn test_parse_code_trims() {
        assert_eq!(parse_code("  4/0AbCd-ef \n").unwrap(), "4/0AbCd-ef");
        assert_eq!(parse_code("4/xyz trailing words").unwrap(), "4/xyz");
    }

    #[test]
    fn test_parse_code_empty() {
        assert!(matches!(parse_code(""), Err(Error::Authentication(_))));
        assert!(matches!(parse_code("   \n"), Err(Error::Authentication(_))));
    }

    #[tokio::test]
    async fn test_read_code_from_reader() {
        let source =
            StdinCodeSource::with_reader(|| Box::new(Cursor::new(b"  4/code\n".to_vec())));

        let code = source.read_code("https://auth.example").await.unwrap();
        assert_eq!(code, "4/code");
    }

    #[tokio::test]
    async fn test_closed_input_is_authentication_error() {
        let source = StdinCodeSource::with_reader(|| Box::new(Cursor::new(Vec::new())));

        let err = source.read_code("https://auth.example").await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_authentication_error() {
        let source = silent_source().with_timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();

        let err = source.read_code("https://auth.example").await.unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timed_out_read_does_not_block_shutdown() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let source = silent_source().with_timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();

        let result = runtime.block_on(source.read_code("https://auth.example"));
        drop(runtime);

        assert!(matches!(result, Err(Error::Authentication(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
