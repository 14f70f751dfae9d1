//! Upload → export → delete state machine.

use std::path::Path;
use tracing::{debug, info, warn};

use driveocr_common::{Error, RemoteHandle, Result};
use driveocr_storage::DocumentService;

/// Where a pipeline run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    /// Remote object exists and must be deleted.
    Uploaded(RemoteHandle),
    /// Text obtained, remote object still exists.
    Exported { handle: RemoteHandle, text: String },
    /// Remote object removed; carries the extracted text.
    Deleted(String),
    Failed,
}

/// Result of a run whose upload and export succeeded.
#[derive(Debug)]
pub struct Recognition {
    /// Text exactly as exported by the service.
    pub text: String,
    /// Set when the remote copy could not be deleted.
    pub cleanup_warning: Option<Error>,
}

/// Single-shot recognition of one local file.
pub struct Pipeline<'a> {
    service: &'a dyn DocumentService,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(service: &'a dyn DocumentService) -> Self {
        Self {
            service,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Recognize the text in `local_path`.
    ///
    /// # Preconditions
    /// - State is `Idle`
    ///
    /// # Postconditions
    /// - Once upload succeeded, delete has been attempted exactly once
    /// - Extracted text is never dropped because delete failed
    ///
    /// # Errors
    /// - `Error::LocalIo` if the file cannot be read (no remote call made)
    /// - `Error::Remote` for a failed upload or export
    pub async fn run(&mut self, local_path: &Path) -> Result<Recognition> {
        if self.state != PipelineState::Idle {
            return Err(Error::InvalidInput(
                "Pipeline has already run".to_string(),
            ));
        }

        debug!(path = %local_path.display(), service = self.service.name(), "Uploading");
        let handle = match self.service.upload(local_path).await {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(e)),
        };
        info!(handle = %handle, "Uploaded");
        self.state = PipelineState::Uploaded(handle.clone());

        let text = match self.service.export(&handle).await {
            Ok(text) => text,
            Err(e) => {
                if let Err(cleanup) = self.service.delete(&handle).await {
                    warn!(handle = %handle, "Remote copy left behind: {}", cleanup);
                }
                return Err(self.fail(e));
            }
        };
        info!(handle = %handle, chars = text.chars().count(), "Exported");
        self.state = PipelineState::Exported {
            handle: handle.clone(),
            text: text.clone(),
        };

        let cleanup_warning = match self.service.delete(&handle).await {
            Ok(()) => {
                debug!(handle = %handle, "Deleted");
                self.state = PipelineState::Deleted(text.clone());
                None
            }
            Err(e) => {
                warn!(handle = %handle, "Remote copy left behind: {}", e);
                self.state = PipelineState::Failed;
                Some(e)
            }
        };

        Ok(Recognition {
            text,
            cleanup_warning,
        })
    }

    fn fail(&mut self, error: Error) -> Error {
        self.state = PipelineState::Failed;
        error
    }
}

/// Run a fresh pipeline for `local_path` against `service`.
pub async fn recognize(service: &dyn DocumentService, local_path: &Path) -> Result<Recognition> {
    Pipeline::new(service).run(local_path).await
}
