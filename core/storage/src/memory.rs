//! In-memory document service for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use driveocr_common::{Error, RemoteHandle, RemoteStep, Result};

use crate::provider::DocumentService;

#[derive(Debug, Default)]
struct State {
    objects: HashMap<String, Vec<u8>>,
    calls: Vec<RemoteStep>,
    failing: HashSet<RemoteStep>,
    exported_text: Option<String>,
}

/// In-memory document service.
///
/// Uploaded bytes are kept in memory and "converted" by UTF-8 decoding unless
/// a fixed export text is configured. Every remote call is recorded, and any
/// step can be made to fail. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentService {
    state: Arc<RwLock<State>>,
}

impl MemoryDocumentService {
    /// Create a new empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `text` from every export regardless of the uploaded content.
    pub fn with_exported_text(self, text: impl Into<String>) -> Self {
        self.state.write().unwrap().exported_text = Some(text.into());
        self
    }

    /// Make the given step fail with a remote error.
    pub fn failing_on(self, step: RemoteStep) -> Self {
        self.state.write().unwrap().failing.insert(step);
        self
    }

    /// Remote calls made so far, in order.
    pub fn calls(&self) -> Vec<RemoteStep> {
        self.state.read().unwrap().calls.clone()
    }

    /// Number of times `step` was called.
    pub fn call_count(&self, step: RemoteStep) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|s| **s == step)
            .count()
    }

    /// Number of objects currently stored remotely.
    pub fn live_objects(&self) -> usize {
        self.state.read().unwrap().objects.len()
    }

    fn record(&self, step: RemoteStep) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push(step);
        if state.failing.contains(&step) {
            return Err(Error::remote(step, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentService for MemoryDocumentService {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(&self, local_path: &Path) -> Result<RemoteHandle> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|source| Error::LocalIo {
                path: local_path.to_path_buf(),
                source,
            })?;

        self.record(RemoteStep::Upload)?;

        let id = Uuid::new_v4().to_string();
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.state.write().unwrap().objects.insert(id.clone(), data);

        Ok(RemoteHandle::new(id, name))
    }

    async fn export(&self, handle: &RemoteHandle) -> Result<String> {
        self.record(RemoteStep::Export)?;

        let state = self.state.read().unwrap();
        let data = state
            .objects
            .get(&handle.id)
            .ok_or_else(|| Error::remote(RemoteStep::Export, "404 Not Found"))?;

        Ok(match &state.exported_text {
            Some(text) => text.clone(),
            None => String::from_utf8_lossy(data).into_owned(),
        })
    }

    async fn delete(&self, handle: &RemoteHandle) -> Result<()> {
        self.record(RemoteStep::Delete)?;

        self.state
            .write()
            .unwrap()
            .objects
            .remove(&handle.id)
            .map(|_| ())
            .ok_or_else(|| Error::remote(RemoteStep::Delete, "404 Not Found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_export_delete() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "page.txt", b"Hello, World!");
        let service = MemoryDocumentService::new();

        let handle = service.upload(&path).await.unwrap();
        assert_eq!(handle.name, "page.txt");
        assert_eq!(service.live_objects(), 1);

        let text = service.export(&handle).await.unwrap();
        assert_eq!(text, "Hello, World!");

        service.delete(&handle).await.unwrap();
        assert_eq!(service.live_objects(), 0);
        assert_eq!(
            service.calls(),
            vec![RemoteStep::Upload, RemoteStep::Export, RemoteStep::Delete]
        );
    }

    #[tokio::test]
    async fn test_missing_file_makes_no_call() {
        let dir = TempDir::new().unwrap();
        let service = MemoryDocumentService::new();

        let err = service
            .upload(&dir.path().join("missing.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LocalIo { .. }));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "scan.png", &[0x89, 0x50]);
        let service = MemoryDocumentService::new().failing_on(RemoteStep::Upload);

        let err = service.upload(&path).await.unwrap_err();
        assert_eq!(err.remote_step(), Some(RemoteStep::Upload));
        assert_eq!(service.call_count(RemoteStep::Upload), 1);
        assert_eq!(service.live_objects(), 0);
    }

    #[tokio::test]
    async fn test_fixed_export_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "scan.png", &[0xff, 0xd8]);
        let service = MemoryDocumentService::new().with_exported_text("recognized");

        let handle = service.upload(&path).await.unwrap();
        assert_eq!(service.export(&handle).await.unwrap(), "recognized");
    }
}
