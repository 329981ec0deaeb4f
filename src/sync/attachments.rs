//! Resolution of attachment references queued with offline notes.
//!
//! A reference is an opaque handle recorded when the note was written. By the
//! time the note is pushed the underlying resource may be gone; callers drop
//! such attachments instead of failing the note.

use async_trait::async_trait;
use std::path::Path;

use crate::backend::Attachment;

/// A queued attachment whose source can no longer be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Attachment {reference} is unreadable: {reason}")]
pub struct AttachmentError {
    pub reference: String,
    pub reason: String,
}

/// Turns attachment references into uploadable bytes.
#[async_trait]
pub trait AttachmentResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<Attachment, AttachmentError>;
}

/// Resolves references as local file paths (`/path/img.jpg` or `file:///path/img.jpg`).
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAttachmentResolver;

#[async_trait]
impl AttachmentResolver for FsAttachmentResolver {
    async fn resolve(&self, reference: &str) -> Result<Attachment, AttachmentError> {
        let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
        let bytes = tokio::fs::read(path).await.map_err(|e| AttachmentError {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| "upload.jpg".to_string());

        Ok(Attachment { filename, bytes })
    }
}
