//! Repository capability.
//!
//! Everything that touches a registry goes through [`Repository`], passed
//! explicitly into each operation. Content is addressed by descriptor; tags
//! are the only mutable names.

use std::future::Future;

use async_trait::async_trait;
use olmoci_core::error::{OlmError, Result};
use tokio_util::sync::CancellationToken;

use super::descriptor::Descriptor;

/// A content-addressed store with mutable tags.
#[async_trait]
pub trait Repository: Send + Sync {
    /// `registry/repository`, used in logs and errors.
    fn name(&self) -> String;

    /// Resolve a tag to the descriptor it currently points at.
    async fn resolve(&self, tag: &str) -> Result<Descriptor>;

    /// Fetch the content a descriptor refers to.
    async fn fetch(&self, descriptor: &Descriptor) -> Result<Vec<u8>>;

    /// Whether content with this descriptor's digest is already stored.
    async fn exists(&self, descriptor: &Descriptor) -> Result<bool>;

    /// Store `content` under `descriptor`. Pushing content that is already
    /// stored succeeds without changing anything.
    async fn push(&self, descriptor: &Descriptor, content: &[u8]) -> Result<()>;

    /// Bind `tag` to `descriptor`, replacing any previous binding.
    async fn tag(&self, descriptor: &Descriptor, tag: &str) -> Result<()>;
}

/// Run `fut` unless `cancel` fires first.
///
/// When the token fires the in-flight future is dropped and `Cancelled` is
/// returned; `step` names what was interrupted.
pub async fn cancellable<T, F>(cancel: &CancellationToken, step: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(OlmError::Cancelled(step.to_string()));
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(step, "Operation cancelled");
            Err(OlmError::Cancelled(step.to_string()))
        }
        result = fut => result,
    }
}
