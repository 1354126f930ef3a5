//! In-memory repository.
//!
//! Holds content and tags in process memory. Clones share the same state,
//! so a test can hand one clone to the pipeline and inspect another. Call
//! counters record how many times each capability was used.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use olmoci_core::error::{OlmError, Result};
use parking_lot::RwLock;

use super::descriptor::Descriptor;
use super::digest::Digest;
use super::repository::Repository;

/// Number of calls made against a [`MemoryRepository`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub resolves: usize,
    pub fetches: usize,
    pub exists: usize,
    /// Push calls, including no-op pushes of content already stored.
    pub pushes: usize,
    /// Pushes that actually stored new content.
    pub stored: usize,
    pub tags: usize,
}

#[derive(Debug, Default)]
struct Inner {
    content: HashMap<Digest, (Descriptor, Vec<u8>)>,
    tags: HashMap<String, Descriptor>,
    calls: CallCounts,
}

impl Inner {
    /// Stored bytes for `digest`, whatever algorithm it was computed with.
    fn lookup(&self, digest: &Digest) -> Option<&[u8]> {
        self.content
            .get(digest)
            .or_else(|| self.content.values().find(|(_, bytes)| digest.matches(bytes)))
            .map(|(_, bytes)| bytes.as_slice())
    }
}

/// Repository backed by process memory.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    name: String,
    inner: Arc<RwLock<Inner>>,
}

impl MemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Store content directly, bypassing call counting.
    pub fn insert(&self, media_type: &str, content: &[u8]) -> Descriptor {
        let descriptor = Descriptor::of(content, media_type);
        self.inner.write().content.insert(
            descriptor.digest.clone(),
            (descriptor.clone(), content.to_vec()),
        );
        descriptor
    }

    /// Bind a tag directly, bypassing call counting.
    pub fn insert_tag(&self, tag: &str, descriptor: &Descriptor) {
        self.inner
            .write()
            .tags
            .insert(tag.to_string(), descriptor.clone());
    }

    /// Descriptor currently bound to `tag`.
    pub fn tagged(&self, tag: &str) -> Option<Descriptor> {
        self.inner.read().tags.get(tag).cloned()
    }

    /// Stored content for `digest`.
    pub fn content(&self, digest: &Digest) -> Option<Vec<u8>> {
        self.inner.read().lookup(digest).map(<[u8]>::to_vec)
    }

    /// Number of distinct stored objects.
    pub fn len(&self) -> usize {
        self.inner.read().content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn calls(&self) -> CallCounts {
        self.inner.read().calls
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn resolve(&self, tag: &str) -> Result<Descriptor> {
        let mut inner = self.inner.write();
        inner.calls.resolves += 1;
        inner
            .tags
            .get(tag)
            .cloned()
            .ok_or_else(|| OlmError::NotFound(format!("{}:{}", self.name, tag)))
    }

    async fn fetch(&self, descriptor: &Descriptor) -> Result<Vec<u8>> {
        let mut inner = self.inner.write();
        inner.calls.fetches += 1;
        inner
            .lookup(&descriptor.digest)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| OlmError::NotFound(format!("{}@{}", self.name, descriptor.digest)))
    }

    async fn exists(&self, descriptor: &Descriptor) -> Result<bool> {
        let mut inner = self.inner.write();
        inner.calls.exists += 1;
        Ok(inner.lookup(&descriptor.digest).is_some())
    }

    async fn push(&self, descriptor: &Descriptor, content: &[u8]) -> Result<()> {
        if !descriptor.matches(content) {
            return Err(OlmError::Conflict(format!(
                "content does not match descriptor {} ({} bytes)",
                descriptor.digest, descriptor.size
            )));
        }

        let mut inner = self.inner.write();
        inner.calls.pushes += 1;
        if inner.lookup(&descriptor.digest).is_none() {
            inner.calls.stored += 1;
            inner.content.insert(
                descriptor.digest.clone(),
                (descriptor.clone(), content.to_vec()),
            );
        }
        Ok(())
    }

    async fn tag(&self, descriptor: &Descriptor, tag: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner.calls.tags += 1;
        if inner.lookup(&descriptor.digest).is_none() {
            return Err(OlmError::NotFound(format!(
                "cannot tag {}:{}: {} is not stored",
                self.name, tag, descriptor.digest
            )));
        }
        inner.tags.insert(tag.to_string(), descriptor.clone());
        Ok(())
    }
}
