//! OCI content descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::digest::{Algorithm, Digest};

/// Reference to stored content: media type, digest and size.
///
/// Descriptors are values. A change to the referenced content produces a
/// new descriptor with a new digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    pub media_type: String,

    /// Digest of the referenced content.
    pub digest: Digest,

    /// Size in bytes of the referenced content.
    pub size: i64,

    /// Optional annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,

    /// Fields this codec does not interpret (`artifactType`, `platform`,
    /// `urls`, ...), kept so a copied descriptor encodes unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Descriptor {
    pub fn new(media_type: impl Into<String>, digest: Digest, size: i64) -> Self {
        Self {
            media_type: media_type.into(),
            digest,
            size,
            annotations: None,
            extra: BTreeMap::new(),
        }
    }

    /// Describe `content` exactly as it will be stored.
    ///
    /// This is the one place content identity is computed.
    pub fn of(content: &[u8], media_type: impl Into<String>) -> Self {
        Self::of_with(Algorithm::Sha256, content, media_type)
    }

    /// Like [`Descriptor::of`], hashing with `algorithm`.
    pub fn of_with(algorithm: Algorithm, content: &[u8], media_type: impl Into<String>) -> Self {
        Self::new(
            media_type,
            Digest::compute(algorithm, content),
            content.len() as i64,
        )
    }

    /// Whether `content` is the content this descriptor refers to.
    pub fn matches(&self, content: &[u8]) -> bool {
        self.size == content.len() as i64 && self.digest.matches(content)
    }

    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}
