//! Artifact manifest codec.
//!
//! Decoding is strict about the fields the artifact graph depends on and
//! keeps any other top-level field as an opaque JSON value. Encoding is
//! deterministic: fields are written in a fixed order, maps are sorted, and
//! no whitespace is emitted, so equal manifests always produce equal digests.

use std::collections::BTreeMap;

use olmoci_core::error::{OlmError, Result};
use serde::{Deserialize, Serialize};

use super::descriptor::Descriptor;
use super::media_type::{ArtifactKind, ARTIFACT_MANIFEST};

/// OCI artifact manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactManifest {
    /// Always [`ARTIFACT_MANIFEST`].
    pub media_type: String,

    /// Kind of artifact this manifest describes.
    pub artifact_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blobs: Vec<Descriptor>,

    /// Artifact this manifest refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Top-level fields this codec does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ArtifactManifest {
    /// Decode manifest bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let manifest: ArtifactManifest = serde_json::from_slice(bytes)
            .map_err(|e| OlmError::MalformedManifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Encode to the exact bytes that will be stored.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;
        Ok(serde_json::to_vec(self)?)
    }

    /// Kind named by `artifactType`, if it is one of the OLM kinds.
    pub fn kind(&self) -> Option<ArtifactKind> {
        ArtifactKind::from_media_type(&self.artifact_type)
    }

    /// Encode and describe, ready to push.
    pub fn prepare(self) -> Result<PreparedManifest> {
        let bytes = self.encode()?;
        let descriptor = Descriptor::of(&bytes, ARTIFACT_MANIFEST);
        Ok(PreparedManifest {
            manifest: self,
            bytes,
            descriptor,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.media_type != ARTIFACT_MANIFEST {
            return Err(OlmError::MalformedManifest(format!(
                "mediaType must be '{}', got '{}'",
                ARTIFACT_MANIFEST, self.media_type
            )));
        }
        if self.artifact_type.is_empty() {
            return Err(OlmError::MalformedManifest(
                "artifactType must not be empty".to_string(),
            ));
        }
        if self.kind() == Some(ArtifactKind::Annotations) && self.subject.is_none() {
            return Err(OlmError::MalformedManifest(
                "annotations artifact requires a subject".to_string(),
            ));
        }
        if self.annotations.keys().any(|k| k.is_empty()) {
            return Err(OlmError::MalformedManifest(
                "annotation keys must not be empty".to_string(),
            ));
        }
        for desc in self.blobs.iter().chain(self.subject.iter()) {
            if desc.size < 0 {
                return Err(OlmError::MalformedManifest(format!(
                    "descriptor {} has negative size {}",
                    desc.digest, desc.size
                )));
            }
        }
        Ok(())
    }
}

/// A manifest together with its encoded bytes and descriptor.
#[derive(Debug, Clone)]
pub struct PreparedManifest {
    manifest: ArtifactManifest,
    bytes: Vec<u8>,
    descriptor: Descriptor,
}

impl PreparedManifest {
    pub fn manifest(&self) -> &ArtifactManifest {
        &self.manifest
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}
