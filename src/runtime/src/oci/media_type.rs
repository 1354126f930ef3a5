//! Media types and the OLM artifact kinds.
//!
//! The OLM hierarchy is catalog → package → channel → bundle. A fifth kind,
//! the annotations overlay, is only ever produced here and never accepted
//! as the subject of another overlay.

use olmoci_core::error::{OlmError, Result};

/// OCI artifact manifest media type.
pub const ARTIFACT_MANIFEST: &str = "application/vnd.oci.artifact.manifest.v1+json";

/// OCI image manifest media type.
pub const IMAGE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// OCI image index media type.
pub const IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Docker schema 2 manifest media type.
pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Docker manifest list media type.
pub const DOCKER_MANIFEST_LIST: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";

/// Media types the registry may answer with when a manifest is requested.
pub const MANIFEST_MEDIA_TYPES: &[&str] = &[
    ARTIFACT_MANIFEST,
    IMAGE_MANIFEST,
    IMAGE_INDEX,
    DOCKER_MANIFEST,
    DOCKER_MANIFEST_LIST,
];

/// Bundle `manifests/` directory packed as tar+gzip.
pub const BUNDLE_MANIFESTS_LAYER: &str =
    "application/vnd.cncf.operatorframework.olm.bundle.manifests.v1.tar+gzip";

/// Bundle `metadata/` directory packed as tar+gzip.
pub const BUNDLE_METADATA_LAYER: &str =
    "application/vnd.cncf.operatorframework.olm.bundle.metadata.v1.tar+gzip";

/// Media type a manifest document declares in its `mediaType` field.
///
/// Image manifests may omit the field, so a document without it is taken to
/// be an image manifest, never an artifact manifest.
pub fn declared_media_type(bytes: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|v| v.get("mediaType").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| IMAGE_MANIFEST.to_string())
}

/// Whether content of this media type is stored as a manifest (as opposed to a blob).
pub fn is_manifest(media_type: &str) -> bool {
    MANIFEST_MEDIA_TYPES.contains(&media_type)
}

/// Kind of an OLM artifact, carried in `artifactType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Catalog,
    Package,
    Channel,
    Bundle,
    /// Metadata overlay attached to another artifact through `subject`.
    Annotations,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Catalog,
        ArtifactKind::Package,
        ArtifactKind::Channel,
        ArtifactKind::Bundle,
        ArtifactKind::Annotations,
    ];

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Catalog => "application/vnd.cncf.operatorframework.olm.catalog.v1",
            Self::Package => "application/vnd.cncf.operatorframework.olm.package.v1",
            Self::Channel => "application/vnd.cncf.operatorframework.olm.channel.v1",
            Self::Bundle => "application/vnd.cncf.operatorframework.olm.bundle.v1",
            Self::Annotations => "application/vnd.cncf.operatorframework.olm.annotations.v1",
        }
    }

    /// Recognise any of the five kinds.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.media_type() == media_type)
    }

    /// Only hierarchy artifacts may be annotated; overlays may not, so
    /// referrer graphs never contain annotation chains.
    pub fn can_annotate(&self) -> bool {
        !matches!(self, Self::Annotations)
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Package => write!(f, "package"),
            Self::Channel => write!(f, "channel"),
            Self::Bundle => write!(f, "bundle"),
            Self::Annotations => write!(f, "annotations"),
        }
    }
}

/// Validate that `media_type` names an artifact that may be annotated.
///
/// Accepts catalog, package, channel and bundle. The overlay type and any
/// other artifact type fail with `UnsupportedArtifactType`.
pub fn validate_artifact_type(media_type: &str) -> Result<ArtifactKind> {
    match ArtifactKind::from_media_type(media_type) {
        Some(kind) if kind.can_annotate() => Ok(kind),
        Some(kind) => Err(OlmError::UnsupportedArtifactType(format!(
            "{} artifacts cannot be annotated",
            kind
        ))),
        None => Err(OlmError::UnsupportedArtifactType(format!(
            "'{}' is not a catalog, package, channel, or bundle",
            media_type
        ))),
    }
}
