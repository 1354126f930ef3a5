//! Artifact graph construction.
//!
//! New artifacts are linked to existing ones only through the `subject`
//! field of the new manifest; the subject's bytes are never touched. The
//! builders are pure: the same inputs always encode to the same bytes.

use std::collections::BTreeMap;

use olmoci_core::error::{OlmError, Result};

use super::bundle::BundlePayload;
use super::descriptor::Descriptor;
use super::manifest::ArtifactManifest;
use super::media_type::{ArtifactKind, ARTIFACT_MANIFEST};

/// Blob content paired with its descriptor.
#[derive(Debug, Clone)]
pub struct PreparedBlob {
    pub descriptor: Descriptor,
    pub bytes: Vec<u8>,
}

impl PreparedBlob {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            descriptor: Descriptor::of(&bytes, media_type),
            bytes,
        }
    }
}

/// Build an artifact manifest of `kind`.
pub fn build_artifact_manifest(
    kind: ArtifactKind,
    blobs: Vec<Descriptor>,
    subject: Option<Descriptor>,
    annotations: BTreeMap<String, String>,
) -> Result<ArtifactManifest> {
    if kind == ArtifactKind::Annotations && subject.is_none() {
        return Err(OlmError::InvalidAnnotations(
            "an annotations artifact must have a subject".to_string(),
        ));
    }
    validate_annotation_keys(&annotations)?;

    Ok(ArtifactManifest {
        media_type: ARTIFACT_MANIFEST.to_string(),
        artifact_type: kind.media_type().to_string(),
        blobs,
        subject,
        annotations,
        extra: BTreeMap::new(),
    })
}

/// Build an annotations overlay for `subject`.
///
/// The subject descriptor is copied as given; callers confirm its kind with
/// [`validate_artifact_type`](super::media_type::validate_artifact_type)
/// first. An empty mapping is allowed and still yields a distinct artifact
/// recording the link.
pub fn build_annotation_manifest(
    subject: &Descriptor,
    annotations: BTreeMap<String, String>,
) -> Result<ArtifactManifest> {
    build_artifact_manifest(
        ArtifactKind::Annotations,
        Vec::new(),
        Some(subject.clone()),
        annotations,
    )
}

/// Build a bundle manifest from a loaded payload.
///
/// Bundles are roots of the hierarchy and carry no subject. Blob order
/// follows the payload.
pub fn build_bundle_manifest(
    payload: &BundlePayload,
) -> Result<(ArtifactManifest, Vec<PreparedBlob>)> {
    if payload.blobs.is_empty() {
        return Err(OlmError::InvalidBundle(
            "bundle payload contains no blobs".to_string(),
        ));
    }

    let blobs: Vec<PreparedBlob> = payload
        .blobs
        .iter()
        .map(|blob| PreparedBlob::new(blob.media_type.clone(), blob.data.clone()))
        .collect();
    let descriptors = blobs.iter().map(|b| b.descriptor.clone()).collect();

    let manifest = build_artifact_manifest(
        ArtifactKind::Bundle,
        descriptors,
        None,
        payload.annotations.clone(),
    )?;
    Ok((manifest, blobs))
}

fn validate_annotation_keys(annotations: &BTreeMap<String, String>) -> Result<()> {
    if annotations.keys().any(|k| k.is_empty()) {
        return Err(OlmError::InvalidAnnotations(
            "annotation keys must be non-empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oci::bundle::BundleBlob;
    use crate::oci::digest::Digest;
    use crate::oci::media_type::{BUNDLE_MANIFESTS_LAYER, BUNDLE_METADATA_LAYER};

    fn bundle_subject() -> Descriptor {
        Descriptor::new(
            ARTIFACT_MANIFEST,
            format!("sha256:{}", "a".repeat(64)).parse::<Digest>().unwrap(),
            512,
        )
    }

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_annotation_manifest_shape() {
        let subject = bundle_subject();
        let manifest =
            build_annotation_manifest(&subject, annotations(&[("key", "value")])).unwrap();

        assert_eq!(manifest.media_type, ARTIFACT_MANIFEST);
        assert_eq!(manifest.artifact_type, ArtifactKind::Annotations.media_type());
        assert!(manifest.blobs.is_empty());
        assert_eq!(manifest.subject.as_ref(), Some(&subject));
        assert_eq!(manifest.annotations, annotations(&[("key", "value")]));

        let prepared = manifest.prepare().unwrap();
        assert_ne!(prepared.descriptor().digest, subject.digest);
    }

    #[test]
    fn test_annotation_manifest_is_deterministic() {
        let subject = bundle_subject();
        let a = build_annotation_manifest(&subject, annotations(&[("b", "2"), ("a", "1")]))
            .unwrap()
            .prepare()
            .unwrap();
        let b = build_annotation_manifest(&subject, annotations(&[("a", "1"), ("b", "2")]))
            .unwrap()
            .prepare()
            .unwrap();
        assert_eq!(a.bytes(), b.bytes());
        assert_eq!(a.descriptor(), b.descriptor());
    }

    #[test]
    fn test_empty_annotations_still_link() {
        let subject = bundle_subject();
        let manifest = build_annotation_manifest(&subject, BTreeMap::new()).unwrap();
        assert!(manifest.annotations.is_empty());
        assert_eq!(manifest.subject, Some(subject));
        assert!(manifest.prepare().is_ok());
    }

    #[test]
    fn test_different_annotations_different_digest() {
        let subject = bundle_subject();
        let empty = build_annotation_manifest(&subject, BTreeMap::new())
            .unwrap()
            .prepare()
            .unwrap();
        let filled = build_annotation_manifest(&subject, annotations(&[("k", "v")]))
            .unwrap()
            .prepare()
            .unwrap();
        assert_ne!(empty.descriptor().digest, filled.descriptor().digest);
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = build_annotation_manifest(&bundle_subject(), annotations(&[("", "v")]))
            .unwrap_err();
        assert!(matches!(err, OlmError::InvalidAnnotations(_)));
    }

    #[test]
    fn test_whitespace_key_accepted() {
        // Only empty keys are invalid; the codec decodes what the builder produces
        let manifest =
            build_annotation_manifest(&bundle_subject(), annotations(&[(" ", "v")])).unwrap();
        let bytes = manifest.encode().unwrap();
        assert_eq!(ArtifactManifest::decode(&bytes).unwrap(), manifest);
    }

    #[test]
    fn test_overlay_requires_subject() {
        let err = build_artifact_manifest(
            ArtifactKind::Annotations,
            Vec::new(),
            None,
            BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, OlmError::InvalidAnnotations(_)));
    }

    #[test]
    fn test_bundle_manifest() {
        let payload = BundlePayload {
            blobs: vec![
                BundleBlob::new(BUNDLE_MANIFESTS_LAYER, b"manifests".to_vec()),
                BundleBlob::new(BUNDLE_METADATA_LAYER, b"metadata".to_vec()),
            ],
            annotations: annotations(&[("operators.operatorframework.io.bundle.package.v1", "etcd")]),
        };

        let (manifest, blobs) = build_bundle_manifest(&payload).unwrap();
        assert_eq!(manifest.artifact_type, ArtifactKind::Bundle.media_type());
        assert!(manifest.subject.is_none());
        assert_eq!(manifest.blobs.len(), 2);
        assert_eq!(manifest.blobs[0].media_type, BUNDLE_MANIFESTS_LAYER);
        assert_eq!(manifest.blobs[1].digest, Digest::sha256(b"metadata"));
        assert_eq!(blobs[0].bytes, b"manifests");
        assert_eq!(
            manifest.annotations["operators.operatorframework.io.bundle.package.v1"],
            "etcd"
        );
    }

    #[test]
    fn test_empty_bundle_rejected() {
        let payload = BundlePayload::default();
        assert!(matches!(
            build_bundle_manifest(&payload),
            Err(OlmError::InvalidBundle(_))
        ));
    }
}
