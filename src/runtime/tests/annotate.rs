//! Integration tests: annotate artifacts held in an in-memory repository.
//!
//! Each test seeds a [`MemoryRepository`] with artifact manifests, runs the
//! annotate pipeline against a reference, then inspects what was stored.

use std::collections::BTreeMap;

use olmoci_core::OlmError;
use olmoci_runtime::oci::media_type::{ARTIFACT_MANIFEST, IMAGE_MANIFEST};
use olmoci_runtime::oci::{build_annotation_manifest, build_artifact_manifest, Algorithm};
use olmoci_runtime::{
    annotate, ArtifactKind, ArtifactManifest, ArtifactReference, Descriptor, Digest, MemoryRepository,
};
use tokio_util::sync::CancellationToken;

const REPOSITORY: &str = "quay.io/operatorhubio/etcd";

fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Store an artifact of `kind` and tag it.
fn seed(repo: &MemoryRepository, kind: ArtifactKind, tag: &str) -> Descriptor {
    let manifest = build_artifact_manifest(kind, Vec::new(), None, BTreeMap::new()).unwrap();
    let desc = repo.insert(ARTIFACT_MANIFEST, &manifest.encode().unwrap());
    repo.insert_tag(tag, &desc);
    desc
}

fn reference(suffix: &str) -> ArtifactReference {
    ArtifactReference::parse(&format!("{}{}", REPOSITORY, suffix)).unwrap()
}

#[tokio::test]
async fn test_annotate_bundle_by_digest() {
    let repo = MemoryRepository::new(REPOSITORY);
    let subject = seed(&repo, ArtifactKind::Bundle, "v0.9.4");

    let overlay_desc = annotate(
        &repo,
        &reference(&format!("@{}", subject.digest)),
        annotations(&[("key", "value")]),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let overlay = ArtifactManifest::decode(&repo.content(&overlay_desc.digest).unwrap()).unwrap();
    assert_eq!(overlay.media_type, ARTIFACT_MANIFEST);
    assert_eq!(overlay.artifact_type, ArtifactKind::Annotations.media_type());
    assert_eq!(overlay.subject.as_ref().map(|s| &s.digest), Some(&subject.digest));
    assert_eq!(overlay.annotations, annotations(&[("key", "value")]));
    assert_ne!(overlay_desc.digest, subject.digest);

    // Subject bytes and tag are unchanged
    assert_eq!(repo.tagged("v0.9.4"), Some(subject));
}

#[tokio::test]
async fn test_annotate_every_hierarchy_kind() {
    let repo = MemoryRepository::new(REPOSITORY);
    let cancel = CancellationToken::new();

    for (i, kind) in [
        ArtifactKind::Catalog,
        ArtifactKind::Package,
        ArtifactKind::Channel,
        ArtifactKind::Bundle,
    ]
    .into_iter()
    .enumerate()
    {
        let tag = format!("t{}", i);
        let subject = seed(&repo, kind, &tag);
        let desc = annotate(&repo, &reference(&format!(":{}", tag)), BTreeMap::new(), &cancel)
            .await
            .unwrap();
        let overlay = ArtifactManifest::decode(&repo.content(&desc.digest).unwrap()).unwrap();
        assert_eq!(overlay.subject, Some(subject), "{}", kind);
    }
}

#[tokio::test]
async fn test_annotate_image_manifest_pushes_nothing() {
    let repo = MemoryRepository::new(REPOSITORY);
    let image = repo.insert(
        IMAGE_MANIFEST,
        format!(r#"{{"schemaVersion":2,"mediaType":"{}"}}"#, IMAGE_MANIFEST).as_bytes(),
    );
    repo.insert_tag("latest", &image);

    let err = annotate(
        &repo,
        &reference(":latest"),
        annotations(&[("key", "value")]),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, OlmError::UnsupportedArtifactType(_)));
    assert_eq!(repo.calls().pushes, 0);
    assert_eq!(repo.calls().tags, 0);
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn test_annotate_image_manifest_by_digest_pushes_nothing() {
    let repo = MemoryRepository::new(REPOSITORY);
    let image = repo.insert(
        IMAGE_MANIFEST,
        format!(r#"{{"schemaVersion":2,"mediaType":"{}"}}"#, IMAGE_MANIFEST).as_bytes(),
    );

    let err = annotate(
        &repo,
        &reference(&format!("@{}", image.digest)),
        BTreeMap::new(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, OlmError::UnsupportedArtifactType(_)));
    assert_eq!(repo.calls().pushes, 0);
}

#[tokio::test]
async fn test_annotate_image_manifest_without_media_type() {
    let repo = MemoryRepository::new(REPOSITORY);
    // mediaType is optional in image manifests
    let image = repo.insert(IMAGE_MANIFEST, br#"{"schemaVersion":2,"config":{},"layers":[]}"#);

    let err = annotate(
        &repo,
        &reference(&format!("@{}", image.digest)),
        annotations(&[("key", "value")]),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, OlmError::UnsupportedArtifactType(_)));
    assert_eq!(repo.calls().pushes, 0);
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn test_annotate_by_sha512_digest() {
    let repo = MemoryRepository::new(REPOSITORY);
    let stored = seed(&repo, ArtifactKind::Bundle, "v1");
    let bytes = repo.content(&stored.digest).unwrap();
    let sha512 = Digest::compute(Algorithm::Sha512, &bytes);

    let desc = annotate(
        &repo,
        &reference(&format!("@{}", sha512)),
        annotations(&[("key", "value")]),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let overlay = ArtifactManifest::decode(&repo.content(&desc.digest).unwrap()).unwrap();
    let subject = overlay.subject.unwrap();
    assert_eq!(subject.digest, sha512);
    assert_eq!(subject.size, bytes.len() as i64);
    assert_eq!(subject.media_type, ARTIFACT_MANIFEST);
}

#[tokio::test]
async fn test_annotate_overlay_is_rejected() {
    let repo = MemoryRepository::new(REPOSITORY);
    let bundle = seed(&repo, ArtifactKind::Bundle, "v1");
    let overlay = build_annotation_manifest(&bundle, annotations(&[("a", "b")])).unwrap();
    let overlay_desc = repo.insert(ARTIFACT_MANIFEST, &overlay.encode().unwrap());

    let err = annotate(
        &repo,
        &reference(&format!("@{}", overlay_desc.digest)),
        BTreeMap::new(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OlmError::UnsupportedArtifactType(_)));
    assert_eq!(repo.calls().pushes, 0);
}

#[tokio::test]
async fn test_annotate_twice_is_a_storage_no_op() {
    let repo = MemoryRepository::new(REPOSITORY);
    seed(&repo, ArtifactKind::Channel, "stable");
    let cancel = CancellationToken::new();
    let values = annotations(&[("olm.maxOpenShiftVersion", "4.14")]);

    let first = annotate(&repo, &reference(":stable"), values.clone(), &cancel)
        .await
        .unwrap();
    let second = annotate(&repo, &reference(":stable"), values, &cancel)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(repo.calls().stored, 1);
    assert_eq!(repo.len(), 2);
}

#[tokio::test]
async fn test_annotate_unknown_tag() {
    let repo = MemoryRepository::new(REPOSITORY);
    let err = annotate(&repo, &reference(":missing"), BTreeMap::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OlmError::NotFound(_)));
}

#[tokio::test]
async fn test_annotate_tampered_content() {
    let repo = MemoryRepository::new(REPOSITORY);
    let subject = seed(&repo, ArtifactKind::Bundle, "v1");
    // Tag points at a digest whose content is not stored
    let bogus = Descriptor::of(b"elsewhere", ARTIFACT_MANIFEST);
    repo.insert_tag("broken", &bogus);

    let err = annotate(&repo, &reference(":broken"), BTreeMap::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OlmError::NotFound(_)));
    assert_eq!(repo.tagged("v1"), Some(subject));
}
