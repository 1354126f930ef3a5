//! Integration tests: load bundle directories and push them to an
//! in-memory repository.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use olmoci_core::{OlmError, Result};
use olmoci_runtime::oci::media_type::{BUNDLE_MANIFESTS_LAYER, BUNDLE_METADATA_LAYER};
use olmoci_runtime::{
    push_bundle, ArtifactKind, ArtifactManifest, ArtifactReference, BundleLoader, Descriptor,
    MemoryRepository, Repository,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const TARGET: &str = "quay.io/operatorhubio/etcd-bundle:v0.9.4";

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn bundle_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "manifests/etcdoperator.v0.9.4.clusterserviceversion.yaml",
        "kind: ClusterServiceVersion\nmetadata:\n  name: etcdoperator.v0.9.4\n",
    );
    write(
        dir.path(),
        "manifests/etcdclusters.etcd.database.coreos.com.crd.yaml",
        "kind: CustomResourceDefinition\n",
    );
    write(
        dir.path(),
        "metadata/annotations.yaml",
        "annotations:\n  operators.operatorframework.io.bundle.package.v1: etcd\n  operators.operatorframework.io.bundle.channels.v1: alpha\n",
    );
    dir
}

#[tokio::test]
async fn test_push_bundle_directory() {
    let dir = bundle_dir();
    let payload = BundleLoader::load(dir.path()).unwrap();
    let repo = MemoryRepository::new("quay.io/operatorhubio/etcd-bundle");
    let target = ArtifactReference::parse(TARGET).unwrap();

    let desc = push_bundle(&repo, &payload, &target, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(repo.tagged("v0.9.4"), Some(desc.clone()));
    let manifest = ArtifactManifest::decode(&repo.content(&desc.digest).unwrap()).unwrap();
    assert_eq!(manifest.kind(), Some(ArtifactKind::Bundle));
    assert!(manifest.subject.is_none());

    let media_types: Vec<&str> = manifest.blobs.iter().map(|b| b.media_type.as_str()).collect();
    assert_eq!(media_types, vec![BUNDLE_MANIFESTS_LAYER, BUNDLE_METADATA_LAYER]);
    for blob in &manifest.blobs {
        assert!(repo.content(&blob.digest).is_some());
    }
    assert_eq!(
        manifest
            .annotations
            .get("operators.operatorframework.io.bundle.package.v1")
            .map(String::as_str),
        Some("etcd")
    );
}

#[tokio::test]
async fn test_identical_bundles_yield_same_descriptor() {
    let target = ArtifactReference::parse(TARGET).unwrap();
    let cancel = CancellationToken::new();

    let first_dir = bundle_dir();
    let second_dir = bundle_dir();
    let first_payload = BundleLoader::load(first_dir.path()).unwrap();
    let second_payload = BundleLoader::load(second_dir.path()).unwrap();
    assert_eq!(first_payload, second_payload);

    let repo = MemoryRepository::new("quay.io/operatorhubio/etcd-bundle");
    let first = push_bundle(&repo, &first_payload, &target, &cancel).await.unwrap();
    let objects = repo.len();
    let second = push_bundle(&repo, &second_payload, &target, &cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(repo.len(), objects);

    // Same descriptor in an unrelated repository too
    let other = MemoryRepository::new("localhost:5000/etcd-bundle");
    let third = push_bundle(&other, &first_payload, &target, &cancel).await.unwrap();
    assert_eq!(first, third);
}

#[tokio::test]
async fn test_push_bundle_default_tag() {
    let dir = bundle_dir();
    let payload = BundleLoader::load(dir.path()).unwrap();
    let repo = MemoryRepository::new("quay.io/operatorhubio/etcd-bundle");
    let target = ArtifactReference::parse("quay.io/operatorhubio/etcd-bundle").unwrap();

    let desc = push_bundle(&repo, &payload, &target, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(repo.tagged(target.tag.as_deref().unwrap()), Some(desc));
}

#[tokio::test]
async fn test_bundle_without_manifests_dir() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "metadata/annotations.yaml", "annotations: {}\n");
    let err = BundleLoader::load(dir.path()).unwrap_err();
    assert!(matches!(err, OlmError::FilesystemError { .. }));
}

/// Repository whose tag call never completes.
struct HangingTag {
    inner: MemoryRepository,
}

#[async_trait]
impl Repository for HangingTag {
    fn name(&self) -> String {
        self.inner.name()
    }

    async fn resolve(&self, tag: &str) -> Result<Descriptor> {
        self.inner.resolve(tag).await
    }

    async fn fetch(&self, descriptor: &Descriptor) -> Result<Vec<u8>> {
        self.inner.fetch(descriptor).await
    }

    async fn exists(&self, descriptor: &Descriptor) -> Result<bool> {
        self.inner.exists(descriptor).await
    }

    async fn push(&self, descriptor: &Descriptor, content: &[u8]) -> Result<()> {
        self.inner.push(descriptor, content).await
    }

    async fn tag(&self, _descriptor: &Descriptor, _tag: &str) -> Result<()> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_cancel_during_tag_leaves_no_tag() {
    let dir = bundle_dir();
    let payload = BundleLoader::load(dir.path()).unwrap();
    let inner = MemoryRepository::new("quay.io/operatorhubio/etcd-bundle");
    let repo = HangingTag {
        inner: inner.clone(),
    };
    let target = ArtifactReference::parse(TARGET).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = push_bundle(&repo, &payload, &target, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, OlmError::Cancelled(_)));
    assert!(inner.tagged("v0.9.4").is_none());
    // Content pushed before the tag step stays behind unreferenced
    assert_eq!(inner.len(), 3);
}

#[tokio::test]
async fn test_cancel_before_push_stores_nothing() {
    let dir = bundle_dir();
    let payload = BundleLoader::load(dir.path()).unwrap();
    let repo = MemoryRepository::new("quay.io/operatorhubio/etcd-bundle");
    let target = ArtifactReference::parse(TARGET).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = push_bundle(&repo, &payload, &target, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, OlmError::Cancelled(_)));
    assert!(repo.is_empty());
}
