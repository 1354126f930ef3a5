//! Push and tag pipeline.
//!
//! Every operation here encodes and validates all content before the first
//! push, so a failure never leaves a corrupt manifest behind. A failure
//! after content is pushed but before it is tagged leaves unreferenced
//! content, which content-addressed storage tolerates; nothing is rolled
//! back and nothing is retried.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use olmoci_core::error::{OlmError, Result};
use tokio_util::sync::CancellationToken;

use super::bundle::BundlePayload;
use super::descriptor::Descriptor;
use super::graph::{build_annotation_manifest, build_bundle_manifest, PreparedBlob};
use super::manifest::{ArtifactManifest, PreparedManifest};
use super::media_type::{validate_artifact_type, ARTIFACT_MANIFEST};
use super::reference::ArtifactReference;
use super::repository::{cancellable, Repository};
use super::resolve::{resolve, verify_content};

/// Push `content` unless the repository already holds it.
async fn push_content(
    repo: &dyn Repository,
    descriptor: &Descriptor,
    content: &[u8],
    cancel: &CancellationToken,
) -> Result<()> {
    if cancellable(cancel, "check content", repo.exists(descriptor)).await? {
        tracing::debug!(digest = %descriptor.digest, "Content already present, skipping push");
        return Ok(());
    }
    cancellable(cancel, "push", repo.push(descriptor, content)).await
}

/// Upload blobs concurrently.
///
/// Each blob is addressed by its own digest, so concurrent uploads of
/// distinct blobs never conflict and duplicates converge.
pub async fn push_blobs(
    repo: &dyn Repository,
    blobs: &[PreparedBlob],
    cancel: &CancellationToken,
) -> Result<()> {
    try_join_all(
        blobs
            .iter()
            .map(|blob| push_content(repo, &blob.descriptor, &blob.bytes, cancel)),
    )
    .await?;
    Ok(())
}

/// Push an encoded manifest and optionally bind `tag` to it.
///
/// The tag is bound only after the push succeeded and only if `cancel` has
/// not fired; an interrupted tag call is abandoned, never half-applied.
pub async fn push_and_tag(
    repo: &dyn Repository,
    manifest: &PreparedManifest,
    tag: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Descriptor> {
    let descriptor = manifest.descriptor();
    push_content(repo, descriptor, manifest.bytes(), cancel)
        .await
        .map_err(|e| step_error("push manifest", &repo.name(), e))?;

    if let Some(tag) = tag {
        cancellable(cancel, "tag", repo.tag(descriptor, tag))
            .await
            .map_err(|e| step_error("tag", &format!("{}:{}", repo.name(), tag), e))?;
        tracing::info!(
            repository = %repo.name(),
            tag,
            digest = %descriptor.digest,
            "Tagged manifest"
        );
    }

    Ok(descriptor.clone())
}

/// Attach `annotations` to the artifact at `subject`.
///
/// The subject must be an artifact manifest whose artifact type is a
/// catalog, package, channel or bundle. Nothing is pushed when it is not.
/// The subject itself is never modified; the returned descriptor names a
/// new annotations manifest whose `subject` points at it.
pub async fn annotate(
    repo: &dyn Repository,
    subject: &ArtifactReference,
    annotations: BTreeMap<String, String>,
    cancel: &CancellationToken,
) -> Result<Descriptor> {
    let resolved = resolve(repo, subject, cancel).await?;
    require_artifact_manifest(subject, &resolved)?;

    let content = cancellable(cancel, "fetch subject", repo.fetch(&resolved))
        .await
        .map_err(|e| step_error("fetch subject", &subject.to_string(), e))?;
    let subject_desc = verify_content(&resolved, &content)?;
    require_artifact_manifest(subject, &subject_desc)?;

    let artifact = ArtifactManifest::decode(&content)
        .map_err(|e| step_error("decode subject", &subject.to_string(), e))?;
    let kind = validate_artifact_type(&artifact.artifact_type)?;

    let overlay = build_annotation_manifest(&subject_desc, annotations)?.prepare()?;
    tracing::debug!(
        subject = %subject,
        kind = %kind,
        overlay = %overlay.descriptor().digest,
        "Built annotations manifest"
    );

    let descriptor = push_and_tag(repo, &overlay, None, cancel).await?;
    tracing::info!(
        subject = %subject,
        subject_digest = %subject_desc.digest,
        digest = %descriptor.digest,
        "Annotated artifact"
    );
    Ok(descriptor)
}

/// Push a bundle and tag it with `target`'s tag.
///
/// `target` must not pin a digest; the default tag applies when it names none.
pub async fn push_bundle(
    repo: &dyn Repository,
    payload: &BundlePayload,
    target: &ArtifactReference,
    cancel: &CancellationToken,
) -> Result<Descriptor> {
    if target.is_digest() {
        return Err(OlmError::invalid_reference(
            &target.to_string(),
            "push target must be a tag, not a digest",
        ));
    }
    let tag = target.tag.as_deref().unwrap_or(olmoci_core::DEFAULT_TAG);

    let (manifest, blobs) = build_bundle_manifest(payload)?;
    let prepared = manifest.prepare()?;

    tracing::info!(
        target = %target,
        blobs = blobs.len(),
        digest = %prepared.descriptor().digest,
        "Pushing bundle"
    );
    push_blobs(repo, &blobs, cancel)
        .await
        .map_err(|e| step_error("push bundle blobs", &target.to_string(), e))?;
    push_and_tag(repo, &prepared, Some(tag), cancel).await
}

fn require_artifact_manifest(subject: &ArtifactReference, descriptor: &Descriptor) -> Result<()> {
    if descriptor.media_type != ARTIFACT_MANIFEST {
        return Err(OlmError::UnsupportedArtifactType(format!(
            "{} is a {}, not an artifact manifest",
            subject, descriptor.media_type
        )));
    }
    Ok(())
}

/// Prefix registry and filesystem failures with the step and target.
/// Typed errors callers match on pass through unchanged.
fn step_error(step: &str, target: &str, err: OlmError) -> OlmError {
    match err {
        OlmError::RegistryError { registry, message } => OlmError::RegistryError {
            registry,
            message: format!("{} {}: {}", step, target, message),
        },
        OlmError::Other(message) => OlmError::Other(format!("{} {}: {}", step, target, message)),
        other => other,
    }
}
