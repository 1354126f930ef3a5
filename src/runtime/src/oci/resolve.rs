//! Reference resolution.
//!
//! Turns a parsed reference into a descriptor. Tags are mutable and cost one
//! read against the repository; digests are already concrete and resolve
//! locally.

use olmoci_core::error::{OlmError, Result};
use tokio_util::sync::CancellationToken;

use super::descriptor::Descriptor;
use super::media_type::{declared_media_type, ARTIFACT_MANIFEST};
use super::reference::ArtifactReference;
use super::registry::{RegistryOptions, RemoteRepository};
use super::repository::{cancellable, Repository};

/// Resolve `reference` against `repo`.
///
/// A digest reference (with or without a tag) makes no repository call and
/// yields a provisional descriptor: the artifact manifest media type and a
/// size of 0. Use [`verify_content`] once the bytes are fetched to obtain
/// the exact descriptor. A tag-only reference costs exactly one
/// [`Repository::resolve`] call.
pub async fn resolve(
    repo: &dyn Repository,
    reference: &ArtifactReference,
    cancel: &CancellationToken,
) -> Result<Descriptor> {
    if let Some(ref digest) = reference.digest {
        tracing::debug!(reference = %reference, "Resolved by digest");
        return Ok(Descriptor::new(ARTIFACT_MANIFEST, digest.clone(), 0));
    }

    let tag = reference
        .tag
        .as_deref()
        .ok_or_else(|| OlmError::invalid_reference(&reference.to_string(), "no tag or digest"))?;
    let descriptor = cancellable(cancel, "resolve", repo.resolve(tag)).await?;
    tracing::debug!(
        reference = %reference,
        digest = %descriptor.digest,
        media_type = %descriptor.media_type,
        "Resolved tag"
    );
    Ok(descriptor)
}

/// Describe fetched `content`, checking it against the descriptor it was
/// fetched by.
///
/// The digest is recomputed with the algorithm of the expected digest. The
/// media type is the one the document declares; a document that declares
/// none is an image manifest.
pub fn verify_content(expected: &Descriptor, content: &[u8]) -> Result<Descriptor> {
    let actual = Descriptor::of_with(
        expected.digest.algorithm(),
        content,
        declared_media_type(content),
    );

    if actual.digest != expected.digest {
        return Err(OlmError::MalformedManifest(format!(
            "content digest {} does not match {}",
            actual.digest, expected.digest
        )));
    }
    Ok(actual)
}

/// Parse `reference` and open its repository. No network call.
pub fn parse_name_and_reference(
    reference: &str,
    options: &RegistryOptions,
) -> Result<(RemoteRepository, ArtifactReference)> {
    let parsed = options.parse_reference(reference)?;
    let repo = RemoteRepository::new(&parsed, options);
    Ok((repo, parsed))
}

/// Parse `reference`, open its repository and resolve it to a descriptor.
pub async fn resolve_name_and_reference(
    reference: &str,
    options: &RegistryOptions,
    cancel: &CancellationToken,
) -> Result<(RemoteRepository, ArtifactReference, Descriptor)> {
    let (repo, parsed) = parse_name_and_reference(reference, options)?;
    let descriptor = resolve(&repo, &parsed, cancel).await?;
    Ok((repo, parsed, descriptor))
}
