//! Artifact reference parsing.
//!
//! Parses references like `quay.io/olm/etcd-bundle:v0.9.4` into structured
//! components. Parsing is purely syntactic; no registry is contacted.

use olmoci_core::config::{DEFAULT_REGISTRY, DEFAULT_TAG};
use olmoci_core::error::{OlmError, Result};

use super::digest::Digest;

/// Longest tag a registry accepts.
const MAX_TAG_LEN: usize = 128;

/// Parsed artifact reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    /// Registry hostname (e.g., "quay.io", "localhost:5000")
    pub registry: String,
    /// Repository path (e.g., "olm/etcd-bundle")
    pub repository: String,
    /// Tag (e.g., "latest", "v0.9.4")
    pub tag: Option<String>,
    /// Digest; takes precedence over the tag when both are present
    pub digest: Option<Digest>,
}

impl ArtifactReference {
    /// Parse a reference string with the built-in defaults.
    ///
    /// Supports formats:
    /// - `etcd` → docker.io/library/etcd:latest
    /// - `olm/etcd:v1` → docker.io/olm/etcd:v1
    /// - `quay.io/olm/etcd` → quay.io/olm/etcd:latest
    /// - `quay.io/olm/etcd@sha256:abc...` → digest only
    /// - `quay.io/olm/etcd:v1@sha256:abc...` → tag and digest
    pub fn parse(reference: &str) -> Result<Self> {
        Self::parse_with_defaults(reference, DEFAULT_REGISTRY, DEFAULT_TAG)
    }

    /// Parse a reference string, filling in the given registry and tag defaults.
    pub fn parse_with_defaults(
        reference: &str,
        default_registry: &str,
        default_tag: &str,
    ) -> Result<Self> {
        let input = reference.trim();
        if input.is_empty() {
            return Err(OlmError::invalid_reference(reference, "empty reference"));
        }

        // Split off digest first (@ separator)
        let (name_tag, digest) = match input.split_once('@') {
            Some((name_tag, digest_part)) => {
                if digest_part.contains('@') {
                    return Err(OlmError::invalid_reference(
                        reference,
                        "more than one '@' separator",
                    ));
                }
                let digest: Digest = digest_part
                    .parse()
                    .map_err(|e: String| OlmError::invalid_reference(reference, e))?;
                (name_tag, Some(digest))
            }
            None => (input, None),
        };

        // Split tag on the last colon after the last slash; a numeric suffix
        // without a slash is a registry port, not a tag.
        let last_segment_start = name_tag.rfind('/').map(|p| p + 1).unwrap_or(0);
        let (name, tag) = match name_tag[last_segment_start..].rfind(':') {
            Some(colon) => {
                let colon = last_segment_start + colon;
                let after_colon = &name_tag[colon + 1..];
                let is_port = last_segment_start == 0
                    && !after_colon.is_empty()
                    && after_colon.chars().all(|c| c.is_ascii_digit());
                if is_port {
                    (name_tag, None)
                } else {
                    (&name_tag[..colon], Some(after_colon.to_string()))
                }
            }
            None => (name_tag, None),
        };

        if let Some(ref tag) = tag {
            validate_tag(reference, tag)?;
        }

        let (registry, repository) = split_registry_repository(reference, name, default_registry)?;

        // Apply default tag if no tag and no digest
        let tag = if tag.is_none() && digest.is_none() {
            Some(default_tag.to_string())
        } else {
            tag
        };

        Ok(ArtifactReference {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// `registry/repository` without tag or digest.
    pub fn name(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }

    /// Whether the reference pins content by digest.
    pub fn is_digest(&self) -> bool {
        self.digest.is_some()
    }

    /// Same repository, pinned to `digest`, without a tag.
    pub fn with_digest(&self, digest: Digest) -> Self {
        Self {
            registry: self.registry.clone(),
            repository: self.repository.clone(),
            tag: None,
            digest: Some(digest),
        }
    }

    /// Get the full reference string.
    pub fn full_reference(&self) -> String {
        let mut s = self.name();
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(&digest.to_string());
        }
        s
    }
}

impl std::fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}

impl std::str::FromStr for ArtifactReference {
    type Err = OlmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Tags are `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`.
fn validate_tag(reference: &str, tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(OlmError::invalid_reference(reference, "empty tag"));
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(OlmError::invalid_reference(
            reference,
            format!("tag longer than {} characters", MAX_TAG_LEN),
        ));
    }
    let mut chars = tag.chars();
    let first_ok = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !first_ok || !rest_ok {
        return Err(OlmError::invalid_reference(
            reference,
            format!("invalid tag '{}'", tag),
        ));
    }
    Ok(())
}

/// Split a name into registry and repository components.
fn split_registry_repository(
    reference: &str,
    name: &str,
    default_registry: &str,
) -> Result<(String, String)> {
    // The first component is a registry host when it contains a dot or
    // colon, or is "localhost"
    let (registry, repository) = match name.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (first.to_string(), rest.to_string())
        }
        _ if name.contains('/') || default_registry != DEFAULT_REGISTRY => {
            (default_registry.to_string(), name.to_string())
        }
        // Single name like "etcd" → "library/etcd" on Docker Hub
        _ => (default_registry.to_string(), format!("library/{}", name)),
    };

    if repository.is_empty() {
        return Err(OlmError::invalid_reference(reference, "empty repository name"));
    }
    validate_repository(reference, &repository)?;
    Ok((registry, repository))
}

/// Repository path components are lowercase alphanumerics joined by `.`, `_`, `__` or `-`.
fn validate_repository(reference: &str, repository: &str) -> Result<()> {
    for component in repository.split('/') {
        let valid = !component.is_empty()
            && component
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
            && component.starts_with(|c: char| c.is_ascii_alphanumeric())
            && component.ends_with(|c: char| c.is_ascii_alphanumeric());
        if !valid {
            return Err(OlmError::invalid_reference(
                reference,
                format!("invalid repository name '{}'", repository),
            ));
        }
    }
    Ok(())
}
