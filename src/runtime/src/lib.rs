//! olmoci Runtime - OLM artifacts on OCI registries.
//!
//! Reference resolution, the artifact manifest codec, graph construction
//! and the push/tag pipeline, backed by either a remote registry or an
//! in-memory repository.

pub mod oci;

// Re-export common types
pub use oci::{annotate, push_bundle, resolve, verify_content};
pub use oci::{ArtifactKind, ArtifactManifest, ArtifactReference, Descriptor, Digest};
pub use oci::{BundleLoader, BundlePayload, CredentialStore, MemoryRepository};
pub use oci::{RegistryAuth, RegistryOptions, RemoteRepository, Repository};

/// olmoci runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
