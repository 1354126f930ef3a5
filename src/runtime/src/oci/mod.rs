//! OCI artifact graph for OLM content.
//!
//! Catalogs, packages, channels and bundles are stored as OCI artifact
//! manifests. Annotations are attached to any of them by pushing a separate
//! overlay manifest whose `subject` points at the target, so existing
//! content is never rewritten.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Artifact graph                             │
//! │                                                               │
//! │  catalog ──▶ package ──▶ channel ──▶ bundle                   │
//! │     ▲           ▲           ▲          ▲                      │
//! │     └───────────┴─────┬─────┴──────────┘                      │
//! │                       │ subject                               │
//! │                  annotations                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`reference`] parses `registry/repository[:tag][@digest]`
//! - [`resolve`] turns a reference into a [`Descriptor`]
//! - [`manifest`] encodes and decodes artifact manifests
//! - [`graph`] builds overlay and bundle manifests
//! - [`pipeline`] pushes content and binds tags

pub mod bundle;
pub mod credentials;
pub mod descriptor;
pub mod digest;
pub mod graph;
pub mod manifest;
pub mod media_type;
pub mod memory;
pub mod pipeline;
pub mod reference;
pub mod registry;
pub mod repository;
pub mod resolve;

pub use bundle::{load_annotations, BundleBlob, BundleLoader, BundlePayload};
pub use credentials::{Credential, CredentialStore};
pub use descriptor::Descriptor;
pub use digest::{Algorithm, Digest};
pub use graph::{build_annotation_manifest, build_artifact_manifest, build_bundle_manifest, PreparedBlob};
pub use manifest::{ArtifactManifest, PreparedManifest};
pub use media_type::{validate_artifact_type, ArtifactKind};
pub use memory::{CallCounts, MemoryRepository};
pub use pipeline::{annotate, push_and_tag, push_blobs, push_bundle};
pub use reference::ArtifactReference;
pub use registry::{RegistryAuth, RegistryOptions, RemoteRepository};
pub use repository::{cancellable, Repository};
pub use resolve::{parse_name_and_reference, resolve, resolve_name_and_reference, verify_content};
