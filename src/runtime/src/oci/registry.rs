//! Remote repository over the OCI distribution API.
//!
//! Uses the `oci-distribution` crate to talk to registries (Quay, GHCR,
//! Docker Hub, a local `registry:2`, ...).

use std::sync::Arc;

use async_trait::async_trait;
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::errors::OciDistributionError;
use oci_distribution::manifest::OciDescriptor;
use oci_distribution::secrets::RegistryAuth as OciRegistryAuth;
use oci_distribution::{Client, Reference, RegistryOperation};
use olmoci_core::config::OlmConfig;
use olmoci_core::error::{OlmError, Result};

use super::credentials::{Credential, CredentialStore};
use super::descriptor::Descriptor;
use super::media_type::{declared_media_type, is_manifest, MANIFEST_MEDIA_TYPES};
use super::reference::ArtifactReference;
use super::repository::Repository;

/// Authentication credentials for a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    credential: Option<Credential>,
}

impl RegistryAuth {
    /// No credentials.
    pub fn anonymous() -> Self {
        Self { credential: None }
    }

    /// Basic authentication with username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credential: Some(Credential {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// Reads `OLMOCI_REGISTRY_USERNAME` and `OLMOCI_REGISTRY_PASSWORD`,
    /// anonymous when either is unset.
    pub fn from_env() -> Self {
        match (
            std::env::var("OLMOCI_REGISTRY_USERNAME"),
            std::env::var("OLMOCI_REGISTRY_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => Self::basic(username, password),
            _ => Self::anonymous(),
        }
    }

    /// Credential store first, then environment, then anonymous.
    pub fn from_credential_store(registry: &str) -> Self {
        if let Ok(store) = CredentialStore::default_path() {
            match store.get(registry) {
                Ok(Some(credential)) => {
                    return Self {
                        credential: Some(credential),
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(registry, error = %e, "Ignoring credential store"),
            }
        }
        Self::from_env()
    }

    pub fn is_anonymous(&self) -> bool {
        self.credential.is_none()
    }

    fn to_oci_auth(&self) -> OciRegistryAuth {
        match &self.credential {
            Some(c) => OciRegistryAuth::Basic(c.username.clone(), c.password.clone()),
            None => OciRegistryAuth::Anonymous,
        }
    }
}

/// How to reach registries.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Fixed credentials; when unset they are looked up per registry.
    pub auth: Option<RegistryAuth>,
    /// Use plain HTTP for every registry.
    pub plain_http: bool,
    pub config: OlmConfig,
}

impl RegistryOptions {
    pub fn new(config: OlmConfig) -> Self {
        Self {
            auth: None,
            plain_http: false,
            config,
        }
    }

    /// Parse `reference` with the configured defaults.
    pub fn parse_reference(&self, reference: &str) -> Result<ArtifactReference> {
        ArtifactReference::parse_with_defaults(
            reference,
            &self.config.default_registry,
            &self.config.default_tag,
        )
    }

    fn auth_for(&self, registry: &str) -> RegistryAuth {
        self.auth
            .clone()
            .unwrap_or_else(|| RegistryAuth::from_credential_store(registry))
    }

    fn protocol_for(&self, registry: &str) -> ClientProtocol {
        if self.plain_http || self.config.is_insecure(registry) {
            ClientProtocol::Http
        } else {
            ClientProtocol::Https
        }
    }
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self::new(OlmConfig::default())
    }
}

/// One repository on a remote registry.
#[derive(Clone)]
pub struct RemoteRepository {
    registry: String,
    repository: String,
    client: Arc<Client>,
    auth: RegistryAuth,
}

impl RemoteRepository {
    /// Create a handle for the repository named by `reference`. No network call.
    pub fn new(reference: &ArtifactReference, options: &RegistryOptions) -> Self {
        let config = ClientConfig {
            protocol: options.protocol_for(&reference.registry),
            ..Default::default()
        };
        Self {
            registry: reference.registry.clone(),
            repository: reference.repository.clone(),
            client: Arc::new(Client::new(config)),
            auth: options.auth_for(&reference.registry),
        }
    }

    fn tag_reference(&self, tag: &str) -> Reference {
        Reference::with_tag(self.registry.clone(), self.repository.clone(), tag.to_string())
    }

    fn digest_reference(&self, descriptor: &Descriptor) -> Reference {
        Reference::with_digest(
            self.registry.clone(),
            self.repository.clone(),
            descriptor.digest.to_string(),
        )
    }

    fn map_err(&self, what: &str, err: OciDistributionError) -> OlmError {
        match err {
            OciDistributionError::ImageManifestNotFoundError(message) => {
                OlmError::NotFound(format!("{}: {}", what, message))
            }
            other => OlmError::registry(&self.registry, format!("{}: {}", what, other)),
        }
    }

    async fn authenticate(&self, reference: &Reference, operation: RegistryOperation) -> Result<()> {
        self.client
            .auth(reference, &self.auth.to_oci_auth(), operation)
            .await
            .map_err(|e| self.map_err("authenticate", e))?;
        Ok(())
    }

    async fn pull_manifest(&self, reference: &Reference) -> Result<(Vec<u8>, String)> {
        self.client
            .pull_manifest_raw(reference, &self.auth.to_oci_auth(), MANIFEST_MEDIA_TYPES)
            .await
            .map_err(|e| self.map_err(&format!("pull manifest {}", reference), e))
    }
}

#[async_trait]
impl Repository for RemoteRepository {
    fn name(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }

    async fn resolve(&self, tag: &str) -> Result<Descriptor> {
        let reference = self.tag_reference(tag);
        tracing::debug!(reference = %reference, "Resolving tag");

        let (bytes, digest) = self.pull_manifest(&reference).await?;
        let descriptor = Descriptor::of(&bytes, declared_media_type(&bytes));
        if descriptor.digest.to_string() != digest {
            return Err(OlmError::registry(
                &self.registry,
                format!(
                    "registry reported digest {} for {} but content hashes to {}",
                    digest, reference, descriptor.digest
                ),
            ));
        }
        Ok(descriptor)
    }

    async fn fetch(&self, descriptor: &Descriptor) -> Result<Vec<u8>> {
        let reference = self.digest_reference(descriptor);
        if is_manifest(&descriptor.media_type) {
            let (bytes, _) = self.pull_manifest(&reference).await?;
            return Ok(bytes);
        }

        let layer = OciDescriptor {
            media_type: descriptor.media_type.clone(),
            digest: descriptor.digest.to_string(),
            size: descriptor.size,
            ..Default::default()
        };
        let mut data: Vec<u8> = Vec::new();
        self.authenticate(&reference, RegistryOperation::Pull).await?;
        self.client
            .pull_blob(&reference, &layer, &mut data)
            .await
            .map_err(|e| self.map_err(&format!("pull blob {}", descriptor.digest), e))?;
        Ok(data)
    }

    async fn exists(&self, _descriptor: &Descriptor) -> Result<bool> {
        // Registries deduplicate uploads by digest, so always push.
        Ok(false)
    }

    async fn push(&self, descriptor: &Descriptor, content: &[u8]) -> Result<()> {
        let reference = self.digest_reference(descriptor);
        self.authenticate(&reference, RegistryOperation::Push).await?;

        if is_manifest(&descriptor.media_type) {
            let content_type = http::HeaderValue::from_str(&descriptor.media_type).map_err(|e| {
                OlmError::registry(&self.registry, format!("invalid media type: {}", e))
            })?;
            self.client
                .push_manifest_raw(&reference, content.to_vec(), content_type)
                .await
                .map_err(|e| self.map_err(&format!("push manifest {}", descriptor.digest), e))?;
        } else {
            self.client
                .push_blob(&reference, content, &descriptor.digest.to_string())
                .await
                .map_err(|e| self.map_err(&format!("push blob {}", descriptor.digest), e))?;
        }

        tracing::debug!(
            repository = %self.name(),
            digest = %descriptor.digest,
            size = descriptor.size,
            "Pushed content"
        );
        Ok(())
    }

    async fn tag(&self, descriptor: &Descriptor, tag: &str) -> Result<()> {
        if !is_manifest(&descriptor.media_type) {
            return Err(OlmError::UnsupportedArtifactType(format!(
                "only manifests can be tagged, got {}",
                descriptor.media_type
            )));
        }

        let (bytes, _) = self.pull_manifest(&self.digest_reference(descriptor)).await?;
        if !descriptor.matches(&bytes) {
            return Err(OlmError::Conflict(format!(
                "{} does not hold the content of {}",
                self.name(),
                descriptor.digest
            )));
        }

        let reference = self.tag_reference(tag);
        self.authenticate(&reference, RegistryOperation::Push).await?;
        let content_type = http::HeaderValue::from_str(&descriptor.media_type).map_err(|e| {
            OlmError::registry(&self.registry, format!("invalid media type: {}", e))
        })?;
        self.client
            .push_manifest_raw(&reference, bytes, content_type)
            .await
            .map_err(|e| self.map_err(&format!("tag {}", reference), e))?;

        tracing::debug!(reference = %reference, digest = %descriptor.digest, "Tagged");
        Ok(())
    }
}
