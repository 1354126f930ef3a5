//! OLM bundle directory loading.
//!
//! A bundle directory holds a required `manifests/` directory and an optional
//! `metadata/` directory. Each is packed into a tar+gzip blob with fixed
//! timestamps, ownership and modes and sorted entries, so loading the same
//! directory twice yields byte-identical blobs.
//!
//! ```text
//! bundle/
//! ├── manifests/     (CSV, CRDs, ...)
//! └── metadata/
//!     └── annotations.yaml
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::{Compression, GzBuilder};
use olmoci_core::error::{OlmError, Result};
use serde::Deserialize;

use super::media_type::{BUNDLE_MANIFESTS_LAYER, BUNDLE_METADATA_LAYER};

const MANIFESTS_DIR: &str = "manifests";
const METADATA_DIR: &str = "metadata";
const ANNOTATIONS_FILE: &str = "annotations.yaml";

/// One blob of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleBlob {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl BundleBlob {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }
}

/// Loaded bundle contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundlePayload {
    /// Blobs in manifest order.
    pub blobs: Vec<BundleBlob>,
    /// Bundle annotations from `metadata/annotations.yaml`.
    pub annotations: BTreeMap<String, String>,
}

/// `metadata/annotations.yaml` layout.
#[derive(Debug, Default, Deserialize)]
struct AnnotationsFile {
    #[serde(default)]
    annotations: BTreeMap<String, String>,
}

/// Loads bundle directories into payloads.
pub struct BundleLoader;

impl BundleLoader {
    /// Load the bundle at `path`.
    pub fn load(path: &Path) -> Result<BundlePayload> {
        if !path.is_dir() {
            return Err(OlmError::filesystem(path, "bundle path is not a directory"));
        }

        let manifests_dir = path.join(MANIFESTS_DIR);
        if !manifests_dir.is_dir() {
            return Err(OlmError::filesystem(
                path,
                format!("bundle has no {}/ directory", MANIFESTS_DIR),
            ));
        }

        let mut payload = BundlePayload::default();
        payload.blobs.push(BundleBlob::new(
            BUNDLE_MANIFESTS_LAYER,
            pack_dir(&manifests_dir, MANIFESTS_DIR)?,
        ));

        let metadata_dir = path.join(METADATA_DIR);
        if metadata_dir.is_dir() {
            payload.blobs.push(BundleBlob::new(
                BUNDLE_METADATA_LAYER,
                pack_dir(&metadata_dir, METADATA_DIR)?,
            ));

            let annotations_path = metadata_dir.join(ANNOTATIONS_FILE);
            if annotations_path.is_file() {
                let data = std::fs::read_to_string(&annotations_path)
                    .map_err(|e| OlmError::filesystem(&annotations_path, e))?;
                let file: AnnotationsFile = serde_yaml::from_str(&data)
                    .map_err(|e| OlmError::filesystem(&annotations_path, e))?;
                payload.annotations = file.annotations;
            }
        }

        tracing::debug!(
            bundle = %path.display(),
            blobs = payload.blobs.len(),
            annotations = payload.annotations.len(),
            "Loaded bundle"
        );
        Ok(payload)
    }
}

/// Load an annotation mapping from a YAML (or JSON) document.
pub fn load_annotations(path: &Path) -> Result<BTreeMap<String, String>> {
    let data = std::fs::read_to_string(path).map_err(|e| OlmError::filesystem(path, e))?;
    if data.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let annotations: BTreeMap<String, String> = serde_yaml::from_str(&data)
        .map_err(|e| OlmError::InvalidAnnotations(format!("{}: {}", path.display(), e)))?;

    if annotations.keys().any(|k| k.is_empty()) {
        return Err(OlmError::InvalidAnnotations(format!(
            "{}: annotation keys must be non-empty",
            path.display()
        )));
    }
    Ok(annotations)
}

/// Pack `dir` into a deterministic tar+gzip archive rooted at `prefix/`.
fn pack_dir(dir: &Path, prefix: &str) -> Result<Vec<u8>> {
    let mut files = Vec::new();
    collect_files(dir, Path::new(prefix), &mut files)?;
    files.sort();

    let encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.mode(tar::HeaderMode::Deterministic);

    for (archive_path, source) in &files {
        let data = std::fs::read(source).map_err(|e| OlmError::filesystem(source, e))?;
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        builder
            .append_data(&mut header, archive_path, data.as_slice())
            .map_err(|e| OlmError::filesystem(source, e))?;
    }

    let mut encoder = builder
        .into_inner()
        .map_err(|e| OlmError::filesystem(dir, e))?;
    encoder.flush().map_err(|e| OlmError::filesystem(dir, e))?;
    encoder.finish().map_err(|e| OlmError::filesystem(dir, e))
}

/// Collect regular files under `dir` as (archive path, source path) pairs.
fn collect_files(dir: &Path, archive_dir: &Path, out: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| OlmError::filesystem(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| OlmError::filesystem(dir, e))?;
        let path = entry.path();
        let archive_path = archive_dir.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| OlmError::filesystem(&path, e))?;
        if file_type.is_dir() {
            collect_files(&path, &archive_path, out)?;
        } else if file_type.is_file() {
            out.push((archive_path, path));
        } else {
            tracing::warn!(path = %path.display(), "Skipping non-regular file in bundle");
        }
    }
    Ok(())
}
