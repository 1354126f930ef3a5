//! `olmoci inspect` command — Show an artifact manifest.

use clap::Args;
use olmoci_runtime::oci::{cancellable, resolve_name_and_reference, verify_content};
use olmoci_runtime::{ArtifactManifest, Repository};

use super::Context;
use crate::output;

#[derive(Args)]
pub struct InspectArgs {
    /// Artifact reference
    pub reference: String,

    /// Print the manifest as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: InspectArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let (repo, reference, resolved) =
        resolve_name_and_reference(&args.reference, &ctx.options, &ctx.cancel).await?;
    let content = cancellable(&ctx.cancel, "fetch", repo.fetch(&resolved)).await?;
    let descriptor = verify_content(&resolved, &content)?;
    let manifest = ArtifactManifest::decode(&content)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    println!("Reference:     {}", reference);
    println!("Digest:        {}", descriptor.digest);
    println!("Size:          {}", output::format_bytes(descriptor.size.max(0) as u64));
    println!("Artifact type: {}", manifest.artifact_type);
    if let Some(subject) = &manifest.subject {
        println!("Subject:       {} ({})", subject.digest, subject.media_type);
    }

    if !manifest.blobs.is_empty() {
        let mut table = output::new_table(&["MEDIA TYPE", "DIGEST", "SIZE"]);
        for blob in &manifest.blobs {
            table.add_row(vec![
                blob.media_type.clone(),
                output::short_digest(&blob.digest.to_string()),
                output::format_bytes(blob.size.max(0) as u64),
            ]);
        }
        println!();
        println!("{table}");
    }

    if !manifest.annotations.is_empty() {
        let mut table = output::new_table(&["ANNOTATION", "VALUE"]);
        for (key, value) in &manifest.annotations {
            table.add_row(vec![key.as_str(), value.as_str()]);
        }
        println!();
        println!("{table}");
    }

    Ok(())
}
