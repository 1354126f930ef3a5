//! `olmoci resolve` command — Print the descriptor a reference points at.

use clap::Args;
use olmoci_runtime::oci::{cancellable, resolve_name_and_reference, verify_content};
use olmoci_runtime::Repository;

use super::Context;

#[derive(Args)]
pub struct ResolveArgs {
    /// Reference (e.g., "quay.io/org/etcd:v1" or "quay.io/org/etcd@sha256:...")
    pub reference: String,
}

pub async fn execute(args: ResolveArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let (repo, reference, mut descriptor) =
        resolve_name_and_reference(&args.reference, &ctx.options, &ctx.cancel).await?;

    // A digest resolves locally; fetch once to report the real media type and size
    if reference.is_digest() {
        let content = cancellable(&ctx.cancel, "fetch", repo.fetch(&descriptor)).await?;
        descriptor = verify_content(&descriptor, &content)?;
    }

    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}
