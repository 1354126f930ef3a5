//! `olmoci push` command — Push OLM content to a registry.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use olmoci_runtime::oci::parse_name_and_reference;
use olmoci_runtime::BundleLoader;

use super::Context;

#[derive(Args)]
pub struct PushArgs {
    #[command(subcommand)]
    pub command: PushCommand,
}

#[derive(Subcommand)]
pub enum PushCommand {
    /// Push a bundle directory (manifests/ and optional metadata/)
    Bundle(PushBundleArgs),
}

#[derive(Args)]
pub struct PushBundleArgs {
    /// Bundle directory
    pub dir: PathBuf,

    /// Target reference (e.g., "quay.io/org/etcd-bundle:v0.9.4")
    pub reference: String,
}

pub async fn execute(args: PushArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        PushCommand::Bundle(args) => push_bundle(args, ctx).await,
    }
}

async fn push_bundle(args: PushBundleArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let (repo, target) = parse_name_and_reference(&args.reference, &ctx.options)?;
    let payload = BundleLoader::load(&args.dir)?;

    let descriptor = olmoci_runtime::push_bundle(&repo, &payload, &target, &ctx.cancel).await?;

    println!("Digest: {}@{}", target.name(), descriptor.digest);
    println!("Tag: {}", target);
    Ok(())
}
