//! `olmoci annotate` command — Attach annotations to an existing artifact.

use std::path::PathBuf;

use clap::Args;
use olmoci_runtime::oci::{load_annotations, parse_name_and_reference};

use super::Context;

#[derive(Args)]
pub struct AnnotateArgs {
    /// Catalog, package, channel or bundle reference (e.g., "quay.io/org/etcd:v1")
    pub subject: String,

    /// YAML or JSON file with a string-to-string mapping
    pub file: PathBuf,

    /// Only print the digest
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(args: AnnotateArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    // Read annotations before any registry traffic
    let annotations = load_annotations(&args.file)?;
    let (repo, subject) = parse_name_and_reference(&args.subject, &ctx.options)?;

    let descriptor = olmoci_runtime::annotate(&repo, &subject, annotations, &ctx.cancel).await?;

    if args.quiet {
        println!("{}", descriptor.digest);
    } else {
        println!("Annotated {}", subject);
        println!("Digest: {}@{}", subject.name(), descriptor.digest);
    }
    Ok(())
}
