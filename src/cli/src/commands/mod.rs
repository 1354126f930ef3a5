//! CLI command definitions and dispatch.

mod annotate;
mod inspect;
mod login;
mod logout;
mod push;
mod resolve;
mod version;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use olmoci_core::OlmConfig;
use olmoci_runtime::RegistryOptions;
use tokio_util::sync::CancellationToken;

/// olmoci - OLM catalogs, packages, channels and bundles on OCI registries.
#[derive(Parser)]
#[command(name = "olmoci", version, about)]
pub struct Cli {
    /// Configuration file (default: ~/.olmoci/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Talk to registries over plain HTTP
    #[arg(long, global = true)]
    pub plain_http: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Attach annotations to a catalog, package, channel or bundle
    Annotate(annotate::AnnotateArgs),
    /// Push OLM content to a registry
    Push(push::PushArgs),
    /// Resolve a reference to a descriptor
    Resolve(resolve::ResolveArgs),
    /// Show an artifact manifest
    Inspect(inspect::InspectArgs),
    /// Log in to a registry
    Login(login::LoginArgs),
    /// Log out from a registry
    Logout(logout::LogoutArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// State shared by every command of one invocation.
pub struct Context {
    pub options: RegistryOptions,
    /// Cancelled on Ctrl-C.
    pub cancel: CancellationToken,
}

impl Context {
    fn new(config: OlmConfig, plain_http: bool) -> Self {
        let mut options = RegistryOptions::new(config);
        options.plain_http = plain_http;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling");
                token.cancel();
            }
        });

        Self { options, cancel }
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli, config: OlmConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new(config, cli.plain_http);
    match cli.command {
        Command::Annotate(args) => annotate::execute(args, &ctx).await,
        Command::Push(args) => push::execute(args, &ctx).await,
        Command::Resolve(args) => resolve::execute(args, &ctx).await,
        Command::Inspect(args) => inspect::execute(args, &ctx).await,
        Command::Login(args) => login::execute(args).await,
        Command::Logout(args) => logout::execute(args).await,
        Command::Version(args) => version::execute(args).await,
    }
}
