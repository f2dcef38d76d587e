use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cluster;
mod cmd;
mod constants;
mod crd;
mod error;
mod exec;
mod git;
mod requirements;
mod secretmgr;

use cmd::run::{BootRunner, RunArgs};
use cmd::secrets::SecretsCommand;
use error::Error;
use git::GitCli;

#[derive(Parser)]
#[command(name = "helmboot")]
#[command(bin_name = "helmboot")]
#[command(author, version, about = "Boots up Jenkins X in a Kubernetes cluster using GitOps", long_about = None)]
struct HelmbootCli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Commands for working with the boot secrets
    Secrets {
        #[command(subcommand)]
        command: SecretsCommand,
    },
    Run(RunArgs),
}

impl Command {
    fn verbose(&self) -> bool {
        match self {
            Command::Secrets { command } => command.verbose(),
            Command::Run(_) => false,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("HELMBOOT_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("helmboot=debug")
        } else {
            EnvFilter::new("helmboot=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Secrets { command } => cmd::secrets::run(command).await,
        Command::Run(args) => BootRunner::new(args, Arc::new(GitCli)).run().await,
    }
}

#[tokio::main]
async fn main() {
    let cli = HelmbootCli::parse();
    init_logging(cli.command.verbose());

    if let Err(e) = run(cli.command).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
