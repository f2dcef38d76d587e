use clap::Subcommand;
use std::sync::Arc;

use crate::cluster::KubeCluster;
use crate::error::Error;

mod transfer;
mod yaml;

use transfer::{ExportArgs, ImportArgs};
use yaml::YamlArgs;

#[derive(Subcommand, Debug)]
pub enum SecretsCommand {
    /// Generates the YAML file from a Kubernetes Secret
    Yaml(YamlArgs),
    /// Exports the secrets YAML from the secret manager
    Export(ExportArgs),
    /// Imports a secrets YAML file into the secret manager
    Import(ImportArgs),
}

impl SecretsCommand {
    pub fn verbose(&self) -> bool {
        match self {
            SecretsCommand::Yaml(args) => args.verbose,
            _ => false,
        }
    }
}

pub async fn run(command: SecretsCommand) -> Result<(), Error> {
    match command {
        SecretsCommand::Yaml(args) => yaml::run(args).await,
        SecretsCommand::Export(args) => {
            let cluster = Arc::new(KubeCluster::connect().await?);
            transfer::export(args, cluster).await
        }
        SecretsCommand::Import(args) => {
            let cluster = Arc::new(KubeCluster::connect().await?);
            transfer::import(args, cluster).await
        }
    }
}
