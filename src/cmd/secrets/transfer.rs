use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::cluster::ClusterAccess;
use crate::error::Error;
use crate::secretmgr::{Kind, KindResolver};

/// Writes the stored secrets YAML to a file or stdout
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// The file to write, stdout if not specified
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// The secret manager to use, detected from the cluster if not specified
    #[arg(short, long, value_enum)]
    pub kind: Option<Kind>,
    /// The directory to look for jx-requirements.yml
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

/// Stores a secrets YAML file in the secret manager
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// The secrets YAML file to import
    #[arg(short, long)]
    pub file: PathBuf,
    /// The secret manager to use, detected from the cluster if not specified
    #[arg(short, long, value_enum)]
    pub kind: Option<Kind>,
    /// The directory to look for jx-requirements.yml
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

pub async fn export(args: ExportArgs, cluster: Arc<dyn ClusterAccess>) -> Result<(), Error> {
    let resolver = KindResolver {
        kind: args.kind,
        dir: args.dir,
    };
    let manager = resolver.create_secret_manager(cluster).await?;

    let yaml = manager
        .load_secrets()
        .await?
        .filter(|yaml| !yaml.trim().is_empty())
        .ok_or_else(|| Error::NoStoredSecrets(manager.kind().to_string()))?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, &yaml).map_err(|e| Error::io("failed to save file", &path, e))?;
            info!("exported secrets to {}", path.display());
        }
        None => {
            print!("{}", yaml);
            if !yaml.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

pub async fn import(args: ImportArgs, cluster: Arc<dyn ClusterAccess>) -> Result<(), Error> {
    let yaml = std::fs::read_to_string(&args.file)
        .map_err(|e| Error::io("failed to read secrets file", &args.file, e))?;
    serde_yaml::from_str::<serde_yaml::Value>(&yaml)?;

    let resolver = KindResolver {
        kind: args.kind,
        dir: args.dir,
    };
    let manager = resolver.create_secret_manager(cluster).await?;
    manager
        .upsert_secrets(&|_current| Ok(yaml.clone()), "")
        .await?;
    info!(
        "imported {} into the {} secret manager",
        args.file.display(),
        manager.kind()
    );
    Ok(())
}
