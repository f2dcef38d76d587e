use async_trait::async_trait;
use std::fmt;

use crate::error::Error;

pub mod factory;
mod gsm;
mod local;

pub use factory::KindResolver;
pub use gsm::GoogleSecretManager;
pub use local::LocalSecretManager;

/// Backend storing the boot secrets YAML
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    /// A Kubernetes Secret in the current namespace
    Local,
    /// Google Cloud Secret Manager in the cluster's project
    #[value(name = "google-secret-manager")]
    GoogleSecretManager,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Kind::Local => "local",
            Kind::GoogleSecretManager => "google-secret-manager",
        };
        write!(f, "{}", name)
    }
}

pub type SecretCallback<'a> = &'a (dyn Fn(String) -> Result<String, Error> + Send + Sync);

#[async_trait]
pub trait SecretManager: Send + Sync {
    fn kind(&self) -> Kind;

    /// The stored secrets YAML, `None` when nothing has been stored yet
    async fn load_secrets(&self) -> Result<Option<String>, Error>;

    async fn store_secrets(&self, yaml: &str) -> Result<(), Error>;

    /// Passes the current secrets YAML (or `default_yaml` when there is none) to
    /// `callback` and stores whatever it returns.
    async fn upsert_secrets(
        &self,
        callback: SecretCallback<'_>,
        default_yaml: &str,
    ) -> Result<(), Error> {
        let current = self
            .load_secrets()
            .await?
            .filter(|yaml| !yaml.trim().is_empty())
            .unwrap_or_else(|| default_yaml.to_string());
        let updated = callback(current)?;
        self.store_secrets(&updated).await
    }
}
