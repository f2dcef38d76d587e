use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::Client;
use tracing::debug;

use crate::constants::DEV_ENVIRONMENT;
use crate::crd::Environment;
use crate::error::Error;

#[cfg(test)]
pub mod fake;
mod utils;

pub use utils::{perform_get, perform_get_opt, perform_operation, Operation};

/// The cluster lookups shared by the secret and requirements commands
#[async_trait]
pub trait ClusterAccess: Send + Sync {
    /// Namespace every lookup is scoped to
    fn namespace(&self) -> &str;

    /// Fetches a Secret in [`ClusterAccess::namespace`], `None` if it does not exist
    async fn get_secret(&self, name: &str) -> Result<Option<Secret>, Error>;

    /// Creates the Secret, or replaces it when it carries a resource version
    async fn save_secret(&self, secret: &Secret) -> Result<Secret, Error>;

    /// Fetches the `dev` Environment, `None` if it (or its CRD) does not exist
    async fn get_dev_environment(&self) -> Result<Option<Environment>, Error>;
}

pub struct KubeCluster {
    client: Client,
    namespace: String,
}

impl KubeCluster {
    /// Connects using the local kubeconfig or the in-cluster service account,
    /// scoped to the namespace of the current context.
    pub async fn connect() -> Result<KubeCluster, Error> {
        let config = kube::Config::infer().await?;
        let namespace = config.default_namespace.clone();
        let client = Client::try_from(config)?;
        debug!("connected to Kubernetes using namespace {}", namespace);
        Ok(KubeCluster::new(client, namespace))
    }

    pub fn new(client: Client, namespace: impl Into<String>) -> KubeCluster {
        KubeCluster {
            client,
            namespace: namespace.into(),
        }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }
}

#[async_trait]
impl ClusterAccess for KubeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_secret(&self, name: &str) -> Result<Option<Secret>, Error> {
        let secret = perform_get_opt(self.client(), name, &self.namespace).await?;
        Ok(secret)
    }

    async fn save_secret(&self, secret: &Secret) -> Result<Secret, Error> {
        let operation = if secret.metadata.resource_version.is_some() {
            Operation::Update
        } else {
            Operation::Create
        };
        perform_operation(self.client(), operation, secret).await
    }

    async fn get_dev_environment(&self) -> Result<Option<Environment>, Error> {
        let env = perform_get_opt(self.client(), DEV_ENVIRONMENT, &self.namespace).await?;
        Ok(env)
    }
}

/// True when running inside a pod with a mounted service account
pub fn is_in_cluster() -> bool {
    kube::Config::incluster().is_ok()
}
