use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::core::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::{Kind, SecretManager};
use crate::cluster::ClusterAccess;
use crate::constants::{LOCAL_SECRET, LOCAL_SECRET_KEY};
use crate::error::Error;

/// Stores the secrets YAML in the `jx-boot-secrets` Kubernetes Secret
pub struct LocalSecretManager {
    cluster: Arc<dyn ClusterAccess>,
}

impl LocalSecretManager {
    pub fn new(cluster: Arc<dyn ClusterAccess>) -> LocalSecretManager {
        LocalSecretManager { cluster }
    }
}

#[async_trait]
impl SecretManager for LocalSecretManager {
    fn kind(&self) -> Kind {
        Kind::Local
    }

    async fn load_secrets(&self) -> Result<Option<String>, Error> {
        let secret = self.cluster.get_secret(LOCAL_SECRET).await?;
        let yaml = secret
            .and_then(|s| s.data)
            .and_then(|mut data| data.remove(LOCAL_SECRET_KEY))
            .map(|value| String::from_utf8_lossy(&value.0).into_owned());
        Ok(yaml)
    }

    async fn store_secrets(&self, yaml: &str) -> Result<(), Error> {
        let ns = self.cluster.namespace().to_string();
        let mut secret = match self.cluster.get_secret(LOCAL_SECRET).await? {
            Some(s) => s,
            None => Secret {
                metadata: ObjectMeta {
                    name: Some(LOCAL_SECRET.to_string()),
                    namespace: Some(ns.clone()),
                    ..Default::default()
                },
                ..Default::default()
            },
        };

        let mut data = secret.data.take().unwrap_or_else(BTreeMap::new);
        data.insert(
            LOCAL_SECRET_KEY.to_string(),
            ByteString(yaml.as_bytes().to_vec()),
        );
        secret.data = Some(data);

        self.cluster.save_secret(&secret).await?;
        info!("saved Secret {} in namespace {}", LOCAL_SECRET, ns);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::FakeCluster;

    #[tokio::test]
    async fn upsert_creates_secret_from_default() {
        let cluster = Arc::new(FakeCluster::new("jx"));
        let manager = LocalSecretManager::new(cluster.clone());

        assert_eq!(manager.load_secrets().await.unwrap(), None);
        manager
            .upsert_secrets(&|current| Ok(format!("{}  adminUser: admin\n", current)), "secrets:\n")
            .await
            .unwrap();

        let stored = manager.load_secrets().await.unwrap().unwrap();
        assert_eq!(stored, "secrets:\n  adminUser: admin\n");
        let secret = cluster.secret(LOCAL_SECRET).unwrap();
        assert_eq!(secret.metadata.namespace.as_deref(), Some("jx"));
    }

    #[tokio::test]
    async fn upsert_keeps_other_keys() {
        let cluster = Arc::new(
            FakeCluster::new("jx")
                .with_secret(LOCAL_SECRET, &[(LOCAL_SECRET_KEY, "old: true\n"), ("extra", "x")]),
        );
        let manager = LocalSecretManager::new(cluster.clone());

        manager
            .upsert_secrets(&|current| Ok(current.replace("old", "new")), "")
            .await
            .unwrap();

        let data = cluster.secret(LOCAL_SECRET).unwrap().data.unwrap();
        assert_eq!(data[LOCAL_SECRET_KEY].0, b"new: true\n".to_vec());
        assert_eq!(data["extra"].0, b"x".to_vec());
    }
}
