use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::{GoogleSecretManager, Kind, LocalSecretManager, SecretManager};
use crate::cluster::ClusterAccess;
use crate::constants::{LOCAL_SECRET, PROVIDER_GKE};
use crate::error::Error;
use crate::requirements::{resolve_requirements, RequirementsConfig};

/// Creates the [`SecretManager`] for the given kind
pub fn new_secret_manager(
    kind: Kind,
    cluster: Arc<dyn ClusterAccess>,
    requirements: &RequirementsConfig,
) -> Result<Box<dyn SecretManager>, Error> {
    match kind {
        Kind::Local => Ok(Box::new(LocalSecretManager::new(cluster))),
        Kind::GoogleSecretManager => Ok(Box::new(GoogleSecretManager::new(requirements)?)),
    }
}

/// Works out which kind of [`SecretManager`] to use for the current cluster
pub struct KindResolver {
    /// Skips detection when set
    pub kind: Option<Kind>,
    /// Directory to search for `jx-requirements.yml` when the cluster has none
    pub dir: PathBuf,
}

impl KindResolver {
    pub async fn create_secret_manager(
        &self,
        cluster: Arc<dyn ClusterAccess>,
    ) -> Result<Box<dyn SecretManager>, Error> {
        let (requirements, _) = match resolve_requirements(cluster.as_ref(), &self.dir).await {
            Ok(found) => found,
            Err(Error::RequirementsNotFound(dir)) => {
                debug!("no requirements file found from {}", dir.display());
                return Err(Error::UnresolvedRequirements(
                    cluster.namespace().to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        let kind = match self.kind {
            Some(kind) => kind,
            None => resolve_kind(cluster.as_ref(), &requirements).await?,
        };
        info!("using the {} secret manager", kind);
        new_secret_manager(kind, cluster, &requirements)
    }
}

/// On GKE the secrets live in Google Secret Manager unless the local boot
/// Secret already exists; everywhere else they are local.
pub async fn resolve_kind(
    cluster: &dyn ClusterAccess,
    requirements: &RequirementsConfig,
) -> Result<Kind, Error> {
    if requirements.cluster.provider != PROVIDER_GKE {
        return Ok(Kind::Local);
    }

    let ns = cluster.namespace();
    let secret = cluster
        .get_secret(LOCAL_SECRET)
        .await
        .map_err(|e| Error::SecretLookupFailed {
            name: LOCAL_SECRET.to_string(),
            namespace: ns.to_string(),
            source: Box::new(e),
        })?;

    match secret {
        Some(_) => {
            debug!("found Secret {} in namespace {}", LOCAL_SECRET, ns);
            Ok(Kind::Local)
        }
        None => Ok(Kind::GoogleSecretManager),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::FakeCluster;
    use crate::constants::{LOCAL_SECRET_KEY, REQUIREMENTS_FILE_NAME};
    use tempfile::TempDir;

    fn requirements(provider: &str) -> RequirementsConfig {
        let mut r = RequirementsConfig::default();
        r.cluster.provider = provider.into();
        r.cluster.project_id = "my-project".into();
        r
    }

    #[tokio::test]
    async fn gke_without_local_secret_uses_google_secret_manager() {
        let cluster = FakeCluster::new("jx");
        let kind = resolve_kind(&cluster, &requirements("gke")).await.unwrap();
        assert_eq!(kind, Kind::GoogleSecretManager);
    }

    #[tokio::test]
    async fn gke_with_local_secret_stays_local() {
        let cluster = FakeCluster::new("jx").with_secret(LOCAL_SECRET, &[(LOCAL_SECRET_KEY, "a: b")]);
        let kind = resolve_kind(&cluster, &requirements("gke")).await.unwrap();
        assert_eq!(kind, Kind::Local);
    }

    #[tokio::test]
    async fn other_providers_are_always_local() {
        for provider in ["eks", "aks", "kind", ""] {
            let empty = FakeCluster::new("jx");
            let with_secret = FakeCluster::new("jx").with_secret(LOCAL_SECRET, &[]);
            assert_eq!(resolve_kind(&empty, &requirements(provider)).await.unwrap(), Kind::Local);
            assert_eq!(
                resolve_kind(&with_secret, &requirements(provider)).await.unwrap(),
                Kind::Local
            );
        }
    }

    #[tokio::test]
    async fn lookup_failures_are_fatal() {
        let cluster = FakeCluster::new("jx").failing_with(403);
        let err = resolve_kind(&cluster, &requirements("gke")).await.unwrap_err();
        assert!(matches!(err, Error::SecretLookupFailed { .. }));
    }

    #[tokio::test]
    async fn creates_manager_for_detected_kind() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(REQUIREMENTS_FILE_NAME),
            "cluster:\n  provider: gke\n  project: my-project\n",
        )
        .unwrap();
        let resolver = KindResolver {
            kind: None,
            dir: temp.path().to_path_buf(),
        };

        let manager = resolver
            .create_secret_manager(Arc::new(FakeCluster::new("jx")))
            .await
            .unwrap();
        assert_eq!(manager.kind(), Kind::GoogleSecretManager);
    }

    #[tokio::test]
    async fn explicit_kind_skips_detection() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(REQUIREMENTS_FILE_NAME),
            "cluster:\n  provider: gke\n",
        )
        .unwrap();
        let resolver = KindResolver {
            kind: Some(Kind::Local),
            dir: temp.path().to_path_buf(),
        };

        let manager = resolver
            .create_secret_manager(Arc::new(FakeCluster::new("jx")))
            .await
            .unwrap();
        assert_eq!(manager.kind(), Kind::Local);
    }

    #[tokio::test]
    async fn missing_requirements_names_the_namespace() {
        let temp = TempDir::new().unwrap();
        let resolver = KindResolver {
            kind: None,
            dir: temp.path().to_path_buf(),
        };

        let err = resolver
            .create_secret_manager(Arc::new(FakeCluster::new("team-a")))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("namespace team-a"));
    }
}
