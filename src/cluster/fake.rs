use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::core::{ErrorResponse, ObjectMeta};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::ClusterAccess;
use crate::crd::Environment;
use crate::error::Error;

/// In-memory cluster used by unit tests
pub struct FakeCluster {
    namespace: String,
    secrets: Mutex<BTreeMap<String, Secret>>,
    dev: Option<Environment>,
    failure: Option<u16>,
}

impl FakeCluster {
    pub fn new(namespace: &str) -> FakeCluster {
        FakeCluster {
            namespace: namespace.to_string(),
            secrets: Mutex::new(BTreeMap::new()),
            dev: None,
            failure: None,
        }
    }

    pub fn with_secret(self, name: &str, data: &[(&str, &str)]) -> FakeCluster {
        let data: BTreeMap<String, ByteString> = data
            .iter()
            .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
            .collect();
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(self.namespace.clone()),
                resource_version: Some("1".into()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };
        self.secrets.lock().unwrap().insert(name.to_string(), secret);
        self
    }

    pub fn with_dev_environment(mut self, env: Environment) -> FakeCluster {
        self.dev = Some(env);
        self
    }

    /// Every API call fails with the given HTTP status code
    pub fn failing_with(mut self, code: u16) -> FakeCluster {
        self.failure = Some(code);
        self
    }

    pub fn secret(&self, name: &str) -> Option<Secret> {
        self.secrets.lock().unwrap().get(name).cloned()
    }

    fn check(&self) -> Result<(), Error> {
        match self.failure {
            Some(code) => Err(Error::Kube(kube::Error::Api(ErrorResponse {
                status: "Failure".into(),
                message: "injected failure".into(),
                reason: "InternalError".into(),
                code,
            }))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterAccess for FakeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_secret(&self, name: &str) -> Result<Option<Secret>, Error> {
        self.check()?;
        Ok(self.secret(name))
    }

    async fn save_secret(&self, secret: &Secret) -> Result<Secret, Error> {
        self.check()?;
        let mut saved = secret.clone();
        let version = saved
            .metadata
            .resource_version
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        saved.metadata.resource_version = Some((version + 1).to_string());
        self.secrets
            .lock()
            .unwrap()
            .insert(saved.name_any(), saved.clone());
        Ok(saved)
    }

    async fn get_dev_environment(&self) -> Result<Option<Environment>, Error> {
        self.check()?;
        Ok(self.dev.clone())
    }
}
