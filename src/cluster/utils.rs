use kube::api::PostParams;
use kube::core::ResourceExt;
use kube::Api;
use kube::Client;

use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use crate::error::{is_not_found, Error};

#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Create,
    Update,
}

pub async fn perform_operation<T>(
    client: Client,
    operation: Operation,
    value: &T,
) -> Result<T, Error>
where
    T: Clone + DeserializeOwned + Debug + Serialize + ResourceExt,
    <T as kube::Resource>::DynamicType: Default,
    T: Resource<Scope = NamespaceResourceScope>,
{
    let pp = PostParams::default();
    let api: Api<T> = Api::namespaced(client, &value.namespace().unwrap_or("default".into()));

    match operation {
        Operation::Create => {
            let result = api.create(&pp, value).await?;
            Ok(result)
        }
        Operation::Update => {
            let result = api.replace(&value.name_any(), &pp, value).await?;
            Ok(result)
        }
    }
}

pub async fn perform_get<T>(client: Client, name: &str, namespace: &str) -> Result<T, kube::Error>
where
    T: Clone + DeserializeOwned + Debug + ResourceExt,
    <T as kube::Resource>::DynamicType: Default,
    T: Resource<Scope = NamespaceResourceScope>,
{
    let api: Api<T> = Api::namespaced(client, namespace);
    let result = api.get(name).await?;
    Ok(result)
}

/// Like [`perform_get`] but maps a 404 to `None`
pub async fn perform_get_opt<T>(
    client: Client,
    name: &str,
    namespace: &str,
) -> Result<Option<T>, kube::Error>
where
    T: Clone + DeserializeOwned + Debug + ResourceExt,
    <T as kube::Resource>::DynamicType: Default,
    T: Resource<Scope = NamespaceResourceScope>,
{
    let api: Api<T> = Api::namespaced(client, namespace);
    match api.get(name).await {
        Ok(result) => Ok(Some(result)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(e),
    }
}
