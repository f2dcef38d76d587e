use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRepository {
    #[serde(default)]
    pub url: Option<String>,
}

/// Team wide settings stored on the `dev` Environment
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamSettings {
    #[serde(default)]
    pub boot_requirements: Option<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, PartialEq, Debug, JsonSchema, Default)]
#[kube(group = "jenkins.io", version = "v1", kind = "Environment", namespaced)]
#[kube(singular = "environment", plural = "environments")]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    #[serde(default)]
    pub source: EnvironmentRepository,
    #[serde(default)]
    pub team_settings: TeamSettings,
}

impl Environment {
    /// Git URL of the GitOps repository backing this environment, if set
    pub fn source_url(&self) -> Option<&str> {
        self.spec
            .source
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
    }

    pub fn boot_requirements(&self) -> Option<&str> {
        self.spec
            .team_settings
            .boot_requirements
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_dev_environment() {
        let env: Environment = serde_json::from_value(json!({
            "apiVersion": "jenkins.io/v1",
            "kind": "Environment",
            "metadata": { "name": "dev", "namespace": "jx" },
            "spec": {
                "kind": "Development",
                "source": { "url": "https://github.com/acme/env-dev.git", "ref": "main" },
                "teamSettings": { "bootRequirements": "cluster:\n  provider: gke\n" }
            }
        }))
        .unwrap();

        assert_eq!(env.source_url(), Some("https://github.com/acme/env-dev.git"));
        assert_eq!(env.boot_requirements(), Some("cluster:\n  provider: gke\n"));
    }

    #[test]
    fn blank_settings_are_treated_as_absent() {
        let mut env = Environment::new("dev", EnvironmentSpec::default());
        env.spec.source.url = Some(String::new());
        env.spec.team_settings.boot_requirements = Some("  \n".into());

        assert_eq!(env.source_url(), None);
        assert_eq!(env.boot_requirements(), None);
    }
}
