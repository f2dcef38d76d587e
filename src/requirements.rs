use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cluster::ClusterAccess;
use crate::constants::REQUIREMENTS_FILE_NAME;
use crate::crd::Environment;
use crate::error::Error;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default, rename = "project")]
    pub project_id: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub region: String,
}

/// Location of the version stream the boot pipeline resolves chart versions from
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct VersionStreamConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "ref")]
    pub ref_: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct IngressConfig {
    #[serde(default)]
    pub domain: String,
}

/// The `jx-requirements.yml` document describing the target cluster
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub version_stream: VersionStreamConfig,
    #[serde(default)]
    pub ingress: IngressConfig,
}

impl RequirementsConfig {
    pub fn parse(text: &str, source_name: &str) -> Result<RequirementsConfig, Error> {
        serde_yaml::from_str(text).map_err(|source| Error::InvalidRequirements {
            source_name: source_name.to_string(),
            source,
        })
    }

    pub fn load_file(path: &Path) -> Result<RequirementsConfig, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io("failed to read requirements file", path, e))?;
        RequirementsConfig::parse(&text, &path.display().to_string())
    }

    /// Loads `jx-requirements.yml` from `dir` or the nearest ancestor containing one
    pub fn load_from_dir(dir: &Path) -> Result<(RequirementsConfig, PathBuf), Error> {
        let path = find_requirements_file(dir)?;
        debug!("loading requirements from {}", path.display());
        let requirements = RequirementsConfig::load_file(&path)?;
        Ok((requirements, path))
    }

    /// Requirements embedded in the team settings of the `dev` Environment
    pub fn from_environment(env: &Environment) -> Result<Option<RequirementsConfig>, Error> {
        match env.boot_requirements() {
            Some(text) => RequirementsConfig::parse(text, "the 'dev' Environment").map(Some),
            None => Ok(None),
        }
    }
}

fn find_requirements_file(dir: &Path) -> Result<PathBuf, Error> {
    let start = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::io("failed to resolve the current directory for", dir, e))?
            .join(dir)
    };

    start
        .ancestors()
        .map(|d| d.join(REQUIREMENTS_FILE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Error::RequirementsNotFound(dir.to_path_buf()))
}

/// Finds the requirements for the current namespace, preferring the `dev` Environment
/// over the `jx-requirements.yml` file found from `dir`.
pub async fn resolve_requirements(
    cluster: &dyn ClusterAccess,
    dir: &Path,
) -> Result<(RequirementsConfig, String), Error> {
    let ns = cluster.namespace().to_string();
    if let Some(dev) = cluster.get_dev_environment().await? {
        match RequirementsConfig::from_environment(&dev) {
            Ok(Some(requirements)) => return Ok((requirements, ns)),
            Ok(None) => debug!("the 'dev' Environment in namespace {} has no requirements", ns),
            Err(e) => warn!("ignoring requirements on the 'dev' Environment: {}", e),
        }
    }
    let (requirements, _) = RequirementsConfig::load_from_dir(dir)?;
    Ok((requirements, ns))
}
