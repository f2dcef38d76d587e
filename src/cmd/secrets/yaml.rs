use clap::Args;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cluster::{ClusterAccess, KubeCluster};
use crate::cmd::batch_mode;
use crate::constants::{LOCAL_SECRET, LOCAL_SECRET_KEY, SECRETS_ROOT};
use crate::error::Error;

/// Generates the secrets YAML file from a Kubernetes Secret or a secret file
#[derive(Args, Debug, Default)]
pub struct YamlArgs {
    /// The output YAML file to generate
    #[arg(short, long, env = "JX_SECRETS_YAML")]
    pub out: Option<PathBuf>,
    /// The secret file to use to get the data for the secrets YAML if using a file rather than Kubernetes Secret
    #[arg(short, long, env = "JXL_SECRET_FILE")]
    pub file: Option<PathBuf>,
    /// The Kubernetes Secret to read when no secret file is given
    #[arg(long, env = "JXL_SECRET_NAME", default_value = LOCAL_SECRET)]
    pub secret_name: String,
    /// Enables verbose logging
    #[arg(short, long)]
    pub verbose: bool,
    /// Runs in batch mode without prompting for user input
    #[arg(short, long)]
    pub batch_mode: bool,
}

#[derive(Debug, PartialEq)]
pub enum SecretSource {
    File(PathBuf),
    Cluster(String),
}

impl YamlArgs {
    pub fn source(&self) -> SecretSource {
        match self.file.as_ref().filter(|f| !f.as_os_str().is_empty()) {
            Some(file) => SecretSource::File(file.clone()),
            None if self.secret_name.is_empty() => SecretSource::Cluster(LOCAL_SECRET.to_string()),
            None => SecretSource::Cluster(self.secret_name.clone()),
        }
    }
}

pub type SecretData = BTreeMap<String, Vec<u8>>;

pub async fn run(args: YamlArgs) -> Result<(), Error> {
    let out = args
        .out
        .clone()
        .filter(|o| !o.as_os_str().is_empty())
        .ok_or(Error::MissingOption("out"))?;

    debug!(
        "generating {} (batch mode: {})",
        out.display(),
        batch_mode(args.batch_mode)
    );

    let data = match args.source() {
        SecretSource::File(file) => {
            let data = load_secret_file(&file)?;
            if data.is_empty() {
                return Err(Error::NoSecretData(format!(
                    "secret file {}",
                    file.display()
                )));
            }
            data
        }
        SecretSource::Cluster(name) => {
            let cluster = KubeCluster::connect().await?;
            read_secret_data(&cluster, &name).await?
        }
    };

    generate_secrets_yaml(&out, &data)
}

/// Reads the data of the named Secret, failing when it is missing or empty
pub async fn read_secret_data(cluster: &dyn ClusterAccess, name: &str) -> Result<SecretData, Error> {
    let ns = cluster.namespace().to_string();
    let secret = cluster
        .get_secret(name)
        .await
        .map_err(|e| Error::SecretLookupFailed {
            name: name.to_string(),
            namespace: ns.clone(),
            source: Box::new(e),
        })?
        .ok_or_else(|| Error::SecretNotFound {
            name: name.to_string(),
            namespace: ns.clone(),
        })?;

    let data: SecretData = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.0))
        .collect();
    if data.is_empty() {
        return Err(Error::NoSecretData(format!(
            "Secret {} in namespace {}",
            name, ns
        )));
    }
    Ok(data)
}

/// Loads a secret file made of lines of the form `foo: bar`
pub fn load_secret_file(path: &Path) -> Result<SecretData, Error> {
    if !path.exists() {
        return Err(Error::SecretFileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::io("failed to load secret file", path, e))?;
    Ok(parse_secret_lines(&text))
}

fn parse_secret_lines(text: &str) -> SecretData {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().as_bytes().to_vec()))
        .collect()
}

pub fn generate_secrets_yaml(path: &Path, data: &SecretData) -> Result<(), Error> {
    let content = match data.get(LOCAL_SECRET_KEY).filter(|raw| !raw.is_empty()) {
        Some(raw) => {
            debug!("using the raw {} entry", LOCAL_SECRET_KEY);
            raw.clone()
        }
        None => render_secrets_values(data)?.into_bytes(),
    };

    std::fs::write(path, content).map_err(|e| Error::io("failed to save file", path, e))?;
    info!("generated secrets file {}", path.display());
    Ok(())
}

/// Nests every dotted key under the `secrets` root
fn render_secrets_values(data: &SecretData) -> Result<String, Error> {
    let mut secrets = Mapping::new();
    for (key, value) in data {
        let value = Value::String(String::from_utf8_lossy(value).into_owned());
        set_map_value_via_path(&mut secrets, key, value);
    }

    let mut values = Mapping::new();
    values.insert(Value::String(SECRETS_ROOT.into()), Value::Mapping(secrets));
    Ok(serde_yaml::to_string(&values)?)
}

/// Sets `a.b.c` as `a: {b: {c: value}}`, replacing any scalar in the way
pub fn set_map_value_via_path(map: &mut Mapping, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(Value::String(path.to_string()), value);
        }
        Some((head, rest)) => {
            if !matches!(map.get(head), Some(Value::Mapping(_))) {
                map.insert(Value::String(head.to_string()), Value::Mapping(Mapping::new()));
            }
            if let Some(Value::Mapping(child)) = map.get_mut(head) {
                set_map_value_via_path(child, rest, value);
            }
        }
    }
}
