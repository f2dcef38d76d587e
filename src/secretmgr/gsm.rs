use async_trait::async_trait;
use std::io::Write;
use tracing::{debug, info};

use super::{Kind, SecretManager};
use crate::constants::LOCAL_SECRET;
use crate::error::Error;
use crate::exec::Command;
use crate::requirements::RequirementsConfig;

/// Stores the secrets YAML as versions of a Google Secret Manager secret,
/// using the `gcloud` CLI.
pub struct GoogleSecretManager {
    project: String,
    secret_name: String,
    binary: String,
}

impl GoogleSecretManager {
    pub fn new(requirements: &RequirementsConfig) -> Result<GoogleSecretManager, Error> {
        let project = requirements.cluster.project_id.trim();
        if project.is_empty() {
            return Err(Error::MissingRequirement("cluster.project"));
        }
        Ok(GoogleSecretManager {
            project: project.to_string(),
            secret_name: LOCAL_SECRET.to_string(),
            binary: "gcloud".to_string(),
        })
    }

    #[cfg(test)]
    fn with_binary(mut self, binary: &str) -> GoogleSecretManager {
        self.binary = binary.to_string();
        self
    }

    fn gcloud(&self, args: &[&str]) -> Command {
        let mut c = Command::new(&self.binary, ["secrets"]);
        c.args.extend(args.iter().map(|a| a.to_string()));
        c.args.push("--project".into());
        c.args.push(self.project.clone());
        c
    }

    fn access_command(&self) -> Command {
        self.gcloud(&["versions", "access", "latest", "--secret", self.secret_name.as_str()])
    }

    async fn ensure_secret_exists(&self) -> Result<(), Error> {
        match self.gcloud(&["describe", self.secret_name.as_str()]).run().await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                info!(
                    "creating secret {} in project {}",
                    self.secret_name, self.project
                );
                self.gcloud(&[
                    "create",
                    self.secret_name.as_str(),
                    "--replication-policy",
                    "automatic",
                ])
                .run()
                .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn is_not_found(error: &Error) -> bool {
    match error {
        Error::CommandFailed { message, .. } => {
            message.contains("NOT_FOUND") || message.to_lowercase().contains("not found")
        }
        _ => false,
    }
}

#[async_trait]
impl SecretManager for GoogleSecretManager {
    fn kind(&self) -> Kind {
        Kind::GoogleSecretManager
    }

    async fn load_secrets(&self) -> Result<Option<String>, Error> {
        // the stored document is returned byte for byte
        match self.access_command().run_raw().await {
            Ok(yaml) => Ok(Some(yaml)),
            Err(e) if is_not_found(&e) => {
                debug!("no secret {} in project {}", self.secret_name, self.project);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn store_secrets(&self, yaml: &str) -> Result<(), Error> {
        self.ensure_secret_exists().await?;

        let mut file = tempfile::Builder::new()
            .prefix("jx-boot-secrets-")
            .suffix(".yaml")
            .tempfile()
            .map_err(|e| Error::io("failed to create temp file in", std::env::temp_dir(), e))?;
        file.write_all(yaml.as_bytes())
            .map_err(|e| Error::io("failed to write", file.path(), e))?;

        let data_file = file.path().display().to_string();
        self.gcloud(&["versions", "add", self.secret_name.as_str(), "--data-file", data_file.as_str()])
            .run()
            .await?;
        info!(
            "saved secret {} in project {}",
            self.secret_name, self.project
        );
        Ok(())
    }
}
