use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("KubernetesRequestFailed: {0}")]
    Kube(#[from] kube::Error),
    #[error("UnableToLoadKubeConfig: {0}")]
    KubeConfig(#[from] kube::config::InferConfigError),
    #[error("UnableToParseYaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{message} {}: {source}", path.display())]
    Io {
        message: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing option: --{0}")]
    MissingOption(&'static str),
    #[error("could not read Secret {name} in namespace {namespace}")]
    SecretNotFound { name: String, namespace: String },
    #[error("no data for {0}")]
    NoSecretData(String),
    #[error("secret file {} does not exist", .0.display())]
    SecretFileNotFound(PathBuf),
    #[error("no secrets stored in the {0} secret manager")]
    NoStoredSecrets(String),
    #[error("jx-requirements.yml file not found from {}", .0.display())]
    RequirementsNotFound(PathBuf),
    #[error("failed to parse requirements from {source_name}: {source}")]
    InvalidRequirements {
        source_name: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to resolve the jx-requirements.yml from the file system or the 'dev' Environment in namespace {0}")]
    UnresolvedRequirements(String),
    #[error("failed to get Secret {name} in namespace {namespace}: {source}")]
    SecretLookupFailed {
        name: String,
        namespace: String,
        #[source]
        source: Box<Error>,
    },
    #[error("the requirements do not specify {0}")]
    MissingRequirement(&'static str),
    #[error("failed to run {command}: {message}")]
    CommandFailed { command: String, message: String },
    #[error("no .git directory could be found from dir {}", .0.display())]
    GitDirNotFound(PathBuf),
    #[error("No pod found for namespace {namespace} with selector {selector}")]
    PodNotFound { namespace: String, selector: String },
    #[error("failed to read logs of pod {pod}: {source}")]
    LogStream {
        pod: String,
        #[source]
        source: std::io::Error,
    },
    #[error("WaitFailed: {0}")]
    Wait(#[from] kube::runtime::wait::Error),
    #[error("Job {0} failed")]
    JobFailed(String),
}

impl Error {
    pub fn io(message: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Io {
            message,
            path: path.into(),
            source,
        }
    }
}

/// True when the API server answered 404 for the requested object
pub fn is_not_found(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(error_response) if error_response.code == 404)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".into(),
            message: "boom".into(),
            reason: "NotFound".into(),
            code,
        })
    }

    #[test]
    fn only_404_counts_as_not_found() {
        assert!(is_not_found(&api_error(404)));
        assert!(!is_not_found(&api_error(403)));
        assert!(!is_not_found(&api_error(500)));
    }

    #[test]
    fn missing_option_names_the_flag() {
        assert_eq!(Error::MissingOption("out").to_string(), "missing option: --out");
    }
}
