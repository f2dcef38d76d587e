/// Name of the Kubernetes Secret (and GSM secret) holding the boot secrets
pub const LOCAL_SECRET: &str = "jx-boot-secrets";
/// Key of [`LOCAL_SECRET`] holding the raw secrets YAML document
pub const LOCAL_SECRET_KEY: &str = "secrets.yaml";

pub const DEV_ENVIRONMENT: &str = "dev";
pub const REQUIREMENTS_FILE_NAME: &str = "jx-requirements.yml";

pub const PROVIDER_GKE: &str = "gke";

pub const DEFAULT_VERSIONS_URL: &str = "https://github.com/jenkins-x/jenkins-x-versions.git";
pub const DEFAULT_VERSIONS_REF: &str = "master";

pub const INSTALLER_GIT_URL: &str = "https://github.com/jenkins-x-labs/jenkins-x-installer.git";
pub const BOOT_RELEASE: &str = "jx-boot";
pub const BOOT_CHART_DIR: &str = "./jx-boot";
pub const BOOT_JOB: &str = "jx-boot";
pub const BOOT_CONTAINER: &str = "boot";

pub const SECRETS_ROOT: &str = "secrets";
