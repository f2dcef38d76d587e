use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cluster::{is_in_cluster, ClusterAccess, KubeCluster};
use crate::cmd::batch_mode;
use crate::constants::{
    BOOT_RELEASE, DEFAULT_VERSIONS_REF, DEFAULT_VERSIONS_URL, INSTALLER_GIT_URL,
};
use crate::error::Error;
use crate::exec::Command;
use crate::git::{find_git_config_dir, Gitter};
use crate::requirements::RequirementsConfig;

mod job;

use job::tail_job_logs;

/// Boots up Jenkins X in a Kubernetes cluster using GitOps. This is usually run from inside the cluster
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// The directory to look for the Jenkins X Pipeline, requirements and charts
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
    /// Override the Git clone URL for the JX Boot source to start from, ignoring the versions stream
    #[arg(short = 'u', long)]
    pub git_url: Option<String>,
    /// Override the Git ref for the JX Boot source to start from, ignoring the versions stream
    #[arg(long, default_value = "master")]
    pub git_ref: String,
    /// The bootstrap URL for the versions repo
    #[arg(long, default_value = DEFAULT_VERSIONS_URL)]
    pub versions_repo: String,
    /// The bootstrap ref for the versions repo
    #[arg(long, default_value = DEFAULT_VERSIONS_REF)]
    pub versions_ref: String,
    /// Sets the helm logging level from 0 to 9
    #[arg(short = 'v', long)]
    pub helm_log: Option<String>,
    /// Requirements file which will overwrite the default requirements file
    #[arg(short, long)]
    pub requirements: Option<PathBuf>,
    /// Runs in batch mode without prompting for user input
    #[arg(short, long)]
    pub batch_mode: bool,
    /// Create the boot Job even when running inside the cluster
    #[arg(long)]
    pub job: bool,
}

pub struct BootRunner {
    args: RunArgs,
    git: Arc<dyn Gitter>,
}

impl BootRunner {
    pub fn new(args: RunArgs, git: Arc<dyn Gitter>) -> BootRunner {
        BootRunner { args, git }
    }

    pub async fn run(&self) -> Result<(), Error> {
        if self.args.job || !is_in_cluster() {
            let cluster = KubeCluster::connect().await?;
            return self.run_boot_job(&cluster).await;
        }
        self.run_local_boot().await
    }

    /// Runs `jx boot` in this process' environment
    pub async fn run_local_boot(&self) -> Result<(), Error> {
        let c = local_boot_command(&self.args, batch_mode(self.args.batch_mode));
        info!("running {}", c);
        c.run_attached().await
    }

    /// Installs the boot Job chart and follows the Job's logs
    pub async fn run_boot_job(&self, cluster: &KubeCluster) -> Result<(), Error> {
        let (requirements, git_url) = self.find_requirements_and_git_url(cluster).await?;
        if git_url.is_empty() {
            return Err(Error::MissingOption("git-url"));
        }

        info!(
            "running helmboot Job for cluster {} with git URL {}",
            requirements.cluster.cluster_name, git_url
        );

        let temp_dir = tempfile::Builder::new()
            .prefix("jx-boot-")
            .tempdir()
            .map_err(|e| Error::io("failed to create temp dir in", std::env::temp_dir(), e))?;
        let dir = temp_dir.path();

        info!("cloning {} to {}", INSTALLER_GIT_URL, dir.display());
        self.git.clone_repo(INSTALLER_GIT_URL, dir).await?;

        if job::has_helm_release(BOOT_RELEASE).await? {
            info!("uninstalling old {} chart ...", BOOT_RELEASE);
            Command::new("helm", ["uninstall", BOOT_RELEASE])
                .in_dir(dir)
                .run()
                .await?;
        }

        let c = job::boot_job_command(&requirements, &git_url).in_dir(dir);
        info!("running the command:\n\n{}\n\n", c);
        c.run().await?;

        tail_job_logs(cluster).await
    }

    /// Finds the boot configuration from the `dev` Environment, the flags and
    /// the local directory, in that order.
    pub async fn find_requirements_and_git_url(
        &self,
        cluster: &dyn ClusterAccess,
    ) -> Result<(RequirementsConfig, String), Error> {
        let mut requirements = None;
        let mut git_url = String::new();

        if let Some(dev) = cluster.get_dev_environment().await? {
            git_url = dev.source_url().unwrap_or_default().to_string();
            match RequirementsConfig::from_environment(&dev) {
                Ok(found) => requirements = found,
                Err(e) => debug!("failed to load requirements from team settings {}", e),
            }
        }
        if let Some(url) = self.args.git_url.as_ref().filter(|u| !u.is_empty()) {
            git_url = url.clone();
        }
        if let Some(file) = &self.args.requirements {
            requirements = Some(RequirementsConfig::load_file(file)?);
        }

        let requirements = match requirements {
            Some(r) => r,
            None => RequirementsConfig::load_from_dir(&self.args.dir)?.0,
        };

        if git_url.is_empty() {
            git_url = self.find_git_url_from_dir().await?;
        }
        Ok((requirements, git_url))
    }

    async fn find_git_url_from_dir(&self) -> Result<String, Error> {
        let dir = &self.args.dir;
        let git_conf_dir =
            find_git_config_dir(dir).ok_or_else(|| Error::GitDirNotFound(dir.clone()))?;
        self.git.discover_upstream_git_url(&git_conf_dir).await
    }
}

fn local_boot_command(args: &RunArgs, batch_mode: bool) -> Command {
    let mut c = Command::new("jx", ["boot"]);
    let mut flag = |name: &str, value: String| {
        c.args.push(format!("--{}", name));
        c.args.push(value);
    };
    flag("dir", args.dir.display().to_string());
    if let Some(url) = args.git_url.as_ref().filter(|u| !u.is_empty()) {
        flag("git-url", url.clone());
    }
    flag("git-ref", args.git_ref.clone());
    flag("versions-repo", args.versions_repo.clone());
    flag("versions-ref", args.versions_ref.clone());
    if let Some(level) = args.helm_log.as_ref().filter(|l| !l.is_empty()) {
        flag("helm-log", level.clone());
    }
    if let Some(file) = &args.requirements {
        flag("requirements", file.display().to_string());
    }
    if batch_mode {
        c.args.push("--batch-mode".into());
    }
    c
}
