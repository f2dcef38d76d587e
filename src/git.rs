use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Error;
use crate::exec::Command;

/// The git operations needed to launch the boot Job
#[async_trait]
pub trait Gitter: Send + Sync {
    async fn clone_repo(&self, url: &str, dir: &Path) -> Result<(), Error>;

    /// URL of the `upstream` remote, else `origin`, else empty
    async fn discover_upstream_git_url(&self, git_conf_dir: &Path) -> Result<String, Error>;
}

/// [`Gitter`] backed by the `git` binary on the `PATH`
pub struct GitCli;

#[async_trait]
impl Gitter for GitCli {
    async fn clone_repo(&self, url: &str, dir: &Path) -> Result<(), Error> {
        let dir = dir.display().to_string();
        Command::new("git", ["clone", url, dir.as_str()])
            .run()
            .await?;
        Ok(())
    }

    async fn discover_upstream_git_url(&self, git_conf_dir: &Path) -> Result<String, Error> {
        let config = git_conf_dir.join("config").display().to_string();
        for remote in ["upstream", "origin"] {
            let key = format!("remote.{}.url", remote);
            let c = Command::new("git", ["config", "--file", config.as_str(), "--get", key.as_str()]);
            // `git config --get` exits non zero when the key is missing
            match c.run().await {
                Ok(url) if !url.is_empty() => return Ok(url),
                Ok(_) => {}
                Err(e) => debug!("no {} remote: {}", remote, e),
            }
        }
        Ok(String::new())
    }
}

/// Finds the git directory holding the config of the repository enclosing `dir`
pub fn find_git_config_dir(dir: &Path) -> Option<PathBuf> {
    let start = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    start.ancestors().find_map(|d| {
        let dot_git = d.join(".git");
        if dot_git.is_dir() {
            Some(dot_git)
        } else if dot_git.is_file() {
            resolve_gitdir_file(d, &dot_git)
        } else {
            None
        }
    })
}

/// Worktrees and submodules have a `.git` file of the form `gitdir: <path>`.
/// A worktree's git dir names the shared repository dir in its `commondir` file.
fn resolve_gitdir_file(work_dir: &Path, dot_git: &Path) -> Option<PathBuf> {
    let text = std::fs::read_to_string(dot_git).ok()?;
    let gitdir = text
        .lines()
        .find_map(|line| line.strip_prefix("gitdir:"))?
        .trim();
    let gitdir = work_dir.join(gitdir);
    let config_dir = match std::fs::read_to_string(gitdir.join("commondir")) {
        Ok(common) => gitdir.join(common.trim()),
        Err(_) => gitdir,
    };
    debug!("{} points at git dir {}", dot_git.display(), config_dir.display());
    Some(std::fs::canonicalize(&config_dir).unwrap_or(config_dir))
}
