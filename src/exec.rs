use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::debug;

use crate::error::Error;

/// A CLI invocation such as `helm list --short`
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl Command {
    pub fn new<I, S>(name: &str, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command {
            name: name.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Command {
        self.dir = Some(dir.into());
        self
    }

    fn process(&self) -> tokio::process::Command {
        let mut process = tokio::process::Command::new(&self.name);
        process.args(&self.args);
        if let Some(dir) = &self.dir {
            process.current_dir(dir);
        }
        process
    }

    /// Runs the command once, returning its trimmed stdout
    pub async fn run(&self) -> Result<String, Error> {
        Ok(self.run_raw().await?.trim().to_string())
    }

    /// Like [`Command::run`] but returns stdout exactly as written
    pub async fn run_raw(&self) -> Result<String, Error> {
        debug!("running {}", self);
        let output = self
            .process()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(format!("{}: {}", output.status, stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs the command with stdout and stderr attached to ours
    pub async fn run_attached(&self) -> Result<(), Error> {
        debug!("running {}", self);
        let status = self
            .process()
            .status()
            .await
            .map_err(|e| self.failed(e.to_string()))?;
        if !status.success() {
            return Err(self.failed(status.to_string()));
        }
        Ok(())
    }

    fn failed(&self, message: String) -> Error {
        Error::CommandFailed {
            command: self.to_string(),
            message,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
