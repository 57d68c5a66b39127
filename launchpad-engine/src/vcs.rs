//! Version-control driver
//!
//! Commits a workspace and pushes it to the run's remote by shelling out to
//! `git`. The local commit always completes before the network push is
//! attempted, and the two failure classes are reported separately.

use async_trait::async_trait;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

pub const BOT_NAME: &str = "GitHub Actions Bot";
pub const BOT_EMAIL: &str = "actions@github.com";

const REDACTED: &str = "***";

/// Version-control errors
#[derive(Debug, Error)]
pub enum VcsError {
    /// A local step (init, config, add, commit) failed
    #[error("git {step} failed: {stderr}")]
    Local { step: &'static str, stderr: String },

    /// The remote rejected or never received the push
    #[error("git push rejected: {reason}")]
    Push { reason: String },

    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("remote url {0} cannot carry credentials")]
    InvalidRemote(String),
}

impl VcsError {
    /// True for failures that happened before anything left the machine
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Push { .. })
    }
}

/// Local commit plus remote push of a workspace
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Commits `files` (relative to `workdir`) and pushes to `remote_url`
    ///
    /// # Arguments
    /// * `workdir` - Workspace root, initialized on first use
    /// * `remote_url` - Credential-free clone URL of the repository
    /// * `files` - Paths to stage; the commit is made even if nothing changed
    /// * `message` - Commit message
    async fn commit_and_push(
        &self,
        workdir: &Path,
        remote_url: &str,
        files: &[PathBuf],
        message: &str,
    ) -> Result<(), VcsError>;
}

/// `git` subprocess implementation of [`VersionControl`]
#[derive(Clone)]
pub struct GitCli {
    username: String,
    token: String,
    branch: String,
    author_name: String,
    author_email: String,
    trusted_host: Option<String>,
}

impl std::fmt::Debug for GitCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCli")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("branch", &self.branch)
            .finish()
    }
}

impl GitCli {
    /// Creates a driver pushing to `branch` as `username`
    pub fn new(username: impl Into<String>, token: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            branch: branch.into(),
            author_name: BOT_NAME.to_string(),
            author_email: BOT_EMAIL.to_string(),
            trusted_host: None,
        }
    }

    /// Restricts credentials to remotes on `host`
    pub fn with_trusted_host(mut self, host: impl Into<String>) -> Self {
        self.trusted_host = Some(host.into());
        self
    }

    /// Push URL carrying the credential
    ///
    /// Only http(s) remotes get credentials, and only on the trusted host
    /// when one is set; local paths and `file://` remotes pass through
    /// unchanged.
    pub fn authenticated_url(&self, remote_url: &str) -> Result<String, VcsError> {
        let Ok(mut url) = Url::parse(remote_url) else {
            if Path::new(remote_url).is_absolute() {
                return Ok(remote_url.to_string());
            }
            return Err(VcsError::InvalidRemote(remote_url.to_string()));
        };

        match url.scheme() {
            "http" | "https" => {
                if let Some(trusted) = &self.trusted_host
                    && url.host_str() != Some(trusted.as_str())
                {
                    return Err(VcsError::InvalidRemote(remote_url.to_string()));
                }
                url.set_username(&self.username)
                    .and_then(|()| url.set_password(Some(&self.token)))
                    .map_err(|()| VcsError::InvalidRemote(remote_url.to_string()))?;
                Ok(url.to_string())
            }
            "file" => Ok(remote_url.to_string()),
            _ => Err(VcsError::InvalidRemote(remote_url.to_string())),
        }
    }

    /// Removes the token from git diagnostics
    fn redact(&self, text: &str) -> String {
        let text = text.trim();
        if self.token.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.token, REDACTED)
        }
    }

    async fn run(&self, workdir: &Path, args: &[&str]) -> Result<Output, VcsError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;
        Ok(output)
    }

    /// Runs a local step, failing with [`VcsError::Local`]
    async fn local(&self, workdir: &Path, step: &'static str, args: &[&str]) -> Result<String, VcsError> {
        debug!(step, "git");
        let output = self.run(workdir, args).await?;
        if !output.status.success() {
            return Err(VcsError::Local {
                step,
                stderr: self.redact(&String::from_utf8_lossy(&output.stderr)),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn ensure_repository(&self, workdir: &Path) -> Result<(), VcsError> {
        if workdir.join(".git").exists() {
            return Ok(());
        }

        let head = format!("refs/heads/{}", self.branch);
        self.local(workdir, "init", &["init", "--quiet"]).await?;
        self.local(workdir, "branch", &["symbolic-ref", "HEAD", head.as_str()]).await?;
        self.local(workdir, "config", &["config", "user.name", self.author_name.as_str()])
            .await?;
        self.local(workdir, "config", &["config", "user.email", self.author_email.as_str()])
            .await?;
        Ok(())
    }

    async fn set_remote(&self, workdir: &Path, url: &str) -> Result<(), VcsError> {
        let remotes = self.local(workdir, "remote", &["remote"]).await?;
        if remotes.lines().any(|r| r.trim() == "origin") {
            self.local(workdir, "remote", &["remote", "set-url", "origin", url])
                .await?;
        } else {
            self.local(workdir, "remote", &["remote", "add", "origin", url])
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn commit_and_push(
        &self,
        workdir: &Path,
        remote_url: &str,
        files: &[PathBuf],
        message: &str,
    ) -> Result<(), VcsError> {
        let push_url = self.authenticated_url(remote_url)?;

        self.ensure_repository(workdir).await?;

        if !files.is_empty() {
            let paths: Vec<String> = files.iter().map(|f| f.to_string_lossy().into_owned()).collect();
            let mut args = vec!["add", "--"];
            args.extend(paths.iter().map(String::as_str));
            self.local(workdir, "add", &args).await?;
        }

        self.local(
            workdir,
            "commit",
            &["commit", "--allow-empty", "--no-gpg-sign", "--quiet", "-m", message],
        )
        .await?;

        // origin keeps the credential-free URL; the token only lives in argv
        self.set_remote(workdir, remote_url).await?;

        let refspec = format!("HEAD:refs/heads/{}", self.branch);
        let output = self
            .run(workdir, &["push", "--quiet", push_url.as_str(), refspec.as_str()])
            .await?;
        if !output.status.success() {
            return Err(VcsError::Push {
                reason: self.redact(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        info!(branch = %self.branch, files = files.len(), "pushed");
        Ok(())
    }
}
