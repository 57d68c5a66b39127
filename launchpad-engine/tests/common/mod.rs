//! In-memory collaborators for driving the provisioner

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crypto_box::SecretKey;
use crypto_box::aead::OsRng;
use launchpad_client::{ClientError, RepositoryPublicKey};
use launchpad_core::domain::repository::{RepositoryHandle, SecretBundle};
use launchpad_engine::service::{CompletionService, FixedProject, ProjectResolver, SourceHost};
use launchpad_engine::vcs::{VcsError, VersionControl};
use launchpad_engine::{CancellationToken, Config, DeployCredential, Provisioner};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const CREDENTIAL: &str = r#"{"type": "service_account", "project_id": "demo-project"}"#;
pub const PROJECT_NUMBER: u64 = 123456789;

pub const COMPLETION: &str = "Sure!\n\n```html\n<!DOCTYPE html>\n<html><head><link rel=\"stylesheet\" href=\"styles.css\"></head><body><button id=\"go\">Go</button><script src=\"script.js\" defer></script></body></html>\n```\n\n```css\nbutton { border-radius: 4px; }\n```\n\n```js\ndocument.getElementById('go').onclick = () => alert('hi');\n```\n";

/// Ordered record of every external call made during a run
#[derive(Default)]
pub struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.entries().iter().any(|e| e.starts_with(prefix))
    }
}

// ============================================================================
// Completion
// ============================================================================

pub enum Reply {
    Text(String),
    Fail,
    Hang,
}

pub struct FakeCompletion {
    journal: Arc<Journal>,
    pub reply: Mutex<Reply>,
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn generate(&self, description: &str) -> Result<String, ClientError> {
        self.journal.record(format!("generate:{description}"));
        let reply = match &*self.reply.lock().unwrap() {
            Reply::Text(text) => Some(Ok(text.clone())),
            Reply::Fail => Some(Err(ClientError::api_error(500, "upstream exploded"))),
            Reply::Hang => None,
        };
        match reply {
            Some(reply) => reply,
            None => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(String::new())
            }
        }
    }
}

// ============================================================================
// Source host
// ============================================================================

#[derive(Default)]
pub struct FakeHost {
    journal: Arc<Journal>,
    pub conflict: AtomicBool,
    pub fail_key_fetch: AtomicBool,
    /// Dispatch answers 404 this many times before succeeding
    pub dispatch_misses: AtomicU32,
    pub dispatch_attempts: AtomicU32,
    pub keys: Mutex<Vec<SecretKey>>,
    pub secrets: Mutex<Vec<(String, SecretBundle)>>,
}

#[async_trait]
impl SourceHost for FakeHost {
    async fn create_repository(&self, name: &str, private: bool) -> Result<RepositoryHandle, ClientError> {
        self.journal.record(format!("create_repository:{name}"));
        assert!(!private);
        if self.conflict.load(Ordering::SeqCst) {
            return Err(ClientError::NameConflict(name.to_string()));
        }
        Ok(RepositoryHandle {
            name: name.to_string(),
            remote_url: format!("https://github.com/octocat/{name}.git"),
            html_url: Some(format!("https://github.com/octocat/{name}")),
        })
    }

    async fn get_public_key(&self, repo: &str) -> Result<RepositoryPublicKey, ClientError> {
        self.journal.record(format!("public_key:{repo}"));
        if self.fail_key_fetch.load(Ordering::SeqCst) {
            return Err(ClientError::api_error(404, "Not Found"));
        }
        let secret = SecretKey::generate(&mut OsRng);
        let mut keys = self.keys.lock().unwrap();
        let key = RepositoryPublicKey {
            key_id: format!("key-{}", keys.len()),
            key: STANDARD.encode(secret.public_key().as_bytes()),
        };
        keys.push(secret);
        Ok(key)
    }

    async fn put_secret(&self, repo: &str, name: &str, bundle: &SecretBundle) -> Result<(), ClientError> {
        self.journal.record(format!("put_secret:{repo}:{name}"));
        self.secrets
            .lock()
            .unwrap()
            .push((name.to_string(), bundle.clone()));
        Ok(())
    }

    async fn dispatch_workflow(&self, repo: &str, workflow_file: &str, git_ref: &str) -> Result<(), ClientError> {
        self.journal
            .record(format!("dispatch:{repo}:{workflow_file}@{git_ref}"));
        self.dispatch_attempts.fetch_add(1, Ordering::SeqCst);
        let misses = self.dispatch_misses.load(Ordering::SeqCst);
        if misses > 0 {
            self.dispatch_misses.store(misses - 1, Ordering::SeqCst);
            return Err(ClientError::api_error(404, "Not Found"));
        }
        Ok(())
    }
}

// ============================================================================
// Version control
// ============================================================================

#[derive(Debug, Clone)]
pub struct Push {
    pub workdir: PathBuf,
    pub remote_url: String,
    pub files: Vec<PathBuf>,
    pub message: String,
}

#[derive(Default)]
pub struct FakeVcs {
    journal: Arc<Journal>,
    /// Push with this commit message is rejected by the remote
    pub reject_message: Mutex<Option<String>>,
    /// Cancelled right after the first successful push
    pub cancel_after_push: Mutex<Option<CancellationToken>>,
    pub pushes: Mutex<Vec<Push>>,
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn commit_and_push(
        &self,
        workdir: &Path,
        remote_url: &str,
        files: &[PathBuf],
        message: &str,
    ) -> Result<(), VcsError> {
        self.journal.record(format!("push:{message}"));
        assert!(workdir.is_dir());
        for file in files {
            assert!(workdir.join(file).is_file(), "{} not staged", file.display());
        }

        if self.reject_message.lock().unwrap().as_deref() == Some(message) {
            return Err(VcsError::Push {
                reason: "remote: Permission denied".to_string(),
            });
        }

        self.pushes.lock().unwrap().push(Push {
            workdir: workdir.to_path_buf(),
            remote_url: remote_url.to_string(),
            files: files.to_vec(),
            message: message.to_string(),
        });
        if let Some(token) = self.cancel_after_push.lock().unwrap().take() {
            token.cancel();
        }
        Ok(())
    }
}

// ============================================================================
// Project lookup
// ============================================================================

pub struct UnreachableMetadata;

#[async_trait]
impl ProjectResolver for UnreachableMetadata {
    async fn project_number(&self) -> Result<u64, ClientError> {
        Err(ClientError::api_error(503, "metadata server unavailable"))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub journal: Arc<Journal>,
    pub completion: Arc<FakeCompletion>,
    pub host: Arc<FakeHost>,
    pub vcs: Arc<FakeVcs>,
    pub project: Arc<dyn ProjectResolver>,
    pub root: TempDir,
    pub config: Config,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Arc::new(Journal::default());
        let root = TempDir::new().unwrap();

        let mut config = Config::new(
            "ghp_test".to_string(),
            "octocat".to_string(),
            "sk-test".to_string(),
            DeployCredential::decode(CREDENTIAL).unwrap(),
            "demo-project".to_string(),
        );
        config.project_number = Some(PROJECT_NUMBER);
        config.workspace_root = root.path().join("workspaces");
        config.step_timeout = Duration::from_secs(5);
        config.dispatch_retries = 3;
        config.dispatch_backoff = Duration::from_millis(1);

        Self {
            completion: Arc::new(FakeCompletion {
                journal: journal.clone(),
                reply: Mutex::new(Reply::Text(COMPLETION.to_string())),
            }),
            host: Arc::new(FakeHost {
                journal: journal.clone(),
                ..FakeHost::default()
            }),
            vcs: Arc::new(FakeVcs {
                journal: journal.clone(),
                ..FakeVcs::default()
            }),
            project: Arc::new(FixedProject(PROJECT_NUMBER)),
            journal,
            root,
            config,
        }
    }

    pub fn provisioner(&self) -> Provisioner {
        Provisioner::new(
            Arc::new(self.config.clone()),
            self.completion.clone(),
            self.host.clone(),
            self.vcs.clone(),
            self.project.clone(),
        )
    }

    pub fn workspace_root(&self) -> &Path {
        &self.config.workspace_root
    }
}
