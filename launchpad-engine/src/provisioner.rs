//! Provisioning state machine
//!
//! Drives one request through
//! `Init → ContentRequested → ArtifactExtracted → WorkspaceStaged →
//! RepoCreated → CodePushed → SecretRegistered → WorkflowStaged →
//! WorkflowPushed → DeployDispatched → UrlResolved → Done`.
//!
//! Each transition fires only after its suspension point returned success.
//! Any error, timeout or cancellation moves the run to `Failed` and nothing
//! created so far is rolled back.

use launchpad_client::{ClientError, CompletionClient, MetadataClient, SourceHostClient};
use launchpad_core::domain::artifact::extract_detailed;
use launchpad_core::domain::repository::RepositoryHandle;
use launchpad_core::domain::run::{PipelineRun, ProvisioningRequest, RunState, predict_service_url};
use launchpad_core::domain::slug::{Slug, UniqueSuffix};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::Config;
use crate::descriptors::{DOCKERFILE, WORKFLOW_FILE, WORKFLOW_PATH, WorkflowParams, render_dockerfile, render_workflow};
use crate::error::{ProvisionError, RunFailure};
use crate::service::{
    CompletionService, FixedProject, ProjectResolver, SecretProvisioner, SourceHost,
};
use crate::vcs::{GitCli, VersionControl};
use crate::workspace::Workspace;

pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";
pub const WORKFLOW_COMMIT_MESSAGE: &str = "Add deploy workflow";

/// Upper bound of a single dispatch backoff
const MAX_DISPATCH_BACKOFF: Duration = Duration::from_secs(30);

/// Runs provisioning requests against a fixed set of collaborators
///
/// Holds no per-run state, so one instance can serve concurrent runs.
#[derive(Clone)]
pub struct Provisioner {
    config: Arc<Config>,
    completion: Arc<dyn CompletionService>,
    host: Arc<dyn SourceHost>,
    vcs: Arc<dyn VersionControl>,
    project: Arc<dyn ProjectResolver>,
    secrets: SecretProvisioner,
}

impl Provisioner {
    pub fn new(
        config: Arc<Config>,
        completion: Arc<dyn CompletionService>,
        host: Arc<dyn SourceHost>,
        vcs: Arc<dyn VersionControl>,
        project: Arc<dyn ProjectResolver>,
    ) -> Self {
        let secrets = SecretProvisioner::new(host.clone());
        Self {
            config,
            completion,
            host,
            vcs,
            project,
            secrets,
        }
    }

    /// Wires the real HTTP clients and the `git` driver from configuration
    pub fn from_config(config: Arc<Config>) -> Result<Self, ProvisionError> {
        config.validate()?;

        let completion = CompletionClient::new(
            config.openai_base_url.as_str(),
            config.openai_api_key.as_str(),
            config.openai_model.as_str(),
        );
        let host = SourceHostClient::new(
            config.github_api_url.as_str(),
            config.github_user.as_str(),
            config.github_token.as_str(),
        );
        let vcs = GitCli::new(
            config.github_user.as_str(),
            config.github_token.as_str(),
            config.default_branch.as_str(),
        )
        .with_trusted_host(config.github_host.as_str());
        let project: Arc<dyn ProjectResolver> = match config.project_number {
            Some(number) => Arc::new(FixedProject(number)),
            None => Arc::new(MetadataClient::default()),
        };

        Ok(Self::new(
            config,
            Arc::new(completion),
            Arc::new(host),
            Arc::new(vcs),
            project,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs a request to completion with a fresh slug suffix
    pub async fn run(&self, request: ProvisioningRequest) -> Result<PipelineRun, RunFailure> {
        self.run_with(request, &UniqueSuffix::now(), &CancellationToken::new())
            .await
    }

    /// Runs a request with a caller-chosen suffix and cancellation token
    ///
    /// Cancellation is observed between steps, never inside one. Whatever
    /// was created before the cancellation stays in place.
    pub async fn run_with(
        &self,
        request: ProvisioningRequest,
        suffix: &UniqueSuffix,
        cancel: &CancellationToken,
    ) -> Result<PipelineRun, RunFailure> {
        let slug = Slug::generate(&request.application_name, suffix);
        let mut run = PipelineRun::new(request, slug);
        let span = info_span!("run", slug = %run.slug, run_id = %run.id);

        let outcome = self.execute(&mut run, cancel).instrument(span.clone()).await;

        match outcome {
            Ok(()) => Ok(run),
            Err(error) => {
                let failed_at = run.state.next().unwrap_or(RunState::Failed);
                let last_state = run.fail();
                span.in_scope(|| {
                    error!(
                        kind = error.kind(),
                        %last_state,
                        %failed_at,
                        "provisioning failed: {}",
                        error
                    );
                });
                Err(RunFailure {
                    last_state,
                    failed_at,
                    error,
                    run: Box::new(run),
                })
            }
        }
    }

    async fn execute(&self, run: &mut PipelineRun, cancel: &CancellationToken) -> Result<(), ProvisionError> {
        let config = &self.config;
        info!(application = %run.request.application_name, "provisioning started");

        // Init -> ContentRequested
        let completion = self
            .step(RunState::ContentRequested, cancel, async {
                self.completion
                    .generate(&run.request.application_description)
                    .await
                    .map_err(ProvisionError::UpstreamRequestFailed)
            })
            .await?;
        transition(run)?;

        // ContentRequested -> ArtifactExtracted
        let extraction = extract_detailed(&completion);
        for kind in extraction.degraded() {
            warn!(%kind, "no {} found in completion, using placeholder", kind);
        }
        let artifact = extraction.artifact;
        run.artifact = Some(artifact.clone());
        transition(run)?;

        // ArtifactExtracted -> WorkspaceStaged
        let mut workspace = self
            .step(RunState::WorkspaceStaged, cancel, async {
                let mut workspace = Workspace::create(&config.workspace_root, &run.slug)?;
                let descriptors = BTreeMap::from([(PathBuf::from(DOCKERFILE), render_dockerfile())]);
                workspace.stage_artifact(&artifact, &descriptors)?;
                Ok(workspace)
            })
            .await?;
        run.workspace = Some(workspace.path().to_path_buf());
        transition(run)?;

        // WorkspaceStaged -> RepoCreated
        let repository = self
            .step(RunState::RepoCreated, cancel, self.create_repository(&run.slug))
            .await?;
        run.repository = Some(repository.clone());
        transition(run)?;

        // RepoCreated -> CodePushed
        let files = workspace.files();
        self.step(RunState::CodePushed, cancel, async {
            self.vcs
                .commit_and_push(workspace.path(), &repository.remote_url, &files, INITIAL_COMMIT_MESSAGE)
                .await
                .map_err(ProvisionError::from)
        })
        .await?;
        transition(run)?;

        // CodePushed -> SecretRegistered
        self.step(RunState::SecretRegistered, cancel, async {
            self.secrets
                .register_secret(
                    &repository,
                    &config.deploy_secret_name,
                    config.deploy_credential.as_bytes(),
                )
                .await
                .map_err(ProvisionError::from)
        })
        .await?;
        run.secret_registered = true;
        transition(run)?;

        // SecretRegistered -> WorkflowStaged
        let workflow = render_workflow(WorkflowParams {
            slug: &run.slug,
            project_id: &config.gcp_project,
            region: &config.region,
            secret_name: &config.deploy_secret_name,
            branch: &config.default_branch,
        });
        let workflow_files = self
            .step(RunState::WorkflowStaged, cancel, async {
                Ok(workspace.stage([(WORKFLOW_PATH, workflow)])?)
            })
            .await?;
        transition(run)?;

        // WorkflowStaged -> WorkflowPushed
        self.step(RunState::WorkflowPushed, cancel, async {
            self.vcs
                .commit_and_push(
                    workspace.path(),
                    &repository.remote_url,
                    &workflow_files,
                    WORKFLOW_COMMIT_MESSAGE,
                )
                .await
                .map_err(ProvisionError::from)
        })
        .await?;
        run.workflow_pushed = true;
        transition(run)?;

        // WorkflowPushed -> DeployDispatched
        self.step(RunState::DeployDispatched, cancel, self.dispatch(&repository))
            .await?;
        run.deploy_dispatched = true;
        transition(run)?;

        // DeployDispatched -> UrlResolved
        let project_number = self
            .step(RunState::UrlResolved, cancel, async {
                self.project
                    .project_number()
                    .await
                    .map_err(ProvisionError::ResolutionFailed)
            })
            .await?;
        let url = predict_service_url(&run.slug, project_number, &config.region, &config.platform_domain);
        run.service_url = Some(url);
        transition(run)?;

        // UrlResolved -> Done
        transition(run)?;
        info!(
            service_url = run.service_url.as_deref().unwrap_or_default(),
            "provisioning finished"
        );
        Ok(())
    }

    /// One suspension point: cancellation check, then a bounded wait
    async fn step<T, F>(&self, target: RunState, cancel: &CancellationToken, fut: F) -> Result<T, ProvisionError>
    where
        F: Future<Output = Result<T, ProvisionError>>,
    {
        if cancel.is_cancelled() {
            return Err(ProvisionError::Cancelled { state: target });
        }

        match tokio::time::timeout(self.config.step_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProvisionError::Timeout { state: target }),
        }
    }

    async fn create_repository(&self, slug: &Slug) -> Result<RepositoryHandle, ProvisionError> {
        let repository = self
            .host
            .create_repository(slug.as_str(), self.config.private_repos)
            .await
            .map_err(|e| match e {
                ClientError::NameConflict(name) => ProvisionError::NameConflict { name },
                other => ProvisionError::RepositoryCreationFailed(other),
            })?;

        if repository.name != slug.as_str() {
            return Err(ProvisionError::RepositoryCreationFailed(ClientError::InvalidResponse(
                format!("repository created as {} instead of {}", repository.name, slug),
            )));
        }

        Ok(repository)
    }

    /// Dispatches the deploy workflow
    ///
    /// A workflow pushed moments ago may not be registered yet; 404 and 422
    /// answers are retried with exponential backoff up to
    /// `dispatch_retries` attempts.
    async fn dispatch(&self, repository: &RepositoryHandle) -> Result<(), ProvisionError> {
        let mut attempt = 0;
        let mut delay = self.config.dispatch_backoff;

        loop {
            attempt += 1;

            match self
                .host
                .dispatch_workflow(&repository.name, WORKFLOW_FILE, &self.config.default_branch)
                .await
            {
                Ok(()) => {
                    info!(attempt, workflow = WORKFLOW_FILE, "workflow dispatched");
                    return Ok(());
                }
                Err(e) if attempt < self.config.dispatch_retries && matches!(e.status(), Some(404 | 422)) => {
                    warn!(
                        "Workflow not dispatchable yet (attempt {}/{}): {}. Retrying in {:?}",
                        attempt, self.config.dispatch_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_DISPATCH_BACKOFF);
                }
                Err(e) => return Err(ProvisionError::DispatchFailed(e)),
            }
        }
    }
}

/// Records a completed step
fn transition(run: &mut PipelineRun) -> Result<(), ProvisionError> {
    let state = run.advance()?;
    info!(%state, "state reached");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::domain::run::TransitionError;

    fn run() -> PipelineRun {
        let request = ProvisioningRequest {
            application_name: "Demo".to_string(),
            application_description: "timer".to_string(),
        };
        let slug = Slug::generate("Demo", &UniqueSuffix::new("t1").unwrap());
        PipelineRun::new(request, slug)
    }

    #[test]
    fn test_transition_advances_one_state() {
        let mut run = run();
        transition(&mut run).unwrap();
        assert_eq!(run.state, RunState::ContentRequested);
    }

    #[test]
    fn test_transition_past_terminal_state_is_an_error() {
        let mut run = run();
        run.fail();

        let err = transition(&mut run).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::InvalidTransition(TransitionError {
                from: RunState::Failed
            })
        ));
    }
}
