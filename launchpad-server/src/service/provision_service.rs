//! Provision Service
//!
//! Validates inbound requests and runs them through the provisioner.
//!
//! Runs execute on their own task so a client that disconnects mid-run
//! never leaves a half-provisioned application behind an aborted future.

use launchpad_core::domain::run::{PipelineRun, ProvisioningRequest};
use launchpad_core::dto::provision::ProvisionRequest;
use launchpad_engine::{Provisioner, RunFailure};

/// Longest accepted application name
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted application description
pub const MAX_DESCRIPTION_LEN: usize = 4000;

/// Service error type
#[derive(Debug)]
pub enum ProvisionServiceError {
    ValidationError(String),
    RunFailed(Box<RunFailure>),
    Internal(String),
}

impl From<RunFailure> for ProvisionServiceError {
    fn from(failure: RunFailure) -> Self {
        ProvisionServiceError::RunFailed(Box::new(failure))
    }
}

pub type Result<T> = std::result::Result<T, ProvisionServiceError>;

/// Provision a new application
pub async fn provision(provisioner: &Provisioner, req: ProvisionRequest) -> Result<PipelineRun> {
    let request: ProvisioningRequest = req.into();
    validate_request(&request)?;

    tracing::info!("Provisioning application: {}", request.application_name);

    let provisioner = provisioner.clone();
    let handle = tokio::spawn(async move { provisioner.run(request).await });
    let run = handle
        .await
        .map_err(|e| ProvisionServiceError::Internal(format!("provisioning task failed: {}", e)))??;

    tracing::info!(
        "Application provisioned: {} ({})",
        run.slug,
        run.service_url.as_deref().unwrap_or_default()
    );

    Ok(run)
}

/// Validate a provisioning request
fn validate_request(req: &ProvisioningRequest) -> Result<()> {
    if req.application_name.is_empty() {
        return Err(ProvisionServiceError::ValidationError(
            "Application name cannot be empty".to_string(),
        ));
    }

    if req.application_name.chars().count() > MAX_NAME_LEN {
        return Err(ProvisionServiceError::ValidationError(format!(
            "Application name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }

    if req.application_description.is_empty() {
        return Err(ProvisionServiceError::ValidationError(
            "Application description cannot be empty".to_string(),
        ));
    }

    if req.application_description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ProvisionServiceError::ValidationError(format!(
            "Application description cannot exceed {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }

    Ok(())
}
