//! Provision API Handler
//!
//! JSON endpoint for programmatic clients.

use axum::{Json, extract::State};
use launchpad_core::dto::provision::{ProvisionRequest, ProvisionResponse};
use launchpad_engine::Provisioner;

use crate::api::error::ApiResult;
use crate::service::provision_service;

/// POST /api/provision
/// Run a provisioning request to completion
pub async fn provision(
    State(provisioner): State<Provisioner>,
    Json(req): Json<ProvisionRequest>,
) -> ApiResult<Json<ProvisionResponse>> {
    tracing::debug!("Provision request received: {}", req.app_name);

    let run = provision_service::provision(&provisioner, req).await?;

    Ok(Json(ProvisionResponse::from(&run)))
}
