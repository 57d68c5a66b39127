//! Provisioning DTOs for the inbound request surface

use serde::{Deserialize, Serialize};

use crate::domain::run::{PipelineRun, ProvisioningRequest, RunState};

/// Request to provision a new application
///
/// Accepts both snake_case and the camelCase field names used by the
/// browser form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    #[serde(alias = "appName", alias = "applicationName")]
    pub app_name: String,
    #[serde(alias = "appDescription", alias = "applicationDescription")]
    pub app_description: String,
}

impl From<ProvisionRequest> for ProvisioningRequest {
    fn from(request: ProvisionRequest) -> Self {
        Self {
            application_name: request.app_name.trim().to_string(),
            application_description: request.app_description.trim().to_string(),
        }
    }
}

/// Result of a completed provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionResponse {
    pub run_id: uuid::Uuid,
    pub slug: String,
    pub repository_url: Option<String>,
    pub service_url: Option<String>,
    pub state: RunState,
}

impl From<&PipelineRun> for ProvisionResponse {
    fn from(run: &PipelineRun) -> Self {
        Self {
            run_id: run.id,
            slug: run.slug.to_string(),
            repository_url: run
                .repository
                .as_ref()
                .map(|repo| repo.html_url.clone().unwrap_or_else(|| repo.remote_url.clone())),
            service_url: run.service_url.clone(),
            state: run.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_form_field_names() {
        let json = r#"{"appName": "  Demo App ", "appDescription": "todo list"}"#;
        let request: ProvisionRequest = serde_json::from_str(json).unwrap();
        let domain: ProvisioningRequest = request.into();

        assert_eq!(domain.application_name, "Demo App");
        assert_eq!(domain.application_description, "todo list");
    }

    #[test]
    fn test_request_accepts_snake_case() {
        let json = r#"{"app_name": "x", "app_description": "y"}"#;
        let request: ProvisionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.app_name, "x");
    }
}
