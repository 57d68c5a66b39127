//! Provision command handler
//!
//! Runs one provisioning request in-process. Ctrl-C cancels the run at the
//! next step boundary.

use anyhow::{Context, Result, bail};
use colored::*;
use launchpad_core::domain::run::{PipelineRun, ProvisioningRequest};
use launchpad_core::domain::slug::UniqueSuffix;
use launchpad_core::dto::provision::ProvisionResponse;
use launchpad_engine::{CancellationToken, Config, Provisioner};
use std::path::Path;
use std::sync::Arc;

/// Description from the flag or the file, exactly one of them
pub fn read_description(description: Option<String>, file: Option<&Path>) -> Result<String> {
    let description = match (description, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read description file: {}", path.display()))?,
        (None, None) => bail!("Either --description or --description-file is required"),
    };

    let description = description.trim().to_string();
    if description.is_empty() {
        bail!("Application description cannot be empty");
    }
    Ok(description)
}

pub async fn provision(name: String, description: String, json: bool) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration from environment")?;
    let provisioner =
        Provisioner::from_config(Arc::new(config)).context("Configuration is not usable")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping after the current step...".yellow());
            on_interrupt.cancel();
        }
    });

    let request = ProvisioningRequest {
        application_name: name.trim().to_string(),
        application_description: description,
    };

    match provisioner
        .run_with(request, &UniqueSuffix::now(), &cancel)
        .await
    {
        Ok(run) => {
            if json {
                let response = ProvisionResponse::from(&run);
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_run(&run);
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", "✗ Provisioning failed".red().bold());
            eprintln!("  Slug:       {}", failure.run.slug.as_str().cyan());
            eprintln!("  Last state: {}", failure.last_state.to_string().yellow());
            eprintln!("  Failed at:  {}", failure.failed_at.to_string().red());
            if let Some(repository) = &failure.run.repository {
                eprintln!(
                    "  Repository: {} {}",
                    repository_link(repository),
                    "(left in place)".dimmed()
                );
            }
            Err(failure.into())
        }
    }
}

fn repository_link(repository: &launchpad_core::domain::repository::RepositoryHandle) -> &str {
    repository
        .html_url
        .as_deref()
        .unwrap_or(&repository.remote_url)
}

fn print_run(run: &PipelineRun) {
    println!("{}", "✓ Application provisioned!".green().bold());
    println!("  Run:        {}", run.id.to_string().dimmed());
    println!("  Slug:       {}", run.slug.as_str().cyan());
    if let Some(repository) = &run.repository {
        println!("  Repository: {}", repository_link(repository));
    }
    if let Some(workspace) = &run.workspace {
        println!("  Workspace:  {}", workspace.display().to_string().dimmed());
    }
    if let Some(url) = &run.service_url {
        println!("  Service:    {}", url.bold());
    }
    println!(
        "{}",
        "  The first deployment can take a few minutes to come up.".dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_description_from_flag() {
        let text = read_description(Some("  a timer \n".to_string()), None).unwrap();
        assert_eq!(text, "a timer");
    }

    #[test]
    fn test_read_description_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desc.txt");
        std::fs::write(&path, "A pomodoro timer\n").unwrap();

        assert_eq!(read_description(None, Some(&path)).unwrap(), "A pomodoro timer");
    }

    #[test]
    fn test_read_description_requires_content() {
        assert!(read_description(None, None).is_err());
        assert!(read_description(Some("   ".to_string()), None).is_err());
    }
}
