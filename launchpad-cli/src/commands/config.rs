//! Configuration check
//!
//! Loads configuration exactly as `provision` and the server do and prints
//! what was resolved. Credentials are never printed.

use anyhow::{Context, Result};
use colored::*;
use launchpad_engine::Config;

pub fn check_config() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration from environment")?;
    config.validate().context("Configuration is invalid")?;

    println!("{}", "✓ Configuration is valid".green().bold());
    println!("  Owner:          {}", config.github_user.cyan());
    println!("  Project:        {}", config.gcp_project);
    println!(
        "  Project number: {}",
        config
            .project_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "metadata server".to_string())
            .dimmed()
    );
    println!("  Region:         {}", config.region);
    println!("  Domain:         {}", config.platform_domain);
    println!("  Model:          {}", config.openai_model);
    println!("  Branch:         {}", config.default_branch);
    println!("  Secret name:    {}", config.deploy_secret_name);
    println!(
        "  Workspaces:     {}",
        config.workspace_root.display().to_string().dimmed()
    );
    println!("  Step timeout:   {}s", config.step_timeout.as_secs());
    println!(
        "  Visibility:     {}",
        if config.private_repos { "private" } else { "public" }
    );

    Ok(())
}
