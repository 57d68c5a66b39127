//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod config;
mod preview;
mod provision;

pub use preview::DescriptorKind;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate, publish and deploy an application
    Provision {
        /// Application name, used to derive the repository and service name
        #[arg(short, long)]
        name: String,

        /// What the application should do
        #[arg(short, long, conflicts_with = "description_file")]
        description: Option<String>,

        /// Read the description from a file
        #[arg(long)]
        description_file: Option<PathBuf>,

        /// Print the run as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Show the slug a name would get
    Slug {
        name: String,

        /// Fixed uniqueness suffix instead of the current time
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Extract the application files from a completion response
    Extract {
        /// File holding the completion text (stdin when omitted)
        input: Option<PathBuf>,

        /// Write index.html, styles.css and script.js into this directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print a build or deploy descriptor
    Render {
        #[arg(value_enum)]
        kind: DescriptorKind,

        /// Application name
        #[arg(short, long, default_value = "app")]
        name: String,

        /// Fixed uniqueness suffix instead of the current time
        #[arg(long)]
        suffix: Option<String>,

        /// Cloud project id
        #[arg(long, env = "GOOGLE_CLOUD_PROJECT", default_value = "my-project")]
        project: String,

        /// Deploy region
        #[arg(long, env = "CLOUD_RUN_REGION", default_value = launchpad_engine::config::DEFAULT_REGION)]
        region: String,

        /// Name of the registered deploy credential
        #[arg(long, env = "DEPLOY_SECRET_NAME", default_value = launchpad_engine::config::DEFAULT_SECRET_NAME)]
        secret_name: String,

        /// Branch the workflow deploys from
        #[arg(long, env = "DEFAULT_BRANCH", default_value = launchpad_engine::config::DEFAULT_BRANCH)]
        branch: String,
    },
    /// Load and validate configuration from the environment
    CheckConfig,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Provision {
            name,
            description,
            description_file,
            json,
        } => {
            let description = provision::read_description(description, description_file.as_deref())?;
            provision::provision(name, description, json).await
        }
        Commands::Slug { name, suffix } => preview::show_slug(&name, suffix.as_deref()),
        Commands::Extract { input, out } => preview::extract(input.as_deref(), out.as_deref()),
        Commands::Render {
            kind,
            name,
            suffix,
            project,
            region,
            secret_name,
            branch,
        } => preview::render(
            kind,
            &name,
            suffix.as_deref(),
            &project,
            &region,
            &secret_name,
            &branch,
        ),
        Commands::CheckConfig => config::check_config(),
    }
}
