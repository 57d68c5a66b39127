//! Launchpad Engine
//!
//! Everything a provisioning run needs beyond the pure domain types:
//!
//! - [`config`]: process-wide configuration, resolved once at startup
//! - [`seal`]: anonymous public-key sealing of the deploy credential
//! - [`workspace`] and [`descriptors`]: the per-run staging directory and
//!   the build/deploy files written into it
//! - [`vcs`]: commit and push through the `git` command line
//! - [`service`]: trait seams for the completion service, the source host
//!   and the project lookup
//! - [`provisioner`]: the state machine sequencing all of the above
//!
//! # Example
//!
//! ```no_run
//! use launchpad_engine::{Config, Provisioner};
//! use launchpad_core::domain::run::ProvisioningRequest;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(Config::from_env()?);
//!     let provisioner = Provisioner::from_config(config)?;
//!
//!     let run = provisioner
//!         .run(ProvisioningRequest {
//!             application_name: "Demo App".to_string(),
//!             application_description: "A pomodoro timer".to_string(),
//!         })
//!         .await?;
//!     println!("{}", run.service_url.unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod descriptors;
pub mod error;
pub mod provisioner;
pub mod seal;
pub mod service;
pub mod vcs;
pub mod workspace;

// Re-export commonly used types
pub use config::{Config, ConfigError, DeployCredential};
pub use error::{ProvisionError, RunFailure};
pub use provisioner::Provisioner;
pub use tokio_util::sync::CancellationToken;
