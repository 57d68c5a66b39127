//! Service layer
//!
//! Trait seams for every external collaborator of a run, plus the secret
//! provisioning logic built on top of them. The provisioner only talks to
//! these traits, so tests can substitute in-memory fakes.

mod completion;
mod project;
mod secrets;
mod source_host;

// Re-export traits
pub use completion::CompletionService;
pub use project::ProjectResolver;
pub use source_host::SourceHost;

// Re-export implementations
pub use completion::SYSTEM_INSTRUCTION;
pub use project::FixedProject;
pub use secrets::{SecretError, SecretProvisioner};
