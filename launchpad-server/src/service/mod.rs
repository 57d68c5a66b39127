//! Service Layer
//!
//! Request validation and the hand-off to the provisioner.

pub mod provision_service;
