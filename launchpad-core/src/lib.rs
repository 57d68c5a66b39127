//! Launchpad Core
//!
//! Core types and pure transforms for the Launchpad provisioning pipeline.
//!
//! This crate contains:
//! - Domain types: slugs, generated artifacts, repository handles and the run state machine
//! - DTOs: request/response shapes exchanged with the inbound HTTP surface
//!
//! Nothing in here performs I/O.

pub mod domain;
pub mod dto;
