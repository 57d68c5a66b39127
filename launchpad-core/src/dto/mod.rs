//! Data Transfer Objects
//!
//! Wire shapes for the inbound provisioning surface.

pub mod provision;
