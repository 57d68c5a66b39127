//! Domain types shared by the engine, the server and the CLI

pub mod artifact;
pub mod repository;
pub mod run;
pub mod slug;
