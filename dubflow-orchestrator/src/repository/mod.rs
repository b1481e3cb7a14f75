//! Repository layer
//!
//! Database access for the orchestrator. Each submodule handles persistence
//! for a specific domain entity.

pub mod job;

pub use job as job_repository;
