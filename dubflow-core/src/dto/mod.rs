//! Data transfer objects
//!
//! Request/response shapes exchanged between the orchestrator API and its
//! clients. Each submodule covers one domain area.

pub mod job;
