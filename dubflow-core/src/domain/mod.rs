//! Domain types for the Dubflow system

pub mod approval;
pub mod job;
pub mod validation;
