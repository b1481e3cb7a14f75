//! Dubflow Core
//!
//! Core types and abstractions for the Dubflow media translation system.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, ApprovalState, ValidationOutcome, etc.)
//! - DTOs: Data transfer objects for inter-service communication

pub mod domain;
pub mod dto;
