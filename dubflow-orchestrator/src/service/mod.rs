//! Service layer
//!
//! Business logic between the HTTP API and the repository. The workflow
//! driver owns stage transitions; this layer owns the boundary operations
//! (submit, query, approve/reject, re-iterate).

pub mod job;

pub use job as job_service;
