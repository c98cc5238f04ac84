//! The pipeline's moving parts: the three polling loops and the
//! notification policy layer.
//!
//! Ingestion, queue draining, and credential refresh (in
//! [`crate::social::auth`]) are independent scheduled tasks with their own
//! shutdown signals; nothing orders them relative to each other.

pub mod drain;
pub mod ingest;
pub mod notify;
pub mod publish;
