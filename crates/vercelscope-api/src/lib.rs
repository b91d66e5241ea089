//! Vercel REST API client for vercelscope
//!
//! This crate wraps the handful of Vercel endpoints the dashboard needs:
//! token validation, project and deployment listings, and the build log
//! events endpoint in both its bounded (historical) and follow (live tail)
//! forms.

mod client;

pub use client::{EventsQuery, VercelClient};

// Re-export types that are used in our public API
pub use vercelscope_types::{Deployment, LogEvent, Project};
