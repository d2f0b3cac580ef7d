//! HTTP plumbing: the authenticated fetch collaborator and service endpoints.

pub mod client;
pub mod endpoints;

pub use client::{ApiClient, ApiResponse, RetrySettings};
pub use endpoints::Endpoints;
