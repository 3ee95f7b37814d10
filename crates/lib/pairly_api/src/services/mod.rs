//! Service layer: session orchestration and notification dispatch.

pub mod auth;
pub mod notify;
