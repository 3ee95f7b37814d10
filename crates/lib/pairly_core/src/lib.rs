//! # pairly_core
//!
//! Core domain logic for Pairly: identity sessions and real-time
//! notifications.

pub mod auth;
pub mod couple;
pub mod federation;
pub mod migrate;
pub mod models;
pub mod notify;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
