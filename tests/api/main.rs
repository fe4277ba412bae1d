//! API Integration Tests
//!
//! Drives the full router (CORS and tracing layers included) through
//! `tower::ServiceExt::oneshot` and checks the response envelope.

#[path = "../common/mod.rs"]
mod common;

mod users;
