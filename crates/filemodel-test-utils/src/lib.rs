//! Shared test utilities for the filemodel workspace.
//!
//! This crate provides fixture directory trees for the crate test suites and
//! the integration scenarios. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TestTree`] builder for on-disk model files
//! - [`logging`]: tracing output captured by the test harness

pub mod logging;
pub mod tree;

pub use tree::TestTree;
