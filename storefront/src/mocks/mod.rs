//! Mock gateway implementations for testing.
//!
//! This module provides simple, in-memory implementations of all gateway
//! traits for use in unit and integration tests.

pub mod backend;
pub mod storage;

pub use backend::MockStorefront;
pub use storage::MockObjectStorage;
