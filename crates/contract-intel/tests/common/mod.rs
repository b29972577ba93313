//! Shared test utilities for contract-intel integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs over temp directories and an on-disk database
//! - Builders for contract text and PDF fixtures

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
