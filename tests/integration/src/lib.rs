//! Integration test utilities for the tally auth subsystem
//!
//! Provides a harness wiring the services to a manual clock and a small
//! in-memory account directory standing in for the application's database.

pub mod fixtures;

pub use fixtures::*;
pub use helpers::*;
