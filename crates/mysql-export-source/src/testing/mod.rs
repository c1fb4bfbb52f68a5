//! Testing utilities for the MySQL export source
//!
//! Docker container management for integration tests.

pub mod container;

pub use container::MySQLContainer;
