//! Redis health checker.

pub mod v3;
