//! Health checker extensions.

pub mod redis;
