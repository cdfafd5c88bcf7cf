//! Envoy configuration message types and the rule tables used to validate them.
//!
//! This crate provides:
//!
//! - Message types such as [`health_checkers::redis::v3::Redis`], encoded with
//!   `prost` and reflectable through `prost-reflect`.
//! - A shared [`DESCRIPTOR_POOL`] describing those messages. It is assembled
//!   in code, so no `protoc` is needed at build time.
//! - The rule-table schema ([`FieldRules`], [`StringRules`], …) and the
//!   built-in [`RULES`] registry declaring the constraints of each message.
//!
//! # Usage
//!
//! Most users do not need this crate directly. The
//! [`envoy-validate`](https://crates.io/crates/envoy-validate) crate re-exports
//! it as `types` and evaluates the rules.

#![warn(missing_docs)]

pub mod health_checkers;
mod proto;
#[allow(missing_docs)]
pub mod rules;

pub use proto::{DESCRIPTOR_POOL, descriptor_pool_build_error};
pub use rules::{
    BoolRules, BytesRules, DoubleRules, EnumRules, Fixed32Rules, Fixed64Rules, FieldRules,
    FloatRules, Int32Rules, Int64Rules, MapRules, MessageFieldRules, MessageRules, NumericRules,
    RULES, RepeatedRules, RuleSet, SFixed32Rules, SFixed64Rules, SInt32Rules, SInt64Rules,
    StringRules, Type, UInt32Rules, UInt64Rules, WellKnownBytes, WellKnownString,
};
