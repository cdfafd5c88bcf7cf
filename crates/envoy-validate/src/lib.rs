//! Runtime validation for Envoy configuration messages.
//!
//! Rules are declared per message type in a [`types::RuleSet`] table and
//! compiled against `prost-reflect` descriptors on first use. The built-in
//! table covers the Redis health checker
//! ([`types::health_checkers::redis::v3::Redis`]), whose single `key` field
//! declares no rules, so every `Redis` value is valid.
//!
//! # Quick start
//!
//! ```rust
//! use envoy_validate::Validate;
//! use envoy_validate::types::health_checkers::redis::v3::Redis;
//!
//! let redis = Redis { key: "probe".to_string() };
//! redis.validate().expect("fail-fast validation");
//! redis.validate_all().expect("collect-all validation");
//! ```
//!
//! To validate other message types, construct a [`Validator`] with extra
//! rules and reuse it across calls so compiled evaluators stay cached:
//!
//! ```rust
//! use envoy_validate::{Validator, ValidatorOption};
//! use envoy_validate::types::RuleSet;
//! # use envoy_validate::types::health_checkers::redis::v3::Redis;
//!
//! let rules = RuleSet::from_json(r#"{
//!     "envoy.extensions.health_checkers.redis.v3.Redis": {
//!         "fields": {"key": {"type": {"string": {"max_len": 64}}}}
//!     }
//! }"#).expect("rules parse");
//! let validator = Validator::with_options(&[ValidatorOption::Rules(rules)]);
//! assert!(validator.validate(&Redis { key: "probe".to_string() }).is_ok());
//! ```
//!
//! # Error types
//!
//! | Type | When |
//! |------|------|
//! | [`ValidationError`] | First violation, from fail-fast validation |
//! | [`MultiError`] | Every violation in detection order, from collect-all validation |
//! | [`CompilationError`] | A rule table does not fit the message descriptor |
//!
//! All three are unified under [`Error`]. A violation renders as
//! `invalid [key for ]<Message>.<field>: <reason>[ | caused by: <cause>]`.

#![warn(missing_docs)]

mod config;
mod error;
mod validator;
mod violation;

#[cfg(test)]
mod fixtures;

/// Re-export of `envoy-validate-types` for the message types, rule tables
/// and descriptor pool.
pub use envoy_validate_types as types;

pub use config::{Filter, ValidationOption, ValidatorOption};
pub use error::{CompilationError, Error, MultiError};
pub use validator::{Validate, Validator, validate, validate_all};
pub use violation::{Cause, FieldError, ValidationError};
