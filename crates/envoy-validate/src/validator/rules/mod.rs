pub(crate) mod bool;
pub(crate) mod bytes;
pub(crate) mod enum_rules;
pub(crate) mod map_rules;
pub(crate) mod number;
pub(crate) mod repeated;
pub(crate) mod string;

use std::fmt::Display;

use prost_reflect::DynamicMessage;

use envoy_validate_types::Type;

use crate::error::{CompilationError, Error, MultiError};
use crate::violation::ValidationError;

use super::evaluator::Evaluator;

/// A standard-rules evaluator built from the type-specific rules of a `FieldRules`.
/// Stores pre-computed checks for fast runtime evaluation.
pub(crate) enum StandardRuleEval {
    Float(number::NumericRuleEval<f32>),
    Double(number::NumericRuleEval<f64>),
    Int32(number::NumericRuleEval<i32>),
    Int64(number::NumericRuleEval<i64>),
    UInt32(number::NumericRuleEval<u32>),
    UInt64(number::NumericRuleEval<u64>),
    Bool(self::bool::BoolRuleEval),
    String(self::string::StringRuleEval),
    Bytes(bytes::BytesRuleEval),
    Enum(enum_rules::EnumRuleEval),
    Repeated(repeated::RepeatedRuleEval),
    Map(map_rules::MapRuleEval),
}

impl Evaluator for StandardRuleEval {
    fn tautology(&self) -> bool {
        match self {
            Self::Float(e) => e.tautology(),
            Self::Double(e) => e.tautology(),
            Self::Int32(e) => e.tautology(),
            Self::Int64(e) => e.tautology(),
            Self::UInt32(e) => e.tautology(),
            Self::UInt64(e) => e.tautology(),
            Self::Bool(e) => e.tautology(),
            Self::String(e) => e.tautology(),
            Self::Bytes(e) => e.tautology(),
            Self::Enum(e) => e.tautology(),
            Self::Repeated(e) => e.tautology(),
            Self::Map(e) => e.tautology(),
        }
    }

    fn evaluate(
        &self,
        _msg: &DynamicMessage,
        val: &prost_reflect::Value,
        cfg: &crate::config::ValidationConfig,
    ) -> Result<(), Error> {
        match self {
            Self::Float(e) => e.evaluate(val, cfg),
            Self::Double(e) => e.evaluate(val, cfg),
            Self::Int32(e) => e.evaluate(val, cfg),
            Self::Int64(e) => e.evaluate(val, cfg),
            Self::UInt32(e) => e.evaluate(val, cfg),
            Self::UInt64(e) => e.evaluate(val, cfg),
            Self::Bool(e) => e.evaluate(val, cfg),
            Self::String(e) => e.evaluate(val, cfg),
            Self::Bytes(e) => e.evaluate(val, cfg),
            Self::Enum(e) => e.evaluate(val, cfg),
            Self::Repeated(e) => e.evaluate(val, cfg),
            Self::Map(e) => e.evaluate(val, cfg),
        }
    }
}

/// Build a `StandardRuleEval` from the type-specific rules of a field.
///
/// The zig-zag and fixed-width integer kinds share the evaluator of their
/// value type, since `prost-reflect` surfaces them with the same `Value` variant.
pub(crate) fn build_standard_rules(
    rule_type: Option<&Type>,
) -> Result<Option<StandardRuleEval>, CompilationError> {
    let Some(rule_type) = rule_type else {
        return Ok(None);
    };

    let eval = match rule_type {
        Type::Float(r) => StandardRuleEval::Float(number::NumericRuleEval::new(r)),
        Type::Double(r) => StandardRuleEval::Double(number::NumericRuleEval::new(r)),
        Type::Int32(r) | Type::Sint32(r) | Type::Sfixed32(r) => {
            StandardRuleEval::Int32(number::NumericRuleEval::new(r))
        }
        Type::Int64(r) | Type::Sint64(r) | Type::Sfixed64(r) => {
            StandardRuleEval::Int64(number::NumericRuleEval::new(r))
        }
        Type::Uint32(r) | Type::Fixed32(r) => {
            StandardRuleEval::UInt32(number::NumericRuleEval::new(r))
        }
        Type::Uint64(r) | Type::Fixed64(r) => {
            StandardRuleEval::UInt64(number::NumericRuleEval::new(r))
        }
        Type::Bool(r) => StandardRuleEval::Bool(self::bool::BoolRuleEval::new(r)),
        Type::String(r) => StandardRuleEval::String(self::string::StringRuleEval::new(r)?),
        Type::Bytes(r) => StandardRuleEval::Bytes(bytes::BytesRuleEval::new(r)?),
        Type::Enum(r) => StandardRuleEval::Enum(enum_rules::EnumRuleEval::new(r)),
        Type::Repeated(r) => StandardRuleEval::Repeated(repeated::RepeatedRuleEval::new(r)),
        Type::Map(r) => StandardRuleEval::Map(map_rules::MapRuleEval::new(r)),
    };

    Ok(Some(eval))
}

/// Collapse the violations found by one rule evaluator into a result.
pub(crate) fn into_result(mut violations: Vec<ValidationError>) -> Result<(), Error> {
    match violations.len() {
        0 => Ok(()),
        1 => Err(violations.swap_remove(0).into()),
        _ => Err(MultiError::new(violations).into()),
    }
}

/// Render a list the way rule reasons quote `in`/`not_in` sets: `[a b c]`.
pub(crate) fn format_list<T: Display>(items: &[T]) -> String {
    let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(" "))
}
