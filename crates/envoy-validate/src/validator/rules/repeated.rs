use std::collections::HashSet;

use prost_reflect::Value;

use envoy_validate_types::RepeatedRules;

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::violation::ValidationError;

use super::into_result;

/// Item-count rules. `unique` is checked per index by the list evaluator,
/// interleaved with the item rules.
pub(crate) struct RepeatedRuleEval {
    min_items: Option<u64>,
    max_items: Option<u64>,
}

impl RepeatedRuleEval {
    pub fn new(rules: &RepeatedRules) -> Self {
        Self {
            min_items: rules.min_items,
            max_items: rules.max_items,
        }
    }

    pub fn tautology(&self) -> bool {
        self.min_items.is_none() && self.max_items.is_none()
    }

    pub fn evaluate(&self, val: &Value, _cfg: &ValidationConfig) -> Result<(), Error> {
        let Some(list) = val.as_list() else {
            return Ok(());
        };

        let mut violations = Vec::new();
        let len = list.len() as u64;

        if let Some(min) = self.min_items {
            if len < min {
                violations.push(ValidationError::from_reason(format!(
                    "value must contain at least {min} item(s)"
                )));
            }
        }

        if let Some(max) = self.max_items {
            if len > max {
                violations.push(ValidationError::from_reason(format!(
                    "value must contain no more than {max} item(s)"
                )));
            }
        }

        into_result(violations)
    }
}

/// Hashable key extracted from a `prost_reflect::Value` for O(n) uniqueness checking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum UniqueKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(u32),
    F64(u64),
    String(String),
    Bytes(Vec<u8>),
    Enum(i32),
}

fn unique_key(value: &Value) -> Option<UniqueKey> {
    match value {
        Value::Bool(v) => Some(UniqueKey::Bool(*v)),
        Value::I32(v) => Some(UniqueKey::I32(*v)),
        Value::I64(v) => Some(UniqueKey::I64(*v)),
        Value::U32(v) => Some(UniqueKey::U32(*v)),
        Value::U64(v) => Some(UniqueKey::U64(*v)),
        Value::F32(v) => Some(UniqueKey::F32(v.to_bits())),
        Value::F64(v) => Some(UniqueKey::F64(v.to_bits())),
        Value::String(v) => Some(UniqueKey::String(v.clone())),
        Value::Bytes(v) => Some(UniqueKey::Bytes(v.to_vec())),
        Value::EnumNumber(v) => Some(UniqueKey::Enum(*v)),
        _ => None,
    }
}

/// Indices of items equal to an earlier item, in list order.
pub(crate) fn duplicate_indices(list: &[Value]) -> Vec<usize> {
    let keys: Option<Vec<_>> = list.iter().map(unique_key).collect();
    if let Some(keys) = keys {
        let mut seen = HashSet::with_capacity(keys.len());
        return keys
            .into_iter()
            .enumerate()
            .filter_map(|(idx, key)| (!seen.insert(key)).then_some(idx))
            .collect();
    }

    // Composite items fall back to pairwise comparison.
    list.iter()
        .enumerate()
        .filter(|(i, item)| list[..*i].contains(*item))
        .map(|(i, _)| i)
        .collect()
}
