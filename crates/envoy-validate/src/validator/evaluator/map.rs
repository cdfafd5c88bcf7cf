use prost_reflect::{DynamicMessage, MapKey, Value};

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::violation::ValidationError;

use super::value::ValueEval;
use super::{Evaluator, collect_violations, for_each_violation};

/// Evaluator for map fields.
/// Visits entries in key order (numeric for integer keys) and applies rules
/// to keys and values. Violations are reported under `[key]`.
pub(crate) struct MapEval {
    /// Rules for map keys.
    pub key_rules: ValueEval,
    /// Rules for map values.
    pub value_rules: ValueEval,
}

impl Evaluator for MapEval {
    fn tautology(&self) -> bool {
        self.key_rules.tautology() && self.value_rules.tautology()
    }

    fn evaluate(
        &self,
        msg: &DynamicMessage,
        val: &Value,
        cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let Some(map) = val.as_map() else {
            return Ok(());
        };

        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let checks = entries.iter().flat_map(|(key, value)| {
            let path = format!("[{}]", map_key_to_string(key));
            let key_check = (!self.key_rules.tautology()).then(|| {
                let key_value = Value::from(MapKey::clone(key));
                let result = self.key_rules.evaluate_value(msg, &key_value, cfg, &path);
                for_each_violation(result, ValidationError::mark_for_key)
            });
            let value_check = (!self.value_rules.tautology())
                .then(|| self.value_rules.evaluate_value(msg, value, cfg, &path));
            key_check.into_iter().chain(value_check)
        });
        collect_violations(checks, cfg.fail_fast)
    }
}

fn map_key_to_string(key: &MapKey) -> String {
    match key {
        MapKey::Bool(b) => b.to_string(),
        MapKey::I32(n) => n.to_string(),
        MapKey::I64(n) => n.to_string(),
        MapKey::U32(n) => n.to_string(),
        MapKey::U64(n) => n.to_string(),
        MapKey::String(s) => s.clone(),
    }
}
