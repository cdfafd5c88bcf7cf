use prost_reflect::{DynamicMessage, FieldDescriptor, Value};

use crate::config::ValidationConfig;
use crate::error::Error;

use super::{Evaluator, Evaluators, collect_violations, for_each_violation};

/// Evaluator for a concrete value: a singular field value, a repeated
/// element, or a map key or value.
pub(crate) struct ValueEval {
    /// The field descriptor for this value.
    pub descriptor: FieldDescriptor,

    /// Direct evaluators for this value (standard rules, enum checks).
    pub rules: Evaluators,

    /// Nested evaluators (embedded message, map items, list items).
    pub nested_rules: Evaluators,

    /// Whether to skip rules if the value is the zero/default value.
    pub ignore_empty: bool,

    /// The zero value for comparison (used with `ignore_empty`).
    pub zero: Option<Value>,
}

impl ValueEval {
    pub fn new(descriptor: FieldDescriptor) -> Self {
        Self {
            descriptor,
            rules: Evaluators::default(),
            nested_rules: Evaluators::default(),
            ignore_empty: false,
            zero: None,
        }
    }

    pub fn push_rule(&mut self, eval: Box<dyn Evaluator>) {
        self.rules.push(eval);
    }

    pub fn push_nested(&mut self, eval: Box<dyn Evaluator>) {
        self.nested_rules.push(eval);
    }

    pub fn tautology(&self) -> bool {
        self.rules.tautology() && self.nested_rules.tautology()
    }

    /// Evaluate this value, reporting violations under `segment`
    /// (a field name, `[index]` or `[key]`).
    pub fn evaluate_value(
        &self,
        msg: &DynamicMessage,
        val: &Value,
        cfg: &ValidationConfig,
        segment: &str,
    ) -> Result<(), Error> {
        if self.ignore_empty && self.zero.as_ref() == Some(val) {
            return Ok(());
        }

        let stages = [&self.rules, &self.nested_rules]
            .into_iter()
            .filter(|stage| !stage.is_empty())
            .map(|stage| {
                for_each_violation(stage.evaluate(msg, val, cfg), |v| v.prepend_field(segment))
            });
        collect_violations(stages, cfg.fail_fast)
    }
}
