use envoy_validate_types::EnumRules;

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::violation::ValidationError;

use super::{format_list, into_result};

/// `const`/`in`/`not_in` on enum numbers. `defined_only` is handled by
/// `DefinedEnumEval`, which needs the enum descriptor.
pub(crate) struct EnumRuleEval {
    r#const: Option<i32>,
    r#in: Vec<i32>,
    not_in: Vec<i32>,
}

impl EnumRuleEval {
    pub fn new(rules: &EnumRules) -> Self {
        Self {
            r#const: rules.r#const,
            r#in: rules.r#in.clone(),
            not_in: rules.not_in.clone(),
        }
    }

    pub fn tautology(&self) -> bool {
        self.r#const.is_none() && self.r#in.is_empty() && self.not_in.is_empty()
    }

    pub fn evaluate(
        &self,
        val: &prost_reflect::Value,
        _cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let Some(v) = val.as_enum_number() else {
            return Ok(());
        };

        let mut violations = Vec::new();

        if let Some(c) = self.r#const {
            if v != c {
                violations.push(ValidationError::from_reason(format!(
                    "value must equal {c}"
                )));
            }
        }

        if !self.r#in.is_empty() && !self.r#in.contains(&v) {
            violations.push(ValidationError::from_reason(format!(
                "value must be in list {}",
                format_list(&self.r#in)
            )));
        }

        if self.not_in.contains(&v) {
            violations.push(ValidationError::from_reason(format!(
                "value must not be in list {}",
                format_list(&self.not_in)
            )));
        }

        into_result(violations)
    }
}
