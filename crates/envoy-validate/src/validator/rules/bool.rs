use envoy_validate_types::BoolRules;

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::violation::ValidationError;

pub(crate) struct BoolRuleEval {
    r#const: Option<bool>,
}

impl BoolRuleEval {
    pub fn new(rules: &BoolRules) -> Self {
        Self {
            r#const: rules.r#const,
        }
    }

    pub fn tautology(&self) -> bool {
        self.r#const.is_none()
    }

    pub fn evaluate(
        &self,
        val: &prost_reflect::Value,
        _cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let Some(v) = val.as_bool() else {
            return Ok(());
        };

        if let Some(c) = self.r#const {
            if v != c {
                return Err(ValidationError::from_reason(format!("value must equal {c}")).into());
            }
        }

        Ok(())
    }
}
