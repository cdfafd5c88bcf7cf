use envoy_validate_types::MapRules;

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::violation::ValidationError;

use super::into_result;

/// Pair-count rules. Key and value rules are compiled into `MapEval`.
pub(crate) struct MapRuleEval {
    min_pairs: Option<u64>,
    max_pairs: Option<u64>,
}

impl MapRuleEval {
    pub fn new(rules: &MapRules) -> Self {
        Self {
            min_pairs: rules.min_pairs,
            max_pairs: rules.max_pairs,
        }
    }

    pub fn tautology(&self) -> bool {
        self.min_pairs.is_none() && self.max_pairs.is_none()
    }

    pub fn evaluate(
        &self,
        val: &prost_reflect::Value,
        _cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let Some(map) = val.as_map() else {
            return Ok(());
        };

        let mut violations = Vec::new();
        let len = map.len() as u64;

        if let Some(min) = self.min_pairs {
            if len < min {
                violations.push(ValidationError::from_reason(format!(
                    "value must contain at least {min} pair(s)"
                )));
            }
        }

        if let Some(max) = self.max_pairs {
            if len > max {
                violations.push(ValidationError::from_reason(format!(
                    "value must contain no more than {max} pair(s)"
                )));
            }
        }

        into_result(violations)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use prost_reflect::{MapKey, Value};

    use envoy_validate_types::MapRules;

    use super::MapRuleEval;
    use crate::config::ValidationConfig;
    use crate::violation::FieldError;

    #[test]
    fn pair_counts() {
        let eval = MapRuleEval::new(&MapRules {
            min_pairs: Some(1),
            max_pairs: Some(1),
            ..Default::default()
        });
        let cfg = ValidationConfig::default();

        let err = eval
            .evaluate(&Value::Map(HashMap::new()), &cfg)
            .expect_err("empty map is below min_pairs");
        assert_eq!(
            err.violations()[0].reason(),
            "value must contain at least 1 pair(s)"
        );

        let one = HashMap::from([(MapKey::String("env".into()), Value::String("prod".into()))]);
        assert!(eval.evaluate(&Value::Map(one), &cfg).is_ok());
    }
}
