use std::fmt::Display;

use prost_reflect::Value;

use envoy_validate_types::NumericRules;

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::violation::ValidationError;

use super::{format_list, into_result};

/// A scalar that can be read out of a reflected field value.
pub(crate) trait Numeric: Copy + PartialOrd + Display + Send + Sync + 'static {
    fn extract(val: &Value) -> Option<Self>;
}

macro_rules! numeric {
    ($value_ty:ty, $extract_method:ident) => {
        impl Numeric for $value_ty {
            fn extract(val: &Value) -> Option<Self> {
                val.$extract_method()
            }
        }
    };
}

numeric!(f32, as_f32);
numeric!(f64, as_f64);
numeric!(i32, as_i32);
numeric!(i64, as_i64);
numeric!(u32, as_u32);
numeric!(u64, as_u64);

/// Comparison rules for any numeric field kind.
///
/// Range checks are written as negated acceptance tests, so a NaN float
/// fails every bound.
pub(crate) struct NumericRuleEval<T> {
    r#const: Option<T>,
    lt: Option<T>,
    lte: Option<T>,
    gt: Option<T>,
    gte: Option<T>,
    r#in: Vec<T>,
    not_in: Vec<T>,
}

impl<T: Numeric> NumericRuleEval<T> {
    pub fn new(rules: &NumericRules<T>) -> Self {
        Self {
            r#const: rules.r#const,
            lt: rules.lt,
            lte: rules.lte,
            gt: rules.gt,
            gte: rules.gte,
            r#in: rules.r#in.clone(),
            not_in: rules.not_in.clone(),
        }
    }

    pub fn tautology(&self) -> bool {
        self.r#const.is_none()
            && self.lt.is_none()
            && self.lte.is_none()
            && self.gt.is_none()
            && self.gte.is_none()
            && self.r#in.is_empty()
            && self.not_in.is_empty()
    }

    pub fn evaluate(&self, val: &Value, _cfg: &ValidationConfig) -> Result<(), Error> {
        let Some(v) = T::extract(val) else {
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

        if let Some(reason) = self.check_range(v) {
            violations.push(ValidationError::from_reason(reason));
        }

        if !self.r#in.is_empty() && !self.r#in.iter().any(|x| *x == v) {
            violations.push(ValidationError::from_reason(format!(
                "value must be in list {}",
                format_list(&self.r#in)
            )));
        }

        if self.not_in.iter().any(|x| *x == v) {
            violations.push(ValidationError::from_reason(format!(
                "value must not be in list {}",
                format_list(&self.not_in)
            )));
        }

        into_result(violations)
    }

    /// Returns the reason `v` falls outside the configured bounds, if it does.
    ///
    /// With a lower and an upper bound, the value must be inside the range when
    /// lower < upper and outside it otherwise.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    fn check_range(&self, v: T) -> Option<String> {
        match (self.gt, self.gte, self.lt, self.lte) {
            (Some(gt), _, Some(lt), _) => {
                if gt < lt {
                    (!(v > gt && v < lt))
                        .then(|| format!("value must be inside range ({gt}, {lt})"))
                } else {
                    (!(v > gt || v < lt))
                        .then(|| format!("value must be outside range [{lt}, {gt}]"))
                }
            }
            (Some(gt), _, _, Some(lte)) => {
                if gt < lte {
                    (!(v > gt && v <= lte))
                        .then(|| format!("value must be inside range ({gt}, {lte}]"))
                } else {
                    (!(v > gt || v <= lte))
                        .then(|| format!("value must be outside range ({lte}, {gt}]"))
                }
            }
            (_, Some(gte), Some(lt), _) => {
                if gte < lt {
                    (!(v >= gte && v < lt))
                        .then(|| format!("value must be inside range [{gte}, {lt})"))
                } else {
                    (!(v >= gte || v < lt))
                        .then(|| format!("value must be outside range [{lt}, {gte})"))
                }
            }
            (_, Some(gte), _, Some(lte)) => {
                if gte < lte {
                    (!(v >= gte && v <= lte))
                        .then(|| format!("value must be inside range [{gte}, {lte}]"))
                } else {
                    (!(v >= gte || v <= lte))
                        .then(|| format!("value must be outside range ({lte}, {gte})"))
                }
            }
            (Some(gt), _, _, _) => {
                (!(v > gt)).then(|| format!("value must be greater than {gt}"))
            }
            (_, Some(gte), _, _) => {
                (!(v >= gte)).then(|| format!("value must be greater than or equal to {gte}"))
            }
            (_, _, Some(lt), _) => (!(v < lt)).then(|| format!("value must be less than {lt}")),
            (_, _, _, Some(lte)) => {
                (!(v <= lte)).then(|| format!("value must be less than or equal to {lte}"))
            }
            _ => None,
        }
    }
}
