use std::collections::HashSet;
use std::iter;

use prost_reflect::{DynamicMessage, Value};

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::validator::rules::repeated::duplicate_indices;
use crate::violation::ValidationError;

use super::value::ValueEval;
use super::{Evaluator, collect_violations};

/// Walks the elements of a repeated field, reporting violations under
/// `[index]`. Each index runs the `unique` check first, then its item rules.
pub(crate) struct ListEval {
    pub item_rules: ValueEval,
    pub unique: bool,
}

impl Evaluator for ListEval {
    fn tautology(&self) -> bool {
        !self.unique && self.item_rules.tautology()
    }

    fn evaluate(
        &self,
        msg: &DynamicMessage,
        val: &Value,
        cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let Some(items) = val.as_list() else {
            return Ok(());
        };

        let duplicates: HashSet<usize> = if self.unique {
            duplicate_indices(items).into_iter().collect()
        } else {
            HashSet::new()
        };

        let checks = items.iter().enumerate().flat_map(|(index, item)| {
            let path = format!("[{index}]");
            let unique_check = duplicates.contains(&index).then(|| {
                let mut violation =
                    ValidationError::from_reason("repeated value must contain unique items");
                violation.prepend_field(&path);
                Err::<(), Error>(violation.into())
            });
            let item_check = iter::once_with(move || {
                self.item_rules.evaluate_value(msg, item, cfg, &path)
            });
            unique_check.into_iter().chain(item_check)
        });
        collect_violations(checks, cfg.fail_fast)
    }
}
