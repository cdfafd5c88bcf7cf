use std::collections::BTreeSet;

use prost_reflect::{DynamicMessage, EnumDescriptor, Value};

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::violation::ValidationError;

use super::Evaluator;

/// `defined_only`: rejects enum numbers with no declared value.
pub(crate) struct DefinedEnumEval {
    defined: BTreeSet<i32>,
}

impl DefinedEnumEval {
    pub fn new(descriptor: &EnumDescriptor) -> Self {
        Self {
            defined: descriptor.values().map(|value| value.number()).collect(),
        }
    }
}

impl Evaluator for DefinedEnumEval {
    fn tautology(&self) -> bool {
        false
    }

    fn evaluate(
        &self,
        _msg: &DynamicMessage,
        val: &Value,
        _cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        match val.as_enum_number() {
            Some(number) if !self.defined.contains(&number) => Err(ValidationError::from_reason(
                "value must be one of the defined enum values",
            )
            .into()),
            _ => Ok(()),
        }
    }
}
