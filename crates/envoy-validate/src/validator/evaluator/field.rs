use prost_reflect::{DynamicMessage, ReflectMessage};

use crate::config::ValidationConfig;
use crate::error::{CompilationError, Error};
use crate::violation::ValidationError;

use super::value::ValueEval;
use super::{MessageEvaluator, for_each_violation};

/// Evaluator for a single message field.
/// Handles the required check and delegates to value evaluation.
pub(crate) struct FieldEval {
    /// The value evaluator for this field.
    pub value: ValueEval,

    /// Whether the field must be set.
    pub required: bool,

    /// Whether the field tracks presence (message field, proto3 optional, oneof member).
    pub has_presence: bool,

    /// Compilation error for this field, if any.
    pub err: Option<CompilationError>,
}

impl MessageEvaluator for FieldEval {
    fn tautology(&self) -> bool {
        !self.required && self.value.tautology() && self.err.is_none()
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        let field_desc = &self.value.descriptor;

        if !cfg.filter.should_validate_field(msg, field_desc) {
            return Ok(());
        }

        if let Some(ref err) = self.err {
            return Err(err.clone().into());
        }

        let descriptor = msg.descriptor();
        let field_is_set = msg.has_field(field_desc);

        if self.required && !field_is_set {
            return Err(
                ValidationError::new(descriptor.name(), field_desc.name(), "value is required")
                    .into(),
            );
        }

        if self.has_presence && !field_is_set {
            return Ok(());
        }

        let val = msg.get_field(field_desc);
        let result = self
            .value
            .evaluate_value(msg, &val, cfg, field_desc.name());
        for_each_violation(result, |v| v.set_message_if_empty(descriptor.name()))
    }
}
