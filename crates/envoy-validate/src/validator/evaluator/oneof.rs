use prost_reflect::{DynamicMessage, OneofDescriptor, ReflectMessage};

use crate::config::ValidationConfig;
use crate::error::Error;
use crate::violation::ValidationError;

use super::MessageEvaluator;

/// Evaluator for a proto oneof. Checks that one member is set when `required` is true.
pub(crate) struct OneofEval {
    pub descriptor: OneofDescriptor,
    pub required: bool,
}

impl MessageEvaluator for OneofEval {
    fn tautology(&self) -> bool {
        !self.required
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        if !self.required || !cfg.filter.should_validate_oneof(msg, &self.descriptor) {
            return Ok(());
        }

        let any_set = self.descriptor.fields().any(|field| msg.has_field(&field));
        if !any_set {
            return Err(ValidationError::new(
                msg.descriptor().name(),
                self.descriptor.name(),
                "value is required",
            )
            .into());
        }

        Ok(())
    }
}
