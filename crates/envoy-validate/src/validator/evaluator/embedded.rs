use std::sync::Arc;

use prost_reflect::{DynamicMessage, Value};

use crate::config::ValidationConfig;
use crate::error::{self, Error};
use crate::violation::ValidationError;

use super::message::MessageEval;
use super::{Evaluator, MessageEvaluator};

/// Validates a singular message value with its type's own evaluator.
///
/// A failing child is reported once, on the parent field, with the child's
/// error as cause: its first violation when failing fast, otherwise every
/// violation as a `MultiError`.
pub(crate) struct EmbeddedMessageEval {
    pub message: Arc<MessageEval>,
}

impl Evaluator for EmbeddedMessageEval {
    fn tautology(&self) -> bool {
        self.message.tautology()
    }

    fn evaluate(
        &self,
        _msg: &DynamicMessage,
        val: &Value,
        cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let Some(child) = val.as_message() else {
            return Ok(());
        };

        error::finish(self.message.evaluate_message(child, cfg), cfg.fail_fast).map_err(
            |err| match err {
                Error::Compilation(_) => err,
                cause => ValidationError::from_reason("embedded message failed validation")
                    .with_cause(cause)
                    .into(),
            },
        )
    }
}
