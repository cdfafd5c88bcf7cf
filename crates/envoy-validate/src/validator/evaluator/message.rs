use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use prost_reflect::{DynamicMessage, ReflectMessage};

use crate::config::ValidationConfig;
use crate::error::{CompilationError, Error};

use super::{MessageEvaluator, collect_violations};

#[derive(Default)]
struct Compiled {
    err: Option<CompilationError>,
    evaluators: Vec<Box<dyn MessageEvaluator>>,
}

/// Compiled rules of one message type: field evaluators in schema order,
/// then required oneofs.
///
/// Filled in after it is cached, so that recursive message types can refer
/// to their own evaluator while it is being built.
#[derive(Default)]
pub(crate) struct MessageEval {
    compiled: RwLock<Compiled>,
}

impl MessageEval {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Compiled> {
        self.compiled.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Compiled> {
        self.compiled.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_err(&self, err: CompilationError) {
        self.write().err = Some(err);
    }

    pub fn compilation_error_cause(&self) -> Option<String> {
        self.read().err.as_ref().map(|err| err.cause.clone())
    }

    pub fn append(&self, eval: Box<dyn MessageEvaluator>) {
        if !eval.tautology() {
            self.write().evaluators.push(eval);
        }
    }

    /// Returns true if nothing was compiled for this message.
    pub fn is_empty(&self) -> bool {
        let compiled = self.read();
        compiled.err.is_none() && compiled.evaluators.is_empty()
    }
}

impl MessageEvaluator for MessageEval {
    fn tautology(&self) -> bool {
        // A recursive message may still be under construction.
        false
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        let compiled = self.read();
        if let Some(err) = &compiled.err {
            return Err(err.clone().into());
        }

        if !cfg.filter.should_validate(msg, &msg.descriptor()) {
            return Ok(());
        }

        collect_violations(
            compiled
                .evaluators
                .iter()
                .map(|eval| eval.evaluate_message(msg, cfg)),
            cfg.fail_fast,
        )
    }
}

impl MessageEvaluator for Arc<MessageEval> {
    fn tautology(&self) -> bool {
        MessageEval::tautology(self)
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        MessageEval::evaluate_message(self, msg, cfg)
    }
}
