//! Compiled evaluator tree.
//!
//! A [`message::MessageEval`] holds one [`field::FieldEval`] per field that
//! carries rules, followed by required-oneof checks. Each field delegates to
//! a [`value::ValueEval`], which runs the standard rules for the value and
//! then the nested ones (list items, map entries, embedded messages).

pub(crate) mod embedded;
pub(crate) mod enum_check;
pub(crate) mod field;
pub(crate) mod list;
pub(crate) mod map;
pub(crate) mod message;
pub(crate) mod oneof;
pub(crate) mod value;

use prost_reflect::{DynamicMessage, Value};

use crate::config::ValidationConfig;
use crate::error::{self, Error};
use crate::violation::ValidationError;

/// Apply `f` to every violation in an error result. Compilation errors pass through.
pub(crate) fn for_each_violation(
    result: Result<(), Error>,
    mut f: impl FnMut(&mut ValidationError),
) -> Result<(), Error> {
    match result {
        Ok(()) => Ok(()),
        Err(mut err) => {
            for violation in err.violations_mut() {
                f(violation);
            }
            Err(err)
        }
    }
}

/// Drain `results` in order, merging violations. The iterator is lazy, so
/// evaluation stops at the first violation when failing fast, and at the
/// first compilation error in either mode.
pub(crate) fn collect_violations(
    results: impl IntoIterator<Item = Result<(), Error>>,
    fail_fast: bool,
) -> Result<(), Error> {
    let mut acc: Option<Error> = None;
    for result in results {
        let (cont, merged) = error::merge_violations(acc, result, fail_fast);
        acc = merged;
        if !cont {
            break;
        }
    }
    acc.map_or(Ok(()), Err)
}

/// Evaluator for concrete field values (scalars, list items, map keys/values).
pub(crate) trait Evaluator: Send + Sync {
    /// Returns true if this evaluator always succeeds.
    fn tautology(&self) -> bool;

    /// Evaluate a value. `msg` is the containing message.
    fn evaluate(
        &self,
        msg: &DynamicMessage,
        val: &Value,
        cfg: &ValidationConfig,
    ) -> Result<(), Error>;
}

/// Evaluator applied to a whole message.
pub(crate) trait MessageEvaluator: Send + Sync {
    /// Returns true if this evaluator always succeeds.
    fn tautology(&self) -> bool;

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error>;
}

/// Evaluators applied together to one value, in insertion order.
/// Tautologies are dropped on push.
#[derive(Default)]
pub(crate) struct Evaluators(Vec<Box<dyn Evaluator>>);

impl Evaluators {
    pub fn push(&mut self, eval: Box<dyn Evaluator>) {
        if !eval.tautology() {
            self.0.push(eval);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Evaluator for Evaluators {
    fn tautology(&self) -> bool {
        self.0.is_empty()
    }

    fn evaluate(
        &self,
        msg: &DynamicMessage,
        val: &Value,
        cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        collect_violations(
            self.0.iter().map(|eval| eval.evaluate(msg, val, cfg)),
            cfg.fail_fast,
        )
    }
}
