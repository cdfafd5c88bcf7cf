use std::fmt;

use crate::violation::ValidationError;

/// Top-level error type returned by validation.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The first rule violation found by fail-fast validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every rule violation found by collect-all validation, in detection order.
    #[error(transparent)]
    Multi(#[from] MultiError),

    /// The rule table for a message could not be compiled against its descriptor.
    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

impl Error {
    /// Returns the violations carried by this error, empty for compilation errors.
    #[must_use]
    pub fn violations(&self) -> &[ValidationError] {
        match self {
            Self::Validation(err) => std::slice::from_ref(err),
            Self::Multi(err) => err.all_errors(),
            Self::Compilation(_) => &[],
        }
    }

    pub(crate) fn violations_mut(&mut self) -> &mut [ValidationError] {
        match self {
            Self::Validation(err) => std::slice::from_mut(err),
            Self::Multi(err) => &mut err.0,
            Self::Compilation(_) => &mut [],
        }
    }
}

/// Ordered list of violations returned by collect-all validation.
///
/// Renders each violation joined with `"; "`.
#[derive(Debug, Clone, Default)]
pub struct MultiError(Vec<ValidationError>);

impl MultiError {
    /// Wrap `errors`, keeping their order.
    #[must_use]
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    /// Returns the wrapped violations in detection order.
    #[must_use]
    pub fn all_errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Consume the aggregate, returning its violations.
    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.0
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no violations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the violations in detection order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl IntoIterator for MultiError {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Returned when a rule table cannot be compiled against a message descriptor.
#[derive(Debug, Clone, thiserror::Error)]
#[error("compilation error: {cause}")]
pub struct CompilationError {
    /// Description of why the rules failed to compile.
    pub cause: String,
}

/// Merge violations from a sub-evaluation into an accumulator.
///
/// Returns `(should_continue, accumulated_error)`.
/// If `fail_fast` is true, keeps only the first violation and stops.
pub(crate) fn merge_violations(
    acc: Option<Error>,
    new_err: Result<(), Error>,
    fail_fast: bool,
) -> (bool, Option<Error>) {
    let new_err = match new_err {
        Ok(()) => return (true, acc),
        Err(e) => e,
    };

    let mut new_violations = match new_err {
        Error::Compilation(_) => return (false, Some(new_err)),
        Error::Validation(single) => vec![single],
        Error::Multi(multi) => multi.into_errors(),
    };
    if new_violations.is_empty() {
        return (true, acc);
    }

    if fail_fast {
        new_violations.truncate(1);
        return (false, Some(Error::Multi(MultiError(new_violations))));
    }

    match acc {
        Some(Error::Multi(mut existing)) => {
            existing.0.extend(new_violations);
            (true, Some(Error::Multi(existing)))
        }
        Some(Error::Validation(first)) => {
            let mut merged = vec![first];
            merged.extend(new_violations);
            (true, Some(Error::Multi(MultiError(merged))))
        }
        _ => (true, Some(Error::Multi(MultiError(new_violations)))),
    }
}

/// Shape an evaluation result for the caller: a single [`ValidationError`]
/// for fail-fast, a [`MultiError`] for collect-all.
pub(crate) fn finish(result: Result<(), Error>, fail_fast: bool) -> Result<(), Error> {
    let err = match result {
        Ok(()) => return Ok(()),
        Err(Error::Compilation(err)) => return Err(err.into()),
        Err(err) => err,
    };

    let mut violations = match err {
        Error::Validation(single) => vec![single],
        Error::Multi(multi) => multi.into_errors(),
        Error::Compilation(_) => Vec::new(),
    };
    if violations.is_empty() {
        return Ok(());
    }

    if fail_fast {
        Err(Error::Validation(violations.swap_remove(0)))
    } else {
        Err(Error::Multi(MultiError(violations)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::{CompilationError, Error, MultiError, finish, merge_violations};
    use crate::violation::{FieldError, ValidationError};

    fn violation(reason: &str) -> Error {
        Error::Validation(ValidationError::new("Redis", "key", reason))
    }

    #[test]
    fn multi_error_joins_messages_in_order() {
        let multi = MultiError::new(vec![
            ValidationError::new("Redis", "key", "reason A"),
            ValidationError::new("Redis", "key", "reason B"),
        ]);
        assert_eq!(
            multi.to_string(),
            "invalid Redis.key: reason A; invalid Redis.key: reason B"
        );
        assert_eq!(multi.len(), 2);
        assert!(!multi.is_empty());
        let reasons: Vec<_> = multi.iter().map(|v| v.reason().to_string()).collect();
        assert_eq!(reasons, vec!["reason A", "reason B"]);
    }

    #[test]
    fn empty_multi_error_renders_nothing() {
        assert_eq!(MultiError::default().to_string(), "");
        assert!(MultiError::default().is_empty());
    }

    #[test]
    fn top_level_error_is_transparent() {
        let err = violation("reason A");
        assert_eq!(err.to_string(), "invalid Redis.key: reason A");

        let compile = Error::from(CompilationError {
            cause: "bad regex".to_string(),
        });
        assert_eq!(compile.to_string(), "compilation error: bad regex");
        assert!(compile.violations().is_empty());
    }

    #[test]
    fn merge_violations_handles_compilation_and_violation_paths() {
        let (cont, acc) = merge_violations(None, Ok(()), true);
        assert!(cont);
        assert!(acc.is_none());

        let compile = Error::Compilation(CompilationError {
            cause: "broken".to_string(),
        });
        let (cont, acc) = merge_violations(None, Err(compile), false);
        assert!(!cont);
        assert!(matches!(acc, Some(Error::Compilation(_))));

        let (cont, acc) = merge_violations(None, Err(violation("A")), true);
        assert!(!cont);
        assert_eq!(acc.expect("accumulated").violations().len(), 1);

        let (cont, acc) = merge_violations(Some(violation("A")), Err(violation("B")), false);
        assert!(cont);
        let reasons: Vec<_> = acc
            .expect("accumulated")
            .violations()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            reasons,
            vec!["invalid Redis.key: A", "invalid Redis.key: B"]
        );
    }

    #[test]
    fn merge_violations_truncates_batches_when_failing_fast() {
        let batch = Error::Multi(MultiError::new(vec![
            ValidationError::new("Redis", "key", "A"),
            ValidationError::new("Redis", "key", "B"),
        ]));
        let (cont, acc) = merge_violations(None, Err(batch), true);
        assert!(!cont);
        let acc = acc.expect("accumulated");
        assert_eq!(acc.violations().len(), 1);
        assert_eq!(acc.violations()[0].to_string(), "invalid Redis.key: A");
    }

    #[test]
    fn finish_shapes_result_by_mode() {
        let fast = finish(Err(violation("A")), true).expect_err("violation");
        assert!(matches!(fast, Error::Validation(_)));

        let all = finish(Err(violation("A")), false).expect_err("violation");
        let Error::Multi(multi) = all else {
            panic!("collect-all must return an aggregate");
        };
        assert_eq!(multi.len(), 1);

        assert!(finish(Err(Error::Multi(MultiError::default())), false).is_ok());
        assert!(finish(Ok(()), true).is_ok());
    }

    proptest! {
        #[test]
        fn all_errors_preserves_input_sequence(reasons in vec("[a-z ]{1,10}", 0..8)) {
            let errors: Vec<_> = reasons
                .iter()
                .map(|r| ValidationError::new("Redis", "key", r.clone()))
                .collect();
            let multi = MultiError::new(errors.clone());

            let rendered: Vec<_> = multi.all_errors().iter().map(ToString::to_string).collect();
            let expected: Vec<_> = errors.iter().map(ToString::to_string).collect();
            prop_assert_eq!(&rendered, &expected);
            prop_assert_eq!(multi.to_string(), expected.join("; "));
        }
    }
}
