use std::sync::{Arc, LazyLock};

use prost_reflect::{DynamicMessage, ReflectMessage};

use envoy_validate_types::RULES;

use crate::config::{ValidationConfig, ValidationOption, ValidatorOption};
use crate::error::{self, Error};

mod builder;
mod evaluator;
mod lookups;
mod rules;

use builder::Builder;
use evaluator::MessageEvaluator;

/// Thread-safe validator for Envoy configuration messages.
///
/// Validates messages against the rule tables registered for their type.
/// Evaluators are compiled lazily and cached for reuse.
pub struct Validator {
    builder: Builder,
    config: ValidationConfig,
}

impl Validator {
    /// Create a new `Validator` using the built-in rule tables.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(&[])
    }

    /// Create a new `Validator` with the given options.
    #[must_use]
    pub fn with_options(options: &[ValidatorOption]) -> Self {
        let mut disable_lazy = false;
        let mut allow_unknown_fields = false;
        let mut message_descriptors = Vec::new();
        let mut rules = RULES.clone();

        for opt in options {
            match opt {
                ValidatorOption::DisableLazy => disable_lazy = true,
                ValidatorOption::AllowUnknownFields => allow_unknown_fields = true,
                ValidatorOption::MessageDescriptors(descriptors) => {
                    message_descriptors.extend(descriptors.iter().cloned());
                }
                ValidatorOption::Rules(extra) => rules.extend(extra.clone()),
            }
        }

        let builder = Builder::new(rules, !disable_lazy, allow_unknown_fields);
        for descriptor in &message_descriptors {
            builder.preload(descriptor);
        }

        Self {
            builder,
            config: ValidationConfig::default(),
        }
    }

    /// Validate a message, stopping at the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with the first violation found, or
    /// [`Error::Compilation`] if the rules for the message are inconsistent.
    pub fn validate<M: ReflectMessage>(&self, msg: &M) -> Result<(), Error> {
        self.validate_with(msg, &[ValidationOption::FailFast])
    }

    /// Validate a message, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Multi`] with all violations in detection order, or
    /// [`Error::Compilation`] if the rules for the message are inconsistent.
    pub fn validate_all<M: ReflectMessage>(&self, msg: &M) -> Result<(), Error> {
        self.validate_with(msg, &[])
    }

    /// Validate a message with per-call validation options. Collects every
    /// violation unless [`ValidationOption::FailFast`] is given.
    ///
    /// # Errors
    ///
    /// Returns the violations found, or a compilation error.
    pub fn validate_with<M: ReflectMessage>(
        &self,
        msg: &M,
        options: &[ValidationOption],
    ) -> Result<(), Error> {
        let dynamic = msg.transcode_to_dynamic();
        let descriptor = dynamic.descriptor();
        let eval = self.builder.load_or_build(&descriptor);
        let cfg = effective_config(&self.config, options);

        let result = error::finish(eval.evaluate_message(&dynamic, &cfg), cfg.fail_fast);
        tracing::trace!(
            message_type = descriptor.full_name(),
            fail_fast = cfg.fail_fast,
            violations = result.as_ref().err().map_or(0, |err| err.violations().len()),
            "validated message"
        );
        result
    }
}

fn effective_config(base: &ValidationConfig, options: &[ValidationOption]) -> ValidationConfig {
    let mut cfg = ValidationConfig {
        fail_fast: base.fail_fast,
        filter: Arc::clone(&base.filter),
    };

    for option in options {
        match option {
            ValidationOption::FailFast => cfg.fail_fast = true,
            ValidationOption::Filter(filter) => cfg.filter = Arc::clone(filter),
        }
    }

    cfg
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_VALIDATOR: LazyLock<Validator> = LazyLock::new(Validator::new);

/// Validate a message with a global `Validator`, stopping at the first violation.
///
/// # Errors
///
/// Returns [`Error::Validation`] with the first violation found, or
/// [`Error::Compilation`] if the rules for the message are inconsistent.
pub fn validate<M: ReflectMessage>(msg: &M) -> Result<(), Error> {
    GLOBAL_VALIDATOR.validate(msg)
}

/// Validate a message with a global `Validator`, collecting every violation.
///
/// # Errors
///
/// Returns [`Error::Multi`] with all violations in detection order, or
/// [`Error::Compilation`] if the rules for the message are inconsistent.
pub fn validate_all<M: ReflectMessage>(msg: &M) -> Result<(), Error> {
    GLOBAL_VALIDATOR.validate_all(msg)
}

/// Validation entry points on the message itself.
///
/// ```rust
/// use envoy_validate::Validate;
/// use envoy_validate::types::health_checkers::redis::v3::Redis;
///
/// let redis = Redis { key: "probe".to_string() };
/// assert!(redis.validate().is_ok());
/// assert!(None::<Redis>.validate_all().is_ok());
/// ```
pub trait Validate {
    /// Check the rules, returning the first violation.
    ///
    /// # Errors
    ///
    /// See [`Validator::validate`].
    fn validate(&self) -> Result<(), Error>;

    /// Check the rules, returning every violation.
    ///
    /// # Errors
    ///
    /// See [`Validator::validate_all`].
    fn validate_all(&self) -> Result<(), Error>;
}

impl<T: Validate + ?Sized> Validate for &T {
    fn validate(&self) -> Result<(), Error> {
        (**self).validate()
    }

    fn validate_all(&self) -> Result<(), Error> {
        (**self).validate_all()
    }
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn validate(&self) -> Result<(), Error> {
        (**self).validate()
    }

    fn validate_all(&self) -> Result<(), Error> {
        (**self).validate_all()
    }
}

/// An absent message is valid.
impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), Error> {
        self.as_ref().map_or(Ok(()), Validate::validate)
    }

    fn validate_all(&self) -> Result<(), Error> {
        self.as_ref().map_or(Ok(()), Validate::validate_all)
    }
}

/// Implement [`Validate`] for message types through the global validator.
///
/// The types must implement `prost_reflect::ReflectMessage`.
#[macro_export]
macro_rules! impl_validate {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Validate for $ty {
                fn validate(&self) -> ::core::result::Result<(), $crate::Error> {
                    $crate::validate(self)
                }

                fn validate_all(&self) -> ::core::result::Result<(), $crate::Error> {
                    $crate::validate_all(self)
                }
            }
        )+
    };
}

impl_validate!(
    DynamicMessage,
    envoy_validate_types::health_checkers::redis::v3::Redis,
);
