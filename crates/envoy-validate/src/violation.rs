use std::fmt;
use std::sync::Arc;

/// Shared, thread-safe error used as the cause of a violation.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Structured accessors shared by every per-field validation error.
///
/// Lets callers inspect the offending field without parsing the rendered message.
/// The underlying error is also reachable through `std::error::Error::source`.
pub trait FieldError: fmt::Display {
    /// Path of the offending field inside its message, e.g. `key` or `hosts[2]`.
    fn field(&self) -> &str;

    /// Human-readable description of the violated rule.
    fn reason(&self) -> &str;

    /// Underlying error that triggered the violation, if any.
    fn cause(&self) -> Option<&Cause>;

    /// Returns true if the violation concerns a map key rather than a value.
    fn key(&self) -> bool;

    /// Name identifying the error type, e.g. `RedisValidationError`.
    fn error_name(&self) -> String;
}

/// A single instance where a field rule was not met.
///
/// Renders as `invalid [key for ]<Message>.<field>: <reason>[ | caused by: <cause>]`.
#[derive(Clone)]
pub struct ValidationError {
    message: String,
    field: String,
    reason: String,
    cause: Option<Cause>,
    key: bool,
}

impl ValidationError {
    /// Create a violation of `field` on the message named `message` (short name, e.g. `Redis`).
    pub fn new(
        message: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            field: field.into(),
            reason: reason.into(),
            cause: None,
            key: false,
        }
    }

    /// A violation whose message and field are filled in by the enclosing evaluator.
    pub(crate) fn from_reason(reason: impl Into<String>) -> Self {
        Self::new("", "", reason)
    }

    /// Attach the underlying error.
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attach an already shared cause.
    #[must_use]
    pub fn with_shared_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Mark this violation as concerning a map key.
    #[must_use]
    pub fn for_key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Short name of the message the field belongs to.
    #[must_use]
    pub fn message_name(&self) -> &str {
        &self.message
    }

    pub(crate) fn mark_for_key(&mut self) {
        self.key = true;
    }

    /// Prefix the field path with `segment`. Subscripts (`[..]`) attach
    /// without a separator.
    pub(crate) fn prepend_field(&mut self, segment: &str) {
        if self.field.is_empty() {
            self.field = segment.to_string();
        } else if self.field.starts_with('[') {
            self.field = format!("{segment}{}", self.field);
        } else {
            self.field = format!("{segment}.{}", self.field);
        }
    }

    /// Record the owning message, unless an inner evaluator already did.
    pub(crate) fn set_message_if_empty(&mut self, message: &str) {
        if self.message.is_empty() {
            self.message = message.to_string();
        }
    }
}

impl FieldError for ValidationError {
    fn field(&self) -> &str {
        &self.field
    }

    fn reason(&self) -> &str {
        &self.reason
    }

    fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    fn key(&self) -> bool {
        self.key
    }

    fn error_name(&self) -> String {
        format!("{}ValidationError", self.message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.key { "key for " } else { "" };
        write!(
            f,
            "invalid {key}{}.{}: {}",
            self.message, self.field, self.reason
        )?;
        if let Some(cause) = &self.cause {
            write!(f, " | caused by: {cause}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&self.error_name())
            .field("field", &self.field)
            .field("reason", &self.reason)
            .field("cause", &self.cause.as_ref().map(ToString::to_string))
            .field("key", &self.key)
            .finish()
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::{FieldError, ValidationError};

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    fn has_cause<E: FieldError>(err: &E) -> bool {
        err.cause().is_some()
    }

    #[test]
    fn renders_plain_violation() {
        let err = ValidationError::new("Redis", "key", "value is required");
        assert_eq!(err.to_string(), "invalid Redis.key: value is required");
    }

    #[test]
    fn key_flag_adds_prefix() {
        let err = ValidationError::new("Redis", "labels[env]", "bad key").for_key();
        assert!(err.key());
        assert_eq!(err.to_string(), "invalid key for Redis.labels[env]: bad key");

        let value = ValidationError::new("Redis", "labels[env]", "bad value");
        assert!(!value.key());
        assert_eq!(value.to_string(), "invalid Redis.labels[env]: bad value");
    }

    #[test]
    fn cause_adds_suffix_and_source() {
        let err = ValidationError::new("Redis", "key", "lookup failed").with_cause(Refused);
        assert_eq!(
            err.to_string(),
            "invalid Redis.key: lookup failed | caused by: connection refused"
        );
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string).as_deref(),
            Some("connection refused")
        );
        assert!(has_cause(&err));

        let plain = ValidationError::new("Redis", "key", "lookup failed");
        assert!(!has_cause(&plain));
        assert!(std::error::Error::source(&plain).is_none());
        assert!(!plain.to_string().contains("caused by"));
    }

    #[test]
    fn accessors_expose_structured_fields() {
        let err = ValidationError::new("Redis", "key", "reason A");
        assert_eq!(err.field(), "key");
        assert_eq!(err.reason(), "reason A");
        assert_eq!(err.message_name(), "Redis");
        assert_eq!(err.error_name(), "RedisValidationError");
    }

    #[test]
    fn prepend_field_joins_names_and_subscripts() {
        let mut err = ValidationError::from_reason("bad");
        err.prepend_field("[2]");
        err.prepend_field("hosts");
        assert_eq!(err.field(), "hosts[2]");

        let mut nested = ValidationError::from_reason("bad");
        nested.prepend_field("port");
        nested.prepend_field("endpoint");
        assert_eq!(nested.field(), "endpoint.port");
    }

    #[test]
    fn set_message_if_empty_keeps_inner_owner() {
        let mut err = ValidationError::new("Endpoint", "port", "bad");
        err.set_message_if_empty("Cluster");
        assert_eq!(err.message_name(), "Endpoint");

        let mut bare = ValidationError::from_reason("bad");
        bare.set_message_if_empty("Cluster");
        assert_eq!(bare.message_name(), "Cluster");
    }

    proptest! {
        #[test]
        fn rendering_follows_template(
            field in "[a-z_]{1,12}",
            reason in "[a-zA-Z0-9 ]{0,24}",
            key in any::<bool>(),
        ) {
            let mut err = ValidationError::new("Redis", field.clone(), reason.clone());
            if key {
                err = err.for_key();
            }
            let prefix = if key { "key for " } else { "" };
            prop_assert_eq!(err.to_string(), format!("invalid {prefix}Redis.{field}: {reason}"));
        }
    }
}
