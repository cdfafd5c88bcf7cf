use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use uriparse::{URI, URIReference};

use envoy_validate_types::{StringRules, WellKnownString};

use crate::config::ValidationConfig;
use crate::error::{CompilationError, Error};
use crate::violation::ValidationError;

use super::{format_list, into_result};

#[allow(clippy::expect_used)]
static EMAIL_LOCAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+$").expect("email local part regex must compile")
});
#[allow(clippy::expect_used)]
static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid regex must compile")
});
#[allow(clippy::expect_used)]
static HTTP_HEADER_NAME_STRICT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^:?[0-9a-zA-Z!#$%&\\'*+-.^_|~\\x60]+$")
        .expect("strict HTTP header name regex must compile")
});
#[allow(clippy::expect_used)]
static HTTP_HEADER_VALUE_STRICT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[^\\x00-\\x08\\x0A-\\x1F\\x7F]*$")
        .expect("strict HTTP header value regex must compile")
});
#[allow(clippy::expect_used)]
static HTTP_HEADER_LOOSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[^\\x00\\x0A\\x0D]*$").expect("loose HTTP header regex must compile")
});

/// Why a string is not in a well-known format. Carried as the violation cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum FormatError {
    #[error("hostname cannot exceed 253 characters")]
    HostnameTooLong,
    #[error("hostname part must be non-empty and cannot exceed 63 characters")]
    HostnamePartLength,
    #[error("hostname parts cannot begin with hyphens")]
    HostnamePartLeadingHyphen,
    #[error("hostname parts cannot end with hyphens")]
    HostnamePartTrailingHyphen,
    #[error("hostname parts can only contain alphanumeric characters or hyphens, got {0:?}")]
    HostnamePartCharacter(char),
    #[error("email address cannot exceed 254 characters")]
    EmailTooLong,
    #[error("email address is missing an '@'")]
    EmailMissingAt,
    #[error("email address local part cannot exceed 64 characters")]
    EmailLocalTooLong,
    #[error("email address local part is malformed")]
    EmailLocalMalformed,
    #[error("invalid uuid format")]
    Uuid,
    #[error("URI scheme is malformed")]
    UriScheme,
    #[error("{0}")]
    Uri(String),
}

pub(crate) struct StringRuleEval {
    r#const: Option<String>,
    len: Option<u64>,
    min_len: Option<u64>,
    max_len: Option<u64>,
    len_bytes: Option<u64>,
    min_bytes: Option<u64>,
    max_bytes: Option<u64>,
    pattern: Option<Regex>,
    prefix: Option<String>,
    suffix: Option<String>,
    contains: Option<String>,
    not_contains: Option<String>,
    r#in: Vec<String>,
    in_set: HashSet<String>,
    not_in: Vec<String>,
    not_in_set: HashSet<String>,
    strict: bool,
    well_known: Option<WellKnownString>,
}

impl StringRuleEval {
    pub fn new(rules: &StringRules) -> Result<Self, CompilationError> {
        let pattern = rules
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| CompilationError {
                cause: format!("invalid regex pattern: {e}"),
            })?;

        Ok(Self {
            r#const: rules.r#const.clone(),
            len: rules.len,
            min_len: rules.min_len,
            max_len: rules.max_len,
            len_bytes: rules.len_bytes,
            min_bytes: rules.min_bytes,
            max_bytes: rules.max_bytes,
            pattern,
            prefix: rules.prefix.clone(),
            suffix: rules.suffix.clone(),
            contains: rules.contains.clone(),
            not_contains: rules.not_contains.clone(),
            r#in: rules.r#in.clone(),
            in_set: rules.r#in.iter().cloned().collect(),
            not_in: rules.not_in.clone(),
            not_in_set: rules.not_in.iter().cloned().collect(),
            strict: rules.strict.unwrap_or(true),
            well_known: rules.well_known,
        })
    }

    pub fn tautology(&self) -> bool {
        self.r#const.is_none()
            && self.len.is_none()
            && self.min_len.is_none()
            && self.max_len.is_none()
            && self.len_bytes.is_none()
            && self.min_bytes.is_none()
            && self.max_bytes.is_none()
            && self.pattern.is_none()
            && self.prefix.is_none()
            && self.suffix.is_none()
            && self.contains.is_none()
            && self.not_contains.is_none()
            && self.r#in.is_empty()
            && self.not_in.is_empty()
            && self.well_known.is_none()
    }

    #[allow(clippy::too_many_lines)]
    pub fn evaluate(
        &self,
        val: &prost_reflect::Value,
        _cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let Some(s) = val.as_str() else {
            return Ok(());
        };

        let mut violations = Vec::new();

        if let Some(ref c) = self.r#const {
            if s != c {
                violations.push(ValidationError::from_reason(format!(
                    "value must equal {c:?}"
                )));
            }
        }

        let char_count = s.chars().count() as u64;

        if let Some(len) = self.len {
            if char_count != len {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be {len} runes"
                )));
            }
        }
        if let Some(min) = self.min_len {
            if char_count < min {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be at least {min} runes"
                )));
            }
        }
        if let Some(max) = self.max_len {
            if char_count > max {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be at most {max} runes"
                )));
            }
        }

        let byte_len = s.len() as u64;

        if let Some(len) = self.len_bytes {
            if byte_len != len {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be {len} bytes"
                )));
            }
        }
        if let Some(min) = self.min_bytes {
            if byte_len < min {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be at least {min} bytes"
                )));
            }
        }
        if let Some(max) = self.max_bytes {
            if byte_len > max {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be at most {max} bytes"
                )));
            }
        }

        if let Some(ref pat) = self.pattern {
            if !pat.is_match(s) {
                violations.push(ValidationError::from_reason(format!(
                    "value does not match regex pattern {:?}",
                    pat.as_str()
                )));
            }
        }

        if let Some(ref prefix) = self.prefix {
            if !s.starts_with(prefix.as_str()) {
                violations.push(ValidationError::from_reason(format!(
                    "value does not have prefix {prefix:?}"
                )));
            }
        }
        if let Some(ref suffix) = self.suffix {
            if !s.ends_with(suffix.as_str()) {
                violations.push(ValidationError::from_reason(format!(
                    "value does not have suffix {suffix:?}"
                )));
            }
        }
        if let Some(ref contains) = self.contains {
            if !s.contains(contains.as_str()) {
                violations.push(ValidationError::from_reason(format!(
                    "value does not contain substring {contains:?}"
                )));
            }
        }
        if let Some(ref not_contains) = self.not_contains {
            if s.contains(not_contains.as_str()) {
                violations.push(ValidationError::from_reason(format!(
                    "value contains substring {not_contains:?}"
                )));
            }
        }

        if !self.in_set.is_empty() && !self.in_set.contains(s) {
            violations.push(ValidationError::from_reason(format!(
                "value must be in list {}",
                format_list(&self.r#in)
            )));
        }
        if self.not_in_set.contains(s) {
            violations.push(ValidationError::from_reason(format!(
                "value must not be in list {}",
                format_list(&self.not_in)
            )));
        }

        if let Some(wk) = self.well_known {
            if let Some(v) = check_well_known(s, wk, self.strict) {
                violations.push(v);
            }
        }

        into_result(violations)
    }
}

fn check_well_known(s: &str, rule: WellKnownString, strict: bool) -> Option<ValidationError> {
    match rule {
        WellKnownString::Email => validate_email(s)
            .err()
            .map(|e| ValidationError::from_reason("value must be a valid email address").with_cause(e)),
        WellKnownString::Hostname => validate_hostname(s)
            .err()
            .map(|e| ValidationError::from_reason("value must be a valid hostname").with_cause(e)),
        WellKnownString::Ip => IpAddr::from_str(s)
            .err()
            .map(|_| ValidationError::from_reason("value must be a valid IP address")),
        WellKnownString::Ipv4 => Ipv4Addr::from_str(s)
            .err()
            .map(|_| ValidationError::from_reason("value must be a valid IPv4 address")),
        WellKnownString::Ipv6 => Ipv6Addr::from_str(s)
            .err()
            .map(|_| ValidationError::from_reason("value must be a valid IPv6 address")),
        WellKnownString::Uri => validate_uri(s)
            .err()
            .map(|e| ValidationError::from_reason("value must be a valid URI").with_cause(e)),
        WellKnownString::UriRef => validate_uri_ref(s)
            .err()
            .map(|e| ValidationError::from_reason("value must be a valid URI").with_cause(e)),
        WellKnownString::Address => (IpAddr::from_str(s).is_err()
            && validate_hostname(s).is_err())
        .then(|| ValidationError::from_reason("value must be a valid hostname, or ip address")),
        WellKnownString::Uuid => validate_uuid(s)
            .err()
            .map(|e| ValidationError::from_reason("value must be a valid UUID").with_cause(e)),
        WellKnownString::HttpHeaderName => {
            let regex = if strict {
                &*HTTP_HEADER_NAME_STRICT_REGEX
            } else {
                &*HTTP_HEADER_LOOSE_REGEX
            };
            (s.is_empty() || !regex.is_match(s)).then(|| regex_violation(regex))
        }
        WellKnownString::HttpHeaderValue => {
            let regex = if strict {
                &*HTTP_HEADER_VALUE_STRICT_REGEX
            } else {
                &*HTTP_HEADER_LOOSE_REGEX
            };
            (!regex.is_match(s)).then(|| regex_violation(regex))
        }
    }
}

fn regex_violation(regex: &Regex) -> ValidationError {
    ValidationError::from_reason(format!(
        "value does not match regex pattern {:?}",
        regex.as_str()
    ))
}

/// RFC 1034 hostname check. A single trailing dot is allowed.
pub(crate) fn validate_hostname(s: &str) -> Result<(), FormatError> {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.len() > 253 {
        return Err(FormatError::HostnameTooLong);
    }
    for part in s.split('.') {
        if part.is_empty() || part.len() > 63 {
            return Err(FormatError::HostnamePartLength);
        }
        if part.starts_with('-') {
            return Err(FormatError::HostnamePartLeadingHyphen);
        }
        if part.ends_with('-') {
            return Err(FormatError::HostnamePartTrailingHyphen);
        }
        if let Some(c) = part.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            return Err(FormatError::HostnamePartCharacter(c));
        }
    }
    Ok(())
}

/// Accepts a bare address or one wrapped in a display name, `Name <a@b>`.
pub(crate) fn validate_email(s: &str) -> Result<(), FormatError> {
    let addr = match (s.rfind('<'), s.strip_suffix('>')) {
        (Some(open), Some(inner)) => &inner[open + 1..],
        _ => s,
    };
    if addr.len() > 254 {
        return Err(FormatError::EmailTooLong);
    }
    let Some((local, domain)) = addr.rsplit_once('@') else {
        return Err(FormatError::EmailMissingAt);
    };
    if local.len() > 64 {
        return Err(FormatError::EmailLocalTooLong);
    }
    if !EMAIL_LOCAL_REGEX.is_match(local) {
        return Err(FormatError::EmailLocalMalformed);
    }
    validate_hostname(domain)
}

pub(crate) fn validate_uuid(s: &str) -> Result<(), FormatError> {
    if UUID_REGEX.is_match(s) {
        Ok(())
    } else {
        Err(FormatError::Uuid)
    }
}

pub(crate) fn validate_uri(s: &str) -> Result<(), FormatError> {
    if has_invalid_uri_scheme_prefix(s) {
        return Err(FormatError::UriScheme);
    }
    parse_without_panicking(|| URI::try_from(s).map(|_| ()).map_err(|e| e.to_string()))
}

pub(crate) fn validate_uri_ref(s: &str) -> Result<(), FormatError> {
    if has_invalid_uri_scheme_prefix(s) {
        return Err(FormatError::UriScheme);
    }
    parse_without_panicking(|| {
        URIReference::try_from(s)
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
}

/// `uriparse` panics on some malformed schemes.
fn parse_without_panicking(
    parse: impl FnOnce() -> Result<(), String>,
) -> Result<(), FormatError> {
    match catch_unwind(AssertUnwindSafe(parse)) {
        Ok(result) => result.map_err(FormatError::Uri),
        Err(_) => Err(FormatError::UriScheme),
    }
}

fn has_invalid_uri_scheme_prefix(s: &str) -> bool {
    let Some(scheme_end) = s.find(':') else {
        return false;
    };

    let first_hier_delim = s.find(['/', '?', '#']);
    if first_hier_delim.is_some_and(|idx| idx < scheme_end) {
        return false;
    }

    let scheme = &s[..scheme_end];
    let mut bytes = scheme.bytes();
    let Some(first) = bytes.next() else {
        return true;
    };
    if !first.is_ascii_alphabetic() {
        return true;
    }
    !bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}
