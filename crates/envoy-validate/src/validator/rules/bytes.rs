use std::collections::HashSet;

use regex::bytes::Regex as BytesRegex;

use envoy_validate_types::{BytesRules, WellKnownBytes};

use crate::config::ValidationConfig;
use crate::error::{CompilationError, Error};
use crate::violation::ValidationError;

use super::into_result;

pub(crate) struct BytesRuleEval {
    r#const: Option<Vec<u8>>,
    len: Option<u64>,
    min_len: Option<u64>,
    max_len: Option<u64>,
    pattern: Option<BytesRegex>,
    prefix: Option<Vec<u8>>,
    suffix: Option<Vec<u8>>,
    contains: Option<Vec<u8>>,
    r#in: Vec<Vec<u8>>,
    in_set: HashSet<Vec<u8>>,
    not_in: Vec<Vec<u8>>,
    not_in_set: HashSet<Vec<u8>>,
    well_known: Option<WellKnownBytes>,
}

impl BytesRuleEval {
    pub fn new(rules: &BytesRules) -> Result<Self, CompilationError> {
        let pattern = rules
            .pattern
            .as_deref()
            .map(BytesRegex::new)
            .transpose()
            .map_err(|e| CompilationError {
                cause: format!("invalid bytes regex pattern: {e}"),
            })?;

        Ok(Self {
            r#const: rules.r#const.clone(),
            len: rules.len,
            min_len: rules.min_len,
            max_len: rules.max_len,
            pattern,
            prefix: rules.prefix.clone(),
            suffix: rules.suffix.clone(),
            contains: rules.contains.clone(),
            r#in: rules.r#in.clone(),
            in_set: rules.r#in.iter().cloned().collect(),
            not_in: rules.not_in.clone(),
            not_in_set: rules.not_in.iter().cloned().collect(),
            well_known: rules.well_known,
        })
    }

    pub fn tautology(&self) -> bool {
        self.r#const.is_none()
            && self.len.is_none()
            && self.min_len.is_none()
            && self.max_len.is_none()
            && self.pattern.is_none()
            && self.prefix.is_none()
            && self.suffix.is_none()
            && self.contains.is_none()
            && self.r#in.is_empty()
            && self.not_in.is_empty()
            && self.well_known.is_none()
    }

    pub fn evaluate(
        &self,
        val: &prost_reflect::Value,
        _cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        let Some(b) = val.as_bytes() else {
            return Ok(());
        };

        let mut violations = Vec::new();

        if let Some(ref c) = self.r#const {
            if b != c.as_slice() {
                violations.push(ValidationError::from_reason(format!(
                    "value must equal {}",
                    quote(c)
                )));
            }
        }

        let len = b.len() as u64;
        if let Some(expected) = self.len {
            if len != expected {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be {expected} bytes"
                )));
            }
        }
        if let Some(min) = self.min_len {
            if len < min {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be at least {min} bytes"
                )));
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                violations.push(ValidationError::from_reason(format!(
                    "value length must be at most {max} bytes"
                )));
            }
        }

        if let Some(ref pat) = self.pattern {
            if !pat.is_match(b) {
                violations.push(ValidationError::from_reason(format!(
                    "value does not match regex pattern {:?}",
                    pat.as_str()
                )));
            }
        }

        if let Some(ref prefix) = self.prefix {
            if !b.starts_with(prefix) {
                violations.push(ValidationError::from_reason(format!(
                    "value does not have prefix {}",
                    quote(prefix)
                )));
            }
        }
        if let Some(ref suffix) = self.suffix {
            if !b.ends_with(suffix) {
                violations.push(ValidationError::from_reason(format!(
                    "value does not have suffix {}",
                    quote(suffix)
                )));
            }
        }
        if let Some(ref contains) = self.contains {
            if !contains.is_empty() && !b.windows(contains.len()).any(|w| w == contains.as_slice())
            {
                violations.push(ValidationError::from_reason(format!(
                    "value does not contain {}",
                    quote(contains)
                )));
            }
        }

        if !self.in_set.is_empty() && !self.in_set.contains(b.as_ref()) {
            violations.push(ValidationError::from_reason(format!(
                "value must be in list {}",
                quote_list(&self.r#in)
            )));
        }
        if self.not_in_set.contains(b.as_ref()) {
            violations.push(ValidationError::from_reason(format!(
                "value must not be in list {}",
                quote_list(&self.not_in)
            )));
        }

        if let Some(wk) = self.well_known {
            let reason = match wk {
                WellKnownBytes::Ip => {
                    (b.len() != 4 && b.len() != 16).then_some("value must be a valid IP address")
                }
                WellKnownBytes::Ipv4 => {
                    (b.len() != 4).then_some("value must be a valid IPv4 address")
                }
                WellKnownBytes::Ipv6 => {
                    (b.len() != 16).then_some("value must be a valid IPv6 address")
                }
            };
            if let Some(reason) = reason {
                violations.push(ValidationError::from_reason(reason));
            }
        }

        into_result(violations)
    }
}

fn quote(b: &[u8]) -> String {
    format!("{:?}", String::from_utf8_lossy(b))
}

fn quote_list(items: &[Vec<u8>]) -> String {
    let quoted: Vec<String> = items.iter().map(|b| quote(b)).collect();
    format!("[{}]", quoted.join(" "))
}
