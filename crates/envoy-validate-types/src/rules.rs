//! Rule tables in the `validate.rules` vocabulary used by Envoy's API.
//!
//! A [`RuleSet`] maps fully-qualified message names to [`MessageRules`], and
//! each [`MessageRules`] maps field names to [`FieldRules`]. Fields absent
//! from the table, or present with no rule type, carry no constraints.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::health_checkers;

/// Rules for every message type shipped by this crate.
pub static RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new().with_message_rules([health_checkers::redis::v3::rules()]));

/// Rule tables keyed by fully-qualified message name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    messages: BTreeMap<String, MessageRules>,
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a rule set from its JSON form:
    /// `{"pkg.Message": {"fields": {"name": {"type": {"string": {"min_len": 1}}}}}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid rule set document.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse validation rule set")
    }

    /// Add rules for a message, returning the updated set.
    #[must_use]
    pub fn with_message(mut self, full_name: impl Into<String>, rules: MessageRules) -> Self {
        self.insert(full_name, rules);
        self
    }

    /// Add several `(full_name, rules)` pairs, returning the updated set.
    #[must_use]
    pub fn with_message_rules<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, MessageRules)>,
    {
        self.messages.extend(entries);
        self
    }

    /// Insert rules for a message. Returns the rules previously registered under that name.
    pub fn insert(
        &mut self,
        full_name: impl Into<String>,
        rules: MessageRules,
    ) -> Option<MessageRules> {
        self.messages.insert(full_name.into(), rules)
    }

    /// Merge `other` into this set. Entries in `other` replace existing ones.
    pub fn extend(&mut self, other: RuleSet) {
        self.messages.extend(other.messages);
    }

    /// Returns the rules registered for `full_name`, if any.
    #[must_use]
    pub fn get(&self, full_name: &str) -> Option<&MessageRules> {
        self.messages.get(full_name)
    }

    /// Iterate `(full_name, rules)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MessageRules)> {
        self.messages.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of message types with rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no message type has rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Rules attached to a single message type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageRules {
    /// Skip every field rule of this message.
    pub disabled: bool,
    /// Field rules keyed by proto field name.
    pub fields: BTreeMap<String, FieldRules>,
    /// Names of oneofs that must have exactly one member set.
    pub required_oneofs: Vec<String>,
}

impl MessageRules {
    /// Returns the rules for `field`, if the table mentions it.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldRules> {
        self.fields.get(field)
    }

    /// Add rules for a field, returning the updated table.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.insert(name.into(), rules);
        self
    }
}

/// Constraints on a single field, or on a repeated item / map key / map value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRules {
    /// Rules that apply to message-typed fields.
    pub message: Option<MessageFieldRules>,
    /// Type-specific rules. Must match the field's kind.
    pub r#type: Option<Type>,
}

impl FieldRules {
    /// Field rules with only a type-specific rule set.
    #[must_use]
    pub fn of(r#type: Type) -> Self {
        Self {
            message: None,
            r#type: Some(r#type),
        }
    }

    /// Field rules with only message rules.
    #[must_use]
    pub fn message(rules: MessageFieldRules) -> Self {
        Self {
            message: Some(rules),
            r#type: None,
        }
    }

    /// Returns true if these rules declare no constraint at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.r#type.is_none() && self.message.as_ref().is_none_or(MessageFieldRules::is_empty)
    }
}

/// Rules for message-typed fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageFieldRules {
    /// Do not validate the embedded message.
    pub skip: bool,
    /// The field must be set.
    pub required: bool,
}

impl MessageFieldRules {
    /// Returns true if neither `skip` nor `required` is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.skip && !self.required
    }
}

/// Type-specific rule sets, one per field kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Float(FloatRules),
    Double(DoubleRules),
    Int32(Int32Rules),
    Int64(Int64Rules),
    Uint32(UInt32Rules),
    Uint64(UInt64Rules),
    Sint32(SInt32Rules),
    Sint64(SInt64Rules),
    Fixed32(Fixed32Rules),
    Fixed64(Fixed64Rules),
    Sfixed32(SFixed32Rules),
    Sfixed64(SFixed64Rules),
    Bool(BoolRules),
    String(StringRules),
    Bytes(BytesRules),
    Enum(EnumRules),
    Repeated(RepeatedRules),
    Map(MapRules),
}

/// Comparison rules shared by every numeric field kind.
///
/// When both a lower and an upper bound are set, the value must lie inside
/// the range if lower < upper, and outside it otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericRules<T> {
    pub r#const: Option<T>,
    pub lt: Option<T>,
    pub lte: Option<T>,
    pub gt: Option<T>,
    pub gte: Option<T>,
    pub r#in: Vec<T>,
    pub not_in: Vec<T>,
    /// Skip the rules when the value is zero.
    pub ignore_empty: bool,
}

pub type FloatRules = NumericRules<f32>;
pub type DoubleRules = NumericRules<f64>;
pub type Int32Rules = NumericRules<i32>;
pub type Int64Rules = NumericRules<i64>;
pub type UInt32Rules = NumericRules<u32>;
pub type UInt64Rules = NumericRules<u64>;
pub type SInt32Rules = NumericRules<i32>;
pub type SInt64Rules = NumericRules<i64>;
pub type Fixed32Rules = NumericRules<u32>;
pub type Fixed64Rules = NumericRules<u64>;
pub type SFixed32Rules = NumericRules<i32>;
pub type SFixed64Rules = NumericRules<i64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoolRules {
    pub r#const: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringRules {
    pub r#const: Option<String>,
    /// Exact length in Unicode code points.
    pub len: Option<u64>,
    pub min_len: Option<u64>,
    pub max_len: Option<u64>,
    /// Exact length in bytes.
    pub len_bytes: Option<u64>,
    pub min_bytes: Option<u64>,
    pub max_bytes: Option<u64>,
    /// RE2-compatible regular expression the whole value must match.
    pub pattern: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub contains: Option<String>,
    pub not_contains: Option<String>,
    pub r#in: Vec<String>,
    pub not_in: Vec<String>,
    pub well_known: Option<WellKnownString>,
    /// Strict RFC 7230 header validation for `http_header_*`. Defaults to true.
    pub strict: Option<bool>,
    pub ignore_empty: bool,
}

/// Well-known string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellKnownString {
    Email,
    Hostname,
    Ip,
    Ipv4,
    Ipv6,
    Uri,
    UriRef,
    /// Hostname or IP address.
    Address,
    Uuid,
    HttpHeaderName,
    HttpHeaderValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BytesRules {
    pub r#const: Option<Vec<u8>>,
    pub len: Option<u64>,
    pub min_len: Option<u64>,
    pub max_len: Option<u64>,
    pub pattern: Option<String>,
    pub prefix: Option<Vec<u8>>,
    pub suffix: Option<Vec<u8>>,
    pub contains: Option<Vec<u8>>,
    pub r#in: Vec<Vec<u8>>,
    pub not_in: Vec<Vec<u8>>,
    pub well_known: Option<WellKnownBytes>,
    pub ignore_empty: bool,
}

/// Well-known byte formats (packed network addresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellKnownBytes {
    Ip,
    Ipv4,
    Ipv6,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumRules {
    pub r#const: Option<i32>,
    /// Reject numbers that have no declared enum value.
    pub defined_only: bool,
    pub r#in: Vec<i32>,
    pub not_in: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatedRules {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    /// Items must be pairwise distinct. Only valid for scalar and enum items.
    pub unique: bool,
    /// Rules applied to every item.
    pub items: Option<Box<FieldRules>>,
    pub ignore_empty: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapRules {
    pub min_pairs: Option<u64>,
    pub max_pairs: Option<u64>,
    /// Rules applied to every key.
    pub keys: Option<Box<FieldRules>>,
    /// Rules applied to every value.
    pub values: Option<Box<FieldRules>>,
    pub ignore_empty: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn from_json_reads_nested_rule_tables() {
        let rules = RuleSet::from_json(
            r#"{
                "fixtures.v1.Cluster": {
                    "fields": {
                        "name": {"type": {"string": {"min_len": 1, "well_known": "hostname"}}},
                        "hosts": {"type": {"repeated": {"items": {"type": {"string": {"prefix": "h"}}}}}},
                        "endpoint": {"message": {"required": true}}
                    },
                    "required_oneofs": ["target"]
                }
            }"#,
        )
        .expect("rule set should parse");

        let cluster = rules.get("fixtures.v1.Cluster").expect("cluster rules");
        assert_eq!(cluster.required_oneofs, vec!["target".to_string()]);
        assert_eq!(
            cluster.field("name"),
            Some(&FieldRules::of(Type::String(StringRules {
                min_len: Some(1),
                well_known: Some(WellKnownString::Hostname),
                ..Default::default()
            })))
        );
        assert_eq!(
            cluster.field("endpoint"),
            Some(&FieldRules::message(MessageFieldRules {
                required: true,
                skip: false,
            }))
        );

        let hosts = cluster.field("hosts").expect("hosts rules");
        let Some(Type::Repeated(repeated)) = &hosts.r#type else {
            panic!("hosts should carry repeated rules");
        };
        let items = repeated.items.as_deref().expect("item rules");
        assert!(matches!(items.r#type, Some(Type::String(ref s)) if s.prefix.as_deref() == Some("h")));
    }

    #[test]
    fn from_json_rejects_malformed_documents() {
        let err = RuleSet::from_json(r#"{"pkg.M": {"fields": {"x": {"type": {"strng": {}}}}}}"#)
            .expect_err("unknown rule type must not parse");
        assert!(err.to_string().contains("failed to parse validation rule set"));
    }

    #[test]
    fn extend_replaces_existing_entries() {
        let mut base = RuleSet::new().with_message("a.A", MessageRules::default());
        base.extend(RuleSet::new().with_message(
            "a.A",
            MessageRules {
                disabled: true,
                ..Default::default()
            },
        ));

        assert_eq!(base.len(), 1);
        assert!(base.get("a.A").is_some_and(|r| r.disabled));
    }

    #[test]
    fn empty_field_rules_declare_nothing() {
        assert!(FieldRules::default().is_empty());
        assert!(FieldRules::message(MessageFieldRules::default()).is_empty());
        assert!(!FieldRules::of(Type::Bool(BoolRules { r#const: Some(true) })).is_empty());
    }

    #[test]
    fn built_in_rules_cover_redis_without_constraints() {
        let redis = RULES
            .get("envoy.extensions.health_checkers.redis.v3.Redis")
            .expect("redis rules are registered");
        assert!(!redis.disabled);
        assert!(redis.field("key").is_some_and(FieldRules::is_empty));
    }
}
