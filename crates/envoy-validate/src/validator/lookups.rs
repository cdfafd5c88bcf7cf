use prost_reflect::{FieldDescriptor, Kind};

use envoy_validate_types::Type;

/// Maps a proto field kind to the rule-table type name it accepts.
pub(crate) fn expected_standard_rule(kind: &Kind) -> Option<&'static str> {
    match kind {
        Kind::Float => Some("float"),
        Kind::Double => Some("double"),
        Kind::Int32 => Some("int32"),
        Kind::Int64 => Some("int64"),
        Kind::Uint32 => Some("uint32"),
        Kind::Uint64 => Some("uint64"),
        Kind::Sint32 => Some("sint32"),
        Kind::Sint64 => Some("sint64"),
        Kind::Fixed32 => Some("fixed32"),
        Kind::Fixed64 => Some("fixed64"),
        Kind::Sfixed32 => Some("sfixed32"),
        Kind::Sfixed64 => Some("sfixed64"),
        Kind::Bool => Some("bool"),
        Kind::String => Some("string"),
        Kind::Bytes => Some("bytes"),
        Kind::Enum(_) => Some("enum"),
        Kind::Message(_) => None,
    }
}

/// The rule-table type name a field accepts. `nested` is true for repeated
/// items and map keys/values, which take the rules of their element kind.
pub(crate) fn expected_rule(field_desc: &FieldDescriptor, nested: bool) -> Option<&'static str> {
    if field_desc.is_map() && !nested {
        return Some("map");
    }
    if field_desc.is_list() && !nested {
        return Some("repeated");
    }
    expected_standard_rule(&field_desc.kind())
}

/// Name of a rule-table type, as spelled in JSON rule sets.
pub(crate) fn rule_name(rule: &Type) -> &'static str {
    match rule {
        Type::Float(_) => "float",
        Type::Double(_) => "double",
        Type::Int32(_) => "int32",
        Type::Int64(_) => "int64",
        Type::Uint32(_) => "uint32",
        Type::Uint64(_) => "uint64",
        Type::Sint32(_) => "sint32",
        Type::Sint64(_) => "sint64",
        Type::Fixed32(_) => "fixed32",
        Type::Fixed64(_) => "fixed64",
        Type::Sfixed32(_) => "sfixed32",
        Type::Sfixed64(_) => "sfixed64",
        Type::Bool(_) => "bool",
        Type::String(_) => "string",
        Type::Bytes(_) => "bytes",
        Type::Enum(_) => "enum",
        Type::Repeated(_) => "repeated",
        Type::Map(_) => "map",
    }
}

/// Whether the rule type asks to skip zero values.
pub(crate) fn ignores_empty(rule: &Type) -> bool {
    match rule {
        Type::Float(r) => r.ignore_empty,
        Type::Double(r) => r.ignore_empty,
        Type::Int32(r) | Type::Sint32(r) | Type::Sfixed32(r) => r.ignore_empty,
        Type::Int64(r) | Type::Sint64(r) | Type::Sfixed64(r) => r.ignore_empty,
        Type::Uint32(r) | Type::Fixed32(r) => r.ignore_empty,
        Type::Uint64(r) | Type::Fixed64(r) => r.ignore_empty,
        Type::String(r) => r.ignore_empty,
        Type::Bytes(r) => r.ignore_empty,
        Type::Repeated(r) => r.ignore_empty,
        Type::Map(r) => r.ignore_empty,
        Type::Bool(_) | Type::Enum(_) => false,
    }
}

/// Returns true if this field descriptor refers to a message type.
pub(crate) fn is_message_field(desc: &FieldDescriptor) -> bool {
    desc.kind().as_message().is_some()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use prost_reflect::{Kind, ReflectMessage};

    use envoy_validate_types::health_checkers::redis::v3::Redis;
    use envoy_validate_types::{BoolRules, StringRules, Type};

    use super::{expected_rule, expected_standard_rule, ignores_empty, rule_name};

    #[test]
    fn redis_key_accepts_string_rules() {
        let key = Redis::default()
            .descriptor()
            .get_field_by_name("key")
            .expect("key field");
        assert_eq!(expected_rule(&key, false), Some("string"));
        assert_eq!(
            rule_name(&Type::String(StringRules::default())),
            "string"
        );
    }

    #[test]
    fn message_kinds_accept_no_type_rules() {
        let message_kind = Kind::Message(Redis::default().descriptor());
        assert_eq!(expected_standard_rule(&message_kind), None);
        assert_eq!(expected_standard_rule(&Kind::Sfixed64), Some("sfixed64"));
    }

    #[test]
    fn ignore_empty_is_read_per_rule_type() {
        assert!(ignores_empty(&Type::String(StringRules {
            ignore_empty: true,
            ..Default::default()
        })));
        assert!(!ignores_empty(&Type::Bool(BoolRules::default())));
    }
}
