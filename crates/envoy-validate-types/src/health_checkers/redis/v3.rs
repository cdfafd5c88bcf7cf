//! `envoy.extensions.health_checkers.redis.v3`

use std::sync::LazyLock;

use prost_reflect::{MessageDescriptor, ReflectMessage};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::DESCRIPTOR_POOL;
use crate::rules::{FieldRules, MessageRules};

const PACKAGE: &str = "envoy.extensions.health_checkers.redis.v3";
const FILE_NAME: &str = "envoy/extensions/health_checkers/redis/v3/redis.proto";

#[allow(clippy::expect_used)]
static REDIS_DESCRIPTOR: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    DESCRIPTOR_POOL
        .get_message_by_name(Redis::FULL_NAME)
        .expect("Redis descriptor must be registered in DESCRIPTOR_POOL")
});

/// Configuration for the Redis health checker.
///
/// The checker issues `PING` and expects `PONG`. When `key` is set it issues
/// `EXISTS <key>` instead; a reply of 0 counts as a passing check.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Redis {
    /// Key probed with `EXISTS` instead of `PING`, if non-empty.
    #[prost(string, tag = "1")]
    pub key: String,
}

impl Redis {
    /// Fully-qualified protobuf name.
    pub const FULL_NAME: &'static str = "envoy.extensions.health_checkers.redis.v3.Redis";
}

impl ReflectMessage for Redis {
    fn descriptor(&self) -> MessageDescriptor {
        REDIS_DESCRIPTOR.clone()
    }
}

/// Validation rules for this package. `key` declares none.
pub(crate) fn rules() -> (String, MessageRules) {
    (
        Redis::FULL_NAME.to_string(),
        MessageRules::default().with_field("key", FieldRules::default()),
    )
}

pub(crate) fn file_descriptor_proto() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(FILE_NAME.to_string()),
        package: Some(PACKAGE.to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Redis".to_string()),
            field: vec![FieldDescriptorProto {
                name: Some("key".to_string()),
                number: Some(1),
                label: Some(Label::Optional.into()),
                r#type: Some(Type::String.into()),
                json_name: Some("key".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}
