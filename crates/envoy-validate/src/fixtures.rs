//! Descriptor fixtures covering every rule family.
//!
//! ```proto
//! package fixtures.v1;
//!
//! enum Mode { MODE_UNSPECIFIED = 0; MODE_ACTIVE = 1; MODE_PASSIVE = 2; }
//!
//! message Endpoint { string address = 1; uint32 port = 2; }
//!
//! message Cluster {
//!   string name = 1;
//!   int32 weight = 2;
//!   repeated string hosts = 3;
//!   map<string, string> labels = 4;
//!   Endpoint endpoint = 5;
//!   Mode mode = 6;
//!   bytes token = 7;
//!   bool enabled = 8;
//!   double ratio = 9;
//!   repeated Endpoint endpoints = 10;
//!   oneof target { string dns = 11; string ip = 12; }
//!   Cluster parent = 13;
//!   map<int32, string> ports = 14;
//! }
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use prost_reflect::{
    DescriptorPool, DynamicMessage, FieldDescriptor, MapKey, MessageDescriptor, Value,
};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
};

pub(crate) const PACKAGE: &str = "fixtures.v1";

static POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet {
        file: vec![file_descriptor_proto()],
    })
    .expect("fixture descriptors must be valid")
});

pub(crate) fn message(name: &str) -> MessageDescriptor {
    POOL.get_message_by_name(&format!("{PACKAGE}.{name}"))
        .unwrap_or_else(|| panic!("fixture message {name} must exist"))
}

pub(crate) fn cluster() -> MessageDescriptor {
    message("Cluster")
}

pub(crate) fn endpoint() -> MessageDescriptor {
    message("Endpoint")
}

pub(crate) fn field(message_name: &str, field: &str) -> FieldDescriptor {
    message(message_name)
        .get_field_by_name(field)
        .unwrap_or_else(|| panic!("fixture field {message_name}.{field} must exist"))
}

/// Build a message from `(field, value)` pairs.
pub(crate) fn new_message(desc: &MessageDescriptor, fields: Vec<(&str, Value)>) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc.clone());
    for (name, value) in fields {
        msg.set_field_by_name(name, value);
    }
    msg
}

pub(crate) fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

pub(crate) fn strings(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| string(s)).collect())
}

pub(crate) fn labels(pairs: &[(&str, &str)]) -> Value {
    Value::Map(
        pairs
            .iter()
            .map(|(k, v)| (MapKey::String((*k).to_string()), string(v)))
            .collect::<HashMap<_, _>>(),
    )
}

pub(crate) fn ports(pairs: &[(i32, &str)]) -> Value {
    Value::Map(
        pairs
            .iter()
            .map(|(k, v)| (MapKey::I32(*k), string(v)))
            .collect::<HashMap<_, _>>(),
    )
}

pub(crate) fn endpoint_value(address: &str, port: u32) -> Value {
    Value::Message(new_message(
        &endpoint(),
        vec![("address", string(address)), ("port", Value::U32(port))],
    ))
}

fn scalar(name: &str, number: i32, r#type: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional.into()),
        r#type: Some(r#type.into()),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

fn typed(name: &str, number: i32, r#type: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, r#type)
    }
}

fn repeated(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated.into()),
        ..field
    }
}

fn in_oneof(field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        oneof_index: Some(index),
        ..field
    }
}

fn file_descriptor_proto() -> FileDescriptorProto {
    let mode = EnumDescriptorProto {
        name: Some("Mode".to_string()),
        value: ["MODE_UNSPECIFIED", "MODE_ACTIVE", "MODE_PASSIVE"]
            .iter()
            .zip(0..)
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some((*name).to_string()),
                number: Some(number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    let endpoint = DescriptorProto {
        name: Some("Endpoint".to_string()),
        field: vec![
            scalar("address", 1, Type::String),
            scalar("port", 2, Type::Uint32),
        ],
        ..Default::default()
    };

    let labels_entry = DescriptorProto {
        name: Some("LabelsEntry".to_string()),
        field: vec![scalar("key", 1, Type::String), scalar("value", 2, Type::String)],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let ports_entry = DescriptorProto {
        name: Some("PortsEntry".to_string()),
        field: vec![scalar("key", 1, Type::Int32), scalar("value", 2, Type::String)],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let cluster = DescriptorProto {
        name: Some("Cluster".to_string()),
        field: vec![
            scalar("name", 1, Type::String),
            scalar("weight", 2, Type::Int32),
            repeated(scalar("hosts", 3, Type::String)),
            repeated(typed(
                "labels",
                4,
                Type::Message,
                ".fixtures.v1.Cluster.LabelsEntry",
            )),
            typed("endpoint", 5, Type::Message, ".fixtures.v1.Endpoint"),
            typed("mode", 6, Type::Enum, ".fixtures.v1.Mode"),
            scalar("token", 7, Type::Bytes),
            scalar("enabled", 8, Type::Bool),
            scalar("ratio", 9, Type::Double),
            repeated(typed(
                "endpoints",
                10,
                Type::Message,
                ".fixtures.v1.Endpoint",
            )),
            in_oneof(scalar("dns", 11, Type::String), 0),
            in_oneof(scalar("ip", 12, Type::String), 0),
            typed("parent", 13, Type::Message, ".fixtures.v1.Cluster"),
            repeated(typed(
                "ports",
                14,
                Type::Message,
                ".fixtures.v1.Cluster.PortsEntry",
            )),
        ],
        nested_type: vec![labels_entry, ports_entry],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("target".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };

    FileDescriptorProto {
        name: Some("fixtures/v1/cluster.proto".to_string()),
        package: Some(PACKAGE.to_string()),
        message_type: vec![endpoint, cluster],
        enum_type: vec![mode],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}
