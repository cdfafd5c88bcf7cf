use prost_reflect::DescriptorPool;
use prost_types::FileDescriptorSet;
use std::sync::LazyLock;

use crate::health_checkers::redis;

static DESCRIPTOR_POOL_BUILD: LazyLock<(DescriptorPool, Option<String>)> = LazyLock::new(|| {
    let files = FileDescriptorSet {
        file: vec![redis::v3::file_descriptor_proto()],
    };
    match DescriptorPool::from_file_descriptor_set(files) {
        Ok(pool) => (pool, None),
        Err(err) => (DescriptorPool::new(), Some(err.to_string())),
    }
});

/// Descriptors for every message type shipped by this crate.
pub static DESCRIPTOR_POOL: LazyLock<DescriptorPool> =
    LazyLock::new(|| DESCRIPTOR_POOL_BUILD.0.clone());

/// Returns the error raised while assembling [`DESCRIPTOR_POOL`], if any.
#[must_use]
pub fn descriptor_pool_build_error() -> Option<&'static str> {
    DESCRIPTOR_POOL_BUILD.1.as_deref()
}
