//! Memory Layer - 内存实现

mod object_store;

pub use object_store::InMemoryObjectStorage;
