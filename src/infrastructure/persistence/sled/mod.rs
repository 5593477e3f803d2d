//! Sled Storage

mod object_store;

pub use object_store::SledObjectStorage;
