/// Durable key-value storage for the session recovery hints.
pub mod kv_store;
/// Backend-agnostic storage errors.
pub mod storage;
