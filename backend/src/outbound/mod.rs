//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **storage**: filesystem key-value store (cap-std, atomic writes)
//! - **memory**: in-memory key-value store and remote tables
//! - **remote**: remote option and submission tables kept in a key-value store
//!
//! Adapters are thin translators between domain types and the storage
//! medium. They contain no business logic.

pub mod memory;
pub mod remote;
pub mod storage;
