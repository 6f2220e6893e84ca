//! In-memory credential storage backend.
//!
//! This crate provides an in-memory implementation of the `PasswordStorage`
//! trait from `accounts-auth`, using a `DashMap` keyed by user id. It follows
//! the MongoDB backend's observable behavior and is meant for tests and local
//! development.
//!
//! # Example
//!
//! ```ignore
//! use accounts_auth::{PasswordStorage, User};
//! use accounts_db_memory::InMemoryPasswordStorage;
//!
//! let storage = InMemoryPasswordStorage::new();
//! storage.insert_user(User::new("u1"));
//! storage.set_password("u1", "hash").await?;
//! ```

pub mod storage;

pub use accounts_auth::{AuthError, DynPasswordStorage, PasswordStorage, User};
pub use storage::InMemoryPasswordStorage;

/// Creates a new, empty in-memory password storage.
pub fn create_password_storage() -> DynPasswordStorage {
    std::sync::Arc::new(InMemoryPasswordStorage::new())
}
