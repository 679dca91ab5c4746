//! Storage abstraction and implementations for Lessonpath.
//!
//! This crate provides the two seams the progression engine reads and writes
//! through (course trees and completion records), an in-memory backend, a
//! JSON file backend and a caching decorator for trees.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;
pub mod cache;

pub use trait_::{CompletionStore, ContentTreeProvider, Result, StorageError, Versioned};
pub use memory::MemoryStore;
pub use json_storage::JsonStorage;
pub use cache::CachedTreeProvider;
