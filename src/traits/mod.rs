//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations
//! - [`KeyValueStore`] - Persisted key-value storage

pub mod http;
pub mod storage;

pub use http::{set_header, Headers, HttpClient, HttpError, Method, Request, Response};
pub use storage::{KeyValueStore, StorageError};
