//! Concrete implementations of trait abstractions.
//!
//! This module provides production-ready adapters that implement the traits
//! defined in `crate::traits`.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileStorage`] - JSON-file key-value storage
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for all adapters:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::InMemoryStorage`] - In-memory key-value storage

pub mod file_storage;
pub mod mock;
pub mod reqwest_http;

pub use file_storage::FileStorage;
pub use mock::{InMemoryStorage, MockHttpClient, MockResponse};
pub use reqwest_http::ReqwestHttpClient;
