//! Mock implementations for testing.
//!
//! This module provides mock implementations of all trait abstractions,
//! enabling unit testing without network dependencies or file system access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted responses and latency
//! - [`InMemoryStorage`] - In-memory key-value storage

pub mod http;
pub mod storage;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use storage::InMemoryStorage;
