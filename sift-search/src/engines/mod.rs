//! Upstream search backends.
//!
//! Each module provides a struct implementing [`crate::backend::SearchBackend`].

pub mod searxng;

pub use searxng::SearxngClient;
