//! Shared library for Vyndow Lambda functions.
//!
//! This crate provides the domain logic, upstream clients and storage used by
//! every API handler.

pub mod auth;
pub mod config;
pub mod dataforseo;
pub mod debounce;
pub mod error;
pub mod geo;
pub mod http;
pub mod openai;
pub mod seo;
pub mod social;
pub mod store;
pub mod websites;

#[cfg(test)]
mod test_keys;

pub use auth::{authenticate, AuthenticatedUser, FirebaseVerifier, StaticTokenVerifier, TokenVerifier};
pub use config::Config;
pub use dataforseo::DataForSeoClient;
pub use error::{Error, Result};
pub use http::ApiResponse;
pub use openai::OpenAiClient;
pub use store::{DocPath, DocumentStore, FirestoreStore, MemoryStore};
