//! Hosted backend client for roofclaim.
//!
//! Implements the access layer's `AuthProvider` and `DataService` against a
//! GoTrue-style auth API (`/auth/v1`) and a PostgREST-style data API
//! (`/rest/v1`). Every request carries the project's `apikey` header and a
//! bearer token: the user's access token when signed in, the anon key
//! otherwise.
//!
//! # Example
//!
//! ```
//! use roofclaim_hosted::{HostedClient, HostedConfig, MemoryStorage};
//! use std::sync::Arc;
//!
//! let config = HostedConfig::builder(
//!     "https://project.example.co".to_string(),
//!     "public-anon-key".to_string(),
//! )
//! .timeout_seconds(10)
//! .build();
//!
//! let client = HostedClient::new(config, Arc::new(MemoryStorage::new()));
//! assert!(client.is_ok());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod storage;
mod wire;

pub use client::HostedClient;
pub use config::{HostedConfig, HostedConfigBuilder};
pub use error::HostedError;
#[cfg(feature = "browser")]
pub use storage::LocalStorage;
pub use storage::{MemoryStorage, SessionStorage};
