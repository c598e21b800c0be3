//! Orchestrating client.
//!
//! Keep the public surface small and predictable: [`ApiClient`] for calls,
//! [`ApiClientBuilder`] for construction. Implementation details are split into
//! submodules under `src/client/`.

pub mod builder;
pub mod core;
mod execution;
mod policy;

pub use builder::ApiClientBuilder;
pub use core::ApiClient;
