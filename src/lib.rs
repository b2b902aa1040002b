//! Equinix Metal provider plugin for Hemmer.
//!
//! The host spawns the `equinix-provider` binary, reads the handshake line
//! from its stdout and drives it over gRPC. Each protocol call is routed by
//! [`EquinixProvider`] to a resource or data source type, which talks to
//! the Metal REST API through [`metal::MetalClient`].
//!
//! # Resources
//!
//! - `equinix_metal_project`
//! - `equinix_metal_ssh_key`, `equinix_metal_project_ssh_key`
//! - `equinix_metal_device`
//! - `equinix_metal_connection`
//!
//! # Data sources
//!
//! - `equinix_metal_plans`
//! - `equinix_metal_project`
//! - `equinix_metal_device`
//!
//! # Handshake Protocol
//!
//! Once listening, the server prints one line to stdout:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `HEMMER_PROVIDER|<protocol_version>|<address>`. Logs go to stderr.
//!
//! # Configuration
//!
//! ```text
//! provider "equinix" {
//!   auth_token = "..."                 # or METAL_AUTH_TOKEN
//!   endpoint   = "https://api.equinix.com"
//!   max_retries = 10
//! }
//! ```
//!
//! See [`config`] for every attribute and its environment fallback.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod data_sources;
pub mod diff;
pub mod error;
pub mod logging;
pub mod metal;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod sweep;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default};
pub use provider::EquinixProvider;
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on, serve_on_with_options, serve_with_options, ProviderService, ServeOptions,
};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};

pub use async_trait::async_trait;
