//! Equinix Metal REST API access.

mod client;
pub mod models;

pub use client::MetalClient;
