//! Linode Core
//!
//! Host-facing building blocks shared by the filter engine and the provider:
//! decoded configuration values, schema descriptors, diagnostics and the
//! data source / provider traits.

pub mod diagnostics;
pub mod provider;
pub mod resource;
pub mod schema;
