//! Terraform provider for Buildkite
//!
//! Buildkite organizations and their agents are exposed as data sources, read through both the
//! REST API and the GraphQL API of Buildkite.

pub mod client;
pub mod config;
pub mod convert;
pub mod data_source;
pub mod entities;
pub mod error;
pub mod provider;
pub mod resource;

mod utils;

pub use error::{Error, Result};
pub use provider::BuildkiteProvider;
