//! Test helpers shared across gnmi-rs crates.

pub mod fixtures;
pub mod server;

pub use fixtures::{DATA_DOCUMENT, SCHEMA_BUNDLE, schema, store, write_fixture_files};
pub use server::{address, get_request, model, server, server_with};
