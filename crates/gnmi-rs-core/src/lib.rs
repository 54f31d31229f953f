//! Path resolution and value encoding engine for gnmi-rs.
//!
//! This crate owns the schema descriptor, the shared configuration tree, the
//! model registry and the capability/get handlers built on top of them.

pub mod encoder;
pub mod enums;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod server;
pub mod store;
pub mod tree;

pub use enums::{EnumDefinition, EnumRegistry};
/// Error types surfaced by loading, resolution and encoding.
pub use error::{GnmiError, SchemaError, StartupError, TreeError};
pub use registry::ModelRegistry;
pub use resolver::{Resolved, resolve};
pub use schema::{LeafType, ModuleSpec, Schema, SchemaNode};
/// Request handlers and per-call context.
pub use server::{CallContext, GnmiServer, GnmiService, TimestampClock};
pub use store::ConfigStore;
pub use tree::{ConfigNode, ScalarValue};
