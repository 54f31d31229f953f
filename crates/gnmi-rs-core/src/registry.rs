//! Registry of supported models and encodings.

use crate::encoder::SUPPORTED_ENCODINGS;
use crate::schema::Schema;
use gnmi_rs_protocol::{CapabilityResponse, Encoding, GNMI_VERSION, ModelDescriptor};
use log::debug;
use std::collections::HashMap;

/// Immutable set of advertised models plus the encodings the encoder produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRegistry {
    /// Models in registration order.
    models: Vec<ModelDescriptor>,
    /// Top-level node name to owning model index.
    owners: HashMap<String, usize>,
}

impl ModelRegistry {
    /// Register models in order, each with the top-level nodes it owns.
    pub fn new<I, N>(models: I) -> Self
    where
        I: IntoIterator<Item = (ModelDescriptor, N)>,
        N: IntoIterator<Item = String>,
    {
        let mut registry = Self::default();
        for (descriptor, nodes) in models {
            debug!("registering model (model={})", descriptor);
            let idx = registry.models.len();
            registry.models.push(descriptor);
            for node in nodes {
                registry.owners.entry(node).or_insert(idx);
            }
        }
        registry
    }

    /// Build the registry from a schema bundle's module table.
    pub fn from_schema(schema: &Schema) -> Self {
        Self::new(
            schema
                .modules()
                .iter()
                .map(|module| (module.descriptor.clone(), module.nodes.clone())),
        )
    }

    /// Capability answer for this server.
    pub fn capabilities(&self) -> CapabilityResponse {
        CapabilityResponse {
            supported_models: self.models.clone(),
            supported_encodings: self.encodings().to_vec(),
            gnmi_version: GNMI_VERSION.to_string(),
        }
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn encodings(&self) -> &'static [Encoding] {
        &SUPPORTED_ENCODINGS
    }

    pub fn supports_encoding(&self, encoding: Encoding) -> bool {
        self.encodings().contains(&encoding)
    }

    /// Registered model equal to `descriptor` on name, organization and version.
    pub fn find(&self, descriptor: &ModelDescriptor) -> Option<&ModelDescriptor> {
        self.models.iter().find(|model| *model == descriptor)
    }

    /// Model owning a top-level node, if any module declared it.
    pub fn owning_module(&self, top_level: &str) -> Option<&ModelDescriptor> {
        self.owners.get(top_level).map(|idx| &self.models[*idx])
    }

    /// Every model that owns at least one top-level node.
    pub(crate) fn owning_modules(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.owners.values().any(|owner| owner == idx))
            .map(|(_, model)| model)
    }
}
