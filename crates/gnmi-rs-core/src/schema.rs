//! Schema descriptor: the static shape of the configuration tree.
//!
//! A schema bundle is loaded once at startup from a JSON5 document with three
//! members: `modules` (the supported models and the top-level nodes each one
//! owns), `enums` (enum definitions keyed by qualified schema path) and
//! `root` (the container/list/leaf tree).

use crate::enums::{EnumDefinition, EnumRegistry};
use crate::error::SchemaError;
use gnmi_rs_protocol::ModelDescriptor;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Value type carried by a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafType {
    String,
    Int,
    Uint,
    Bool,
    Float,
    Bytes,
    Enum,
    Decimal,
}

impl LeafType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeafType::String => "string",
            LeafType::Int => "int",
            LeafType::Uint => "uint",
            LeafType::Bool => "bool",
            LeafType::Float => "float",
            LeafType::Bytes => "bytes",
            LeafType::Enum => "enum",
            LeafType::Decimal => "decimal",
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node of the schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaNode {
    /// Named children.
    Container {
        #[serde(default)]
        children: BTreeMap<String, SchemaNode>,
    },
    /// Ordered keyed elements; `element` is always a container holding every key.
    List {
        keys: Vec<String>,
        element: Box<SchemaNode>,
    },
    /// Single typed value.
    Leaf {
        #[serde(rename = "type")]
        value_type: LeafType,
    },
}

impl SchemaNode {
    pub fn container<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = (S, SchemaNode)>,
        S: Into<String>,
    {
        SchemaNode::Container {
            children: children
                .into_iter()
                .map(|(name, node)| (name.into(), node))
                .collect(),
        }
    }

    /// Build a keyed list, checking that the element declares every key leaf.
    pub fn list<I, S>(keys: I, element: SchemaNode) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let node = SchemaNode::List {
            keys: keys.into_iter().map(Into::into).collect(),
            element: Box::new(element),
        };
        node.validate("")?;
        Ok(node)
    }

    pub fn leaf(value_type: LeafType) -> Self {
        SchemaNode::Leaf { value_type }
    }

    /// Child schema of a container.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Container { children } => children.get(name),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SchemaNode::Container { .. } => "container",
            SchemaNode::List { .. } => "list",
            SchemaNode::Leaf { .. } => "leaf",
        }
    }

    pub fn leaf_type(&self) -> Option<LeafType> {
        match self {
            SchemaNode::Leaf { value_type } => Some(*value_type),
            _ => None,
        }
    }

    /// Check structural invariants for this node and its descendants.
    pub fn validate(&self, path: &str) -> Result<(), SchemaError> {
        match self {
            SchemaNode::Container { children } => {
                for (name, child) in children {
                    if name.is_empty() || name.contains('/') {
                        return Err(SchemaError::invalid(
                            display(path),
                            format!("invalid child name {name:?}"),
                        ));
                    }
                    child.validate(&join_schema_path(path, name))?;
                }
                Ok(())
            }
            SchemaNode::List { keys, element } => {
                if keys.is_empty() {
                    return Err(SchemaError::invalid(display(path), "list declares no keys"));
                }
                let SchemaNode::Container { children } = element.as_ref() else {
                    return Err(SchemaError::invalid(
                        display(path),
                        "list element must be a container",
                    ));
                };
                let mut seen = HashSet::new();
                for key in keys {
                    if !seen.insert(key.as_str()) {
                        return Err(SchemaError::invalid(
                            display(path),
                            format!("key {key:?} declared twice"),
                        ));
                    }
                    match children.get(key) {
                        Some(SchemaNode::Leaf { .. }) => {}
                        Some(_) => {
                            return Err(SchemaError::invalid(
                                display(path),
                                format!("key {key:?} must be a leaf"),
                            ));
                        }
                        None => {
                            return Err(SchemaError::invalid(
                                display(path),
                                format!("element does not declare key {key:?}"),
                            ));
                        }
                    }
                }
                element.validate(path)
            }
            SchemaNode::Leaf { .. } => Ok(()),
        }
    }

    fn collect_enum_leaves(&self, path: &str, out: &mut Vec<String>) {
        match self {
            SchemaNode::Container { children } => {
                for (name, child) in children {
                    child.collect_enum_leaves(&join_schema_path(path, name), out);
                }
            }
            SchemaNode::List { element, .. } => element.collect_enum_leaves(path, out),
            SchemaNode::Leaf {
                value_type: LeafType::Enum,
            } => out.push(path.to_string()),
            SchemaNode::Leaf { .. } => {}
        }
    }
}

/// Append a child name to a qualified schema path.
pub fn join_schema_path(parent: &str, name: &str) -> String {
    format!("{parent}/{name}")
}

fn display(path: &str) -> String {
    crate::error::display_path(path)
}

/// Supported model plus the top-level nodes it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    #[serde(flatten)]
    pub descriptor: ModelDescriptor,
    /// Names of top-level nodes defined by this module.
    #[serde(default)]
    pub nodes: Vec<String>,
}

impl ModuleSpec {
    pub fn new<I, S>(descriptor: ModelDescriptor, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            descriptor,
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }
}

/// On-disk shape of a schema bundle.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    #[serde(default)]
    modules: Vec<ModuleSpec>,
    #[serde(default)]
    enums: BTreeMap<String, EnumDefinition>,
    root: SchemaNode,
}

/// Validated, immutable schema bundle.
#[derive(Debug, Clone)]
pub struct Schema {
    root: SchemaNode,
    modules: Vec<ModuleSpec>,
    enums: EnumRegistry,
}

impl Schema {
    /// Assemble a schema, checking every structural and cross-reference invariant.
    pub fn new(
        root: SchemaNode,
        modules: Vec<ModuleSpec>,
        enums: EnumRegistry,
    ) -> Result<Self, SchemaError> {
        let SchemaNode::Container { children } = &root else {
            return Err(SchemaError::invalid("/", "root must be a container"));
        };
        root.validate("")?;

        let mut owned = HashSet::new();
        let mut names = HashSet::new();
        for (idx, module) in modules.iter().enumerate() {
            let name = &module.descriptor.name;
            if name.is_empty() {
                return Err(SchemaError::invalid(
                    format!("modules[{idx}]"),
                    "module name is empty",
                ));
            }
            if !names.insert(name.as_str()) {
                return Err(SchemaError::invalid(
                    format!("modules[{idx}]"),
                    format!("module {name:?} registered twice"),
                ));
            }
            for node in &module.nodes {
                if !children.contains_key(node) {
                    return Err(SchemaError::invalid(
                        format!("modules[{idx}]"),
                        format!("module {name:?} owns unknown node {node:?}"),
                    ));
                }
                if !owned.insert(node.as_str()) {
                    return Err(SchemaError::invalid(
                        format!("modules[{idx}]"),
                        format!("node {node:?} is owned by more than one module"),
                    ));
                }
            }
        }

        let mut enum_leaves = Vec::new();
        root.collect_enum_leaves("", &mut enum_leaves);
        for path in &enum_leaves {
            if enums.get(path).is_none() {
                return Err(SchemaError::invalid(
                    path.clone(),
                    "enum leaf has no definition",
                ));
            }
        }
        for path in enums.paths() {
            if !enum_leaves.iter().any(|leaf| leaf == path) {
                return Err(SchemaError::invalid(
                    path,
                    "enum definition does not name an enum leaf",
                ));
            }
            if let Some(definition) = enums.get(path) {
                if definition.is_empty() {
                    return Err(SchemaError::invalid(path, "enum definition is empty"));
                }
                if let Some(name) = definition.duplicate_ordinal() {
                    return Err(SchemaError::invalid(
                        path,
                        format!("enum value {name:?} reuses an ordinal"),
                    ));
                }
            }
        }

        debug!(
            "schema validated (modules={}, top_level_nodes={}, enums={})",
            modules.len(),
            children.len(),
            enums.len()
        );
        Ok(Self {
            root,
            modules,
            enums,
        })
    }

    /// Load a schema bundle from a JSON5 file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        info!("loading schema bundle from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load a schema bundle from JSON5 contents.
    pub fn load_from_str(contents: &str) -> Result<Self, SchemaError> {
        debug!("loading schema bundle from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        let document: SchemaDocument = serde_json::from_value(value)?;
        let enums = document.enums.into_iter().collect::<EnumRegistry>();
        Self::new(document.root, document.modules, enums)
    }

    /// Root container of the schema tree.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn modules(&self) -> &[ModuleSpec] {
        &self.modules
    }

    /// Model descriptors in declaration order.
    pub fn models(&self) -> Vec<ModelDescriptor> {
        self.modules
            .iter()
            .map(|module| module.descriptor.clone())
            .collect()
    }

    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    /// Find the schema node at a qualified schema path such as `/a/b/c`.
    pub fn lookup(&self, path: &str) -> Option<&SchemaNode> {
        let mut node = &self.root;
        for name in path.split('/').filter(|name| !name.is_empty()) {
            if let SchemaNode::List { element, .. } = node {
                node = element.as_ref();
            }
            node = node.child(name)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile_element() -> SchemaNode {
        SchemaNode::container([
            ("id", SchemaNode::leaf(LeafType::String)),
            ("filter", SchemaNode::leaf(LeafType::String)),
        ])
    }

    #[test]
    fn list_requires_key_leaves() {
        assert!(SchemaNode::list(["id"], profile_element()).is_ok());

        let err = SchemaNode::list(["name"], profile_element()).unwrap_err();
        assert!(format!("{err}").contains("does not declare key"));

        let err = SchemaNode::list(["id"], SchemaNode::leaf(LeafType::String)).unwrap_err();
        assert!(format!("{err}").contains("must be a container"));

        let nested = SchemaNode::container([(
            "id",
            SchemaNode::container(Vec::<(String, SchemaNode)>::new()),
        )]);
        let err = SchemaNode::list(["id"], nested).unwrap_err();
        assert!(format!("{err}").contains("must be a leaf"));

        let err = SchemaNode::list(Vec::<String>::new(), profile_element()).unwrap_err();
        assert!(format!("{err}").contains("no keys"));
    }

    #[test]
    fn loads_bundle_with_modules_and_enums() {
        let schema = Schema::load_from_str(
            r#"{
                modules: [
                    { name: "access-profile", organization: "ONF", version: "1.0", nodes: ["access-profile"] },
                ],
                enums: {
                    "/access-profile/access-profile/type": { "internet-only": 0, "intranet-only": 1 },
                },
                root: {
                    kind: "container",
                    children: {
                        "access-profile": {
                            kind: "container",
                            children: {
                                "access-profile": {
                                    kind: "list",
                                    keys: ["id"],
                                    element: {
                                        kind: "container",
                                        children: {
                                            id: { kind: "leaf", type: "string" },
                                            type: { kind: "leaf", type: "enum" },
                                        },
                                    },
                                },
                            },
                        },
                        hostname: { kind: "leaf", type: "string" },
                    },
                },
            }"#,
        )
        .expect("schema");

        assert_eq!(
            schema.models(),
            vec![ModelDescriptor::new("access-profile", "ONF", "1.0")]
        );
        assert_eq!(schema.modules()[0].nodes, vec!["access-profile".to_string()]);
        assert_eq!(
            schema
                .lookup("/access-profile/access-profile/type")
                .and_then(SchemaNode::leaf_type),
            Some(LeafType::Enum)
        );
        assert_eq!(
            schema.lookup("/access-profile/access-profile").map(SchemaNode::kind),
            Some("list")
        );
        assert!(schema.lookup("/access-profile/missing").is_none());
    }

    #[test]
    fn rejects_enum_leaf_without_definition() {
        let root = SchemaNode::container([("mode", SchemaNode::leaf(LeafType::Enum))]);
        let err = Schema::new(root, Vec::new(), EnumRegistry::new()).unwrap_err();
        assert!(format!("{err}").contains("enum leaf has no definition"));
    }

    #[test]
    fn rejects_definition_for_non_enum_leaf() {
        let root = SchemaNode::container([("mode", SchemaNode::leaf(LeafType::String))]);
        let mut enums = EnumRegistry::new();
        enums.register("/mode", EnumDefinition::new([("on", 1)]));
        let err = Schema::new(root, Vec::new(), enums).unwrap_err();
        assert!(format!("{err}").contains("does not name an enum leaf"));
    }

    #[test]
    fn rejects_conflicting_module_ownership() {
        let root = SchemaNode::container([("system", SchemaNode::leaf(LeafType::String))]);
        let modules = vec![
            ModuleSpec::new(ModelDescriptor::new("a", "org", "1"), ["system"]),
            ModuleSpec::new(ModelDescriptor::new("b", "org", "1"), ["system"]),
        ];
        let err = Schema::new(root.clone(), modules, EnumRegistry::new()).unwrap_err();
        assert!(format!("{err}").contains("more than one module"));

        let modules = vec![ModuleSpec::new(
            ModelDescriptor::new("a", "org", "1"),
            ["interfaces"],
        )];
        let err = Schema::new(root, modules, EnumRegistry::new()).unwrap_err();
        assert!(format!("{err}").contains("unknown node"));
    }

    #[test]
    fn rejects_non_container_root() {
        let err = Schema::new(
            SchemaNode::leaf(LeafType::Bool),
            Vec::new(),
            EnumRegistry::new(),
        )
        .unwrap_err();
        assert!(format!("{err}").contains("root must be a container"));
    }
}
