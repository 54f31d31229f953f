//! Address resolution over the configuration tree.
//!
//! Resolution is a recursive descent guided by the schema: each segment names
//! a child of the current container; list segments select exactly one element
//! by a full key match. The tree is only read.

use crate::error::GnmiError;
use crate::schema::{LeafType, SchemaNode, join_schema_path};
use crate::tree::{ConfigNode, ScalarValue};
use gnmi_rs_protocol::{Address, PathSegment};
use std::collections::BTreeMap;

/// Node located by an address.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    /// A set leaf.
    Scalar {
        value: &'a ScalarValue,
        value_type: LeafType,
        schema_path: String,
    },
    /// A container, a whole list, or a single list element.
    Subtree {
        schema: &'a SchemaNode,
        node: &'a ConfigNode,
        schema_path: String,
    },
}

impl Resolved<'_> {
    /// Qualified schema path of the resolved node.
    pub fn schema_path(&self) -> &str {
        match self {
            Resolved::Scalar { schema_path, .. } | Resolved::Subtree { schema_path, .. } => {
                schema_path
            }
        }
    }
}

/// Locate the node addressed by `address` below `root`.
pub fn resolve<'a>(
    root: &'a ConfigNode,
    schema: &'a SchemaNode,
    address: &[PathSegment],
) -> Result<Resolved<'a>, GnmiError> {
    Walk { address }.container(root, schema, 0, String::new())
}

struct Walk<'p> {
    address: &'p [PathSegment],
}

impl Walk<'_> {
    /// Text of the address up to and including segment `depth`.
    fn trail(&self, depth: usize) -> String {
        let end = (depth + 1).min(self.address.len());
        Address::from(self.address[..end].to_vec()).to_string()
    }

    /// Continue from a container pair at segment `depth`.
    fn container<'a>(
        &self,
        node: &'a ConfigNode,
        schema: &'a SchemaNode,
        depth: usize,
        schema_path: String,
    ) -> Result<Resolved<'a>, GnmiError> {
        let Some(segment) = self.address.get(depth) else {
            return Ok(Resolved::Subtree {
                schema,
                node,
                schema_path,
            });
        };
        let (SchemaNode::Container { children: schemas }, ConfigNode::Container(children)) =
            (schema, node)
        else {
            return Err(GnmiError::Internal(format!(
                "instance at {} does not match its {} schema",
                crate::error::display_path(&schema_path),
                schema.kind()
            )));
        };

        let Some(child_schema) = schemas.get(&segment.name) else {
            return Err(GnmiError::PathNotFound(format!(
                "no schema node {:?} at {}",
                segment.name,
                self.trail(depth)
            )));
        };
        let child_path = join_schema_path(&schema_path, &segment.name);
        let is_last = depth + 1 == self.address.len();

        match child_schema {
            SchemaNode::Container { .. } => {
                self.reject_keys(segment, depth)?;
                let child = self.instance(children, segment, depth)?;
                self.container(child, child_schema, depth + 1, child_path)
            }
            SchemaNode::List { keys, element } => {
                let child = self.instance(children, segment, depth)?;
                let ConfigNode::List(elements) = child else {
                    return Err(GnmiError::Internal(format!(
                        "instance at {} is not a list",
                        self.trail(depth)
                    )));
                };
                if segment.keys.is_empty() {
                    if is_last {
                        return Ok(Resolved::Subtree {
                            schema: child_schema,
                            node: child,
                            schema_path: child_path,
                        });
                    }
                    return Err(GnmiError::InvalidPath(format!(
                        "list {} needs a key selector to descend further",
                        self.trail(depth)
                    )));
                }
                let selected = self.select(keys, elements, segment, depth)?;
                self.container(selected, element, depth + 1, child_path)
            }
            SchemaNode::Leaf { value_type } => {
                self.reject_keys(segment, depth)?;
                if !is_last {
                    return Err(GnmiError::InvalidPath(format!(
                        "cannot descend past leaf {}",
                        self.trail(depth)
                    )));
                }
                let child = self.instance(children, segment, depth)?;
                let ConfigNode::Leaf(value) = child else {
                    return Err(GnmiError::Internal(format!(
                        "instance at {} is not a leaf",
                        self.trail(depth)
                    )));
                };
                Ok(Resolved::Scalar {
                    value,
                    value_type: *value_type,
                    schema_path: child_path,
                })
            }
        }
    }

    fn instance<'a>(
        &self,
        children: &'a BTreeMap<String, ConfigNode>,
        segment: &PathSegment,
        depth: usize,
    ) -> Result<&'a ConfigNode, GnmiError> {
        children.get(&segment.name).ok_or_else(|| {
            GnmiError::PathNotFound(format!("no value at {}", self.trail(depth)))
        })
    }

    fn reject_keys(&self, segment: &PathSegment, depth: usize) -> Result<(), GnmiError> {
        if segment.keys.is_empty() {
            Ok(())
        } else {
            Err(GnmiError::InvalidPath(format!(
                "{} is not a list and cannot take keys",
                self.trail(depth)
            )))
        }
    }

    /// Pick the single element whose key leaves equal the selector exactly.
    fn select<'a>(
        &self,
        keys: &[String],
        elements: &'a [ConfigNode],
        segment: &PathSegment,
        depth: usize,
    ) -> Result<&'a ConfigNode, GnmiError> {
        let declared_only = segment.keys.keys().all(|name| keys.contains(name));
        if segment.keys.len() != keys.len() || !declared_only {
            return Err(GnmiError::InvalidPath(format!(
                "{} must select by exactly the keys [{}]",
                self.trail(depth),
                keys.join(", ")
            )));
        }

        let mut matches = elements.iter().filter(|element| {
            keys.iter().all(|key| {
                let wanted = segment.keys.get(key);
                let actual = element.child(key).and_then(ConfigNode::as_scalar);
                match (wanted, actual) {
                    (Some(wanted), Some(actual)) => actual.key_text() == *wanted,
                    _ => false,
                }
            })
        });

        match (matches.next(), matches.next()) {
            (Some(element), None) => Ok(element),
            (None, _) => Err(GnmiError::PathNotFound(format!(
                "no list element matches {}",
                self.trail(depth)
            ))),
            (Some(_), Some(_)) => Err(GnmiError::Internal(format!(
                "more than one list element matches {}",
                self.trail(depth)
            ))),
        }
    }
}
