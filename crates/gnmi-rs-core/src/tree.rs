//! Configuration instance tree and its schema-directed decoding.

use crate::enums::EnumRegistry;
use crate::error::{TreeError, display_path};
use crate::schema::{LeafType, SchemaNode, join_schema_path};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use gnmi_rs_protocol::Decimal64;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Concrete value held by a set leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
    Float(f64),
    Bytes(Vec<u8>),
    /// Enum value by name.
    Enum(String),
    Decimal(Decimal64),
}

impl ScalarValue {
    /// Leaf type this value satisfies.
    pub fn leaf_type(&self) -> LeafType {
        match self {
            ScalarValue::String(_) => LeafType::String,
            ScalarValue::Int(_) => LeafType::Int,
            ScalarValue::Uint(_) => LeafType::Uint,
            ScalarValue::Bool(_) => LeafType::Bool,
            ScalarValue::Float(_) => LeafType::Float,
            ScalarValue::Bytes(_) => LeafType::Bytes,
            ScalarValue::Enum(_) => LeafType::Enum,
            ScalarValue::Decimal(_) => LeafType::Decimal,
        }
    }

    /// Canonical text used when comparing against key selectors.
    pub fn key_text(&self) -> String {
        match self {
            ScalarValue::String(value) | ScalarValue::Enum(value) => value.clone(),
            ScalarValue::Int(value) => value.to_string(),
            ScalarValue::Uint(value) => value.to_string(),
            ScalarValue::Bool(value) => value.to_string(),
            ScalarValue::Float(value) => value.to_string(),
            ScalarValue::Bytes(value) => STANDARD.encode(value),
            ScalarValue::Decimal(value) => value.to_string(),
        }
    }
}

/// Runtime instance mirroring the schema shape.
///
/// An unset leaf or absent container is simply missing from its parent.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Container(BTreeMap<String, ConfigNode>),
    /// Elements in document order; each one is a container.
    List(Vec<ConfigNode>),
    Leaf(ScalarValue),
}

impl ConfigNode {
    /// Empty container.
    pub fn empty() -> Self {
        ConfigNode::Container(BTreeMap::new())
    }

    pub fn container<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = (S, ConfigNode)>,
        S: Into<String>,
    {
        ConfigNode::Container(
            children
                .into_iter()
                .map(|(name, node)| (name.into(), node))
                .collect(),
        )
    }

    pub fn leaf(value: ScalarValue) -> Self {
        ConfigNode::Leaf(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        ConfigNode::Leaf(ScalarValue::String(value.into()))
    }

    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Container(children) => children.get(name),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            ConfigNode::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// Decode a JSON value into an instance of `schema`.
    ///
    /// `path` is the qualified schema path of `schema`; it selects enum
    /// definitions and labels errors.
    pub fn decode(
        schema: &SchemaNode,
        value: &Value,
        enums: &EnumRegistry,
        path: &str,
    ) -> Result<ConfigNode, TreeError> {
        Decoder { enums }.decode(schema, value, path)
    }

    /// Decode JSON document bytes into an instance of `schema`.
    pub fn decode_bytes(
        schema: &SchemaNode,
        bytes: &[u8],
        enums: &EnumRegistry,
        path: &str,
    ) -> Result<ConfigNode, TreeError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::decode(schema, &value, enums, path)
    }

    /// Check that this instance conforms to `schema`, including key uniqueness.
    pub fn validate(
        &self,
        schema: &SchemaNode,
        enums: &EnumRegistry,
        path: &str,
    ) -> Result<(), TreeError> {
        match (schema, self) {
            (SchemaNode::Container { children: schemas }, ConfigNode::Container(children)) => {
                for (name, child) in children {
                    let child_path = join_schema_path(path, name);
                    let child_schema = schemas
                        .get(name)
                        .ok_or(TreeError::UnknownField { path: child_path.clone() })?;
                    child.validate(child_schema, enums, &child_path)?;
                }
                Ok(())
            }
            (SchemaNode::List { keys, element }, ConfigNode::List(elements)) => {
                let mut seen = HashSet::new();
                for entry in elements {
                    entry.validate(element, enums, path)?;
                    let tuple = key_tuple(keys, entry, path)?;
                    if !seen.insert(tuple.clone()) {
                        return Err(TreeError::DuplicateKey {
                            path: display_path(path),
                            key: render_tuple(keys, &tuple),
                        });
                    }
                }
                Ok(())
            }
            (SchemaNode::Leaf { value_type }, ConfigNode::Leaf(value)) => {
                if value.leaf_type() != *value_type {
                    return Err(TreeError::invalid(
                        path,
                        format!("expected {value_type}, found {}", value.leaf_type()),
                    ));
                }
                if let ScalarValue::Enum(name) = value {
                    check_enum(enums, path, name)?;
                }
                Ok(())
            }
            (schema, _) => Err(TreeError::invalid(
                path,
                format!("instance does not match {}", schema.kind()),
            )),
        }
    }
}

/// Key values of a list element in declared key order.
fn key_tuple(keys: &[String], entry: &ConfigNode, path: &str) -> Result<Vec<String>, TreeError> {
    keys.iter()
        .map(|key| {
            entry
                .child(key)
                .and_then(ConfigNode::as_scalar)
                .map(ScalarValue::key_text)
                .ok_or_else(|| TreeError::MissingKey {
                    path: display_path(path),
                    key: key.clone(),
                })
        })
        .collect()
}

fn render_tuple(keys: &[String], tuple: &[String]) -> String {
    keys.iter()
        .zip(tuple)
        .map(|(key, value)| format!("[{key}={value}]"))
        .collect()
}

fn check_enum(enums: &EnumRegistry, path: &str, name: &str) -> Result<(), TreeError> {
    let definition = enums
        .get(path)
        .ok_or_else(|| TreeError::invalid(path, "no enum definition registered"))?;
    if definition.contains(name) {
        Ok(())
    } else {
        Err(TreeError::UnknownEnum {
            path: display_path(path),
            value: name.to_string(),
        })
    }
}

struct Decoder<'a> {
    enums: &'a EnumRegistry,
}

impl Decoder<'_> {
    fn decode(&self, schema: &SchemaNode, value: &Value, path: &str) -> Result<ConfigNode, TreeError> {
        match schema {
            SchemaNode::Container { children } => {
                let Value::Object(members) = value else {
                    return Err(TreeError::invalid(path, "expected object"));
                };
                self.decode_container(children, members, path)
            }
            SchemaNode::List { keys, element } => {
                let Value::Array(items) = value else {
                    return Err(TreeError::invalid(path, "expected array"));
                };
                let mut elements = Vec::with_capacity(items.len());
                let mut seen = HashSet::new();
                for item in items {
                    let entry = self.decode(element, item, path)?;
                    let tuple = key_tuple(keys, &entry, path)?;
                    if !seen.insert(tuple.clone()) {
                        return Err(TreeError::DuplicateKey {
                            path: display_path(path),
                            key: render_tuple(keys, &tuple),
                        });
                    }
                    elements.push(entry);
                }
                Ok(ConfigNode::List(elements))
            }
            SchemaNode::Leaf { value_type } => {
                self.decode_leaf(*value_type, value, path).map(ConfigNode::Leaf)
            }
        }
    }

    fn decode_container(
        &self,
        children: &BTreeMap<String, SchemaNode>,
        members: &Map<String, Value>,
        path: &str,
    ) -> Result<ConfigNode, TreeError> {
        let mut decoded = BTreeMap::new();
        let mut seen = HashSet::new();
        for (member, value) in members {
            let name = local_name(children, member);
            let child_path = join_schema_path(path, name);
            let Some(child_schema) = children.get(name) else {
                return Err(TreeError::UnknownField { path: child_path });
            };
            if !seen.insert(name) {
                return Err(TreeError::DuplicateField {
                    path: display_path(&child_path),
                });
            }
            if value.is_null() {
                continue;
            }
            let node = self.decode(child_schema, value, &child_path)?;
            decoded.insert(name.to_string(), node);
        }
        Ok(ConfigNode::Container(decoded))
    }

    fn decode_leaf(
        &self,
        value_type: LeafType,
        value: &Value,
        path: &str,
    ) -> Result<ScalarValue, TreeError> {
        let mismatch = || TreeError::invalid(path, format!("expected {value_type}"));
        match value_type {
            LeafType::String => value
                .as_str()
                .map(|text| ScalarValue::String(text.to_string()))
                .ok_or_else(mismatch),
            LeafType::Int => match value {
                Value::Number(number) => number.as_i64().map(ScalarValue::Int).ok_or_else(mismatch),
                Value::String(text) => text.parse().map(ScalarValue::Int).map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            LeafType::Uint => match value {
                Value::Number(number) => number.as_u64().map(ScalarValue::Uint).ok_or_else(mismatch),
                Value::String(text) => text.parse().map(ScalarValue::Uint).map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            LeafType::Bool => value.as_bool().map(ScalarValue::Bool).ok_or_else(mismatch),
            LeafType::Float => value.as_f64().map(ScalarValue::Float).ok_or_else(mismatch),
            LeafType::Bytes => {
                let text = value.as_str().ok_or_else(mismatch)?;
                STANDARD
                    .decode(text)
                    .map(ScalarValue::Bytes)
                    .map_err(|err| TreeError::invalid(path, format!("invalid base64: {err}")))
            }
            LeafType::Decimal => {
                let text = match value {
                    Value::Number(number) => number.to_string(),
                    Value::String(text) => text.clone(),
                    _ => return Err(mismatch()),
                };
                parse_decimal(&text)
                    .map(ScalarValue::Decimal)
                    .ok_or_else(|| TreeError::invalid(path, format!("invalid decimal {text:?}")))
            }
            LeafType::Enum => {
                let definition = self
                    .enums
                    .get(path)
                    .ok_or_else(|| TreeError::invalid(path, "no enum definition registered"))?;
                let name = match value {
                    Value::String(name) => name.as_str(),
                    Value::Number(number) => number
                        .as_i64()
                        .and_then(|ordinal| definition.name_of(ordinal))
                        .ok_or_else(|| TreeError::UnknownEnum {
                            path: display_path(path),
                            value: number.to_string(),
                        })?,
                    _ => return Err(mismatch()),
                };
                if !definition.contains(name) {
                    return Err(TreeError::UnknownEnum {
                        path: display_path(path),
                        value: name.to_string(),
                    });
                }
                Ok(ScalarValue::Enum(name.to_string()))
            }
        }
    }
}

/// Strip an RFC 7951 `module:` qualifier when the bare name is a known child.
fn local_name<'a>(children: &BTreeMap<String, SchemaNode>, member: &'a str) -> &'a str {
    if children.contains_key(member) {
        return member;
    }
    match member.split_once(':') {
        Some((_, local)) if children.contains_key(local) => local,
        _ => member,
    }
}

/// Parse `[-]digits[.digits][e[-]digits]` into a scaled decimal.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal64> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (&text[..at], text[at + 1..].parse::<i32>().ok()?),
        None => (text, 0),
    };
    let (digits, precision) = parse_fixed(mantissa)?;
    let scale = i64::from(precision) - i64::from(exponent);
    if scale >= 0 {
        return Some(Decimal64::new(digits, u32::try_from(scale).ok()?));
    }
    let factor = 10i64.checked_pow(u32::try_from(-scale).ok()?)?;
    Some(Decimal64::new(digits.checked_mul(factor)?, 0))
}

fn parse_fixed(text: &str) -> Option<(i64, u32)> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().chain(fraction.chars()).all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let precision = u32::try_from(fraction.len()).ok()?;
    let magnitude: i64 = format!("{whole}{fraction}").parse().ok()?;
    let digits = if negative { -magnitude } else { magnitude };
    Some((digits, precision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::EnumDefinition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn profile_schema() -> SchemaNode {
        let element = SchemaNode::container([
            ("id", SchemaNode::leaf(LeafType::String)),
            ("type", SchemaNode::leaf(LeafType::Enum)),
            ("filter", SchemaNode::leaf(LeafType::String)),
        ]);
        SchemaNode::container([(
            "access-profile",
            SchemaNode::list(["id"], element).expect("list"),
        )])
    }

    fn profile_enums() -> EnumRegistry {
        let mut enums = EnumRegistry::new();
        enums.register(
            "/access-profile/type",
            EnumDefinition::new([("internet-only", 0), ("intranet-only", 1)]),
        );
        enums
    }

    #[test]
    fn decodes_lists_and_enum_ordinals() {
        let node = ConfigNode::decode(
            &profile_schema(),
            &json!({
                "access-profile": [
                    { "id": "a", "type": "internet-only", "filter": "allow all" },
                    { "id": "b", "type": 1 },
                ]
            }),
            &profile_enums(),
            "",
        )
        .expect("decode");

        let Some(ConfigNode::List(elements)) = node.child("access-profile") else {
            panic!("expected list");
        };
        assert_eq!(elements.len(), 2);
        assert_eq!(
            elements[1].child("type"),
            Some(&ConfigNode::Leaf(ScalarValue::Enum("intranet-only".to_string())))
        );
        assert_eq!(elements[1].child("filter"), None);
    }

    #[test]
    fn rejects_duplicate_list_keys() {
        let err = ConfigNode::decode(
            &profile_schema(),
            &json!({ "access-profile": [{ "id": "a" }, { "id": "a" }] }),
            &profile_enums(),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateKey { .. }));
        assert!(format!("{err}").contains("[id=a]"));
    }

    #[test]
    fn rejects_missing_keys_unknown_fields_and_enums() {
        let enums = profile_enums();
        let err = ConfigNode::decode(
            &profile_schema(),
            &json!({ "access-profile": [{ "filter": "x" }] }),
            &enums,
            "",
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::MissingKey { .. }));

        let err = ConfigNode::decode(&profile_schema(), &json!({ "bogus": 1 }), &enums, "")
            .unwrap_err();
        assert!(matches!(err, TreeError::UnknownField { .. }));

        let err = ConfigNode::decode(
            &profile_schema(),
            &json!({ "access-profile": [{ "id": "a", "type": "everything" }] }),
            &enums,
            "",
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::UnknownEnum { .. }));
    }

    #[test]
    fn accepts_module_qualified_members_and_nulls() {
        let node = ConfigNode::decode(
            &profile_schema(),
            &json!({ "sdcore:access-profile": [{ "id": "a", "filter": null }] }),
            &profile_enums(),
            "",
        )
        .expect("decode");
        let Some(ConfigNode::List(elements)) = node.child("access-profile") else {
            panic!("expected list");
        };
        assert_eq!(elements[0], ConfigNode::container([("id", ConfigNode::string("a"))]));
    }

    #[test]
    fn rejects_qualified_and_bare_names_for_one_child() {
        let err = ConfigNode::decode(
            &profile_schema(),
            &json!({
                "sdcore:access-profile": [{ "id": "a" }],
                "access-profile": [{ "id": "b" }],
            }),
            &profile_enums(),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateField { .. }), "{err}");
        assert!(format!("{err}").contains("/access-profile"));

        let err = ConfigNode::decode(
            &profile_schema(),
            &json!({ "access-profile": [{ "id": "a", "filter": "x", "sdcore:filter": null }] }),
            &profile_enums(),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateField { .. }), "{err}");
    }

    #[test]
    fn decodes_typed_leaves() {
        let enums = EnumRegistry::new();
        let cases = [
            (LeafType::Int, json!("-12"), ScalarValue::Int(-12)),
            (LeafType::Int, json!(7), ScalarValue::Int(7)),
            (LeafType::Uint, json!("18446744073709551615"), ScalarValue::Uint(u64::MAX)),
            (LeafType::Bool, json!(true), ScalarValue::Bool(true)),
            (LeafType::Float, json!(0.5), ScalarValue::Float(0.5)),
            (LeafType::Bytes, json!("AQI="), ScalarValue::Bytes(vec![1, 2])),
            (
                LeafType::Decimal,
                json!("12.50"),
                ScalarValue::Decimal(Decimal64::new(1250, 2)),
            ),
            (
                LeafType::Decimal,
                json!(3.25),
                ScalarValue::Decimal(Decimal64::new(325, 2)),
            ),
        ];
        for (value_type, input, expected) in cases {
            let node = ConfigNode::decode(&SchemaNode::leaf(value_type), &input, &enums, "/leaf")
                .expect("decode");
            assert_eq!(node, ConfigNode::Leaf(expected));
        }

        let err = ConfigNode::decode(&SchemaNode::leaf(LeafType::Uint), &json!(-1), &enums, "/leaf")
            .unwrap_err();
        assert!(format!("{err}").contains("expected uint"));
    }

    #[test]
    fn validate_flags_duplicate_keys_built_in_code() {
        let element = |id: &str| ConfigNode::container([("id", ConfigNode::string(id))]);
        let node = ConfigNode::container([(
            "access-profile",
            ConfigNode::List(vec![element("a"), element("a")]),
        )]);
        let err = node
            .validate(&profile_schema(), &profile_enums(), "")
            .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateKey { .. }));
    }

    #[test]
    fn parses_decimal_text() {
        assert_eq!(parse_decimal("-0.05"), Some(Decimal64::new(-5, 2)));
        assert_eq!(parse_decimal("42"), Some(Decimal64::new(42, 0)));
        assert_eq!(parse_decimal(".5"), Some(Decimal64::new(5, 1)));
        assert_eq!(parse_decimal("1e3"), Some(Decimal64::new(1000, 0)));
        assert_eq!(parse_decimal("1.25E1"), Some(Decimal64::new(125, 1)));
        assert_eq!(parse_decimal("-5e-3"), Some(Decimal64::new(-5, 3)));
        assert_eq!(
            parse_decimal("1.2345678901234568e+16"),
            Some(Decimal64::new(12_345_678_901_234_568, 0))
        );
        assert_eq!(parse_decimal("1e30"), None);
        assert_eq!(parse_decimal("e5"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn key_text_is_canonical() {
        assert_eq!(ScalarValue::Uint(7).key_text(), "7");
        assert_eq!(ScalarValue::Bool(false).key_text(), "false");
        assert_eq!(ScalarValue::Decimal(Decimal64::new(150, 2)).key_text(), "1.50");
    }
}
