//! Value encoding for resolved nodes.

use crate::enums::EnumRegistry;
use crate::error::{GnmiError, TreeError, display_path};
use crate::resolver::Resolved;
use crate::schema::{LeafType, SchemaNode, join_schema_path};
use crate::tree::{ConfigNode, ScalarValue};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use gnmi_rs_protocol::{Encoding, TypedValue};
use serde_json::{Map, Number, Value};

/// Encodings this encoder can produce, in advertised order.
///
/// The model registry advertises exactly this set.
pub const SUPPORTED_ENCODINGS: [Encoding; 3] = [Encoding::Json, Encoding::JsonIetf, Encoding::Proto];

pub fn is_supported(encoding: Encoding) -> bool {
    SUPPORTED_ENCODINGS.contains(&encoding)
}

/// Encode a resolved node in the requested encoding.
///
/// Leaves requested as a document come back as a single-value document.
/// Subtrees can only be carried by document encodings.
pub fn encode(resolved: &Resolved<'_>, encoding: Encoding) -> Result<TypedValue, GnmiError> {
    if !is_supported(encoding) {
        return Err(GnmiError::UnsupportedEncoding(format!(
            "encoding {encoding} is not supported"
        )));
    }
    let style = match encoding {
        Encoding::Json => Style::Json,
        Encoding::JsonIetf => Style::Ietf,
        _ => return encode_scalar(resolved),
    };

    let document = match resolved {
        Resolved::Scalar {
            value,
            value_type,
            schema_path,
        } => {
            check_leaf(value, *value_type, schema_path)?;
            style.leaf(value, schema_path)?
        }
        Resolved::Subtree {
            schema,
            node,
            schema_path,
        } => style.node(schema, node, schema_path)?,
    };
    let bytes = serde_json::to_vec(&document)
        .map_err(|err| GnmiError::Internal(format!("failed to serialize document: {err}")))?;

    Ok(match style {
        Style::Json => TypedValue::JsonVal(bytes),
        Style::Ietf => TypedValue::JsonIetfVal(bytes),
    })
}

/// Parse document bytes produced by [`encode`] back into an instance of `schema`.
///
/// `schema_path` is the qualified path of `schema`; enum leaves below it are
/// looked up in `enums`.
pub fn decode_document(
    schema: &SchemaNode,
    bytes: &[u8],
    enums: &EnumRegistry,
    schema_path: &str,
) -> Result<ConfigNode, TreeError> {
    ConfigNode::decode_bytes(schema, bytes, enums, schema_path)
}

fn encode_scalar(resolved: &Resolved<'_>) -> Result<TypedValue, GnmiError> {
    let Resolved::Scalar {
        value,
        value_type,
        schema_path,
    } = resolved
    else {
        return Err(GnmiError::UnsupportedEncoding(format!(
            "{} is not a leaf; use a document encoding for subtrees",
            display_path(resolved.schema_path())
        )));
    };
    check_leaf(value, *value_type, schema_path)?;

    Ok(match value {
        ScalarValue::String(text) | ScalarValue::Enum(text) => TypedValue::StringVal(text.clone()),
        ScalarValue::Int(value) => TypedValue::IntVal(*value),
        ScalarValue::Uint(value) => TypedValue::UintVal(*value),
        ScalarValue::Bool(value) => TypedValue::BoolVal(*value),
        ScalarValue::Float(value) => TypedValue::FloatVal(*value),
        ScalarValue::Bytes(value) => TypedValue::BytesVal(value.clone()),
        ScalarValue::Decimal(value) => TypedValue::DecimalVal(*value),
    })
}

fn check_leaf(value: &ScalarValue, value_type: LeafType, path: &str) -> Result<(), GnmiError> {
    if value.leaf_type() == value_type {
        Ok(())
    } else {
        Err(GnmiError::Internal(format!(
            "leaf {} holds {} but is declared {value_type}",
            display_path(path),
            value.leaf_type()
        )))
    }
}

#[derive(Debug, Clone, Copy)]
enum Style {
    Json,
    /// RFC 7951: 64-bit numbers and decimals travel as strings.
    Ietf,
}

impl Style {
    fn node(&self, schema: &SchemaNode, node: &ConfigNode, path: &str) -> Result<Value, GnmiError> {
        match (schema, node) {
            (SchemaNode::Container { children: schemas }, ConfigNode::Container(children)) => {
                let mut members = Map::new();
                for (name, child) in children {
                    let child_path = join_schema_path(path, name);
                    let child_schema = schemas.get(name).ok_or_else(|| {
                        GnmiError::Internal(format!("no schema for instance at {child_path}"))
                    })?;
                    members.insert(name.clone(), self.node(child_schema, child, &child_path)?);
                }
                Ok(Value::Object(members))
            }
            (SchemaNode::List { element, .. }, ConfigNode::List(elements)) => elements
                .iter()
                .map(|entry| self.node(element, entry, path))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (SchemaNode::Leaf { value_type }, ConfigNode::Leaf(value)) => {
                check_leaf(value, *value_type, path)?;
                self.leaf(value, path)
            }
            (schema, _) => Err(GnmiError::Internal(format!(
                "instance at {} does not match its {} schema",
                display_path(path),
                schema.kind()
            ))),
        }
    }

    fn leaf(&self, value: &ScalarValue, path: &str) -> Result<Value, GnmiError> {
        let ietf = matches!(self, Style::Ietf);
        Ok(match value {
            ScalarValue::String(text) | ScalarValue::Enum(text) => Value::String(text.clone()),
            ScalarValue::Bool(value) => Value::Bool(*value),
            ScalarValue::Bytes(value) => Value::String(STANDARD.encode(value)),
            ScalarValue::Int(value) if ietf => Value::String(value.to_string()),
            ScalarValue::Int(value) => Value::from(*value),
            ScalarValue::Uint(value) if ietf => Value::String(value.to_string()),
            ScalarValue::Uint(value) => Value::from(*value),
            // Exact decimal text in both styles.
            ScalarValue::Decimal(value) => Value::String(value.to_string()),
            ScalarValue::Float(value) => finite(*value, path)?,
        })
    }
}

fn finite(value: f64, path: &str) -> Result<Value, GnmiError> {
    Number::from_f64(value).map(Value::Number).ok_or_else(|| {
        GnmiError::Internal(format!(
            "leaf {} holds {value}, which has no JSON form",
            display_path(path)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use gnmi_rs_protocol::{Address, Decimal64};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scalar(value: &ScalarValue) -> Resolved<'_> {
        Resolved::Scalar {
            value,
            value_type: value.leaf_type(),
            schema_path: "/leaf".to_string(),
        }
    }

    fn document(value: &TypedValue) -> Value {
        serde_json::from_slice(value.as_document().expect("document")).expect("json")
    }

    #[test]
    fn supported_set_excludes_bytes_and_ascii() {
        assert!(is_supported(Encoding::Json));
        assert!(is_supported(Encoding::JsonIetf));
        assert!(is_supported(Encoding::Proto));
        assert!(!is_supported(Encoding::Bytes));
        assert!(!is_supported(Encoding::Ascii));

        let value = ScalarValue::Bool(true);
        let err = encode(&scalar(&value), Encoding::Ascii).unwrap_err();
        assert!(matches!(err, GnmiError::UnsupportedEncoding(_)));
    }

    #[test]
    fn proto_preserves_leaf_types() {
        let cases = [
            (ScalarValue::String("x".into()), TypedValue::StringVal("x".into())),
            (ScalarValue::Int(-3), TypedValue::IntVal(-3)),
            (ScalarValue::Uint(9), TypedValue::UintVal(9)),
            (ScalarValue::Bool(false), TypedValue::BoolVal(false)),
            (ScalarValue::Float(1.5), TypedValue::FloatVal(1.5)),
            (ScalarValue::Bytes(vec![0, 255]), TypedValue::BytesVal(vec![0, 255])),
            (ScalarValue::Enum("up".into()), TypedValue::StringVal("up".into())),
            (
                ScalarValue::Decimal(Decimal64::new(1250, 2)),
                TypedValue::DecimalVal(Decimal64::new(1250, 2)),
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(encode(&scalar(&value), Encoding::Proto), Ok(expected));
        }
    }

    #[test]
    fn leaves_become_single_value_documents() {
        let value = ScalarValue::String("allow app name".into());
        let encoded = encode(&scalar(&value), Encoding::JsonIetf).expect("encode");
        assert_eq!(encoded, TypedValue::JsonIetfVal(br#""allow app name""#.to_vec()));

        let value = ScalarValue::Uint(u64::MAX);
        let ietf = encode(&scalar(&value), Encoding::JsonIetf).expect("encode");
        assert_eq!(document(&ietf), json!("18446744073709551615"));
        let plain = encode(&scalar(&value), Encoding::Json).expect("encode");
        assert_eq!(document(&plain), json!(u64::MAX));

        let value = ScalarValue::Decimal(Decimal64::new(-5, 2));
        assert_eq!(
            document(&encode(&scalar(&value), Encoding::JsonIetf).expect("encode")),
            json!("-0.05")
        );
        assert_eq!(
            document(&encode(&scalar(&value), Encoding::Json).expect("encode")),
            json!("-0.05")
        );

        let value = ScalarValue::Bytes(vec![1, 2]);
        assert_eq!(
            document(&encode(&scalar(&value), Encoding::Json).expect("encode")),
            json!("AQI=")
        );
    }

    #[test]
    fn non_finite_floats_are_internal() {
        let value = ScalarValue::Float(f64::NAN);
        let err = encode(&scalar(&value), Encoding::Json).unwrap_err();
        assert!(matches!(err, GnmiError::Internal(_)));
        assert!(encode(&scalar(&value), Encoding::Proto).is_ok());
    }

    #[test]
    fn mismatched_leaf_types_are_internal() {
        let value = ScalarValue::Int(1);
        let resolved = Resolved::Scalar {
            value: &value,
            value_type: LeafType::String,
            schema_path: "/leaf".to_string(),
        };
        for encoding in SUPPORTED_ENCODINGS {
            let err = encode(&resolved, encoding).unwrap_err();
            assert!(matches!(err, GnmiError::Internal(_)), "{encoding}");
        }
    }

    fn interfaces() -> (SchemaNode, ConfigNode) {
        let element = SchemaNode::container([
            ("name", SchemaNode::leaf(LeafType::String)),
            ("mtu", SchemaNode::leaf(LeafType::Uint)),
            ("enabled", SchemaNode::leaf(LeafType::Bool)),
        ]);
        let schema = SchemaNode::container([(
            "interfaces",
            SchemaNode::container([(
                "interface",
                SchemaNode::list(["name"], element).expect("list"),
            )]),
        )]);
        let entry = |name: &str, mtu: u64| {
            ConfigNode::container([
                ("name", ConfigNode::string(name)),
                ("mtu", ConfigNode::Leaf(ScalarValue::Uint(mtu))),
                ("enabled", ConfigNode::Leaf(ScalarValue::Bool(true))),
            ])
        };
        let root = ConfigNode::container([(
            "interfaces",
            ConfigNode::container([(
                "interface",
                ConfigNode::List(vec![entry("eth0", 1500), entry("eth1", 9000)]),
            )]),
        )]);
        (schema, root)
    }

    #[test]
    fn subtrees_render_lists_with_keys() {
        let (schema, root) = interfaces();
        let path: Address = "interfaces".parse().expect("address");
        let resolved = resolve(&root, &schema, &path.segments).expect("resolve");

        let encoded = encode(&resolved, Encoding::Json).expect("encode");
        assert_eq!(
            document(&encoded),
            json!({
                "interface": [
                    { "enabled": true, "mtu": 1500, "name": "eth0" },
                    { "enabled": true, "mtu": 9000, "name": "eth1" },
                ]
            })
        );

        let encoded = encode(&resolved, Encoding::JsonIetf).expect("encode");
        assert_eq!(
            document(&encoded)["interface"][1]["mtu"],
            json!("9000")
        );
    }

    #[test]
    fn subtree_documents_round_trip() {
        let (schema, root) = interfaces();
        let enums = EnumRegistry::new();
        for encoding in [Encoding::Json, Encoding::JsonIetf] {
            let resolved = resolve(&root, &schema, &[]).expect("resolve");
            let encoded = encode(&resolved, encoding).expect("encode");
            let decoded = decode_document(
                &schema,
                encoded.as_document().expect("document"),
                &enums,
                "",
            )
            .expect("decode");
            assert_eq!(decoded, root);
        }
    }

    #[test]
    fn decimal_documents_keep_scale_and_digits() {
        let schema = SchemaNode::container([("rate", SchemaNode::leaf(LeafType::Decimal))]);
        let enums = EnumRegistry::new();
        for value in [
            Decimal64::new(1250, 2),
            Decimal64::new(1_234_567_890_123_456_789, 2),
            Decimal64::new(-7, 3),
        ] {
            let root = ConfigNode::container([("rate", ConfigNode::leaf(ScalarValue::Decimal(value)))]);
            for encoding in [Encoding::Json, Encoding::JsonIetf] {
                let resolved = resolve(&root, &schema, &[]).expect("resolve");
                let encoded = encode(&resolved, encoding).expect("encode");
                assert_eq!(document(&encoded)["rate"], json!(value.to_string()));
                let decoded = decode_document(
                    &schema,
                    encoded.as_document().expect("document"),
                    &enums,
                    "",
                )
                .expect("decode");
                assert_eq!(decoded, root, "{value} {encoding}");
            }
        }
    }

    #[test]
    fn subtrees_cannot_be_proto() {
        let (schema, root) = interfaces();
        let resolved = resolve(&root, &schema, &[]).expect("resolve");
        let err = encode(&resolved, Encoding::Proto).unwrap_err();
        assert!(matches!(err, GnmiError::UnsupportedEncoding(_)));
    }
}
