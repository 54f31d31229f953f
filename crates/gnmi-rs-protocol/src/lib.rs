//! Wire protocol types for gNMI capability and get exchanges.
//!
//! These types describe field semantics only; the byte layout on the wire is
//! owned by whatever transport carries them.

mod path;
mod status;

pub use path::{Address, AddressParseError, PathSegment};
pub use status::{Code, Status};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Protocol version advertised in capability responses.
pub const GNMI_VERSION: &str = "0.7.0";

/// Wire encoding requested for a retrieved value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Plain JSON document.
    Json,
    /// Opaque bytes.
    Bytes,
    /// Typed scalar values.
    Proto,
    /// ASCII text.
    Ascii,
    /// RFC 7951 JSON document.
    JsonIetf,
}

impl Encoding {
    /// Stable lowercase name of the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::Bytes => "bytes",
            Encoding::Proto => "proto",
            Encoding::Ascii => "ascii",
            Encoding::JsonIetf => "json_ietf",
        }
    }

    /// Numeric value used by the gNMI wire enum.
    pub fn code(&self) -> i32 {
        match self {
            Encoding::Json => 0,
            Encoding::Bytes => 1,
            Encoding::Proto => 2,
            Encoding::Ascii => 3,
            Encoding::JsonIetf => 4,
        }
    }

    /// Whether values in this encoding are framed as structured documents.
    pub fn is_document(&self) -> bool {
        matches!(self, Encoding::Json | Encoding::JsonIetf)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "json" => Ok(Encoding::Json),
            "bytes" => Ok(Encoding::Bytes),
            "proto" => Ok(Encoding::Proto),
            "ascii" => Ok(Encoding::Ascii),
            "json_ietf" => Ok(Encoding::JsonIetf),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

/// Schema module supported by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ModelDescriptor {
    /// Module name.
    pub name: String,
    /// Publishing organization.
    pub organization: String,
    /// Module revision.
    pub version: String,
}

impl ModelDescriptor {
    pub fn new(
        name: impl Into<String>,
        organization: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            organization: organization.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.organization, self.version)
    }
}

/// Fixed-point decimal carried as scaled digits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Decimal64 {
    /// Value scaled by `10^precision`.
    pub digits: i64,
    /// Number of fractional digits.
    pub precision: u32,
}

impl Decimal64 {
    pub fn new(digits: i64, precision: u32) -> Self {
        Self { digits, precision }
    }
}

impl fmt::Display for Decimal64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.precision == 0 {
            return write!(f, "{}", self.digits);
        }
        let sign = if self.digits < 0 { "-" } else { "" };
        let magnitude = self.digits.unsigned_abs().to_string();
        let precision = self.precision as usize;
        let padded = format!("{magnitude:0>width$}", width = precision + 1);
        let (whole, fraction) = padded.split_at(padded.len() - precision);
        write!(f, "{sign}{whole}.{fraction}")
    }
}

/// Value payload of an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum TypedValue {
    StringVal(String),
    IntVal(i64),
    UintVal(u64),
    BoolVal(bool),
    FloatVal(f64),
    BytesVal(Vec<u8>),
    DecimalVal(Decimal64),
    /// Serialized JSON document.
    JsonVal(Vec<u8>),
    /// Serialized RFC 7951 JSON document.
    JsonIetfVal(Vec<u8>),
}

impl TypedValue {
    /// Document bytes when the value is framed as a structured document.
    pub fn as_document(&self) -> Option<&[u8]> {
        match self {
            TypedValue::JsonVal(bytes) | TypedValue::JsonIetfVal(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Capability negotiation request. Carries no fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityRequest {}

/// Models and encodings the server can serve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityResponse {
    /// Supported models in registration order.
    pub supported_models: Vec<ModelDescriptor>,
    /// Supported encodings.
    pub supported_encodings: Vec<Encoding>,
    /// Protocol version implemented by the server.
    pub gnmi_version: String,
}

/// Request for one or more configuration values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetRequest {
    /// Address prepended to every path.
    #[serde(default)]
    pub prefix: Option<Address>,
    /// Addresses to retrieve.
    #[serde(default)]
    pub paths: Vec<Address>,
    /// Requested value encoding.
    pub encoding: Encoding,
    /// Models the client restricts the request to.
    #[serde(default)]
    pub use_models: Vec<ModelDescriptor>,
}

impl GetRequest {
    /// Build a request for a single address.
    pub fn single(path: Address, encoding: Encoding) -> Self {
        Self {
            prefix: None,
            paths: vec![path],
            encoding,
            use_models: Vec::new(),
        }
    }
}

/// Response to a get request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GetResponse {
    pub notifications: Vec<Notification>,
}

/// Timestamped set of updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    /// Prefix echoed from the request.
    #[serde(default)]
    pub prefix: Option<Address>,
    pub updates: Vec<Update>,
}

/// Single addressed value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Update {
    pub path: Address,
    pub value: TypedValue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encoding_parses_wire_and_cli_names() {
        assert_eq!("json_ietf".parse::<Encoding>(), Ok(Encoding::JsonIetf));
        assert_eq!("JSON-IETF".parse::<Encoding>(), Ok(Encoding::JsonIetf));
        assert_eq!("Proto".parse::<Encoding>(), Ok(Encoding::Proto));
        assert!("xml".parse::<Encoding>().is_err());
        assert_eq!(Encoding::JsonIetf.code(), 4);
    }

    #[test]
    fn decimal_renders_fixed_point() {
        assert_eq!(Decimal64::new(1250, 2).to_string(), "12.50");
        assert_eq!(Decimal64::new(-5, 3).to_string(), "-0.005");
        assert_eq!(Decimal64::new(42, 0).to_string(), "42");
    }

    #[test]
    fn get_request_defaults_optional_fields() {
        let request: GetRequest = serde_json::from_str(
            r#"{ "paths": [{ "segments": [{ "name": "system" }] }], "encoding": "json_ietf" }"#,
        )
        .expect("deserialize");
        assert_eq!(request.prefix, None);
        assert!(request.use_models.is_empty());
        assert_eq!(request.paths[0].to_string(), "/system");
    }

    #[test]
    fn typed_value_distinguishes_documents() {
        assert_eq!(TypedValue::StringVal("x".to_string()).as_document(), None);
        let doc = TypedValue::JsonIetfVal(b"\"x\"".to_vec());
        assert_eq!(doc.as_document(), Some(&b"\"x\""[..]));
    }
}
