//! Structured addresses and their textual form.
//!
//! The text syntax is `a/b[key=value][other=value]/c`. A backslash escapes
//! the next character, so `]`, `/`, `=` and `\` can appear inside names and
//! key values. A leading `/` is optional.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One named, optionally keyed step of an address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PathSegment {
    /// Node name.
    pub name: String,
    /// Key name to key value; empty for non-list segments.
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
}

impl PathSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: BTreeMap::new(),
        }
    }

    /// Add a key selector to the segment.
    pub fn with_key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(key.into(), value.into());
        self
    }
}

/// Ordered root-to-leaf sequence of path segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Address {
    pub segments: Vec<PathSegment>,
}

impl Address {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Address with no segments, naming the root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Append a segment, returning the extended address.
    pub fn push(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Concatenate `self` in front of `path`.
    pub fn join(&self, path: &Address) -> Address {
        let mut segments = self.segments.clone();
        segments.extend(path.segments.iter().cloned());
        Address { segments }
    }

    /// Name of the top-level node addressed, if any.
    pub fn first_name(&self) -> Option<&str> {
        self.segments.first().map(|segment| segment.name.as_str())
    }
}

impl From<Vec<PathSegment>> for Address {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

/// Error returned when an address string is malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid path {input:?}: {reason}")]
pub struct AddressParseError {
    pub input: String,
    pub reason: String,
}

impl AddressParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        let mut segments = Vec::new();
        if body.is_empty() {
            return Ok(Address { segments });
        }

        let mut chars = body.chars();
        let mut name = String::new();
        let mut keys = BTreeMap::new();
        let mut in_keys = false;

        while let Some(ch) = chars.next() {
            match ch {
                '\\' if !in_keys => {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| AddressParseError::new(input, "dangling escape"))?;
                    name.push(escaped);
                }
                '[' => {
                    if name.is_empty() {
                        return Err(AddressParseError::new(input, "key selector without a name"));
                    }
                    in_keys = true;
                    let (key, value) = parse_key(&mut chars, input)?;
                    if keys.insert(key.clone(), value).is_some() {
                        return Err(AddressParseError::new(
                            input,
                            format!("duplicate key {key:?}"),
                        ));
                    }
                }
                '/' => {
                    if name.is_empty() {
                        return Err(AddressParseError::new(input, "empty segment"));
                    }
                    segments.push(PathSegment {
                        name: std::mem::take(&mut name),
                        keys: std::mem::take(&mut keys),
                    });
                    in_keys = false;
                }
                _ if in_keys => {
                    return Err(AddressParseError::new(
                        input,
                        format!("unexpected {ch:?} after key selector"),
                    ));
                }
                _ => name.push(ch),
            }
        }

        if name.is_empty() {
            return Err(AddressParseError::new(input, "empty segment"));
        }
        segments.push(PathSegment { name, keys });
        Ok(Address { segments })
    }
}

/// Read `key=value]` after an opening bracket.
fn parse_key(
    chars: &mut std::str::Chars<'_>,
    input: &str,
) -> Result<(String, String), AddressParseError> {
    let mut key = String::new();
    loop {
        match chars.next() {
            Some('\\') => key.push(
                chars
                    .next()
                    .ok_or_else(|| AddressParseError::new(input, "dangling escape"))?,
            ),
            Some('=') => break,
            Some(']') | None => {
                return Err(AddressParseError::new(input, "key selector missing '='"));
            }
            Some(ch) => key.push(ch),
        }
    }
    if key.is_empty() {
        return Err(AddressParseError::new(input, "empty key name"));
    }

    let mut value = String::new();
    loop {
        match chars.next() {
            Some('\\') => value.push(
                chars
                    .next()
                    .ok_or_else(|| AddressParseError::new(input, "dangling escape"))?,
            ),
            Some(']') => return Ok((key, value)),
            None => return Err(AddressParseError::new(input, "unterminated key selector")),
            Some(ch) => value.push(ch),
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str, special: &[char]) -> fmt::Result {
    for ch in text.chars() {
        if ch == '\\' || special.contains(&ch) {
            write!(f, "\\")?;
        }
        write!(f, "{ch}")?;
    }
    Ok(())
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.name, &['/', '['])?;
        for (key, value) in &self.keys {
            write!(f, "[")?;
            write_escaped(f, key, &['=', ']'])?;
            write!(f, "=")?;
            write_escaped(f, value, &[']'])?;
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_keyed_segments() {
        let address: Address = "access-profile/access-profile[id=typical-access-profile]/filter"
            .parse()
            .expect("parse");
        assert_eq!(
            address,
            Address::new(vec![
                PathSegment::new("access-profile"),
                PathSegment::new("access-profile").with_key("id", "typical-access-profile"),
                PathSegment::new("filter"),
            ])
        );
    }

    #[test]
    fn parses_multiple_keys_and_escapes() {
        let address: Address = r"/site[name=a\]b][zone=x/y]/leaf".parse().expect("parse");
        let site = &address.segments[0];
        assert_eq!(site.keys.get("name").map(String::as_str), Some("a]b"));
        assert_eq!(site.keys.get("zone").map(String::as_str), Some("x/y"));
        assert_eq!(address.segments[1].name, "leaf");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let address = Address::new(vec![
            PathSegment::new("a/b"),
            PathSegment::new("list")
                .with_key("k=1", "v]")
                .with_key("other", r"back\slash"),
        ]);
        let text = address.to_string();
        let parsed: Address = text.parse().expect("parse");
        assert_eq!(parsed, address);
    }

    #[test]
    fn root_address_parses_and_prints() {
        assert!("/".parse::<Address>().expect("parse").is_empty());
        assert!("".parse::<Address>().expect("parse").is_empty());
        assert_eq!(Address::root().to_string(), "/");
    }

    #[test]
    fn rejects_malformed_paths() {
        for input in ["a//b", "a[k]", "a[k=v", "[k=v]", "a[k=v]x", "a[=v]", "a[k=1][k=2]", "a\\"] {
            assert!(input.parse::<Address>().is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn join_prepends_prefix() {
        let prefix: Address = "access-profile".parse().expect("prefix");
        let path: Address = "access-profile[id=x]/filter".parse().expect("path");
        assert_eq!(
            prefix.join(&path).to_string(),
            "/access-profile/access-profile[id=x]/filter"
        );
    }
}
