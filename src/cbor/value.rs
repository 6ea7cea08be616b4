//! The YANG-flavoured CBOR data model and its JSON bridge.

use std::fmt;

use crate::error::CborError;

/// A CBOR value in the subset the stack exchanges with the device, with the
/// YANG tags surfaced as typed variants.
#[derive(Debug, Clone, PartialEq)]
pub enum YangValue {
    Null,
    Bool(bool),
    /// Whole i128 range is kept so integers past 2^53 survive untruncated.
    Int(i128),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Tag 44: named bit set, space-separated.
    Bits(String),
    /// Tag 45: enumeration, by name or numeric value.
    Enumeration(Box<YangValue>),
    /// Tag 46: identity reference, by name or SID.
    IdentityRef(Box<YangValue>),
    /// Tag 47: instance identifier, by path or SID.
    InstanceId(Box<YangValue>),
    /// Tag 256: absolute schema identifier.
    Sid(i64),
    /// Tag 257: SID delta relative to the enclosing node.
    DeltaSid(i64),
    /// A tag the stack does not interpret.
    Tagged(u64, Box<YangValue>),
    Array(Vec<YangValue>),
    /// Maps keep textual keys; SID keys are resolved on decode and
    /// re-substituted on encode.
    Map(Vec<(String, YangValue)>),
}

impl YangValue {
    pub fn map(entries: impl Into<Vec<(String, YangValue)>>) -> Self {
        Self::Map(entries.into())
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn uint(v: u64) -> Self {
        Self::Int(i128::from(v))
    }

    /// A map entry helper: `(key, value)` with owned key.
    pub fn entry(key: &str, value: YangValue) -> (String, YangValue) {
        (key.to_string(), value)
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, YangValue)]> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[YangValue]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&YangValue> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Short name of the variant for error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Bits(_) => "bits",
            Self::Enumeration(_) => "enumeration",
            Self::IdentityRef(_) => "identityref",
            Self::InstanceId(_) => "instance-identifier",
            Self::Sid(_) => "sid",
            Self::DeltaSid(_) => "delta-sid",
            Self::Tagged(..) => "tagged",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Convert from a JSON value (CLI input path).
    ///
    /// Integers stay integers; other JSON numbers become floats.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CborError> {
        Ok(match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Self::Int(i128::from(u))
                } else {
                    Self::Float(n.as_f64().ok_or_else(|| {
                        CborError::Decode("unrepresentable JSON number".into())
                    })?)
                }
            }
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), Self::from_json(v)?)))
                    .collect::<Result<_, CborError>>()?,
            ),
        })
    }

    /// Convert to a JSON value (CLI output path). Integers outside the JSON
    /// number range and binary data are rendered as strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => {
                if let Ok(v) = i64::try_from(*i) {
                    Json::from(v)
                } else if let Ok(v) = u64::try_from(*i) {
                    Json::from(v)
                } else {
                    Json::String(i.to_string())
                }
            }
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(Json::Null, Json::Number),
            Self::Text(s) | Self::Bits(s) => Json::String(s.clone()),
            Self::Bytes(b) => Json::String(hex::encode(b)),
            Self::Enumeration(inner) | Self::IdentityRef(inner) | Self::InstanceId(inner) => {
                inner.to_json()
            }
            Self::Sid(s) | Self::DeltaSid(s) => Json::from(*s),
            Self::Tagged(_, inner) => inner.to_json(),
            Self::Array(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for YangValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for YangValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for YangValue {
    fn from(v: i64) -> Self {
        Self::Int(i128::from(v))
    }
}

impl From<u32> for YangValue {
    fn from(v: u32) -> Self {
        Self::Int(i128::from(v))
    }
}

impl From<&str> for YangValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for YangValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_bridge_preserves_integers() {
        let json: serde_json::Value = serde_json::from_str("{\"speed\": 1000000000}").unwrap();
        let value = YangValue::from_json(&json).unwrap();
        assert_eq!(value.get("speed").unwrap().as_int(), Some(1_000_000_000));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn json_bridge_distinguishes_floats() {
        let json: serde_json::Value = serde_json::from_str("[1, 1.5]").unwrap();
        let value = YangValue::from_json(&json).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items[0], YangValue::Int(1));
        assert_eq!(items[1], YangValue::Float(1.5));
    }

    #[test]
    fn huge_int_renders_as_string() {
        let value = YangValue::Int(1 << 90);
        assert!(matches!(value.to_json(), serde_json::Value::String(_)));
    }

    #[test]
    fn map_lookup() {
        let value = YangValue::map(vec![
            YangValue::entry("enabled", YangValue::Bool(true)),
            YangValue::entry("name", "eth0".into()),
        ]);
        assert_eq!(value.get("name").unwrap().as_text(), Some("eth0"));
        assert!(value.get("missing").is_none());
    }
}
