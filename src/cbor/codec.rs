//! Conversion between [`YangValue`] and wire CBOR.

use ciborium::value::{Integer, Value};

use crate::error::CborError;
use crate::sid::SidTable;

use super::tag;
use super::value::YangValue;

/// Encode a value to canonical CBOR bytes, substituting SID keys.
pub fn encode(value: &YangValue, table: &SidTable) -> Result<Vec<u8>, CborError> {
    let cbor = encode_value(value, table)?;
    let mut out = Vec::new();
    ciborium::into_writer(&cbor, &mut out).map_err(|e| CborError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decode CBOR bytes, resolving SID keys back to textual paths.
pub fn decode(bytes: &[u8], table: &SidTable) -> Result<YangValue, CborError> {
    let cbor: Value =
        ciborium::from_reader(bytes).map_err(|e| CborError::Decode(e.to_string()))?;
    decode_value(&cbor, table)
}

/// Lower a [`YangValue`] into the ciborium data model with SID-substituted,
/// canonically ordered map keys.
pub fn encode_value(value: &YangValue, table: &SidTable) -> Result<Value, CborError> {
    Ok(match value {
        YangValue::Null => Value::Null,
        YangValue::Bool(b) => Value::Bool(*b),
        YangValue::Int(i) => Value::Integer(
            Integer::try_from(*i).map_err(|_| CborError::Encode(format!("integer {i} out of CBOR range")))?,
        ),
        YangValue::Float(f) => Value::Float(*f),
        YangValue::Text(s) => Value::Text(s.clone()),
        YangValue::Bytes(b) => Value::Bytes(b.clone()),
        YangValue::Bits(s) => Value::Tag(tag::BITS, Box::new(Value::Text(s.clone()))),
        YangValue::Enumeration(inner) => {
            Value::Tag(tag::ENUMERATION, Box::new(encode_value(inner, table)?))
        }
        YangValue::IdentityRef(inner) => {
            Value::Tag(tag::IDENTITYREF, Box::new(encode_value(inner, table)?))
        }
        YangValue::InstanceId(inner) => Value::Tag(
            tag::INSTANCE_IDENTIFIER,
            Box::new(encode_value(inner, table)?),
        ),
        YangValue::Sid(s) => Value::Tag(tag::SID, Box::new(Value::Integer(Integer::from(*s)))),
        YangValue::DeltaSid(s) => {
            Value::Tag(tag::DELTA_SID, Box::new(Value::Integer(Integer::from(*s))))
        }
        YangValue::Tagged(t, inner) => Value::Tag(*t, Box::new(encode_value(inner, table)?)),
        YangValue::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| encode_value(v, table))
                .collect::<Result<_, _>>()?,
        ),
        YangValue::Map(entries) => {
            let mut encoded: Vec<(Vec<u8>, Value, Value)> = Vec::with_capacity(entries.len());
            for (key, val) in entries {
                let key_value = encode_key(key, table);
                let mut key_bytes = Vec::new();
                ciborium::into_writer(&key_value, &mut key_bytes)
                    .map_err(|e| CborError::Encode(e.to_string()))?;
                encoded.push((key_bytes, key_value, encode_value(val, table)?));
            }
            // Canonical order: byte-wise comparison of the encoded keys
            encoded.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Map(encoded.into_iter().map(|(_, k, v)| (k, v)).collect())
        }
    })
}

/// Map key emission: known YANG paths (and opaque `SID:<n>` keys from an
/// earlier decode) become tag-256 integers, everything else stays text.
fn encode_key(key: &str, table: &SidTable) -> Value {
    if let Some(sid) = table.sid_for_path(key) {
        return Value::Tag(tag::SID, Box::new(Value::Integer(Integer::from(sid))));
    }
    if let Some(n) = key.strip_prefix("SID:").and_then(|s| s.parse::<u32>().ok()) {
        return Value::Tag(tag::SID, Box::new(Value::Integer(Integer::from(n))));
    }
    Value::Text(key.to_string())
}

/// Lift a ciborium value into the YANG data model.
pub fn decode_value(cbor: &Value, table: &SidTable) -> Result<YangValue, CborError> {
    Ok(match cbor {
        Value::Null => YangValue::Null,
        Value::Bool(b) => YangValue::Bool(*b),
        Value::Integer(i) => YangValue::Int(i128::from(*i)),
        Value::Float(f) => YangValue::Float(*f),
        Value::Text(s) => YangValue::Text(s.clone()),
        Value::Bytes(b) => YangValue::Bytes(b.clone()),
        Value::Tag(t, inner) => decode_tagged(*t, inner, table)?,
        Value::Array(items) => YangValue::Array(
            items
                .iter()
                .map(|v| decode_value(v, table))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(entries) => {
            let mut out = Vec::with_capacity(entries.len());
            for (key, val) in entries {
                out.push((decode_key(key, table)?, decode_value(val, table)?));
            }
            YangValue::Map(out)
        }
        _ => {
            return Err(CborError::UnexpectedItem {
                expected: "supported CBOR item",
                got: "unsupported item",
            })
        }
    })
}

fn decode_tagged(t: u64, inner: &Value, table: &SidTable) -> Result<YangValue, CborError> {
    match (t, inner) {
        (tag::BITS, Value::Text(s)) => Ok(YangValue::Bits(s.clone())),
        (tag::ENUMERATION, _) => Ok(YangValue::Enumeration(Box::new(decode_value(
            inner, table,
        )?))),
        (tag::IDENTITYREF, _) => Ok(YangValue::IdentityRef(Box::new(decode_value(
            inner, table,
        )?))),
        (tag::INSTANCE_IDENTIFIER, _) => Ok(YangValue::InstanceId(Box::new(decode_value(
            inner, table,
        )?))),
        (tag::SID, Value::Integer(i)) => Ok(YangValue::Sid(sid_from_integer(*i)?)),
        (tag::DELTA_SID, Value::Integer(i)) => Ok(YangValue::DeltaSid(sid_from_integer(*i)?)),
        (t, _) => Ok(YangValue::Tagged(t, Box::new(decode_value(inner, table)?))),
    }
}

/// Map key decode: text stays, SID forms (tag-256 or a bare integer)
/// resolve through the table or fall back to an opaque `SID:<n>`.
fn decode_key(key: &Value, table: &SidTable) -> Result<String, CborError> {
    let sid = match key {
        Value::Text(s) => return Ok(s.clone()),
        Value::Integer(i) => sid_from_integer(*i)?,
        Value::Tag(tag::SID, inner) => match inner.as_ref() {
            Value::Integer(i) => sid_from_integer(*i)?,
            _ => return Err(CborError::InvalidMapKey),
        },
        _ => return Err(CborError::InvalidMapKey),
    };

    let resolved = u32::try_from(sid)
        .ok()
        .and_then(|s| table.path_for_sid(s))
        .map(String::from);
    Ok(resolved.unwrap_or_else(|| format!("SID:{sid}")))
}

fn sid_from_integer(i: Integer) -> Result<i64, CborError> {
    i64::try_from(i128::from(i)).map_err(|_| CborError::Decode("SID out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sid::SidTable;

    fn table() -> SidTable {
        SidTable::embedded()
    }

    fn roundtrip(value: &YangValue) {
        let table = table();
        let bytes = encode(value, &table).unwrap();
        let back = decode(&bytes, &table).unwrap();
        assert_eq!(&back, value);
    }

    #[test]
    fn scalar_roundtrips() {
        roundtrip(&YangValue::Null);
        roundtrip(&YangValue::Bool(true));
        roundtrip(&YangValue::Int(0));
        roundtrip(&YangValue::Int(-1));
        roundtrip(&YangValue::Int(23));
        roundtrip(&YangValue::Int(1_000_000));
        roundtrip(&YangValue::Float(1.5));
        roundtrip(&YangValue::text("gigabitEthernet"));
        roundtrip(&YangValue::Bytes(vec![0, 1, 2, 255]));
    }

    #[test]
    fn big_integers_survive() {
        // Past 2^53: must not be truncated through a double
        roundtrip(&YangValue::Int((1 << 53) + 1));
        roundtrip(&YangValue::Int(u64::MAX as i128));
        roundtrip(&YangValue::Int(-(1_i128 << 60)));
    }

    #[test]
    fn yang_tags_roundtrip() {
        roundtrip(&YangValue::Bits("flag-a flag-b".into()));
        roundtrip(&YangValue::Enumeration(Box::new(YangValue::Int(3))));
        roundtrip(&YangValue::Enumeration(Box::new(YangValue::text("up"))));
        roundtrip(&YangValue::IdentityRef(Box::new(YangValue::text(
            "iana-if-type:ethernetCsmacd",
        ))));
        roundtrip(&YangValue::InstanceId(Box::new(YangValue::text(
            "/ietf-interfaces:interfaces/interface[name='1']",
        ))));
        roundtrip(&YangValue::Sid(1000));
        roundtrip(&YangValue::DeltaSid(-4));
        roundtrip(&YangValue::Tagged(99, Box::new(YangValue::Int(7))));
    }

    #[test]
    fn known_path_key_becomes_sid_tag() {
        let table = table();
        let value = YangValue::map(vec![YangValue::entry(
            "/ietf-interfaces:interfaces",
            YangValue::map(vec![]),
        )]);
        let bytes = encode(&value, &table).unwrap();

        // a1 (map of 1) d9 0100 (tag 256) 19 03e8 (uint 1000)
        assert_eq!(&bytes[..7], &[0xA1, 0xD9, 0x01, 0x00, 0x19, 0x03, 0xE8]);

        // And the decoded form restores the path
        let back = decode(&bytes, &table).unwrap();
        assert!(back.get("/ietf-interfaces:interfaces").is_some());
    }

    #[test]
    fn unknown_key_stays_text() {
        let table = table();
        let value = YangValue::map(vec![YangValue::entry("custom-key", YangValue::Int(1))]);
        let bytes = encode(&value, &table).unwrap();
        let back = decode(&bytes, &table).unwrap();
        assert_eq!(back.get("custom-key").unwrap().as_int(), Some(1));
    }

    #[test]
    fn unknown_sid_key_surfaces_opaque_and_reencodes() {
        let table = table();
        // Build a map keyed by a SID absent from the table
        let cbor = Value::Map(vec![(
            Value::Tag(tag::SID, Box::new(Value::Integer(Integer::from(999_999)))),
            Value::Bool(true),
        )]);
        let mut bytes = Vec::new();
        ciborium::into_writer(&cbor, &mut bytes).unwrap();

        let decoded = decode(&bytes, &table).unwrap();
        assert!(decoded.get("SID:999999").is_some());

        // Round-trip: the opaque key goes back out as tag-256
        let re = encode(&decoded, &table).unwrap();
        assert_eq!(decode(&re, &table).unwrap(), decoded);
    }

    #[test]
    fn bare_integer_key_resolves_like_sid() {
        let table = table();
        let cbor = Value::Map(vec![(
            Value::Integer(Integer::from(1000)),
            Value::Null,
        )]);
        let mut bytes = Vec::new();
        ciborium::into_writer(&cbor, &mut bytes).unwrap();

        let decoded = decode(&bytes, &table).unwrap();
        assert!(decoded.get("/ietf-interfaces:interfaces").is_some());
    }

    #[test]
    fn canonical_key_order_is_stable() {
        let table = table();
        // Insert keys in the "wrong" order; text keys encode longer than
        // the tag-256 integer key, so the SID key sorts first... byte-wise.
        let forward = YangValue::map(vec![
            YangValue::entry("zzz", YangValue::Int(1)),
            YangValue::entry("aaa", YangValue::Int(2)),
            YangValue::entry("/ietf-interfaces:interfaces", YangValue::Int(3)),
        ]);
        let reversed = YangValue::map(vec![
            YangValue::entry("/ietf-interfaces:interfaces", YangValue::Int(3)),
            YangValue::entry("aaa", YangValue::Int(2)),
            YangValue::entry("zzz", YangValue::Int(1)),
        ]);

        let a = encode(&forward, &table).unwrap();
        let b = encode(&reversed, &table).unwrap();
        assert_eq!(a, b);

        // Stability under re-encode
        let decoded = decode(&a, &table).unwrap();
        assert_eq!(encode(&decoded, &table).unwrap(), a);
    }

    #[test]
    fn nested_structures_roundtrip() {
        roundtrip(&YangValue::map(vec![
            YangValue::entry(
                "interface",
                YangValue::Array(vec![
                    YangValue::map(vec![
                        YangValue::entry("name", "1".into()),
                        YangValue::entry("enabled", YangValue::Bool(true)),
                    ]),
                    YangValue::map(vec![
                        YangValue::entry("name", "2".into()),
                        YangValue::entry("enabled", YangValue::Bool(false)),
                    ]),
                ]),
            ),
        ]));
    }
}
