//! Static SID table: the bidirectional map between YANG instance paths and
//! numeric Structure IDentifiers (RFC 9254), plus per-leaf metadata used for
//! client-side validation of outgoing payloads.
//!
//! The table is embedded at build time and read-only for the life of the
//! process. SID ranges are allocated per module: `ietf-interfaces`
//! 1000-1999, `ieee802-dot1q-bridge` (and the Qbv scheduler augmentations)
//! 2000-2999, `ieee1588-ptp` 3000-3999, `mchp-velocitysp-*` vendor
//! extensions 4000-4299, `ietf-constrained-yang-library` 29300-29399.

mod table;

use std::collections::HashMap;

use crate::cbor::YangValue;
use crate::error::{Error, Result};

/// Schema node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SidKind {
    Container,
    List,
    Leaf,
    LeafList,
    Rpc,
    Action,
}

/// Leaf datatype for client-side range/type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Boolean,
    String,
    Binary,
    Enumeration,
    IdentityRef,
    Decimal64,
    Bits,
}

impl DataType {
    /// Check a value against the datatype. Returns the failure reason.
    fn check(self, value: &YangValue) -> std::result::Result<(), String> {
        let int_range = |lo: i128, hi: i128| match value.as_int() {
            Some(v) if (lo..=hi).contains(&v) => Ok(()),
            Some(v) => Err(format!("{v} outside {lo}..={hi}")),
            None => Err(format!("expected integer, got {}", value.kind())),
        };

        match self {
            Self::Uint8 => int_range(0, u8::MAX as i128),
            Self::Uint16 => int_range(0, u16::MAX as i128),
            Self::Uint32 => int_range(0, u32::MAX as i128),
            Self::Uint64 => int_range(0, u64::MAX as i128),
            Self::Int8 => int_range(i8::MIN as i128, i8::MAX as i128),
            Self::Int16 => int_range(i16::MIN as i128, i16::MAX as i128),
            Self::Int32 => int_range(i32::MIN as i128, i32::MAX as i128),
            Self::Int64 => int_range(i64::MIN as i128, i64::MAX as i128),
            Self::Boolean => match value {
                YangValue::Bool(_) => Ok(()),
                other => Err(format!("expected boolean, got {}", other.kind())),
            },
            Self::String => match value {
                YangValue::Text(_) => Ok(()),
                other => Err(format!("expected string, got {}", other.kind())),
            },
            Self::Binary => match value {
                YangValue::Bytes(_) => Ok(()),
                other => Err(format!("expected binary, got {}", other.kind())),
            },
            Self::Enumeration => match value {
                YangValue::Enumeration(_) | YangValue::Text(_) | YangValue::Int(_) => Ok(()),
                other => Err(format!("expected enumeration, got {}", other.kind())),
            },
            Self::IdentityRef => match value {
                YangValue::IdentityRef(_) | YangValue::Text(_) | YangValue::Sid(_) => Ok(()),
                other => Err(format!("expected identityref, got {}", other.kind())),
            },
            Self::Decimal64 => match value {
                YangValue::Float(_) | YangValue::Int(_) => Ok(()),
                other => Err(format!("expected decimal64, got {}", other.kind())),
            },
            Self::Bits => match value {
                YangValue::Bits(_) | YangValue::Text(_) => Ok(()),
                other => Err(format!("expected bits, got {}", other.kind())),
            },
        }
    }
}

/// One row of the SID table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidEntry {
    pub sid: u32,
    pub path: &'static str,
    pub kind: SidKind,
    pub datatype: Option<DataType>,
    /// Key leaf name, for lists.
    pub key: Option<&'static str>,
}

/// The bidirectional path <-> SID map.
pub struct SidTable {
    by_sid: HashMap<u32, &'static SidEntry>,
    by_path: HashMap<&'static str, &'static SidEntry>,
}

impl SidTable {
    /// Build the table from the embedded data.
    pub fn embedded() -> Self {
        let mut by_sid = HashMap::with_capacity(table::ENTRIES.len());
        let mut by_path = HashMap::with_capacity(table::ENTRIES.len());
        for entry in table::ENTRIES {
            by_sid.insert(entry.sid, entry);
            by_path.insert(entry.path, entry);
        }
        Self { by_sid, by_path }
    }

    pub fn sid_for_path(&self, path: &str) -> Option<u32> {
        self.by_path.get(path).map(|e| e.sid)
    }

    pub fn path_for_sid(&self, sid: u32) -> Option<&'static str> {
        self.by_sid.get(&sid).map(|e| e.path)
    }

    pub fn entry_for_path(&self, path: &str) -> Option<&'static SidEntry> {
        self.by_path.get(path).copied()
    }

    pub fn entry_for_sid(&self, sid: u32) -> Option<&'static SidEntry> {
        self.by_sid.get(&sid).copied()
    }

    /// All entries whose path matches the regex, ordered by SID.
    pub fn search(&self, pattern: &str) -> std::result::Result<Vec<&'static SidEntry>, regex::Error> {
        let re = regex::Regex::new(pattern)?;
        let mut hits: Vec<_> = self
            .by_sid
            .values()
            .copied()
            .filter(|e| re.is_match(e.path))
            .collect();
        hits.sort_by_key(|e| e.sid);
        Ok(hits)
    }

    /// Validate an outgoing leaf value against the table's metadata.
    ///
    /// Paths the table does not know are accepted unchecked -- the static
    /// table is a subset of what a given firmware may expose.
    pub fn validate(&self, path: &str, value: &YangValue) -> Result<()> {
        let Some(entry) = self.by_path.get(path) else {
            return Ok(());
        };
        let Some(datatype) = entry.datatype else {
            return Ok(());
        };
        datatype.check(value).map_err(|reason| Error::Validation {
            path: path.to_string(),
            reason,
        })
    }

    pub fn len(&self) -> usize {
        self.by_sid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sid.is_empty()
    }
}
