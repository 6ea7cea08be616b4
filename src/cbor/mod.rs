//! CBOR codec with YANG extensions (RFC 8949 + RFC 9254).
//!
//! Values are modelled as [`YangValue`], a CBOR data model extended with the
//! YANG tags: 44 (bits), 45 (enumeration), 46 (identityref), 47
//! (instance-identifier), 256 (SID), 257 (delta-SID). Emission is canonical:
//! integers take their minimum-length form (ciborium's own behaviour) and map
//! keys are sorted byte-wise by their encoded form. Map keys that name a
//! known YANG path are replaced by tag 256 around the numeric SID; decoding
//! resolves them back, falling back to an opaque `SID:<n>` key.

mod codec;
mod value;

pub use codec::{decode, decode_value, encode, encode_value};
pub use value::YangValue;

/// YANG CBOR tag numbers (RFC 9254).
pub mod tag {
    pub const BITS: u64 = 44;
    pub const ENUMERATION: u64 = 45;
    pub const IDENTITYREF: u64 = 46;
    pub const INSTANCE_IDENTIFIER: u64 = 47;
    pub const SID: u64 = 256;
    pub const DELTA_SID: u64 = 257;
}
