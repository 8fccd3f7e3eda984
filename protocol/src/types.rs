//! # Primitive Types
//!
//! Fixed-size byte values that show up on the wire: transaction hashes,
//! digests, and signer addresses. All of them render as `0x`-prefixed
//! lowercase hex, which is what EVM tooling expects to see.
//!
//! Also home to [`quantity`], the serde adapter for hex-encoded integers
//! (`0x0`, `0x2329`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{ADDRESS_LENGTH, HASH_LENGTH};

/// Errors from parsing hex-encoded primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("hex quantity must start with 0x: {0:?}")]
    MissingPrefix(String),

    #[error("hex quantity has leading zero digits: {0:?}")]
    LeadingZero(String),

    #[error("hex quantity is empty")]
    EmptyQuantity,

    #[error("hex quantity overflows 64 bits: {0:?}")]
    Overflow(String),
}

/// Strips an optional `0x`/`0X` prefix.
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decodes `0x`-optional hex into exactly `N` bytes.
fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let bytes =
        hex::decode(strip_hex_prefix(s.trim())).map_err(|e| HexError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(HexError::InvalidLength {
            expected: N,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Byte length of this type.
            pub const LEN: usize = $len;

            /// Wraps raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Borrows the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            /// Parses hex with or without the `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, HexError> {
                decode_fixed::<$len>(s).map(Self)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = HexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// A 32-byte canonical transaction hash.
    TxHash,
    HASH_LENGTH
);

fixed_bytes!(
    /// The 32-byte keccak digest that every signer signs.
    Digest,
    HASH_LENGTH
);

fixed_bytes!(
    /// A 20-byte Ethereum-style signer address.
    Address,
    ADDRESS_LENGTH
);

// ---------------------------------------------------------------------------
// Hex quantities
// ---------------------------------------------------------------------------

/// Serde adapter for `u64` values encoded as EVM JSON-RPC hex quantities.
///
/// Encoding is the shortest form (`0x0`, `0x1f`). Decoding is strict: the
/// `0x` prefix is required and leading zero digits are rejected, so a parsed
/// value always re-encodes to the exact same string.
pub mod quantity {
    use super::HexError;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Encodes `value` as `0x`-prefixed lowercase hex without padding.
    pub fn encode(value: u64) -> String {
        format!("{:#x}", value)
    }

    /// Decodes a strict hex quantity.
    pub fn decode(s: &str) -> Result<u64, HexError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| HexError::MissingPrefix(s.to_string()))?;
        if digits.is_empty() {
            return Err(HexError::EmptyQuantity);
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HexError::InvalidHex(s.to_string()));
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(HexError::LeadingZero(s.to_string()));
        }
        if digits.len() > 16 {
            return Err(HexError::Overflow(s.to_string()));
        }
        u64::from_str_radix(digits, 16).map_err(|e| HexError::InvalidHex(e.to_string()))
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_hash_hex_accepts_optional_prefix() {
        let with = TxHash::from_hex(&format!("0x{}", "ab".repeat(32))).unwrap();
        let without = TxHash::from_hex(&"ab".repeat(32)).unwrap();
        assert_eq!(with, without);
        assert_eq!(with.to_hex(), format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn address_rejects_wrong_length() {
        let err = Address::from_hex("0x1234").unwrap_err();
        assert_eq!(
            err,
            HexError::InvalidLength {
                expected: 20,
                got: 2
            }
        );
    }

    #[test]
    fn digest_rejects_non_hex() {
        assert!(matches!(
            Digest::from_hex(&"zz".repeat(32)),
            Err(HexError::InvalidHex(_))
        ));
    }

    #[test]
    fn quantity_encoding_is_minimal() {
        assert_eq!(quantity::encode(0), "0x0");
        assert_eq!(quantity::encode(9001), "0x2329");
        assert_eq!(quantity::encode(u64::MAX), "0xffffffffffffffff");
    }

    #[test]
    fn quantity_decoding_is_strict() {
        assert_eq!(quantity::decode("0x0").unwrap(), 0);
        assert_eq!(quantity::decode("0x2329").unwrap(), 9001);
        assert!(matches!(quantity::decode("2329"), Err(HexError::MissingPrefix(_))));
        assert!(matches!(quantity::decode("0x"), Err(HexError::EmptyQuantity)));
        assert!(matches!(quantity::decode("0x01"), Err(HexError::LeadingZero(_))));
        assert!(matches!(
            quantity::decode("0x10000000000000000"),
            Err(HexError::Overflow(_))
        ));
    }

    #[test]
    fn serde_uses_prefixed_hex() {
        let addr = Address::new([0x11; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
