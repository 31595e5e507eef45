//! Content-hash utilities for store objects with selectable algorithms (SHA-1 and SHA-256).
//! The hash kind is a property of the store that owns the objects; every function here
//! takes it explicitly so repositories with different formats can coexist in one process.

use std::{fmt::Display, io, str::FromStr};

use serde::{Deserialize, Serialize};
use sha1::Digest;

use crate::versioning::object::ObjectKind;

/// Supported hash algorithms for object ids (selector only, no data attached).
/// A store records its kind at initialization and keeps it for its lifetime.
/// Defaults to SHA-1.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
pub enum HashKind {
    #[default]
    Sha1,
    Sha256,
}

impl HashKind {
    /// Byte length of the hash output.
    pub const fn size(&self) -> usize {
        match self {
            HashKind::Sha1 => 20,
            HashKind::Sha256 => 32,
        }
    }

    /// Hex string length of the hash output.
    pub const fn hex_len(&self) -> usize {
        match self {
            HashKind::Sha1 => 40,
            HashKind::Sha256 => 64,
        }
    }

    /// Lowercase name of the hash algorithm.
    pub const fn as_str(&self) -> &'static str {
        match self {
            HashKind::Sha1 => "sha1",
            HashKind::Sha256 => "sha256",
        }
    }
}

impl Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashKind::Sha1),
            "sha256" => Ok(HashKind::Sha256),
            _ => Err("Invalid hash kind".to_string()),
        }
    }
}

/// Concrete object id carrying the bytes for the selected algorithm (SHA-1 or SHA-256).
/// Supports conversion to/from hex strings, byte slices, and stream reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum ObjectHash {
    Sha1([u8; 20]),
    Sha256([u8; 32]),
}

impl Default for ObjectHash {
    fn default() -> Self {
        ObjectHash::Sha1([0u8; 20])
    }
}

impl Display for ObjectHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.as_ref()))
    }
}

impl AsRef<[u8]> for ObjectHash {
    fn as_ref(&self) -> &[u8] {
        match self {
            ObjectHash::Sha1(bytes) => bytes.as_slice(),
            ObjectHash::Sha256(bytes) => bytes.as_slice(),
        }
    }
}

/// Parse hex (40 for SHA-1, 64 for SHA-256) into `ObjectHash`.
impl FromStr for ObjectHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.len() {
            40 => {
                let mut h = [0u8; 20];
                let bytes = hex::decode(s).map_err(|e| e.to_string())?;
                h.copy_from_slice(bytes.as_slice());
                Ok(ObjectHash::Sha1(h))
            }
            64 => {
                let mut h = [0u8; 32];
                let bytes = hex::decode(s).map_err(|e| e.to_string())?;
                h.copy_from_slice(bytes.as_slice());
                Ok(ObjectHash::Sha256(h))
            }
            _ => Err("Invalid hash length".to_string()),
        }
    }
}

impl ObjectHash {
    /// Zero-filled hex string for a given hash kind.
    pub fn zero_str(kind: HashKind) -> String {
        "0".repeat(kind.hex_len())
    }

    /// Return the hash kind for this value.
    pub fn kind(&self) -> HashKind {
        match self {
            ObjectHash::Sha1(_) => HashKind::Sha1,
            ObjectHash::Sha256(_) => HashKind::Sha256,
        }
    }

    /// Return the hash size in bytes.
    pub fn size(&self) -> usize {
        self.kind().size()
    }

    /// Compute the hash of raw data with the given algorithm.
    pub fn digest(kind: HashKind, data: &[u8]) -> ObjectHash {
        match kind {
            HashKind::Sha1 => {
                let h = sha1::Sha1::digest(data);
                let mut bytes = [0u8; 20];
                bytes.copy_from_slice(h.as_ref());
                ObjectHash::Sha1(bytes)
            }
            HashKind::Sha256 => {
                let h = sha2::Sha256::digest(data);
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(h.as_ref());
                ObjectHash::Sha256(bytes)
            }
        }
    }

    /// Compute an object id from its kind and payload, using the loose-object
    /// header convention `"<type> <len>\0<content>"`.
    pub fn from_kind_and_data(kind: HashKind, object_kind: ObjectKind, data: &[u8]) -> ObjectHash {
        let mut d: Vec<u8> = Vec::with_capacity(data.len() + 16);
        d.extend(object_kind.as_bytes());
        d.push(b' ');
        d.extend(data.len().to_string().as_bytes());
        d.push(b'\x00');
        d.extend(data);
        ObjectHash::digest(kind, &d)
    }

    /// Create `ObjectHash` from raw bytes matching the given hash size.
    pub fn from_bytes(kind: HashKind, bytes: &[u8]) -> Result<ObjectHash, String> {
        if bytes.len() != kind.size() {
            return Err(format!(
                "Invalid byte length: got {}, expected {}",
                bytes.len(),
                kind.size()
            ));
        }

        match kind {
            HashKind::Sha1 => {
                let mut h = [0u8; 20];
                h.copy_from_slice(bytes);
                Ok(ObjectHash::Sha1(h))
            }
            HashKind::Sha256 => {
                let mut h = [0u8; 32];
                h.copy_from_slice(bytes);
                Ok(ObjectHash::Sha256(h))
            }
        }
    }

    /// Read hash bytes from a stream according to the given hash size.
    pub fn from_stream(kind: HashKind, data: &mut impl io::Read) -> io::Result<ObjectHash> {
        match kind {
            HashKind::Sha1 => {
                let mut h = [0u8; 20];
                data.read_exact(&mut h)?;
                Ok(ObjectHash::Sha1(h))
            }
            HashKind::Sha256 => {
                let mut h = [0u8; 32];
                data.read_exact(&mut h)?;
                Ok(ObjectHash::Sha256(h))
            }
        }
    }

    /// Abbreviated hex form used in diff headers and log lines.
    pub fn short_str(&self) -> String {
        let hex = self.to_string();
        hex[..7.min(hex.len())].to_string()
    }

    /// Return raw bytes of the hash.
    pub fn to_data(self) -> Vec<u8> {
        self.as_ref().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{HashKind, ObjectHash};

    /// Hashing "Hello, world!" with SHA-1 should match the known value.
    #[test]
    fn test_sha1_digest() {
        let data = "Hello, world!".as_bytes();
        let sha1 = ObjectHash::digest(HashKind::Sha1, data);
        assert_eq!(sha1.to_string(), "943a702d06f34599aee1f8da8ef9f7296031d699");
    }

    /// Hashing "Hello, world!" with SHA-256 should match the known value.
    #[test]
    fn test_sha256_digest() {
        let data = "Hello, world!".as_bytes();
        let sha256 = ObjectHash::digest(HashKind::Sha256, data);
        assert_eq!(
            sha256.to_string(),
            "315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3"
        );
    }

    /// Construct SHA-1 from raw bytes.
    #[test]
    fn test_sha1_from_bytes() {
        let sha1 = ObjectHash::from_bytes(
            HashKind::Sha1,
            &[
                0x8a, 0xb6, 0x86, 0xea, 0xfe, 0xb1, 0xf4, 0x47, 0x02, 0x73, 0x8c, 0x8b, 0x0f, 0x24,
                0xf2, 0x56, 0x7c, 0x36, 0xda, 0x6d,
            ],
        )
        .unwrap();

        assert_eq!(sha1.to_string(), "8ab686eafeb1f44702738c8b0f24f2567c36da6d");
    }

    /// Byte length mismatches are rejected rather than truncated.
    #[test]
    fn test_from_bytes_wrong_length() {
        assert!(ObjectHash::from_bytes(HashKind::Sha256, &[0u8; 20]).is_err());
        assert!(ObjectHash::from_bytes(HashKind::Sha1, &[0u8; 32]).is_err());
    }

    /// Read hash from a stream for both kinds.
    #[test]
    fn test_from_stream() {
        let source = [
            0x8a, 0xb6, 0x86, 0xea, 0xfe, 0xb1, 0xf4, 0x47, 0x02, 0x73, 0x8c, 0x8b, 0x0f, 0x24,
            0xf2, 0x56, 0x7c, 0x36, 0xda, 0x6d,
        ];
        let mut reader = std::io::Cursor::new(source);
        let sha1 = ObjectHash::from_stream(HashKind::Sha1, &mut reader).unwrap();
        assert_eq!(sha1.to_string(), "8ab686eafeb1f44702738c8b0f24f2567c36da6d");
    }

    /// Parse and round-trip a SHA-256 hex string.
    #[test]
    fn test_sha256_from_str() {
        let hash_str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        let hash = ObjectHash::from_str(hash_str).unwrap();
        assert_eq!(hash.kind(), HashKind::Sha256);
        assert_eq!(hash.to_string(), hash_str);
    }

    /// Hex strings of the wrong width are rejected.
    #[test]
    fn test_from_str_invalid_length() {
        assert!(ObjectHash::from_str("abc123").is_err());
    }

    /// Short form is the first seven hex digits.
    #[test]
    fn test_short_str() {
        let hash = ObjectHash::from_str("8ab686eafeb1f44702738c8b0f24f2567c36da6d").unwrap();
        assert_eq!(hash.short_str(), "8ab686e");
    }

    /// Zero string width follows the hash kind.
    #[test]
    fn test_zero_str() {
        assert_eq!(ObjectHash::zero_str(HashKind::Sha1).len(), 40);
        assert_eq!(ObjectHash::zero_str(HashKind::Sha256).len(), 64);
    }
}
