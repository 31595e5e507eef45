//! Object model for the embedded content-addressed store: blobs, trees, commits,
//! and the signature lines inside commits, plus the codec trait that lets the
//! store create strongly typed values from raw bytes.

pub mod blob;
pub mod commit;
pub mod signature;
pub mod tree;

use std::fmt::Display;

use crate::versioning::{
    errors::VersioningError,
    hash::{HashKind, ObjectHash},
};

/// Kinds of objects the store can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    /// The on-disk type tag used in loose-object headers.
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            ObjectKind::Blob => b"blob",
            ObjectKind::Tree => b"tree",
            ObjectKind::Commit => b"commit",
        }
    }

    /// Parse a loose-object type tag.
    pub fn from_tag(tag: &[u8]) -> Result<Self, VersioningError> {
        match tag {
            b"blob" => Ok(ObjectKind::Blob),
            b"tree" => Ok(ObjectKind::Tree),
            b"commit" => Ok(ObjectKind::Commit),
            other => Err(VersioningError::corrupt(
                "decode",
                String::from_utf8_lossy(other),
                "unknown object type tag",
            )),
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        })
    }
}

/// Common interface for all store object types.
///
/// Implementations decode from the payload bytes of a loose object (header
/// already stripped) and encode back to the exact payload that was hashed.
pub trait ObjectCodec: Sized {
    /// Decode an object from its payload bytes, trusting `id` as its identity.
    fn from_bytes(data: &[u8], id: ObjectHash) -> Result<Self, VersioningError>;

    /// The kind tag written into the loose-object header.
    fn kind(&self) -> ObjectKind;

    /// Encode the object back to its payload bytes.
    fn to_data(&self) -> Result<Vec<u8>, VersioningError>;

    /// Compute the object id this payload would receive in a store of the
    /// given hash kind.
    fn compute_id(&self, hash_kind: HashKind) -> Result<ObjectHash, VersioningError> {
        let data = self.to_data()?;
        Ok(ObjectHash::from_kind_and_data(hash_kind, self.kind(), &data))
    }
}
