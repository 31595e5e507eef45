//! The blob object holds raw file content. It is the leaf of the object graph:
//! trees name blobs, commits name trees. The payload is stored verbatim; the
//! store does not interpret or re-encode file contents.

use std::fmt::Display;

use crate::versioning::{
    errors::VersioningError,
    hash::ObjectHash,
    object::{ObjectCodec, ObjectKind},
};

/// File content addressed by its hash.
#[derive(Eq, Debug, Clone)]
pub struct Blob {
    pub id: ObjectHash,
    pub data: Vec<u8>,
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "blob {} ({} bytes)", self.id, self.data.len())
    }
}

impl ObjectCodec for Blob {
    fn from_bytes(data: &[u8], id: ObjectHash) -> Result<Self, VersioningError> {
        Ok(Blob {
            id,
            data: data.to_vec(),
        })
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Blob
    }

    fn to_data(&self) -> Result<Vec<u8>, VersioningError> {
        Ok(self.data.clone())
    }
}
