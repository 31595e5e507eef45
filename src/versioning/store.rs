//! Loose-object store and reference plumbing for one repository.
//!
//! Layout under `<worktree>/.eisen/`:
//!
//! ```text
//! format            hash kind of this store ("sha1" or "sha256")
//! HEAD              "ref: refs/heads/<branch>" or a bare commit id
//! refs/heads/<b>    commit id of branch tip
//! objects/xx/yy…    zlib-compressed "<type> <len>\0<content>"
//! index.json        staging index (see the index module)
//! ```
//!
//! Objects are immutable once written; only references move. That property is
//! what lets history streams walk the store without holding the repository
//! lock.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use bstr::ByteSlice;
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};

use crate::versioning::{
    errors::VersioningError,
    hash::{HashKind, ObjectHash},
    object::{ObjectCodec, ObjectKind, blob::Blob, commit::Commit, tree::Tree},
};

/// Name of the store directory inside the working tree.
pub const STORE_DIR: &str = ".eisen";

/// Default branch created by `init`.
pub const DEFAULT_BRANCH: &str = "master";

/// Where HEAD currently points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadRef {
    /// HEAD names a branch (which may be unborn).
    Branch(String),
    /// HEAD holds a bare commit id.
    Detached(ObjectHash),
}

/// Handle to the on-disk store of one repository. Cheap to clone; all state
/// lives on disk.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    kind: HashKind,
}

impl ObjectStore {
    /// True when `workdir` already contains an initialized store.
    pub fn is_initialized(workdir: &Path) -> bool {
        workdir.join(STORE_DIR).join("format").is_file()
    }

    /// Open the store under `workdir`, initializing a fresh one if absent.
    pub fn open_or_init(workdir: &Path) -> Result<ObjectStore, VersioningError> {
        if Self::is_initialized(workdir) {
            Self::open(workdir)
        } else {
            Self::init(workdir, HashKind::default())
        }
    }

    /// Initialize a fresh store with the given hash kind.
    pub fn init(workdir: &Path, kind: HashKind) -> Result<ObjectStore, VersioningError> {
        let root = workdir.join(STORE_DIR);
        let as_io = |e| VersioningError::io("open", root.display().to_string(), e);

        fs::create_dir_all(root.join("objects")).map_err(as_io)?;
        fs::create_dir_all(root.join("refs/heads")).map_err(as_io)?;
        fs::write(root.join("format"), format!("{kind}\n")).map_err(as_io)?;
        fs::write(root.join("HEAD"), format!("ref: refs/heads/{DEFAULT_BRANCH}\n"))
            .map_err(as_io)?;

        tracing::debug!("initialized fresh store at {}", root.display());
        Ok(ObjectStore { root, kind })
    }

    /// Open an existing store, reading its recorded hash kind.
    pub fn open(workdir: &Path) -> Result<ObjectStore, VersioningError> {
        let root = workdir.join(STORE_DIR);
        let format_path = root.join("format");
        let raw = fs::read_to_string(&format_path)
            .map_err(|e| VersioningError::io("open", format_path.display().to_string(), e))?;
        let kind = HashKind::from_str(raw.trim()).map_err(|e| {
            VersioningError::config("open", format_path.display().to_string(), e)
        })?;
        Ok(ObjectStore { root, kind })
    }

    /// Hash kind this store was initialized with.
    pub fn hash_kind(&self) -> HashKind {
        self.kind
    }

    /// The store directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the staging index file.
    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn object_path(&self, id: ObjectHash) -> PathBuf {
        let hex = id.to_string();
        self.root.join("objects").join(&hex[..2]).join(&hex[2..])
    }

    /// Write an object payload, returning its id. Writing an object that
    /// already exists is a no-op (contents are addressed by hash).
    pub fn put_raw(
        &self,
        object_kind: ObjectKind,
        data: &[u8],
    ) -> Result<ObjectHash, VersioningError> {
        let id = ObjectHash::from_kind_and_data(self.kind, object_kind, data);
        let path = self.object_path(id);
        if path.is_file() {
            return Ok(id);
        }

        let as_io = |e| VersioningError::io("object-write", path.display().to_string(), e);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(as_io)?;
        }

        let mut payload = Vec::with_capacity(data.len() + 16);
        payload.extend(object_kind.as_bytes());
        payload.push(b' ');
        payload.extend(data.len().to_string().as_bytes());
        payload.push(b'\x00');
        payload.extend(data);

        let file = fs::File::create(&path).map_err(as_io)?;
        let mut encoder = ZlibEncoder::new(file, Compression::default());
        encoder.write_all(&payload).map_err(as_io)?;
        encoder.finish().map_err(as_io)?;
        Ok(id)
    }

    /// Encode and write a typed object.
    pub fn put<O: ObjectCodec>(&self, object: &O) -> Result<ObjectHash, VersioningError> {
        self.put_raw(object.kind(), &object.to_data()?)
    }

    /// True when the store holds an object with this id.
    pub fn contains(&self, id: ObjectHash) -> bool {
        self.object_path(id).is_file()
    }

    /// Read an object's kind and payload bytes.
    pub fn get_raw(
        &self,
        op: &'static str,
        id: ObjectHash,
    ) -> Result<(ObjectKind, Vec<u8>), VersioningError> {
        let path = self.object_path(id);
        let compressed = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VersioningError::NotFound {
                    op,
                    what: id.to_string(),
                }
            } else {
                VersioningError::io(op, path.display().to_string(), e)
            }
        })?;

        let mut payload = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut payload)
            .map_err(|e| VersioningError::io(op, path.display().to_string(), e))?;

        let nul = payload
            .find_byte(b'\x00')
            .ok_or_else(|| VersioningError::corrupt(op, id.to_string(), "missing header"))?;
        let header = &payload[..nul];
        let space = header
            .find_byte(b' ')
            .ok_or_else(|| VersioningError::corrupt(op, id.to_string(), "malformed header"))?;
        let object_kind = ObjectKind::from_tag(&header[..space])?;
        let declared_len = header[space + 1..]
            .to_str()
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| VersioningError::corrupt(op, id.to_string(), "malformed length"))?;

        let content = payload[nul + 1..].to_vec();
        if content.len() != declared_len {
            return Err(VersioningError::corrupt(
                op,
                id.to_string(),
                "length mismatch",
            ));
        }
        Ok((object_kind, content))
    }

    fn get_typed<O: ObjectCodec>(
        &self,
        op: &'static str,
        id: ObjectHash,
        expected: ObjectKind,
    ) -> Result<O, VersioningError> {
        let (kind, data) = self.get_raw(op, id)?;
        if kind != expected {
            return Err(VersioningError::corrupt(
                op,
                id.to_string(),
                format!("expected {expected}, found {kind}"),
            ));
        }
        O::from_bytes(&data, id)
    }

    /// Read a blob object.
    pub fn get_blob(&self, op: &'static str, id: ObjectHash) -> Result<Blob, VersioningError> {
        self.get_typed(op, id, ObjectKind::Blob)
    }

    /// Read a tree object.
    pub fn get_tree(&self, op: &'static str, id: ObjectHash) -> Result<Tree, VersioningError> {
        self.get_typed(op, id, ObjectKind::Tree)
    }

    /// Read a commit object.
    pub fn get_commit(&self, op: &'static str, id: ObjectHash) -> Result<Commit, VersioningError> {
        self.get_typed(op, id, ObjectKind::Commit)
    }

    /// Where HEAD points right now.
    pub fn head_ref(&self) -> Result<HeadRef, VersioningError> {
        let path = self.root.join("HEAD");
        let raw = fs::read_to_string(&path)
            .map_err(|e| VersioningError::io("head", path.display().to_string(), e))?;
        let trimmed = raw.trim();

        if let Some(name) = trimmed.strip_prefix("ref: refs/heads/") {
            return Ok(HeadRef::Branch(name.to_string()));
        }
        ObjectHash::from_str(trimmed)
            .map(HeadRef::Detached)
            .map_err(|e| VersioningError::corrupt("head", path.display().to_string(), e))
    }

    /// Commit id of a branch tip, or `None` when the branch is unborn.
    pub fn read_branch(&self, branch: &str) -> Result<Option<ObjectHash>, VersioningError> {
        let path = self.root.join("refs/heads").join(branch);
        match fs::read_to_string(&path) {
            Ok(raw) => ObjectHash::from_str(raw.trim())
                .map(Some)
                .map_err(|e| VersioningError::corrupt("head", path.display().to_string(), e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VersioningError::io(
                "head",
                path.display().to_string(),
                e,
            )),
        }
    }

    /// Resolve HEAD to a commit id, or `None` for an unborn repository.
    pub fn head_commit(&self) -> Result<Option<ObjectHash>, VersioningError> {
        match self.head_ref()? {
            HeadRef::Branch(name) => self.read_branch(&name),
            HeadRef::Detached(id) => Ok(Some(id)),
        }
    }

    /// Point HEAD directly at a commit id (detached).
    pub fn set_head_detached(&self, id: ObjectHash) -> Result<(), VersioningError> {
        let path = self.root.join("HEAD");
        fs::write(&path, format!("{id}\n"))
            .map_err(|e| VersioningError::io("commit", path.display().to_string(), e))
    }

    /// Advance a branch tip to `id`.
    pub fn update_branch(&self, branch: &str, id: ObjectHash) -> Result<(), VersioningError> {
        let path = self.root.join("refs/heads").join(branch);
        let as_io = |e| VersioningError::io("commit", path.display().to_string(), e);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(as_io)?;
        }
        fs::write(&path, format!("{id}\n")).map_err(as_io)
    }
}
