//! The commit object records one version of the working tree: the tree it
//! points at, the parent commits it follows, who made it and when, and the
//! message describing the change. Chained through their parent ids, commits
//! carry the entire history of a repository.
//!
//! Wire form:
//!
//! ```text
//! tree <hex>
//! parent <hex>          (zero or more)
//! author <signature>
//! committer <signature>
//!
//! <message>
//! ```

use std::{fmt::Display, str::FromStr};

use bstr::ByteSlice;

use crate::versioning::{
    errors::VersioningError,
    hash::ObjectHash,
    object::{ObjectCodec, ObjectKind, signature::Signature},
};

/// A snapshot of the working tree with its ancestry and authorship.
#[derive(Eq, Debug, Clone)]
pub struct Commit {
    pub id: ObjectHash,
    pub tree_id: ObjectHash,
    pub parent_ids: Vec<ObjectHash>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "tree: {}", self.tree_id)?;
        for parent in self.parent_ids.iter() {
            writeln!(f, "parent: {parent}")?;
        }
        writeln!(f, "author {}", self.author)?;
        writeln!(f, "committer {}", self.committer)?;
        writeln!(f, "{}", self.message)
    }
}

impl Commit {
    /// Assemble a commit; the id is left zeroed until the store hashes it.
    pub fn new(
        author: Signature,
        committer: Signature,
        tree_id: ObjectHash,
        parent_ids: Vec<ObjectHash>,
        message: &str,
    ) -> Commit {
        Commit {
            id: ObjectHash::default(),
            tree_id,
            parent_ids,
            author,
            committer,
            message: message.to_string(),
        }
    }

    /// The first non-empty line of the message, or the whole message when
    /// every line is blank.
    pub fn summary(&self) -> String {
        self.message
            .lines()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.to_owned())
            .unwrap_or_else(|| self.message.clone())
    }
}

fn parse_id_line(
    line: &[u8],
    prefix: &str,
    commit_id: ObjectHash,
) -> Result<ObjectHash, VersioningError> {
    let hex = line[prefix.len()..].to_str().map_err(|_| {
        VersioningError::corrupt("decode", commit_id.to_string(), "non-UTF-8 id line")
    })?;
    ObjectHash::from_str(hex.trim())
        .map_err(|e| VersioningError::corrupt("decode", commit_id.to_string(), e))
}

impl ObjectCodec for Commit {
    fn from_bytes(data: &[u8], id: ObjectHash) -> Result<Self, VersioningError> {
        let corrupt =
            |reason: &str| VersioningError::corrupt("decode", id.to_string(), reason);

        let mut lines = data.split_str("\n");

        let tree_line = lines.next().ok_or_else(|| corrupt("empty commit payload"))?;
        if !tree_line.starts_with(b"tree ") {
            return Err(corrupt("missing tree line"));
        }
        let tree_id = parse_id_line(tree_line, "tree ", id)?;

        let mut parent_ids = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut header_len = tree_line.len() + 1;

        for line in lines {
            header_len += line.len() + 1;
            if let Some(rest) = line.strip_prefix(b"parent ") {
                let hex = rest.to_str().map_err(|_| corrupt("non-UTF-8 parent line"))?;
                parent_ids.push(
                    ObjectHash::from_str(hex.trim())
                        .map_err(|e| VersioningError::corrupt("decode", id.to_string(), e))?,
                );
            } else if let Some(rest) = line.strip_prefix(b"author ") {
                author = Some(Signature::from_line(rest)?);
            } else if let Some(rest) = line.strip_prefix(b"committer ") {
                committer = Some(Signature::from_line(rest)?);
            } else if line.is_empty() {
                // Blank separator: the rest of the payload is the message.
                break;
            } else {
                return Err(corrupt("unknown commit header line"));
            }
        }

        let message = data
            .get(header_len..)
            .map(|rest| String::from_utf8_lossy(rest).to_string())
            .unwrap_or_default();

        Ok(Commit {
            id,
            tree_id,
            parent_ids,
            author: author.ok_or_else(|| corrupt("missing author line"))?,
            committer: committer.ok_or_else(|| corrupt("missing committer line"))?,
            message,
        })
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Commit
    }

    fn to_data(&self) -> Result<Vec<u8>, VersioningError> {
        let mut data = Vec::new();

        data.extend(b"tree ");
        data.extend(self.tree_id.to_string().as_bytes());
        data.extend(&[0x0a]);

        for parent_id in &self.parent_ids {
            data.extend(b"parent ");
            data.extend(parent_id.to_string().as_bytes());
            data.extend(&[0x0a]);
        }

        data.extend(b"author ");
        data.extend(self.author.to_data());
        data.extend(&[0x0a]);
        data.extend(b"committer ");
        data.extend(self.committer.to_data());
        data.extend(&[0x0a]);
        data.extend(&[0x0a]);
        data.extend(self.message.as_bytes());

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::hash::HashKind;

    fn sample_commit() -> Commit {
        Commit::new(
            Signature::from_line(b"Test <test@example.com> 1757467768 +0000").unwrap(),
            Signature::from_line(b"Test <test@example.com> 1757467768 +0000").unwrap(),
            ObjectHash::digest(HashKind::Sha1, b"tree"),
            vec![],
            "init board\n\nseed columns and rules\n",
        )
    }

    /// Encoding and decoding preserves every field.
    #[test]
    fn test_round_trip() {
        let commit = sample_commit();
        let id = commit.compute_id(HashKind::Sha1).unwrap();
        let decoded = Commit::from_bytes(&commit.to_data().unwrap(), id).unwrap();

        assert_eq!(decoded.tree_id, commit.tree_id);
        assert_eq!(decoded.parent_ids, commit.parent_ids);
        assert_eq!(decoded.author.name, "Test");
        assert_eq!(decoded.author.email, "test@example.com");
        assert_eq!(decoded.message, commit.message);
    }

    /// Parent lines decode in order.
    #[test]
    fn test_parents() {
        let mut commit = sample_commit();
        commit.parent_ids = vec![
            ObjectHash::digest(HashKind::Sha1, b"p1"),
            ObjectHash::digest(HashKind::Sha1, b"p2"),
        ];
        let id = commit.compute_id(HashKind::Sha1).unwrap();
        let decoded = Commit::from_bytes(&commit.to_data().unwrap(), id).unwrap();
        assert_eq!(decoded.parent_ids.len(), 2);
        assert_eq!(decoded.parent_ids, commit.parent_ids);
    }

    /// The summary is the first non-empty message line.
    #[test]
    fn test_summary() {
        let commit = sample_commit();
        assert_eq!(commit.summary(), "init board");
    }

    /// A payload without a tree line is corrupt.
    #[test]
    fn test_missing_tree() {
        let id = ObjectHash::digest(HashKind::Sha1, b"x");
        assert!(Commit::from_bytes(b"author T <t@e> 0 +0000\n\nmsg", id).is_err());
    }

    /// A payload without an author line is corrupt.
    #[test]
    fn test_missing_author() {
        let commit = sample_commit();
        let data = commit.to_data().unwrap();
        let text = String::from_utf8(data).unwrap();
        let broken = text.replace("author ", "auth0r ");
        let id = ObjectHash::digest(HashKind::Sha1, b"x");
        assert!(Commit::from_bytes(broken.as_bytes(), id).is_err());
    }
}
