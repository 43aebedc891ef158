//! Object identifiers and tree entry types.

use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of an object identifier in bytes.
const OID_LEN: usize = 20;

/// Content address of a tree object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub [u8; OID_LEN]);

impl ObjectId {
    /// Create an ObjectId from raw bytes.
    pub fn new(bytes: [u8; OID_LEN]) -> Self {
        Self(bytes)
    }

    /// The all-zero id.
    pub fn zero() -> Self {
        Self([0; OID_LEN])
    }

    /// Build an id from a slice, if it has the right length.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; OID_LEN]>::try_from(bytes).ok().map(Self)
    }

    /// Raw bytes of the id.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the id as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Error parsing an [`ObjectId`] from hex.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid object id '{input}': expected {} hex characters", OID_LEN * 2)]
pub struct ParseObjectIdError {
    input: String,
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseObjectIdError { input: s.to_string() };
        if s.len() != OID_LEN * 2 || !s.is_ascii() {
            return Err(invalid());
        }

        let mut bytes = [0u8; OID_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

/// Kind of a tree entry, as classified by its file mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Executable file.
    Executable,
    /// Nested tree.
    Tree,
    /// Symbolic link.
    Symlink,
    /// Submodule reference (gitlink).
    Submodule,
    /// Unrecognized mode.
    Unknown(u32),
}

impl EntryKind {
    /// Mode of a regular file.
    pub const MODE_FILE: u32 = 0o100644;
    /// Mode of a group-writable file, written by old git versions.
    pub const MODE_FILE_GROUP_WRITABLE: u32 = 0o100664;
    /// Mode of an executable file.
    pub const MODE_EXECUTABLE: u32 = 0o100755;
    /// Mode of a tree.
    pub const MODE_TREE: u32 = 0o040000;
    /// Mode of a symbolic link.
    pub const MODE_SYMLINK: u32 = 0o120000;
    /// Mode of a submodule commit.
    pub const MODE_SUBMODULE: u32 = 0o160000;

    /// Classify a file mode.
    pub fn from_mode(mode: u32) -> Self {
        match mode {
            Self::MODE_FILE | Self::MODE_FILE_GROUP_WRITABLE => Self::File,
            Self::MODE_EXECUTABLE => Self::Executable,
            Self::MODE_TREE => Self::Tree,
            Self::MODE_SYMLINK => Self::Symlink,
            Self::MODE_SUBMODULE => Self::Submodule,
            other => Self::Unknown(other),
        }
    }

    /// File mode for this kind.
    pub fn mode(&self) -> u32 {
        match self {
            Self::File => Self::MODE_FILE,
            Self::Executable => Self::MODE_EXECUTABLE,
            Self::Tree => Self::MODE_TREE,
            Self::Symlink => Self::MODE_SYMLINK,
            Self::Submodule => Self::MODE_SUBMODULE,
            Self::Unknown(mode) => *mode,
        }
    }

    /// Check if this is a file, plain or executable.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File | Self::Executable)
    }

    /// Check if this is a nested tree.
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }
}

/// One named element of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Entry name (a single path segment).
    pub name: CompactString,
    /// Entry kind.
    pub kind: EntryKind,
    /// Id of the referenced object.
    pub id: ObjectId,
}

impl TreeEntry {
    /// Create a new entry.
    pub fn new(name: impl Into<CompactString>, kind: EntryKind, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            kind,
            id,
        }
    }
}
