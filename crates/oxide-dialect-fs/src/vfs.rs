//! Read-only source trees.
//!
//! Migration scripts are discovered through [`SourceFs`], a minimal
//! directory-listing plus file-read abstraction. Paths are slash-separated
//! and relative to the tree root, with `.` naming the root itself. A missing
//! path is always reported as [`io::ErrorKind::NotFound`].
//!
//! - [`DirFs`] - a directory on disk
//! - [`MemFs`] - an in-memory tree, also used for resolved layers
//! - [`SubFs`] - a borrowed view of a subdirectory of another tree

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::ops::Bound;
use std::path::{Path, PathBuf};

/// Path of the root directory of a source tree.
pub const ROOT: &str = ".";

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Anything that is not a directory.
    File,
    /// A directory.
    Dir,
}

/// A single entry returned by [`SourceFs::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (no slashes).
    pub name: String,
    /// Entry kind.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Creates a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    /// Creates a directory entry.
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Dir,
        }
    }

    /// Returns whether this entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// A hierarchical, read-only file tree.
pub trait SourceFs: fmt::Debug + Send + Sync {
    /// Lists a directory, sorted by entry name.
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>>;

    /// Reads the full contents of a file.
    fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Normalizes a relative path: strips `./` prefixes and surrounding slashes.
pub(crate) fn clean(path: &str) -> &str {
    let trimmed = path.trim_start_matches("./").trim_matches('/');
    if trimmed.is_empty() {
        ROOT
    } else {
        trimmed
    }
}

/// Joins a directory and a child name.
pub(crate) fn join(dir: &str, name: &str) -> String {
    match clean(dir) {
        ROOT => clean(name).to_string(),
        dir => format!("{dir}/{}", clean(name)),
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{path}: not found"))
}

// =============================================================================
// DirFs
// =============================================================================

/// A source tree backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    /// Creates a tree rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the on-disk root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match clean(path) {
            ROOT => self.root.clone(),
            rel => self.root.join(rel),
        }
    }
}

impl SourceFs for DirFs {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Symlinks are listed as files and never descended into.
            if entry.file_type()?.is_dir() {
                entries.push(DirEntry::dir(name));
            } else {
                entries.push(DirEntry::file(name));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }
}

// =============================================================================
// MemFs
// =============================================================================

/// An in-memory source tree. Directories are implied by file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemFs {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemFs {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, returning the previous contents if the path existed.
    pub fn insert(
        &mut self,
        path: impl AsRef<str>,
        data: impl Into<Vec<u8>>,
    ) -> Option<Vec<u8>> {
        self.files.insert(clean(path.as_ref()).to_string(), data.into())
    }

    /// Adds a file (builder style).
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<str>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    /// Returns the contents of a file.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(clean(path)).map(Vec::as_slice)
    }

    /// Returns all file paths in lexical order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Returns all files in lexical path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether the tree holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceFs for MemFs {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let dir = clean(path);
        if self.files.contains_key(dir) {
            return Err(io::Error::other(format!("{dir}: not a directory")));
        }
        let prefix = if dir == ROOT {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut entries: Vec<DirEntry> = Vec::new();
        let mut found = dir == ROOT;
        // Keys sharing a prefix are contiguous in a BTreeMap.
        let range = self
            .files
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded));
        for (key, _) in range {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            found = true;
            match rest.split_once('/') {
                Some((child, _)) => {
                    let seen = entries
                        .last()
                        .is_some_and(|last| last.is_dir() && last.name == child);
                    if !seen {
                        entries.push(DirEntry::dir(child));
                    }
                }
                None => entries.push(DirEntry::file(rest)),
            }
        }

        if !found {
            return Err(not_found(dir));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let path = clean(path);
        self.files.get(path).cloned().ok_or_else(|| not_found(path))
    }
}

impl<K, V> FromIterator<(K, V)> for MemFs
where
    K: AsRef<str>,
    V: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fs = Self::new();
        for (path, data) in iter {
            fs.insert(path, data);
        }
        fs
    }
}

// =============================================================================
// SubFs
// =============================================================================

/// A view of a subdirectory of another source tree.
#[derive(Debug, Clone)]
pub struct SubFs<'a> {
    parent: &'a dyn SourceFs,
    dir: String,
}

impl SubFs<'_> {
    /// Returns the directory this view is rooted at, relative to its parent.
    #[must_use]
    pub fn dir(&self) -> &str {
        &self.dir
    }
}

impl SourceFs for SubFs<'_> {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        self.parent.read_dir(&join(&self.dir, path))
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.parent.read_file(&join(&self.dir, path))
    }
}

fn is_listed_as_file(fsys: &dyn SourceFs, path: &str) -> bool {
    let (parent, name) = path.rsplit_once('/').unwrap_or((ROOT, path));
    fsys.read_dir(parent)
        .is_ok_and(|entries| entries.iter().any(|e| e.name == name && !e.is_dir()))
}

/// Opens a subdirectory view.
///
/// Returns `Ok(None)` when the directory does not exist or when the name
/// belongs to a file; any other error is propagated. The directory itself
/// may be a symlink.
pub fn open_sub<'a>(fsys: &'a dyn SourceFs, dir: &str) -> io::Result<Option<SubFs<'a>>> {
    let dir = clean(dir);
    if dir == ROOT {
        return Ok(None);
    }
    match fsys.read_dir(dir) {
        Ok(_) => Ok(Some(SubFs {
            parent: fsys,
            dir: dir.to_string(),
        })),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(_) if is_listed_as_file(fsys, dir) => Ok(None),
        Err(err) => Err(err),
    }
}
