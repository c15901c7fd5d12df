//! Storage abstractions for the template tree and the generated output.
//!
//! [`FsStorage`] works on the real file system, [`MemoryStorage`] keeps a
//! tree in memory. Both implement the two traits, so an in-memory template
//! can be expanded to disk and vice versa.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A direct child of a template directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

/// Read-only access to the template tree.
pub trait TemplateStorage {
    /// Lists the direct children of `path`, sorted by name.
    fn list_dir(&self, path: &Path) -> Result<Vec<Entry>>;

    /// Reads a template file as UTF-8 text.
    fn read_file(&self, path: &Path) -> Result<String>;
}

/// Mutable access to the output tree.
pub trait OutputStorage {
    fn exists(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Whether the directory at `path` has no children.
    fn is_empty_dir(&self, path: &Path) -> Result<bool>;

    /// Creates one directory; its parent must exist.
    fn create_dir(&mut self, path: &Path) -> Result<()>;

    /// Creates or replaces a file; its parent must exist.
    fn write_file(&mut self, path: &Path, content: &str) -> Result<()>;

    fn remove_file(&mut self, path: &Path) -> Result<()>;

    /// Removes an empty directory.
    fn remove_dir(&mut self, path: &Path) -> Result<()>;
}

/// Storage backed by the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateStorage for FsStorage {
    fn list_dir(&self, path: &Path) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for entry in
            WalkDir::new(path).min_depth(1).max_depth(1).follow_links(true).sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::storage(path, e.into()))?;
            let name = entry.file_name().to_str().ok_or_else(|| {
                Error::TemplateError(format!(
                    "file name {:?} is not valid UTF-8",
                    entry.path().display()
                ))
            })?;
            let kind =
                if entry.file_type().is_dir() { EntryKind::Directory } else { EntryKind::File };
            entries.push(Entry { name: name.to_string(), kind });
        }
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::storage(path, e))
    }
}

impl OutputStorage for FsStorage {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_empty_dir(&self, path: &Path) -> Result<bool> {
        let mut children = fs::read_dir(path).map_err(|e| Error::storage(path, e))?;
        Ok(children.next().is_none())
    }

    fn create_dir(&mut self, path: &Path) -> Result<()> {
        fs::create_dir(path).map_err(|e| Error::storage(path, e))
    }

    fn write_file(&mut self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content).map_err(|e| Error::storage(path, e))
    }

    fn remove_file(&mut self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| Error::storage(path, e))
    }

    fn remove_dir(&mut self, path: &Path) -> Result<()> {
        fs::remove_dir(path).map_err(|e| Error::storage(path, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Directory,
    File(String),
}

/// In-memory tree. The empty path is the always-present root.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    nodes: BTreeMap<PathBuf, Node>,
}

fn key(path: &Path) -> PathBuf {
    path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}

fn not_found(path: &Path) -> Error {
    Error::storage(path, io::Error::new(io::ErrorKind::NotFound, "no such file or directory"))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory and any missing ancestors.
    pub fn add_dir<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        let path = key(path.as_ref());
        for ancestor in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            self.nodes.entry(ancestor.to_path_buf()).or_insert(Node::Directory);
        }
        self
    }

    /// Adds a file, creating its parent directories.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, content: &str) -> &mut Self {
        let path = key(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes.insert(path, Node::File(content.to_string()));
        self
    }

    /// Content of the file at `path`, if any.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&str> {
        match self.nodes.get(&key(path.as_ref())) {
            Some(Node::File(content)) => Some(content),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        let path = key(path.as_ref());
        path.as_os_str().is_empty() || matches!(self.nodes.get(&path), Some(Node::Directory))
    }

    /// Every stored file path, in order.
    pub fn files(&self) -> Vec<&Path> {
        self.nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path.as_path())
            .collect()
    }

    /// Every stored directory path, in order.
    pub fn dirs(&self) -> Vec<&Path> {
        self.nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::Directory))
            .map(|(path, _)| path.as_path())
            .collect()
    }

    fn children<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = (&'a PathBuf, &'a Node)> {
        self.nodes.iter().filter(move |(path, _)| path.parent() == Some(dir))
    }

    fn require_parent(&self, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if self.is_dir(parent) => Ok(()),
            _ => Err(not_found(path)),
        }
    }
}

impl TemplateStorage for MemoryStorage {
    fn list_dir(&self, path: &Path) -> Result<Vec<Entry>> {
        let dir = key(path);
        if !self.is_dir(&dir) {
            return Err(not_found(path));
        }
        let mut entries: Vec<Entry> = self
            .children(&dir)
            .filter_map(|(child, node)| {
                let name = child.file_name()?.to_str()?.to_string();
                let kind = match node {
                    Node::Directory => EntryKind::Directory,
                    Node::File(_) => EntryKind::File,
                };
                Some(Entry { name, kind })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        self.file(path).map(str::to_string).ok_or_else(|| not_found(path))
    }
}

impl OutputStorage for MemoryStorage {
    fn exists(&self, path: &Path) -> bool {
        let path = key(path);
        path.as_os_str().is_empty() || self.nodes.contains_key(&path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.file(path).is_some()
    }

    fn is_empty_dir(&self, path: &Path) -> Result<bool> {
        let dir = key(path);
        if !self.is_dir(&dir) {
            return Err(not_found(path));
        }
        let empty = self.children(&dir).next().is_none();
        Ok(empty)
    }

    fn create_dir(&mut self, path: &Path) -> Result<()> {
        let dir = key(path);
        if self.exists(&dir) {
            return Err(Error::storage(
                path,
                io::Error::new(io::ErrorKind::AlreadyExists, "path already exists"),
            ));
        }
        self.require_parent(&dir)?;
        self.nodes.insert(dir, Node::Directory);
        Ok(())
    }

    fn write_file(&mut self, path: &Path, content: &str) -> Result<()> {
        let file = key(path);
        if self.is_dir(&file) {
            return Err(Error::storage(
                path,
                io::Error::new(io::ErrorKind::Other, "path is a directory"),
            ));
        }
        self.require_parent(&file)?;
        self.nodes.insert(file, Node::File(content.to_string()));
        Ok(())
    }

    fn remove_file(&mut self, path: &Path) -> Result<()> {
        match self.nodes.get(&key(path)) {
            Some(Node::File(_)) => {
                self.nodes.remove(&key(path));
                Ok(())
            }
            _ => Err(not_found(path)),
        }
    }

    fn remove_dir(&mut self, path: &Path) -> Result<()> {
        if !self.is_empty_dir(path)? {
            return Err(Error::storage(
                path,
                io::Error::new(io::ErrorKind::Other, "directory not empty"),
            ));
        }
        self.nodes.remove(&key(path));
        Ok(())
    }
}
