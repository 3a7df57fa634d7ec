//! Named text buffers and the active-file pointer.

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::fmt;

new_key_type! { pub struct FileId; }

pub const DEFAULT_EXTENSION: &str = ".py";
pub const DEFAULT_FILE_NAME: &str = "main.py";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStoreError {
    DuplicateName(String),
    NotFound(String),
    LastFile,
    EmptyName,
}

impl fmt::Display for FileStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStoreError::DuplicateName(name) => write!(f, "file already exists: {}", name),
            FileStoreError::NotFound(name) => write!(f, "file not found: {}", name),
            FileStoreError::LastFile => write!(f, "cannot close the last file"),
            FileStoreError::EmptyName => write!(f, "file name is empty"),
        }
    }
}

impl std::error::Error for FileStoreError {}

pub type Result<T> = std::result::Result<T, FileStoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    name: CompactString,
    content: String,
    dirty: bool,
}

impl File {
    fn new(name: CompactString, content: String) -> Self {
        Self {
            name,
            content,
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content changed since the file was created, imported or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Appends the default extension when `name` has none of its own.
pub fn normalize_name(name: &str) -> Option<CompactString> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    if name.ends_with(DEFAULT_EXTENSION) {
        return Some(CompactString::from(name));
    }
    let mut normalized = CompactString::from(name);
    normalized.push_str(DEFAULT_EXTENSION);
    Some(normalized)
}

/// Insertion-ordered arena of files keyed by name.
///
/// Never empty; `active` always points at a live entry.
#[derive(Debug, Clone)]
pub struct FileStore {
    files: SlotMap<FileId, File>,
    by_name: FxHashMap<CompactString, FileId>,
    order: Vec<FileId>,
    active: FileId,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    pub fn new() -> Self {
        Self::with_file(DEFAULT_FILE_NAME, String::new())
    }

    pub fn with_file(name: &str, content: String) -> Self {
        let name = CompactString::from(name);
        let mut files = SlotMap::with_key();
        let id = files.insert(File::new(name.clone(), content));
        let mut by_name = FxHashMap::default();
        by_name.insert(name, id);
        Self {
            files,
            by_name,
            order: vec![id],
            active: id,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn id_of(&self, name: &str) -> Option<FileId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&File> {
        self.id_of(name).and_then(|id| self.files.get(id))
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.files.get(id)
    }

    pub fn active_id(&self) -> FileId {
        self.active
    }

    pub fn active(&self) -> &File {
        &self.files[self.active]
    }

    pub fn active_name(&self) -> &str {
        self.active().name()
    }

    pub fn iter(&self) -> impl Iterator<Item = &File> + '_ {
        self.order.iter().filter_map(|id| self.files.get(*id))
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn snapshot_all(&self) -> Vec<File> {
        self.iter().cloned().collect()
    }

    pub fn create(&mut self, name: &str) -> Result<FileId> {
        let name = normalize_name(name).ok_or(FileStoreError::EmptyName)?;
        if self.by_name.contains_key(&name) {
            return Err(FileStoreError::DuplicateName(name.to_string()));
        }
        let id = self.files.insert(File::new(name.clone(), String::new()));
        self.by_name.insert(name, id);
        self.order.push(id);
        tracing::debug!(file = %self.files[id].name, "file created");
        Ok(id)
    }

    /// Writes the caller's edit buffer into the active file.
    pub fn flush(&mut self, buffer: &str) -> bool {
        let file = &mut self.files[self.active];
        if file.content == buffer {
            return false;
        }
        file.content.clear();
        file.content.push_str(buffer);
        file.dirty = true;
        true
    }

    /// Flushes `buffer` into the current file, then activates `name`.
    pub fn switch_to(&mut self, name: &str, buffer: &str) -> Result<FileId> {
        let target = self
            .id_of(name)
            .ok_or_else(|| FileStoreError::NotFound(name.to_string()))?;
        self.flush(buffer);
        self.active = target;
        Ok(target)
    }

    pub fn close(&mut self, name: &str) -> Result<()> {
        let id = self
            .id_of(name)
            .ok_or_else(|| FileStoreError::NotFound(name.to_string()))?;
        if self.order.len() <= 1 {
            return Err(FileStoreError::LastFile);
        }

        self.order.retain(|other| *other != id);
        if let Some(file) = self.files.remove(id) {
            self.by_name.remove(&file.name);
        }
        if self.active == id {
            self.active = self.order[0];
        }
        tracing::debug!(file = name, active = %self.active_name(), "file closed");
        Ok(())
    }

    /// Renames in place; tab position and content are kept.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let to = to.trim();
        if to.is_empty() {
            return Err(FileStoreError::EmptyName);
        }
        let id = self
            .id_of(from)
            .ok_or_else(|| FileStoreError::NotFound(from.to_string()))?;
        if from == to {
            return Ok(());
        }
        if self.by_name.contains_key(to) {
            return Err(FileStoreError::DuplicateName(to.to_string()));
        }

        let to = CompactString::from(to);
        let file = &mut self.files[id];
        let old = std::mem::replace(&mut file.name, to.clone());
        self.by_name.remove(&old);
        self.by_name.insert(to, id);
        Ok(())
    }

    /// Inserts a new file or silently overwrites an existing one.
    pub fn import_content(&mut self, name: &str, content: String) -> Result<FileId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FileStoreError::EmptyName);
        }
        if let Some(id) = self.id_of(name) {
            let file = &mut self.files[id];
            file.content = content;
            file.dirty = false;
            return Ok(id);
        }

        let name = CompactString::from(name);
        let id = self.files.insert(File::new(name.clone(), content));
        self.by_name.insert(name, id);
        self.order.push(id);
        Ok(id)
    }

    /// Replaces the active file's content wholesale (format, replace-all).
    pub fn set_active_content(&mut self, content: String) -> bool {
        let file = &mut self.files[self.active];
        if file.content == content {
            return false;
        }
        file.content = content;
        file.dirty = true;
        true
    }

    pub fn mark_saved(&mut self, name: &str) -> bool {
        let Some(id) = self.id_of(name) else {
            return false;
        };
        let file = &mut self.files[id];
        let was_dirty = file.dirty;
        file.dirty = false;
        was_dirty
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/files.rs"]
mod tests;
