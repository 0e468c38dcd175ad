//! Storage capabilities
//!
//! Posts and the stats document are plain text blobs addressed by key.
//! The repository and the stats store only see the [`Storage`] trait, so
//! tests can swap the filesystem for [`MemoryStorage`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Key/value text storage
pub trait Storage: Send + Sync {
    /// All keys currently stored, sorted
    fn list(&self) -> io::Result<Vec<String>>;

    /// Read the blob stored under `key`, `None` if absent
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace (or create) the blob stored under `key`
    fn put(&self, key: &str, contents: &str) -> io::Result<()>;

    /// Create the blob only if `key` is free. Returns `false` when it already exists.
    fn put_new(&self, key: &str, contents: &str) -> io::Result<bool>;
}

/// A directory of `<key>.<extension>` files
pub struct FsStorage {
    dir: PathBuf,
    extension: String,
}

impl FsStorage {
    pub fn new<P: AsRef<Path>>(dir: P, extension: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        if !is_plain_key(key) {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid storage key: {:?}", key),
            ));
        }
        Ok(self.dir.join(format!("{}.{}", key, self.extension)))
    }
}

impl Storage for FsStorage {
    fn list(&self) -> io::Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == self.extension)
                .unwrap_or(false);
            if !matches_ext {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, key: &str, contents: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write next to the target and rename over it so readers never see a partial document
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        tracing::debug!("Wrote {:?}", path);
        Ok(())
    }

    fn put_new(&self, key: &str, contents: &str) -> io::Result<bool> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // The target only appears once fully written; a failed write leaves the key free
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.error),
        }

        tracing::debug!("Created {:?}", path);
        Ok(true)
    }
}

/// In-memory storage, used as a test double and for ephemeral sites
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::new(ErrorKind::Other, "memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn list(&self) -> io::Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, contents: &str) -> io::Result<()> {
        self.lock()?.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn put_new(&self, key: &str, contents: &str) -> io::Result<bool> {
        let mut entries = self.lock()?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), contents.to_string());
        Ok(true)
    }
}

/// Lookup of site assets referenced from post bodies
pub trait AssetStore: Send + Sync {
    /// Whether a site-absolute path such as `/images/a.png` names an existing file
    fn exists(&self, site_path: &str) -> bool;
}

/// Assets served from the public directory
pub struct PublicDir {
    root: PathBuf,
}

impl PublicDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl AssetStore for PublicDir {
    fn exists(&self, site_path: &str) -> bool {
        let relative = Path::new(site_path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return false;
        }
        self.root.join(relative).is_file()
    }
}

/// Keys must be a single file name component
fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\'])
        && !key.contains('\0')
}
