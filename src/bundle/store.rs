//! Content stores holding artifact bodies.

use crate::error::{ExforgeError, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Read contract for artifact bodies.
///
/// `Ok(None)` means the reference does not exist; `Err` means it exists (or
/// may exist) but could not be read.
pub trait ContentStore: Send + Sync {
    fn read(&self, reference: &str) -> Result<Option<String>>;
}

/// Artifacts stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference under the root, rejecting anything that escapes it.
    fn path_for(&self, reference: &str) -> Result<PathBuf> {
        let relative = Path::new(reference);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if reference.trim().is_empty() || escapes {
            return Err(ExforgeError::Content(format!(
                "reference '{}' is not a relative path inside '{}'",
                reference,
                self.root.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl ContentStore for FsContentStore {
    fn read(&self, reference: &str) -> Result<Option<String>> {
        let path = self.path_for(reference)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ExforgeError::Content(format!(
                "failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

/// In-memory store, mostly for tests and embedded catalogs.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    entries: HashMap<String, String>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(reference.into(), body.into());
    }

    pub fn with(mut self, reference: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(reference, body);
        self
    }
}

impl ContentStore for MemoryContentStore {
    fn read(&self, reference: &str) -> Result<Option<String>> {
        Ok(self.entries.get(reference).cloned())
    }
}

/// Qualifies every reference with a fixed prefix, e.g. a topic's content path.
#[derive(Clone)]
pub struct PrefixedStore {
    prefix: String,
    inner: Arc<dyn ContentStore>,
}

impl PrefixedStore {
    pub fn new(prefix: impl Into<String>, inner: Arc<dyn ContentStore>) -> Self {
        Self {
            prefix: prefix.into().trim_matches('/').to_string(),
            inner,
        }
    }

    pub fn qualify(&self, reference: &str) -> String {
        if self.prefix.is_empty() {
            reference.to_string()
        } else {
            format!("{}/{}", self.prefix, reference.trim_start_matches('/'))
        }
    }
}

impl ContentStore for PrefixedStore {
    fn read(&self, reference: &str) -> Result<Option<String>> {
        self.inner.read(&self.qualify(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_store_reads_and_reports_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("ownership")).unwrap();
        std::fs::write(dir.path().join("ownership/starter.rs"), "fn main() {}\n").unwrap();

        let store = FsContentStore::new(dir.path());

        assert_eq!(
            store.read("ownership/starter.rs").unwrap().as_deref(),
            Some("fn main() {}\n")
        );
        assert_eq!(store.read("ownership/solution.rs").unwrap(), None);
    }

    #[test]
    fn test_fs_store_rejects_escaping_references() {
        let dir = TempDir::new().unwrap();
        let store = FsContentStore::new(dir.path());

        assert!(matches!(
            store.read("../secrets.txt"),
            Err(ExforgeError::Content(_))
        ));
        assert!(matches!(
            store.read("/etc/passwd"),
            Err(ExforgeError::Content(_))
        ));
        assert!(matches!(store.read("  "), Err(ExforgeError::Content(_))));
    }

    #[test]
    fn test_prefixed_store_qualifies_references() {
        let inner = MemoryContentStore::new().with("macro_rules/starter.rs", "macro_rules! m {}");
        let store = PrefixedStore::new("macro_rules/", Arc::new(inner));

        assert_eq!(store.qualify("starter.rs"), "macro_rules/starter.rs");
        assert_eq!(
            store.read("starter.rs").unwrap().as_deref(),
            Some("macro_rules! m {}")
        );
        assert_eq!(store.read("solution.rs").unwrap(), None);
    }
}
