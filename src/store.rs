use std::fs;
use std::path::PathBuf;
use anyhow::{Context, Result};
use log::debug;

/// Destination for rendered artifacts, keyed by relative path
pub trait BlobStore {
    fn put(&mut self, key: &str, contents: &str) -> Result<()>;
}

/// Writes artifacts below a root directory, overwriting whatever is there.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobStore for FsStore {
    fn put(&mut self, key: &str, contents: &str) -> Result<()> {
        let path = self.root.join(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStore;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_store_creates_parents_and_overwrites() {
        let root = std::env::temp_dir().join(format!("reddit-digest-store-{}", std::process::id()));
        let mut store = FsStore::new(root.clone());

        store.put("daily/2026-10-16.html", "first").unwrap();
        store.put("daily/2026-10-16.html", "second").unwrap();

        let written = fs::read_to_string(root.join("daily/2026-10-16.html")).unwrap();
        assert_eq!(written, "second");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_memory_store_keeps_last_write() {
        let mut store = MemoryStore::default();
        store.put("index.html", "a").unwrap();
        store.put("index.html", "b").unwrap();
        assert_eq!(store.blobs.len(), 1);
        assert_eq!(store.blobs["index.html"], "b");
    }
}
