use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use super::{KvStore, StoreError};

/// Directory backed store, one file per key.
///
/// Every write goes to its own uniquely named temporary file in the same directory and
/// is persisted over the target, so a reader never sees a half written value and
/// concurrent writers never share a temporary file.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    root: PathBuf,
}

impl FileKvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::IoError(e)),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let root = self.root.clone();
        let len = value.len();

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&root, &target, value.as_bytes()))
            .await
            .map_err(io::Error::other)??;
        debug!("Stored {} bytes at {}", len, path.display());
        Ok(())
    }
}

fn write_atomically(root: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    std::fs::create_dir_all(root)?;
    let mut file = NamedTempFile::new_in(root)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::new(dir.path().join("nested"));
        assert_eq!(store.get("default_nodes").await.unwrap(), None);

        store
            .put("default_nodes", r#"[{"server":"a","port":1}]"#.to_string())
            .await
            .unwrap();
        assert_eq!(
            store.get("default_nodes").await.unwrap().as_deref(),
            Some(r#"[{"server":"a","port":1}]"#)
        );
        assert!(dir.path().join("nested/default_nodes.json").exists());
        // Only the value file is left behind
        let entries = std::fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_concurrent_puts_never_tear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::new(dir.path());
        let first = "a".repeat(2 * 1024 * 1024);
        let second = "b".repeat(2 * 1024 * 1024);

        for _ in 0..20 {
            let (put_a, put_b, read) = tokio::join!(
                store.put("default_nodes", first.clone()),
                store.put("default_nodes", second.clone()),
                store.get("default_nodes"),
            );
            put_a.unwrap();
            put_b.unwrap();
            match read.unwrap() {
                None => {}
                Some(value) => assert!(value == first || value == second, "torn read"),
            }
        }

        let last = store.get("default_nodes").await.unwrap().unwrap();
        assert!(last == first || last == second);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::new(dir.path());
        for key in ["", "../etc/passwd", "a/b", ".hidden"] {
            assert!(matches!(
                store.put(key, String::new()).await,
                Err(StoreError::InvalidKey(_))
            ));
        }
    }
}
