use crate::storage::Storage;
use anyhow::Context;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

/// Bounded on-disk image cache: blobs named by the sha1 of their URL, with
/// a sqlite index tracking sizes and access times for LRU eviction.
///
/// All methods are blocking; the loader calls them via `spawn_blocking`.
/// The sqlite connection is opened per operation so handles can be cloned
/// freely into tasks.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    db_path: PathBuf,
    budget_bytes: u64,
}

impl DiskCache {
    pub fn open(dir: &Path, budget_bytes: u64) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
        let db_path = dir.join("index.sqlite3");
        // Create the schema up front so later per-op opens are cheap.
        let _ = Storage::open(&db_path)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            db_path,
            budget_bytes,
        })
    }

    fn index(&self) -> anyhow::Result<Storage> {
        Storage::open(&self.db_path)
    }

    pub fn get(&self, url: &str, now_unix: i64) -> anyhow::Result<Option<Vec<u8>>> {
        let Some(file) = self.index()?.image_lookup(url, now_unix)? else {
            return Ok(None);
        };
        let path = self.dir.join(&file);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            // Blob vanished underneath the index; drop the row and miss.
            Err(_) => {
                self.index()?.image_remove(url)?;
                Ok(None)
            }
        }
    }

    pub fn put(&self, url: &str, bytes: &[u8], now_unix: i64) -> anyhow::Result<()> {
        let file = format!("{}.img", cache_key(url));
        let path = self.dir.join(&file);
        std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;

        let index = self.index()?;
        index.image_insert(url, &file, bytes.len() as u64, now_unix)?;
        self.evict_to_budget(&index)?;
        Ok(())
    }

    /// Delete least-recently-accessed entries until the total fits the
    /// byte budget.
    fn evict_to_budget(&self, index: &Storage) -> anyhow::Result<()> {
        while index.image_total_bytes()? > self.budget_bytes {
            let Some((url, file)) = index.image_oldest()? else {
                break;
            };
            let _ = std::fs::remove_file(self.dir.join(&file));
            index.image_remove(&url)?;
        }
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        let index = self.index()?;
        while let Some((url, file)) = index.image_oldest()? {
            let _ = std::fs::remove_file(self.dir.join(&file));
            index.image_remove(&url)?;
        }
        Ok(())
    }

    pub fn total_bytes(&self) -> anyhow::Result<u64> {
        self.index()?.image_total_bytes()
    }
}

/// Stable file-name key for a URL.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(name: &str, budget: u64) -> (DiskCache, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "spyglass-diskcache-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        (DiskCache::open(&dir, budget).unwrap(), dir)
    }

    #[test]
    fn test_cache_key_is_hex_sha1() {
        let key = cache_key("http://example.com/a.jpg");
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic.
        assert_eq!(key, cache_key("http://example.com/a.jpg"));
        assert_ne!(key, cache_key("http://example.com/b.jpg"));
    }

    #[test]
    fn test_put_then_get_roundtrip() {
        let (cache, dir) = temp_cache("roundtrip", 1024);
        assert!(cache.get("http://x/1.jpg", 1).unwrap().is_none());

        cache.put("http://x/1.jpg", b"hello", 2).unwrap();
        assert_eq!(cache.get("http://x/1.jpg", 3).unwrap().unwrap(), b"hello");
        assert_eq!(cache.total_bytes().unwrap(), 5);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_eviction_drops_least_recently_used() {
        let (cache, dir) = temp_cache("evict", 10);
        cache.put("http://x/old.jpg", b"aaaaaa", 1).unwrap();
        cache.put("http://x/new.jpg", b"bbbbbb", 2).unwrap();

        // 12 bytes total against a 10-byte budget: the older entry goes.
        assert!(cache.get("http://x/old.jpg", 3).unwrap().is_none());
        assert_eq!(
            cache.get("http://x/new.jpg", 4).unwrap().unwrap(),
            b"bbbbbb"
        );
        assert!(cache.total_bytes().unwrap() <= 10);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_access_refreshes_eviction_order() {
        let (cache, dir) = temp_cache("refresh", 14);
        cache.put("http://x/a.jpg", b"aaaaaa", 1).unwrap();
        cache.put("http://x/b.jpg", b"bbbbbb", 2).unwrap();

        // Touch "a" so "b" becomes the eviction candidate.
        let _ = cache.get("http://x/a.jpg", 3).unwrap();
        cache.put("http://x/c.jpg", b"cccccc", 4).unwrap();

        assert!(cache.get("http://x/b.jpg", 5).unwrap().is_none());
        assert!(cache.get("http://x/a.jpg", 6).unwrap().is_some());
        assert!(cache.get("http://x/c.jpg", 7).unwrap().is_some());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_clear_empties_cache() {
        let (cache, dir) = temp_cache("clear", 1024);
        cache.put("http://x/1.jpg", b"one", 1).unwrap();
        cache.put("http://x/2.jpg", b"two", 2).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.total_bytes().unwrap(), 0);
        assert!(cache.get("http://x/1.jpg", 3).unwrap().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }
}
