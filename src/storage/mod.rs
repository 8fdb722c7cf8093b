use anyhow::Context;
use rusqlite::{Connection, params};
use std::path::Path;

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS recent_searches (
  query TEXT PRIMARY KEY,
  filter TEXT NOT NULL,
  searched_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recent_searched_at ON recent_searches(searched_at DESC);

CREATE TABLE IF NOT EXISTS image_index (
  url TEXT PRIMARY KEY,
  file TEXT NOT NULL,
  bytes INTEGER NOT NULL,
  last_access INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_image_last_access ON image_index(last_access ASC);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Record a submitted query; re-searching moves it back to the top.
    pub fn record_search(&self, query: &str, filter: &str, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO recent_searches(query, filter, searched_at)
VALUES(?1, ?2, ?3)
ON CONFLICT(query) DO UPDATE SET
  filter=excluded.filter,
  searched_at=excluded.searched_at
"#,
                params![query, filter, now_unix],
            )
            .context("record search")?;
        Ok(())
    }

    /// Most recent queries first.
    pub fn recent_searches(&self, limit: usize) -> anyhow::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT query FROM recent_searches ORDER BY searched_at DESC LIMIT ?1")
            .context("prepare recent searches")?;
        let queries = stmt
            .query_map(params![limit as i64], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(queries)
    }

    pub fn clear_recent_searches(&self) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM recent_searches", [])
            .context("clear recent searches")?;
        Ok(())
    }

    /// Look up a cached image file and bump its access time on a hit.
    pub fn image_lookup(&self, url: &str, now_unix: i64) -> anyhow::Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT file FROM image_index WHERE url=?1")
            .context("prepare image lookup")?;
        let mut rows = stmt.query(params![url]).context("query image lookup")?;
        if let Some(row) = rows.next().context("read image row")? {
            let file: String = row.get(0)?;
            self.conn
                .execute(
                    "UPDATE image_index SET last_access=?2 WHERE url=?1",
                    params![url, now_unix],
                )
                .context("touch image row")?;
            Ok(Some(file))
        } else {
            Ok(None)
        }
    }

    pub fn image_insert(
        &self,
        url: &str,
        file: &str,
        bytes: u64,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO image_index(url, file, bytes, last_access)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(url) DO UPDATE SET
  file=excluded.file,
  bytes=excluded.bytes,
  last_access=excluded.last_access
"#,
                params![url, file, bytes as i64, now_unix],
            )
            .context("insert image row")?;
        Ok(())
    }

    pub fn image_remove(&self, url: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM image_index WHERE url=?1", params![url])
            .context("remove image row")?;
        Ok(())
    }

    pub fn image_total_bytes(&self) -> anyhow::Result<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COALESCE(SUM(bytes), 0) FROM image_index", [], |r| {
                r.get(0)
            })
            .context("sum image bytes")?;
        Ok(total.max(0) as u64)
    }

    /// Least-recently-accessed entry, the eviction candidate.
    pub fn image_oldest(&self) -> anyhow::Result<Option<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, file FROM image_index ORDER BY last_access ASC LIMIT 1")
            .context("prepare image oldest")?;
        let mut rows = stmt.query([]).context("query image oldest")?;
        if let Some(row) = rows.next().context("read oldest row")? {
            Ok(Some((row.get(0)?, row.get(1)?)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp(name: &str) -> (Storage, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "spyglass-storage-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("test.sqlite3");
        (Storage::open(&path).unwrap(), dir)
    }

    #[test]
    fn test_recent_searches_order_and_dedupe() {
        let (s, dir) = open_temp("recent");
        s.record_search("cats", "all", 100).unwrap();
        s.record_search("dogs", "videos", 200).unwrap();
        s.record_search("cats", "all", 300).unwrap();

        // Re-searching "cats" moved it back to the top, no duplicate row.
        assert_eq!(s.recent_searches(10).unwrap(), ["cats", "dogs"]);
        assert_eq!(s.recent_searches(1).unwrap(), ["cats"]);

        s.clear_recent_searches().unwrap();
        assert!(s.recent_searches(10).unwrap().is_empty());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_image_index_lookup_touches_access_time() {
        let (s, dir) = open_temp("touch");
        s.image_insert("http://a/1.jpg", "aa.img", 10, 100).unwrap();
        s.image_insert("http://a/2.jpg", "bb.img", 20, 200).unwrap();
        assert_eq!(s.image_total_bytes().unwrap(), 30);

        // Oldest is the first insert...
        assert_eq!(s.image_oldest().unwrap().unwrap().0, "http://a/1.jpg");

        // ...until a lookup refreshes it.
        let file = s.image_lookup("http://a/1.jpg", 300).unwrap();
        assert_eq!(file.as_deref(), Some("aa.img"));
        assert_eq!(s.image_oldest().unwrap().unwrap().0, "http://a/2.jpg");

        s.image_remove("http://a/2.jpg").unwrap();
        assert_eq!(s.image_total_bytes().unwrap(), 10);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_image_lookup_miss() {
        let (s, dir) = open_temp("miss");
        assert!(s.image_lookup("http://nope", 0).unwrap().is_none());
        assert!(s.image_oldest().unwrap().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }
}
