//! Thumbnail retrieval and caching.
//!
//! The loader is constructed once at startup and passed around behind an
//! `Arc`; there is no process-wide singleton. Lookup order is memory LRU,
//! then the optional bounded disk cache, then the network, with write-back
//! into both layers. Data-saver mode short-circuits every load to `None`.

pub mod disk;

use anyhow::Context;
use image::DynamicImage;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use disk::DiskCache;

use crate::config::ImagesConfig;

const MEMORY_ENTRIES: usize = 64;

pub struct ImageLoader {
    http: reqwest::Client,
    memory: Mutex<LruCache<String, Arc<Vec<u8>>>>,
    disk: Option<DiskCache>,
    data_saver: bool,
}

impl ImageLoader {
    pub fn new(cfg: &ImagesConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("build image http client")?;

        // No byte budget configured means no disk caching at all.
        let disk = match cfg.max_cache_mib {
            Some(mib) => Some(DiskCache::open(
                &data_dir.join("thumbnails"),
                mib * 1024 * 1024,
            )?),
            None => None,
        };

        let cap = NonZeroUsize::new(MEMORY_ENTRIES).expect("nonzero capacity");
        Ok(Self {
            http,
            memory: Mutex::new(LruCache::new(cap)),
            disk,
            data_saver: cfg.data_saver,
        })
    }

    /// Fetch the encoded image behind `url`, consulting the caches first.
    /// Returns `None` when data-saver mode suppresses image loading.
    pub async fn load(&self, url: &str) -> anyhow::Result<Option<Arc<Vec<u8>>>> {
        if self.data_saver {
            return Ok(None);
        }

        if let Some(bytes) = self.memory_get(url) {
            return Ok(Some(bytes));
        }

        if let Some(disk) = &self.disk {
            let disk = disk.clone();
            let key = url.to_string();
            let hit = tokio::task::spawn_blocking(move || disk.get(&key, now_unix()))
                .await
                .context("disk cache get")??;
            if let Some(bytes) = hit {
                let bytes = Arc::new(bytes);
                self.memory_put(url, bytes.clone());
                return Ok(Some(bytes));
            }
        }

        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetch image {url}"))?
            .error_for_status()
            .context("image http status")?
            .bytes()
            .await
            .context("read image body")?
            .to_vec();

        if let Some(disk) = &self.disk {
            let disk = disk.clone();
            let key = url.to_string();
            let blob = bytes.clone();
            let _ = tokio::task::spawn_blocking(move || disk.put(&key, &blob, now_unix())).await;
        }

        let bytes = Arc::new(bytes);
        self.memory_put(url, bytes.clone());
        Ok(Some(bytes))
    }

    pub fn cache_bytes_on_disk(&self) -> u64 {
        self.disk
            .as_ref()
            .and_then(|d| d.total_bytes().ok())
            .unwrap_or(0)
    }

    pub fn clear_disk_cache(&self) -> anyhow::Result<()> {
        if let Some(disk) = &self.disk {
            disk.clear()?;
        }
        Ok(())
    }

    fn memory_get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.memory.lock().ok()?.get(url).cloned()
    }

    fn memory_put(&self, url: &str, bytes: Arc<Vec<u8>>) {
        if let Ok(mut mem) = self.memory.lock() {
            mem.put(url.to_string(), bytes);
        }
    }
}

/// Decode an encoded image and center-crop it to a square with side
/// `min(width, height)`.
pub fn square_thumbnail(bytes: &[u8]) -> anyhow::Result<DynamicImage> {
    let img = image::load_from_memory(bytes).context("decode image")?;
    let (w, h) = (img.width(), img.height());
    let side = w.min(h);
    if side == 0 {
        anyhow::bail!("image has no pixels");
    }
    Ok(img.crop_imm((w - side) / 2, (h - side) / 2, side, side))
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn encoded_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_square_thumbnail_crops_wide_image() {
        let bytes = encoded_png(8, 4);
        let cropped = square_thumbnail(&bytes).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (4, 4));
    }

    #[test]
    fn test_square_thumbnail_crops_tall_image() {
        let bytes = encoded_png(3, 9);
        let cropped = square_thumbnail(&bytes).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (3, 3));
    }

    #[test]
    fn test_square_thumbnail_keeps_square_image() {
        let bytes = encoded_png(5, 5);
        let cropped = square_thumbnail(&bytes).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (5, 5));
    }

    #[test]
    fn test_square_thumbnail_rejects_garbage() {
        assert!(square_thumbnail(b"not an image").is_err());
    }

    #[tokio::test]
    async fn test_data_saver_suppresses_loading() {
        let cfg = ImagesConfig {
            max_cache_mib: None,
            data_saver: true,
        };
        let dir = std::env::temp_dir().join(format!("spyglass-images-{}", std::process::id()));
        let loader = ImageLoader::new(&cfg, &dir).unwrap();
        // Never touches the network: the URL is not even resolvable.
        let got = loader.load("http://invalid.invalid/x.jpg").await.unwrap();
        assert!(got.is_none());
        let _ = std::fs::remove_dir_all(dir);
    }
}
