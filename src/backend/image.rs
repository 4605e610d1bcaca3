//! In-process image backend
//!
//! Decodes and resizes with the `image` crate; no external dependency, so
//! it sits first in the default preference order. Reports the source
//! dimensions as generation metadata.

use crate::backend::generator::{Backend, Category, DecodeFailure};
use crate::metadata::{keys, MetaMap};
use async_trait::async_trait;
use image::{GenericImageView, ImageFormat};
use std::path::Path;

/// Thumbnailer backed by the pure-Rust decoder stack
pub struct ImageBackend;

#[async_trait]
impl Backend for ImageBackend {
    fn name(&self) -> &'static str {
        "image"
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn accepts(&self, mime: Option<&str>) -> bool {
        match mime {
            Some(m) => m.starts_with("image/"),
            None => true,
        }
    }

    fn handled_categories(&self) -> &'static [Category] {
        &[Category::Image]
    }

    async fn create(
        &self,
        src: &Path,
        dest: &Path,
        size_px: u32,
    ) -> Result<MetaMap, DecodeFailure> {
        let src = src.to_path_buf();
        let dest = dest.to_path_buf();

        // decode + resize are CPU-bound; keep them off the async workers
        tokio::task::spawn_blocking(move || {
            let img = image::open(&src)
                .map_err(|e| DecodeFailure::new(format!("decode {}: {e}", src.display())))?;
            let (width, height) = img.dimensions();

            let thumb = img.thumbnail(size_px, size_px);
            thumb
                .to_rgba8()
                .save_with_format(&dest, ImageFormat::Png)
                .map_err(|e| DecodeFailure::new(format!("encode: {e}")))?;

            let mut meta = MetaMap::new();
            meta.insert(keys::WIDTH.to_string(), width.to_string());
            meta.insert(keys::HEIGHT.to_string(), height.to_string());
            Ok(meta)
        })
        .await
        .map_err(|e| DecodeFailure::new(format!("worker panicked: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn resizes_and_reports_source_dimensions() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.png");
        let dest = dir.path().join("out.png");
        RgbaImage::from_fn(640, 480, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        })
        .save(&src)
        .unwrap();

        let meta = ImageBackend
            .create(&src, &dest, 128)
            .await
            .expect("decode should succeed");

        assert_eq!(meta.get(keys::WIDTH).map(String::as_str), Some("640"));
        assert_eq!(meta.get(keys::HEIGHT).map(String::as_str), Some("480"));

        let out = image::open(&dest).unwrap();
        let (w, h) = out.dimensions();
        assert!(w <= 128 && h <= 128);
        // aspect ratio preserved: 640x480 bounded by 128 is 128x96
        assert_eq!((w, h), (128, 96));
    }

    #[tokio::test]
    async fn garbage_input_is_a_decode_failure() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("junk.png");
        let dest = dir.path().join("out.png");
        std::fs::write(&src, b"not an image").unwrap();

        let err = ImageBackend.create(&src, &dest, 128).await.unwrap_err();
        assert!(err.reason.contains("decode"));
    }

    #[test]
    fn accepts_images_and_unknown() {
        let b = ImageBackend;
        assert!(b.accepts(Some("image/jpeg")));
        assert!(b.accepts(None));
        assert!(!b.accepts(Some("video/mp4")));
        assert!(!b.accepts(Some("application/pdf")));
    }
}
