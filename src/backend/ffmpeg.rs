//! Video backend via ffmpegthumbnailer
//!
//! Extracts a representative frame from video containers. The external
//! tool picks the seek point and handles the container zoo.

use crate::backend::generator::{command_available, run_tool, Backend, Category, DecodeFailure};
use crate::backend::magick::non_empty;
use crate::metadata::MetaMap;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::OnceCell;

/// Thumbnailer backed by the `ffmpegthumbnailer` CLI
pub struct FfmpegBackend {
    available: OnceCell<bool>,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self {
            available: OnceCell::new(),
        }
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpegthumbnailer"
    }

    async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| command_available("ffmpegthumbnailer", &["-v"]))
            .await
    }

    fn accepts(&self, mime: Option<&str>) -> bool {
        match mime {
            Some(m) => m.starts_with("video/"),
            None => true,
        }
    }

    fn handled_categories(&self) -> &'static [Category] {
        &[Category::Video]
    }

    async fn create(
        &self,
        src: &Path,
        dest: &Path,
        size_px: u32,
    ) -> Result<MetaMap, DecodeFailure> {
        let args = vec![
            "-i".to_string(),
            src.display().to_string(),
            "-o".to_string(),
            dest.display().to_string(),
            "-s".to_string(),
            size_px.to_string(),
        ];
        run_tool("ffmpegthumbnailer", &args).await?;

        non_empty(dest)?;
        Ok(MetaMap::new())
    }
}
