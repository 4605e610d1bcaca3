//! ImageMagick CLI backend
//!
//! Shells out to `convert` for the long tail of image formats the
//! in-process decoder does not cover. Availability is probed once per
//! instance.

use crate::backend::generator::{command_available, run_tool, Backend, Category, DecodeFailure};
use crate::metadata::MetaMap;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::OnceCell;

/// Thumbnailer backed by ImageMagick's `convert`
pub struct MagickBackend {
    available: OnceCell<bool>,
}

impl MagickBackend {
    pub fn new() -> Self {
        Self {
            available: OnceCell::new(),
        }
    }
}

impl Default for MagickBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MagickBackend {
    fn name(&self) -> &'static str {
        "magick"
    }

    async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| command_available("convert", &["-version"]))
            .await
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
        // [0] bounds multi-frame inputs to their first frame
        let args = vec![
            format!("{}[0]", src.display()),
            "-auto-orient".to_string(),
            "-thumbnail".to_string(),
            format!("{size_px}x{size_px}"),
            format!("png:{}", dest.display()),
        ];
        run_tool("convert", &args).await?;

        non_empty(dest)?;
        Ok(MetaMap::new())
    }
}

/// Reject CLI runs that "succeed" without writing anything
pub(crate) fn non_empty(dest: &Path) -> Result<(), DecodeFailure> {
    match std::fs::metadata(dest) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(DecodeFailure::new("tool produced empty output")),
        Err(e) => Err(DecodeFailure::new(format!("tool produced no output: {e}"))),
    }
}
