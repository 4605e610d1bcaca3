//! Document backend via poppler's pdftocairo
//!
//! Renders the first page of a PDF. `pdftocairo -singlefile` appends the
//! `.png` extension itself, so the staged destination is passed without it.

use crate::backend::generator::{command_available, run_tool, Backend, Category, DecodeFailure};
use crate::backend::magick::non_empty;
use crate::metadata::MetaMap;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::OnceCell;

/// Thumbnailer backed by the `pdftocairo` CLI
pub struct PopplerBackend {
    available: OnceCell<bool>,
}

impl PopplerBackend {
    pub fn new() -> Self {
        Self {
            available: OnceCell::new(),
        }
    }
}

impl Default for PopplerBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for PopplerBackend {
    fn name(&self) -> &'static str {
        "poppler"
    }

    async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| command_available("pdftocairo", &["-v"]))
            .await
    }

    fn accepts(&self, mime: Option<&str>) -> bool {
        match mime {
            Some(m) => m == "application/pdf",
            None => true,
        }
    }

    fn handled_categories(&self) -> &'static [Category] {
        &[Category::Document]
    }

    async fn create(
        &self,
        src: &Path,
        dest: &Path,
        size_px: u32,
    ) -> Result<MetaMap, DecodeFailure> {
        let prefix = dest.with_extension("");
        let args = vec![
            "-png".to_string(),
            "-singlefile".to_string(),
            "-scale-to".to_string(),
            size_px.to_string(),
            src.display().to_string(),
            prefix.display().to_string(),
        ];
        run_tool("pdftocairo", &args).await?;

        non_empty(dest)?;
        Ok(MetaMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_acceptance_is_pdf_only() {
        let b = PopplerBackend::new();
        assert!(b.accepts(Some("application/pdf")));
        assert!(b.accepts(None));
        assert!(!b.accepts(Some("image/png")));
        assert!(!b.accepts(Some("application/zip")));
    }

    #[test]
    fn category_is_document() {
        assert_eq!(
            PopplerBackend::new().handled_categories(),
            &[Category::Document]
        );
    }
}
