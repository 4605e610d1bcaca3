//! Backend registry and fallback dispatch
//!
//! The registry holds an explicit priority-ordered list of generator
//! backends, built once at startup. Order is preference: a native
//! in-process decoder sits before slower external processes. The list is
//! never reordered at runtime; category filtering selects a subsequence
//! without disturbing relative order.

use crate::backend::ffmpeg::FfmpegBackend;
use crate::backend::generator::{Backend, Category};
use crate::backend::image::ImageBackend;
use crate::backend::magick::MagickBackend;
use crate::backend::poppler::PopplerBackend;
use crate::error::ThumbResult;
use crate::metadata::{keys, MetaMap};
use crate::mime;
use crate::store::publish;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Priority-ordered collection of generator backends
pub struct BackendRegistry {
    backends: Vec<Box<dyn Backend>>,
}

impl BackendRegistry {
    /// Build a registry from an explicit ordered list
    pub fn new(backends: Vec<Box<dyn Backend>>) -> Self {
        Self { backends }
    }

    /// The built-in backends in default preference order
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Box::new(ImageBackend),
            Box::new(MagickBackend::new()),
            Box::new(FfmpegBackend::new()),
            Box::new(PopplerBackend::new()),
        ])
    }

    /// Drop backends by name (config-driven)
    pub fn disable(mut self, names: &[String]) -> Self {
        self.backends
            .retain(|b| !names.iter().any(|n| n == b.name()));
        self
    }

    /// Append a caller-supplied backend at the lowest priority
    pub fn push(&mut self, backend: Box<dyn Backend>) {
        self.backends.push(backend);
    }

    /// Registered backend names, in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Backends whose handled categories intersect the filter.
    ///
    /// An empty filter means no filtering: the full list, order preserved.
    pub fn select(&self, filter: &[Category]) -> Vec<&dyn Backend> {
        self.backends
            .iter()
            .map(|b| b.as_ref())
            .filter(|b| {
                filter.is_empty()
                    || b.handled_categories()
                        .iter()
                        .any(|c| filter.contains(c))
            })
            .collect()
    }

    /// Try backends in order until one produces a thumbnail.
    ///
    /// Each attempt runs against a freshly staged private temp file in
    /// `dest_dir`; failed attempts are discarded, so skipped and failed
    /// backends leave no residue. Returns the staged artifact and the
    /// winning backend's metadata, or `None` when the list exhausts.
    pub async fn generate(
        &self,
        src: &Path,
        size_px: u32,
        dest_dir: &Path,
        filter: &[Category],
    ) -> ThumbResult<Option<(PathBuf, MetaMap)>> {
        let mime = mime::detect(src).await;
        debug!(
            src = %src.display(),
            mime = mime.as_deref().unwrap_or("unknown"),
            "dispatching generation"
        );

        for backend in self.select(filter) {
            if !backend.is_available().await {
                trace!(backend = backend.name(), "skipped: unavailable");
                continue;
            }
            if !backend.accepts(mime.as_deref()) {
                trace!(backend = backend.name(), "skipped: mime not accepted");
                continue;
            }

            let tmp = publish::stage(dest_dir)?;
            match backend.create(src, &tmp, size_px).await {
                Ok(mut meta) => {
                    if let Some(ref m) = mime {
                        meta.entry(keys::MIMETYPE.to_string())
                            .or_insert_with(|| m.clone());
                    }
                    info!(backend = backend.name(), src = %src.display(), "thumbnail generated");
                    return Ok(Some((tmp, meta)));
                }
                Err(failure) => {
                    debug!(
                        backend = backend.name(),
                        reason = %failure,
                        "backend failed, falling back"
                    );
                    publish::discard(&tmp).await;
                }
            }
        }

        debug!(src = %src.display(), "all backends exhausted");
        Ok(None)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
