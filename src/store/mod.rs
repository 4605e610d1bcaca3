//! On-disk cache layout
//!
//! The cache root holds one directory per size class plus a per-application
//! failure namespace:
//!
//! ```text
//! <root>/normal/<32-hex-key>.png
//! <root>/large/<32-hex-key>.png
//! <root>/x-large/<32-hex-key>.png
//! <root>/xx-large/<32-hex-key>.png
//! <root>/fail/<app-name>/<32-hex-key>.png
//! ```
//!
//! All mutation funnels through [`publish`]; directory creation is
//! idempotent, so any number of processes may share one root.

pub mod publish;
pub mod validity;

use crate::error::ThumbResult;
use crate::size::SizeClass;
use crate::uri;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name of the failure namespace
pub const FAIL_DIR: &str = "fail";

/// A cache root and the path arithmetic over it
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Use an explicit cache root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The standard shared root: `$XDG_CACHE_HOME/thumbnails`, falling back
    /// to `~/.cache/thumbnails`
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("thumbnails")
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one size class
    pub fn size_dir(&self, size: SizeClass) -> PathBuf {
        self.root.join(size.dir_name())
    }

    /// Failure-marker directory for one application
    pub fn fail_dir(&self, app_name: &str) -> PathBuf {
        self.root.join(FAIL_DIR).join(app_name)
    }

    /// Compute the thumbnail path for a source at a size class.
    ///
    /// The file may or may not exist. If `src` already points inside the
    /// target size-class directory and is named like a cache entry, it is
    /// returned unchanged, so "is this file already a thumbnail" needs no
    /// rehash.
    pub fn thumb_path(&self, src: &str, size: SizeClass) -> ThumbResult<PathBuf> {
        let dir = self.size_dir(size);

        if !uri::has_uri_scheme(src) {
            let candidate = uri::absolutize(Path::new(src))?;
            if candidate.parent() == Some(dir.as_path())
                && candidate
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_entry_name)
            {
                return Ok(candidate);
            }
        }

        Ok(dir.join(format!("{}.png", uri::cache_key(src)?)))
    }

    /// Compute the failure-marker path for a source under an app namespace
    pub fn fail_path(&self, src: &str, app_name: &str) -> ThumbResult<PathBuf> {
        Ok(self
            .fail_dir(app_name)
            .join(format!("{}.png", uri::cache_key(src)?)))
    }

    /// Create the standard directory tree up front.
    ///
    /// Optional: every write path creates its own target directory on
    /// demand. Idempotent.
    pub async fn ensure_layout(&self) -> ThumbResult<()> {
        for dir in [
            self.size_dir(SizeClass::Normal),
            self.size_dir(SizeClass::Large),
            self.root.join(FAIL_DIR),
        ] {
            publish::ensure_dir(&dir)?;
        }
        debug!(root = %self.root.display(), "cache layout ready");
        Ok(())
    }
}

impl Default for CacheDir {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

/// Whether a file name looks like a cache entry (`<32 hex>.png`)
pub(crate) fn is_entry_name(name: &str) -> bool {
    name.strip_suffix(".png")
        .is_some_and(|stem| stem.len() == 32 && stem.chars().all(|c| c.is_ascii_hexdigit()))
}
