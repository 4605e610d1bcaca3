//! Public cache API
//!
//! [`ThumbCache`] composes the resolver, validity checker, publish protocol
//! and backend registry into the read path (lookup with validity check) and
//! the write path (generate-or-reuse with failure memoization).
//!
//! The registry is injected at construction and threaded through every
//! call; there is no process-wide singleton, so concurrent callers can use
//! independent registries against the same root.

use crate::backend::{BackendRegistry, Category};
use crate::error::{ThumbError, ThumbResult};
use crate::metadata::{keys, MetaMap, MetadataCodec, PngCodec};
use crate::size::SizeClass;
use crate::store::{publish, validity, CacheDir};
use crate::uri;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Size class used when a generation request names none
const DEFAULT_CREATE_SIZE: SizeClass = SizeClass::Large;

/// A shared thumbnail cache rooted at one directory
pub struct ThumbCache {
    dir: CacheDir,
    registry: BackendRegistry,
    codec: Box<dyn MetadataCodec>,
    categories: Vec<Category>,
    default_size: SizeClass,
}

impl ThumbCache {
    /// Cache at an explicit root with an injected registry
    pub fn new(dir: CacheDir, registry: BackendRegistry) -> Self {
        Self {
            dir,
            registry,
            codec: Box::new(PngCodec),
            categories: Vec::new(),
            default_size: DEFAULT_CREATE_SIZE,
        }
    }

    /// Cache at the standard shared root with the built-in backends
    pub fn standard() -> Self {
        Self::new(CacheDir::default(), BackendRegistry::with_defaults())
    }

    /// Restrict generation to backends handling these categories.
    ///
    /// An empty list (the default) means no filtering.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Swap the artifact metadata codec
    pub fn with_codec(mut self, codec: Box<dyn MetadataCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Size class generated when a request names none
    pub fn with_default_size(mut self, size: SizeClass) -> Self {
        self.default_size = size;
        self
    }

    /// The cache layout in use
    pub fn dir(&self) -> &CacheDir {
        &self.dir
    }

    /// Create the standard directory tree up front. Idempotent.
    pub async fn ensure_dirs(&self) -> ThumbResult<()> {
        self.dir.ensure_layout().await
    }

    /// Get the thumbnail for a source, generating it if necessary.
    ///
    /// The full request lifecycle: a valid cache hit is returned as-is; on
    /// a miss, a valid failure marker under `app_name` short-circuits to
    /// "no thumbnail" without touching any backend; otherwise backends are
    /// dispatched in order and the winner is stamped and published. When
    /// every backend fails and `app_name` is given, a failure marker is
    /// recorded so the attempt is not repeated for this source version.
    ///
    /// `Ok(None)` means "no thumbnail", deliberately distinct from a system
    /// error: an unreadable local source also lands here.
    pub async fn get_or_create(
        &self,
        src: &str,
        size: Option<SizeClass>,
        app_name: Option<&str>,
    ) -> ThumbResult<Option<PathBuf>> {
        let mtime = match uri::resolve_mtime(src, None) {
            Ok(mtime) => mtime,
            Err(e @ ThumbError::SourceUnreadable { .. }) => {
                debug!(src, error = %e, "source unreadable, no thumbnail");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if let Some(hit) = validity::probe(&self.dir, self.codec.as_ref(), src, size, mtime)? {
            debug!(src, path = %hit.display(), "cache hit");
            return Ok(Some(hit));
        }

        if let Some(app) = app_name {
            if self.failed_marker_valid(src, app, mtime)? {
                info!(src, app, "generation memoized as failed, skipping");
                return Ok(None);
            }
        }

        let class = size.unwrap_or(self.default_size);
        self.generate_and_publish(src, class, mtime, app_name).await
    }

    /// Pure read: the valid cached path, or `None`. Never generates,
    /// never consults or writes failure markers.
    pub async fn lookup(
        &self,
        src: &str,
        size: Option<SizeClass>,
        mtime: Option<i64>,
    ) -> ThumbResult<Option<PathBuf>> {
        let mtime = uri::resolve_mtime(src, mtime)?;
        validity::probe(&self.dir, self.codec.as_ref(), src, size, mtime)
    }

    /// Publish an artifact a collaborator generated by its own means.
    ///
    /// The artifact file is consumed: moved into the cache, stamped with
    /// the mandatory identity pair (plus `extra`), and published
    /// atomically. Returns the final path.
    pub async fn store(
        &self,
        src: &str,
        size: SizeClass,
        artifact: &Path,
        mtime: Option<i64>,
        extra: MetaMap,
    ) -> ThumbResult<PathBuf> {
        let meta = self.stamped(src, mtime, extra)?;
        let final_path = self.dir.thumb_path(src, size)?;

        let tmp = publish::adopt(artifact, &final_path).await?;
        if let Err(e) = self.codec.write(&tmp, &meta) {
            publish::discard(&tmp).await;
            return Err(e);
        }
        publish::publish(&tmp, &final_path).await?;

        info!(src, path = %final_path.display(), "external artifact stored");
        Ok(final_path)
    }

    /// Record that `app_name` failed to thumbnail this source version.
    ///
    /// Used by collaborators that fail by their own means; generation
    /// exhaustion inside [`Self::get_or_create`] records through the same
    /// path.
    pub async fn record_failure(
        &self,
        src: &str,
        app_name: &str,
        mtime: Option<i64>,
        extra: MetaMap,
    ) -> ThumbResult<PathBuf> {
        let meta = self.stamped(src, mtime, extra)?;
        let final_path = self.dir.fail_path(src, app_name)?;

        let tmp = publish::stage(&self.dir.fail_dir(app_name))?;
        if let Err(e) = self.codec.create_blank(&tmp, &meta) {
            publish::discard(&tmp).await;
            return Err(e);
        }
        publish::publish(&tmp, &final_path).await?;

        info!(src, app = app_name, "failure marker recorded");
        Ok(final_path)
    }

    /// Whether `app_name` has a valid failure marker for this source
    /// version. Pure read. A marker only ever speaks for its own app.
    pub async fn is_marked_failed(
        &self,
        src: &str,
        app_name: &str,
        mtime: Option<i64>,
    ) -> ThumbResult<bool> {
        let mtime = uri::resolve_mtime(src, mtime)?;
        self.failed_marker_valid(src, app_name, mtime)
    }

    /// Stage a temp file in a size-class directory for a collaborator that
    /// renders on its own before calling [`Self::store`].
    pub async fn create_temp(&self, size: SizeClass) -> ThumbResult<PathBuf> {
        publish::stage(&self.dir.size_dir(size))
    }

    fn failed_marker_valid(&self, src: &str, app_name: &str, mtime: i64) -> ThumbResult<bool> {
        let expected_uri = uri::normalize(src)?;
        let path = self.dir.fail_path(src, app_name)?;
        Ok(validity::is_valid(
            self.codec.as_ref(),
            &path,
            &expected_uri,
            mtime,
        ))
    }

    async fn generate_and_publish(
        &self,
        src: &str,
        class: SizeClass,
        mtime: i64,
        app_name: Option<&str>,
    ) -> ThumbResult<Option<PathBuf>> {
        let Some(src_path) = uri::local_path(src) else {
            // mtime resolution already requires a local source; only a
            // caller-supplied mtime can get a non-local source this far
            return Err(ThumbError::UnresolvableMtime {
                uri: src.to_string(),
            });
        };

        let dest_dir = self.dir.size_dir(class);
        let generated = self
            .registry
            .generate(&src_path, class.pixels(), &dest_dir, &self.categories)
            .await?;

        match generated {
            Some((tmp, mut meta)) => {
                if let Ok(file_meta) = std::fs::metadata(&src_path) {
                    meta.insert(keys::SIZE.to_string(), file_meta.len().to_string());
                }
                meta.insert(keys::URI.to_string(), uri::normalize(src)?);
                meta.insert(keys::MTIME.to_string(), mtime.to_string());

                if let Err(e) = self.codec.write(&tmp, &meta) {
                    publish::discard(&tmp).await;
                    return Err(e);
                }

                let final_path = self.dir.thumb_path(src, class)?;
                publish::publish(&tmp, &final_path).await?;
                Ok(Some(final_path))
            }
            None => {
                if let Some(app) = app_name {
                    self.record_failure(src, app, Some(mtime), MetaMap::new())
                        .await?;
                }
                Ok(None)
            }
        }
    }

    /// Merge `extra` with the freshly resolved mandatory identity pair.
    /// The pair always wins over whatever the caller put in.
    fn stamped(&self, src: &str, mtime: Option<i64>, extra: MetaMap) -> ThumbResult<MetaMap> {
        let mut meta = extra;
        meta.insert(keys::URI.to_string(), uri::normalize(src)?);
        meta.insert(
            keys::MTIME.to_string(),
            uri::resolve_mtime(src, mtime)?.to_string(),
        );
        Ok(meta)
    }
}
