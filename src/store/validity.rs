//! Cache entry validation
//!
//! An entry is usable iff it exists, its embedded metadata parses, and the
//! identity pair matches the live source exactly: string equality on the
//! URI, integer equality on the mtime. Exact mtime equality *is* the
//! staleness rule; no content checksumming happens, which keeps validation
//! O(1). Sub-second mtime changes are invisible by format contract.

use crate::error::ThumbResult;
use crate::metadata::MetadataCodec;
use crate::size::SizeClass;
use crate::store::CacheDir;
use crate::uri;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Whether the artifact at `path` is a valid entry for `(uri, mtime)`.
///
/// Parse errors, missing mandatory keys, and coercion failures all mean
/// "not valid" — never an error to the caller.
pub fn is_valid(codec: &dyn MetadataCodec, path: &Path, uri: &str, mtime: i64) -> bool {
    if !path.is_file() {
        return false;
    }
    match codec.read(path) {
        Ok(info) => info.uri == uri && info.mtime == mtime,
        Err(e) => {
            trace!(path = %path.display(), error = %e, "entry rejected");
            false
        }
    }
}

/// Probe the cache for a valid entry.
///
/// With a size class, only that class is checked. Without one, classes are
/// probed in descending pixel order — a larger thumbnail is a safe superset
/// for display. A source that is itself a cache entry is returned as-is,
/// without metadata checks (its embedded URI describes the original, not
/// itself).
pub fn probe(
    dir: &CacheDir,
    codec: &dyn MetadataCodec,
    src: &str,
    size: Option<SizeClass>,
    mtime: i64,
) -> ThumbResult<Option<PathBuf>> {
    let expected_uri = uri::normalize(src)?;
    let src_abs = if uri::has_uri_scheme(src) {
        None
    } else {
        Some(uri::absolutize(Path::new(src))?)
    };

    let one;
    let classes: &[SizeClass] = match size {
        Some(class) => {
            one = [class];
            &one
        }
        None => SizeClass::probe_order(),
    };

    for class in classes {
        let path = dir.thumb_path(src, *class)?;
        if !path.exists() {
            continue;
        }
        if src_abs.as_deref() == Some(path.as_path()) {
            return Ok(Some(path));
        }
        if is_valid(codec, &path, &expected_uri, mtime) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}
