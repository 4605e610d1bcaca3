//! Source identity resolution
//!
//! Turns a path-or-URL into a canonical URI and a stable cache key, and
//! resolves the source modification time used for staleness checks.
//! Same URI in, same key out, on every run and every platform.

use crate::error::{ThumbError, ThumbResult};
use md5::{Digest, Md5};
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use url::Url;

/// Whether the string starts with a URI scheme (`[a-z][a-z0-9+.-]*:`)
pub fn has_uri_scheme(s: &str) -> bool {
    let Some(colon) = s.find(':') else {
        return false;
    };
    if colon == 0 {
        return false;
    }
    let mut chars = s[..colon].chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Normalize a source reference to a canonical URI string.
///
/// Anything that already carries a URI scheme is returned unchanged.
/// Everything else is treated as a local path, made absolute, and rendered
/// as a percent-escaped `file://` URI. Normalizing twice yields the same
/// string.
pub fn normalize(src: &str) -> ThumbResult<String> {
    if has_uri_scheme(src) {
        return Ok(src.to_string());
    }

    let abs = absolutize(Path::new(src))?;
    Url::from_file_path(&abs)
        .map(String::from)
        .map_err(|()| ThumbError::PathInvalid(abs))
}

/// Compute the 32-hex-digit cache key for a source reference.
///
/// The key is the MD5 digest of the UTF-8 bytes of the normalized URI.
/// MD5 is a layout contract here, not a security boundary: other consumers
/// of the same cache root derive the identical file names.
pub fn cache_key(src: &str) -> ThumbResult<String> {
    Ok(key_for_uri(&normalize(src)?))
}

/// Cache key for an already-normalized URI
pub fn key_for_uri(uri: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(uri.as_bytes());
    hex::encode(hasher.finalize())
}

/// Interpret a source reference as a local filesystem path, if it is one.
///
/// Plain paths pass through; `file://` URIs are converted back to paths.
/// Any other scheme yields `None`.
pub fn local_path(src: &str) -> Option<PathBuf> {
    if !has_uri_scheme(src) {
        return Some(PathBuf::from(src));
    }
    let url = Url::parse(src).ok()?;
    if url.scheme() == "file" {
        url.to_file_path().ok()
    } else {
        None
    }
}

/// Resolve the integer-second modification time for a source.
///
/// An explicit mtime always wins. Otherwise the source must be local and
/// its filesystem mtime is read; non-local sources without an explicit
/// mtime fail with [`ThumbError::UnresolvableMtime`].
pub fn resolve_mtime(src: &str, explicit: Option<i64>) -> ThumbResult<i64> {
    if let Some(mtime) = explicit {
        return Ok(mtime);
    }

    let Some(path) = local_path(src) else {
        return Err(ThumbError::UnresolvableMtime {
            uri: src.to_string(),
        });
    };

    let meta = std::fs::metadata(&path).map_err(|e| ThumbError::SourceUnreadable {
        path: path.clone(),
        source: e,
    })?;
    let modified = meta.modified().map_err(|e| ThumbError::SourceUnreadable {
        path: path.clone(),
        source: e,
    })?;

    // Truncate to whole seconds; sub-second precision is invisible to the
    // staleness rule by format contract.
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    })
}

/// Make a path absolute without touching the filesystem.
///
/// Lexical only: `.` and `..` components are folded, symlinks are left
/// alone, and the path does not need to exist.
pub(crate) fn absolutize(path: &Path) -> ThumbResult<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| ThumbError::io("getting current directory", e))?
            .join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
