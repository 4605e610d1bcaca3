//! MIME type detection for source files
//!
//! Content sniffing takes precedence over the filename extension, since
//! extensions are untrustworthy. Sniffing covers the image formats the
//! decoder stack knows; everything else falls back to extension guessing.

use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::trace;

/// Bytes to read for magic-byte detection
const SNIFF_LEN: usize = 256;

/// Detect the MIME type of a local file.
///
/// Returns `None` when neither the content nor the extension gives an
/// answer; dispatch then proceeds without MIME filtering.
pub async fn detect(path: &Path) -> Option<String> {
    if let Some(mime) = sniff(path).await {
        trace!(path = %path.display(), mime, "mime from content");
        return Some(mime);
    }

    let guessed = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string());
    if let Some(ref mime) = guessed {
        trace!(path = %path.display(), mime, "mime from extension");
    }
    guessed
}

/// Guess a MIME type for a non-local source from its URI path alone
pub fn from_uri(uri: &str) -> Option<String> {
    let tail = uri.split(['?', '#']).next().unwrap_or(uri);
    mime_guess::from_path(Path::new(tail))
        .first()
        .map(|m| m.essence_str().to_string())
}

async fn sniff(path: &Path) -> Option<String> {
    let mut file = tokio::fs::File::open(path).await.ok()?;
    let mut buf = [0u8; SNIFF_LEN];
    let n = file.read(&mut buf).await.ok()?;

    image::guess_format(&buf[..n])
        .ok()
        .map(|f| f.to_mime_type().to_string())
}
