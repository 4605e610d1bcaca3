//! Generator backend abstraction
//!
//! Provides a trait for thumbnail generation that can be implemented by
//! different backends (in-process decoders, external CLI thumbnailers).
//! Adapter rule: whatever goes wrong inside a backend surfaces as a single
//! [`DecodeFailure`] value; collaborator-specific error types never cross
//! the dispatcher boundary.

use crate::metadata::MetaMap;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Broad source categories a backend can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Raster and vector images
    Image,
    /// Video containers
    Video,
    /// Paginated documents
    Document,
    /// Anything else
    Misc,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Misc => "misc",
        };
        write!(f, "{}", name)
    }
}

/// A backend could not produce a thumbnail for this source.
///
/// Not a [`crate::error::ThumbError`]: decode failures drive fallback to
/// the next backend and are only surfaced when the whole list exhausts.
#[derive(Debug)]
pub struct DecodeFailure {
    /// Human-readable cause, for logs only
    pub reason: String,
}

impl DecodeFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

/// Abstract thumbnail generator interface
///
/// The registry owns an ordered list of these; order encodes preference.
/// Implementations hold no shared state beyond their own availability
/// cache.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable name, used for logging and config-based disabling
    fn name(&self) -> &'static str;

    /// Whether the backend's runtime dependency is present.
    ///
    /// Called on every dispatch; implementations memoize the probe.
    async fn is_available(&self) -> bool;

    /// Whether the backend wants sources of this MIME type.
    ///
    /// `None` means the type could not be determined; backends should be
    /// permissive then and let the decode attempt decide.
    fn accepts(&self, mime: Option<&str>) -> bool;

    /// Source categories this backend handles
    fn handled_categories(&self) -> &'static [Category];

    /// Produce a thumbnail of `src` at `dest`, bounded by `size_px`.
    ///
    /// `dest` is a private staged file owned by the dispatcher; on failure
    /// the backend must leave nothing anywhere else. Returns optional
    /// generation metadata (dimensions, duration). The mandatory identity
    /// pair is stamped by the dispatcher afterwards, never by backends.
    async fn create(
        &self,
        src: &Path,
        dest: &Path,
        size_px: u32,
    ) -> Result<MetaMap, DecodeFailure>;
}

/// Probe whether an external command runs at all
pub(crate) async fn command_available(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run an external thumbnailer, mapping every failure to [`DecodeFailure`]
pub(crate) async fn run_tool(cmd: &str, args: &[String]) -> Result<(), DecodeFailure> {
    debug!("executing: {} {:?}", cmd, args);

    let output = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| DecodeFailure::new(format!("{cmd}: {e}")))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(DecodeFailure::new(format!(
            "{cmd} exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_display() {
        assert_eq!(Category::Image.to_string(), "image");
        assert_eq!(Category::Document.to_string(), "document");
    }

    #[tokio::test]
    async fn missing_command_is_unavailable() {
        assert!(!command_available("definitely-not-a-real-tool-9a7f", &["-v"]).await);
    }

    #[tokio::test]
    async fn run_tool_maps_missing_binary_to_decode_failure() {
        let err = run_tool("definitely-not-a-real-tool-9a7f", &[]).await.unwrap_err();
        assert!(err.reason.contains("definitely-not-a-real-tool-9a7f"));
    }
}
