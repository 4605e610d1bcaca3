//! Atomic publish protocol
//!
//! Every artifact reaches its final path through stage-then-rename: a
//! uniquely named temp file is created in the *same directory* as the final
//! target (same filesystem, so the rename is atomic), written in private,
//! then renamed over the target in a single operation. Readers see either
//! the complete old artifact or the complete new one, never a partial
//! write. There is no lock file and no lock wait; the rename itself is the
//! only cross-process synchronization primitive.

use crate::error::{ThumbError, ThumbResult};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Permissions for cache directories (owner only)
const DIR_MODE: u32 = 0o700;
/// Permissions for artifacts and temp files (owner only)
const FILE_MODE: u32 = 0o600;

/// Create a directory tree if absent, owner-only. Idempotent.
pub fn ensure_dir(dir: &Path) -> ThumbResult<()> {
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
        .map_err(|e| ThumbError::io(format!("creating cache directory {}", dir.display()), e))
}

/// Stage a private temp file inside `dir`.
///
/// Creates the directory tree if needed, then a uniquely named `.png` file
/// with owner-only permissions. The caller owns the file until it is either
/// [`publish`]ed or [`discard`]ed.
pub fn stage(dir: &Path) -> ThumbResult<PathBuf> {
    ensure_dir(dir)?;

    let tmp = dir.join(format!("{}.png", Uuid::new_v4()));
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(FILE_MODE)
        .open(&tmp)
        .map_err(|e| ThumbError::io(format!("staging temp file {}", tmp.display()), e))?;

    Ok(tmp)
}

/// Atomically move a staged temp file to its final path.
///
/// Sets final permissions first, then renames; the rename replaces any
/// existing artifact in one filesystem operation.
pub async fn publish(tmp: &Path, final_path: &Path) -> ThumbResult<()> {
    tokio::fs::set_permissions(tmp, std::fs::Permissions::from_mode(FILE_MODE))
        .await
        .map_err(|e| ThumbError::io(format!("setting permissions on {}", tmp.display()), e))?;

    tokio::fs::rename(tmp, final_path)
        .await
        .map_err(|e| ThumbError::io(format!("publishing {}", final_path.display()), e))?;

    debug!(path = %final_path.display(), "artifact published");
    Ok(())
}

/// Bring a caller-supplied artifact into the final directory as a staged
/// temp file, ready for metadata stamping and [`publish`].
///
/// Three cases: the artifact already sits at the final path (moved aside to
/// a fresh temp so it is never reprocessed in place), it sits elsewhere in
/// the final directory (used as the temp directly), or it lives anywhere
/// else (moved into a fresh temp, copy-and-remove when rename crosses
/// filesystems).
pub async fn adopt(artifact: &Path, final_path: &Path) -> ThumbResult<PathBuf> {
    let dir = final_path
        .parent()
        .ok_or_else(|| ThumbError::PathInvalid(final_path.to_path_buf()))?;
    let artifact = crate::uri::absolutize(artifact)?;

    if artifact == final_path {
        let tmp = stage(dir)?;
        tokio::fs::rename(&artifact, &tmp)
            .await
            .map_err(|e| ThumbError::io(format!("moving {} aside", artifact.display()), e))?;
        return Ok(tmp);
    }

    if artifact.parent() == Some(dir) {
        return Ok(artifact);
    }

    let tmp = stage(dir)?;
    if tokio::fs::rename(&artifact, &tmp).await.is_err() {
        // rename across filesystems: fall back to copy + remove
        tokio::fs::copy(&artifact, &tmp)
            .await
            .map_err(|e| ThumbError::io(format!("importing {}", artifact.display()), e))?;
        if let Err(e) = tokio::fs::remove_file(&artifact).await {
            warn!(path = %artifact.display(), error = %e, "could not remove imported artifact");
        }
    }
    Ok(tmp)
}

/// Best-effort removal of a staged temp file
pub async fn discard(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %tmp.display(), error = %e, "could not discard temp file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn stage_creates_dir_and_private_file() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("large");

        let tmp = stage(&dir).unwrap();

        assert!(tmp.exists());
        assert_eq!(tmp.parent(), Some(dir.as_path()));
        let mode = fs::metadata(&tmp).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        let dir_mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn stage_names_are_unique_and_not_entries() {
        let root = TempDir::new().unwrap();
        let a = stage(root.path()).unwrap();
        let b = stage(root.path()).unwrap();

        assert_ne!(a, b);
        assert!(!crate::store::is_entry_name(
            a.file_name().unwrap().to_str().unwrap()
        ));
    }

    #[tokio::test]
    async fn publish_replaces_existing_atomically() {
        let root = TempDir::new().unwrap();
        let final_path = root.path().join("entry.png");
        fs::write(&final_path, b"old").unwrap();

        let tmp = stage(root.path()).unwrap();
        fs::write(&tmp, b"new").unwrap();
        publish(&tmp, &final_path).await.unwrap();

        assert_eq!(fs::read(&final_path).unwrap(), b"new");
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn adopt_moves_final_path_aside() {
        let root = TempDir::new().unwrap();
        let final_path = root.path().join("entry.png");
        fs::write(&final_path, b"already here").unwrap();

        let tmp = adopt(&final_path, &final_path).await.unwrap();

        assert_ne!(tmp, final_path);
        assert!(!final_path.exists());
        assert_eq!(fs::read(&tmp).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn adopt_uses_sibling_as_temp() {
        let root = TempDir::new().unwrap();
        let final_path = root.path().join("entry.png");
        let sibling = root.path().join("rendered.png");
        fs::write(&sibling, b"pixels").unwrap();

        let tmp = adopt(&sibling, &final_path).await.unwrap();
        assert_eq!(tmp, sibling);
    }

    #[tokio::test]
    async fn adopt_imports_foreign_artifact() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let final_path = root.path().join("large").join("entry.png");
        let artifact = elsewhere.path().join("made-by-app.png");
        fs::write(&artifact, b"pixels").unwrap();

        let tmp = adopt(&artifact, &final_path).await.unwrap();

        assert_eq!(tmp.parent(), final_path.parent());
        assert!(!artifact.exists());
        assert_eq!(fs::read(&tmp).unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn discard_is_quiet_on_missing() {
        let root = TempDir::new().unwrap();
        discard(&root.path().join("never-existed.png")).await;
    }
}
