//! Artifact metadata embedding
//!
//! Every cache entry carries its identity inside the artifact file itself,
//! as PNG text key/value pairs. `Thumb::URI` and `Thumb::MTime` are
//! mandatory; everything else is optional garnish.

use crate::error::{ThumbError, ThumbResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Well-known metadata keys
pub mod keys {
    /// Canonical URI of the source (mandatory)
    pub const URI: &str = "Thumb::URI";
    /// Source modification time, integer seconds as a decimal string (mandatory)
    pub const MTIME: &str = "Thumb::MTime";
    /// Source image width in pixels
    pub const WIDTH: &str = "Thumb::Image::Width";
    /// Source image height in pixels
    pub const HEIGHT: &str = "Thumb::Image::Height";
    /// Source size in bytes
    pub const SIZE: &str = "Thumb::Size";
    /// Source MIME type
    pub const MIMETYPE: &str = "Thumb::Mimetype";
    /// Page count for documents
    pub const DOC_PAGES: &str = "Thumb::Document::Pages";
    /// Duration in seconds for video sources
    pub const MOVIE_LENGTH: &str = "Thumb::Movie::Length";
}

/// Key/value metadata attached to an artifact
pub type MetaMap = BTreeMap<String, String>;

/// The mandatory identity pair read back from an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbInfo {
    /// Embedded `Thumb::URI`
    pub uri: String,
    /// Embedded `Thumb::MTime`
    pub mtime: i64,
}

/// Reads and writes the metadata embedded in artifact files.
///
/// Implementations own one container format. The engine never looks at
/// pixel data; it only cares that the identity pair round-trips.
pub trait MetadataCodec: Send + Sync {
    /// Read the mandatory identity pair from an artifact
    fn read(&self, path: &Path) -> ThumbResult<ThumbInfo>;

    /// Rewrite an artifact in place with the given metadata attached
    fn write(&self, path: &Path, meta: &MetaMap) -> ThumbResult<()>;

    /// Create a minimal placeholder artifact carrying the given metadata
    fn create_blank(&self, path: &Path, meta: &MetaMap) -> ThumbResult<()>;
}

/// PNG codec: metadata lives in tEXt chunks
pub struct PngCodec;

impl PngCodec {
    fn collect_texts(info: &png::Info<'_>, out: &mut MetaMap) {
        for chunk in &info.uncompressed_latin1_text {
            out.entry(chunk.keyword.clone())
                .or_insert_with(|| chunk.text.clone());
        }
        for chunk in &info.compressed_latin1_text {
            if let Ok(text) = chunk.get_text() {
                out.entry(chunk.keyword.clone()).or_insert(text);
            }
        }
        for chunk in &info.utf8_text {
            if let Ok(text) = chunk.get_text() {
                out.entry(chunk.keyword.clone()).or_insert(text);
            }
        }
    }

    fn encode_rgba(
        path: &Path,
        width: u32,
        height: u32,
        pixels: &[u8],
        meta: &MetaMap,
    ) -> ThumbResult<()> {
        let file = File::create(path)
            .map_err(|e| ThumbError::io(format!("creating artifact {}", path.display()), e))?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        for (key, value) in meta {
            encoder
                .add_text_chunk(key.clone(), value.clone())
                .map_err(|e| ThumbError::MetadataWrite {
                    path: path.to_path_buf(),
                    reason: format!("text chunk '{key}': {e}"),
                })?;
        }

        let mut writer = encoder
            .write_header()
            .map_err(|e| ThumbError::MetadataWrite {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        writer
            .write_image_data(pixels)
            .map_err(|e| ThumbError::MetadataWrite {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        writer.finish().map_err(|e| ThumbError::MetadataWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl MetadataCodec for PngCodec {
    fn read(&self, path: &Path) -> ThumbResult<ThumbInfo> {
        let file =
            File::open(path).map_err(|e| ThumbError::corrupt(path, format!("open: {e}")))?;
        let decoder = png::Decoder::new(BufReader::new(file));
        let mut reader = decoder
            .read_info()
            .map_err(|e| ThumbError::corrupt(path, format!("decode: {e}")))?;

        let mut texts = MetaMap::new();
        Self::collect_texts(reader.info(), &mut texts);

        // Writers may place text chunks after the image data; only scan the
        // rest of the file when the header chunks were not enough.
        if (!texts.contains_key(keys::URI) || !texts.contains_key(keys::MTIME))
            && reader.finish().is_ok()
        {
            Self::collect_texts(reader.info(), &mut texts);
        }

        let uri = texts
            .get(keys::URI)
            .ok_or_else(|| ThumbError::corrupt(path, "missing Thumb::URI"))?
            .clone();
        let mtime = texts
            .get(keys::MTIME)
            .ok_or_else(|| ThumbError::corrupt(path, "missing Thumb::MTime"))?
            .trim()
            .parse::<i64>()
            .map_err(|e| ThumbError::corrupt(path, format!("Thumb::MTime: {e}")))?;

        Ok(ThumbInfo { uri, mtime })
    }

    fn write(&self, path: &Path, meta: &MetaMap) -> ThumbResult<()> {
        let img = image::open(path).map_err(|e| ThumbError::MetadataWrite {
            path: path.to_path_buf(),
            reason: format!("reopening pixels: {e}"),
        })?;
        let rgba = img.to_rgba8();
        Self::encode_rgba(path, rgba.width(), rgba.height(), rgba.as_raw(), meta)
    }

    fn create_blank(&self, path: &Path, meta: &MetaMap) -> ThumbResult<()> {
        // A real 1x1 artifact, same physical format as a thumbnail
        Self::encode_rgba(path, 1, 1, &[0, 0, 0, 0], meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn blank_roundtrips_identity_pair() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fail.png");

        let mut meta = MetaMap::new();
        meta.insert(keys::URI.to_string(), "file:///tmp/a.png".to_string());
        meta.insert(keys::MTIME.to_string(), "1700000000".to_string());
        meta.insert(keys::MIMETYPE.to_string(), "image/png".to_string());

        PngCodec.create_blank(&path, &meta).unwrap();
        let info = PngCodec.read(&path).unwrap();

        assert_eq!(info.uri, "file:///tmp/a.png");
        assert_eq!(info.mtime, 1_700_000_000);
    }

    #[test]
    fn write_restamps_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thumb.png");

        let mut meta = MetaMap::new();
        meta.insert(keys::URI.to_string(), "file:///old".to_string());
        meta.insert(keys::MTIME.to_string(), "1".to_string());
        PngCodec.create_blank(&path, &meta).unwrap();

        meta.insert(keys::URI.to_string(), "file:///new".to_string());
        meta.insert(keys::MTIME.to_string(), "2".to_string());
        PngCodec.write(&path, &meta).unwrap();

        let info = PngCodec.read(&path).unwrap();
        assert_eq!(info.uri, "file:///new");
        assert_eq!(info.mtime, 2);
    }

    #[test]
    fn garbage_is_corrupt_not_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.png");
        fs::write(&path, b"not a png at all").unwrap();

        let err = PngCodec.read(&path).unwrap_err();
        assert!(err.is_entry_invalid());
    }

    #[test]
    fn missing_mandatory_keys_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.png");
        PngCodec.create_blank(&path, &MetaMap::new()).unwrap();

        let err = PngCodec.read(&path).unwrap_err();
        assert!(err.is_entry_invalid());
    }

    #[test]
    fn non_numeric_mtime_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.png");

        let mut meta = MetaMap::new();
        meta.insert(keys::URI.to_string(), "file:///x".to_string());
        meta.insert(keys::MTIME.to_string(), "yesterday".to_string());
        PngCodec.create_blank(&path, &meta).unwrap();

        assert!(PngCodec.read(&path).unwrap_err().is_entry_invalid());
    }
}
