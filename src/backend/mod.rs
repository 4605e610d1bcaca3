//! Thumbnail generator backends
//!
//! A backend turns a source file into a resized preview. Built-ins cover
//! images (in-process and via ImageMagick), video (ffmpegthumbnailer) and
//! documents (pdftocairo); anything implementing [`Backend`] can be
//! appended to a [`BackendRegistry`].

pub mod ffmpeg;
pub mod generator;
pub mod image;
pub mod magick;
pub mod poppler;
pub mod registry;

pub use generator::{Backend, Category, DecodeFailure};
pub use registry::BackendRegistry;
