//! Error types for imgcomment operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building an image source.
///
/// Sniffing, tag extraction and sizing never fail; only reading an
/// image for embedding does.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Cannot build file URI for {}", .0.display())]
    InvalidFileUri(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
