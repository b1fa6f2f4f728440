//! DOCX format detection and validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Main document part of a WordprocessingML package.
pub const DOCUMENT_PART: &str = "word/document.xml";
/// Footnotes part.
pub const FOOTNOTES_PART: &str = "word/footnotes.xml";
/// Endnotes part.
pub const ENDNOTES_PART: &str = "word/endnotes.xml";

/// Zip local file header signature: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// DOCX format information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocxFormat {
    /// Number of entries in the zip container
    pub entry_count: usize,
    /// Whether the package carries a footnotes part
    pub has_footnotes: bool,
    /// Whether the package carries an endnotes part
    pub has_endnotes: bool,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DOCX ({} parts)", self.entry_count)
    }
}

/// Detect DOCX format from a file path.
///
/// # Example
/// ```no_run
/// use docx_refine::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("contract.docx").unwrap();
/// println!("footnotes: {}", format.has_footnotes);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    detect_format_from_bytes(&data)
}

/// Detect DOCX format from the complete file bytes.
///
/// # Returns
/// * `Ok(DocxFormat)` if the data is a zip package with a main document part
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    if !is_zip_bytes(data) {
        return Err(Error::UnknownFormat);
    }

    let archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|_| Error::UnknownFormat)?;
    let names: Vec<&str> = archive.file_names().collect();

    if !names.contains(&DOCUMENT_PART) || !names.contains(&CONTENT_TYPES_PART) {
        return Err(Error::UnknownFormat);
    }

    Ok(DocxFormat {
        entry_count: archive.len(),
        has_footnotes: names.contains(&FOOTNOTES_PART),
        has_endnotes: names.contains(&ENDNOTES_PART),
    })
}

/// Check if bytes start with a zip local file header.
pub fn is_zip_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Check if a file is a valid DOCX package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a valid DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
