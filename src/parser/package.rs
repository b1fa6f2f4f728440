//! DOCX package (zip container) reading and writing.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};
use crate::model::{DocxDocument, StoryKind};

/// A DOCX package held in memory.
///
/// The source bytes are kept as read, so entries that are not replaced
/// are copied into the output without being decompressed.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    data: Vec<u8>,
    names: Vec<String>,
}

impl DocxPackage {
    /// Read a package from disk. The file is opened read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| Error::DocumentRead(format!("{}: {}", path.display(), e)))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| Error::DocumentRead(format!("{}: {}", path.display(), e)))?;

        Self::from_bytes(data).map_err(|e| match e {
            Error::UnknownFormat => Error::DocumentRead(format!(
                "{}: not a DOCX package",
                path.display()
            )),
            other => other,
        })
    }

    /// Read a package from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        detect_format_from_bytes(&data)?;
        let archive = ZipArchive::new(Cursor::new(data.as_slice()))
            .map_err(|e| Error::DocumentRead(e.to_string()))?;
        let names = archive.file_names().map(str::to_string).collect();
        Ok(Self { data, names })
    }

    /// The package bytes as read.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Entry names in archive order.
    pub fn part_names(&self) -> &[String] {
        &self.names
    }

    /// Whether the package has an entry with this name.
    pub fn has_part(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Read an entry's decompressed bytes.
    pub fn read_part(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))
            .map_err(|e| Error::DocumentRead(e.to_string()))?;
        let mut entry = archive
            .by_name(name)
            .map_err(|e| Error::DocumentRead(format!("{}: {}", name, e)))?;
        let mut out = Vec::new();
        entry
            .read_to_end(&mut out)
            .map_err(|e| Error::DocumentRead(format!("{}: {}", name, e)))?;
        Ok(out)
    }

    /// Parse a story part, if the package has it.
    pub fn story(&self, kind: StoryKind) -> Result<Option<DocxDocument>> {
        if !self.has_part(kind.part_name()) {
            return Ok(None);
        }
        let data = self.read_part(kind.part_name())?;
        DocxDocument::parse(kind, &data).map(Some)
    }

    /// Parse the main document body.
    pub fn body(&self) -> Result<DocxDocument> {
        self.story(StoryKind::Body)?.ok_or_else(|| {
            Error::DocumentRead(format!("missing part {}", StoryKind::Body.part_name()))
        })
    }

    /// Write the package with some entries replaced.
    ///
    /// Entries keep their order and compression method; entries that are
    /// not replaced are raw-copied.
    pub fn write_with_parts<W: Write + Seek>(
        &self,
        writer: W,
        replaced: &HashMap<String, Vec<u8>>,
    ) -> Result<W> {
        let write_err = |e: zip::result::ZipError| Error::DocumentWrite(e.to_string());

        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))
            .map_err(|e| Error::DocumentRead(e.to_string()))?;
        let mut zip = ZipWriter::new(writer);

        for i in 0..archive.len() {
            let entry = archive
                .by_index_raw(i)
                .map_err(|e| Error::DocumentRead(e.to_string()))?;
            match replaced.get(entry.name()) {
                Some(data) => {
                    let name = entry.name().to_string();
                    let options =
                        SimpleFileOptions::default().compression_method(entry.compression());
                    drop(entry);
                    zip.start_file(name, options).map_err(write_err)?;
                    zip.write_all(data)
                        .map_err(|e| Error::DocumentWrite(e.to_string()))?;
                }
                None => zip.raw_copy_file(entry).map_err(write_err)?,
            }
        }

        zip.finish().map_err(write_err)
    }

    /// Write the package to bytes with some entries replaced.
    pub fn to_bytes_with_parts(&self, replaced: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>> {
        let cursor = self.write_with_parts(Cursor::new(Vec::new()), replaced)?;
        Ok(cursor.into_inner())
    }

    /// Save the package to `path` with some entries replaced.
    ///
    /// The output is assembled in a temporary file next to `path` and moved
    /// into place only once complete, so a failure leaves nothing behind.
    pub fn save_with_parts(&self, path: &Path, replaced: &HashMap<String, Vec<u8>>) -> Result<()> {
        let tmp = self.stage_with_parts(path, replaced)?;
        persist(tmp, path)?;

        log::debug!("Wrote {} ({} replaced parts)", path.display(), replaced.len());
        Ok(())
    }

    /// Write the package into a temporary file next to `path`, ready to be
    /// persisted over it.
    pub(crate) fn stage_with_parts(
        &self,
        path: &Path,
        replaced: &HashMap<String, Vec<u8>>,
    ) -> Result<NamedTempFile> {
        let mut tmp = staging_file(path)?;
        self.write_with_parts(tmp.as_file_mut(), replaced)?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::DocumentWrite(e.to_string()))?;
        Ok(tmp)
    }
}

/// An empty temporary file in the directory of `path`.
pub(crate) fn staging_file(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir)
        .map_err(|e| Error::DocumentWrite(format!("{}: {}", dir.display(), e)))
}

/// Move a staged file into place at `path`.
pub(crate) fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.persist(path)
        .map_err(|e| Error::DocumentWrite(format!("{}: {}", path.display(), e.error)))?;
    Ok(())
}
