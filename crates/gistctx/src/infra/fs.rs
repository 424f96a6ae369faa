//! File system access used by the collector.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Text encodings recognised when decoding file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Charset {
    /// Sniff the encoding from a byte order mark, defaulting to UTF-8.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0xFF, 0xFE, ..] => Charset::Utf16Le,
            [0xFE, 0xFF, ..] => Charset::Utf16Be,
            _ => Charset::Utf8,
        }
    }

    /// Decode `bytes`, dropping any byte order mark. Malformed sequences are replaced rather
    /// than rejected.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => {
                let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
                String::from_utf8_lossy(body).into_owned()
            }
            Charset::Utf16Le => decode_utf16(bytes.get(2..).unwrap_or(&[]), u16::from_le_bytes),
            Charset::Utf16Be => decode_utf16(bytes.get(2..).unwrap_or(&[]), u16::from_be_bytes),
        }
    }
}

fn decode_utf16(body: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Read-only view of the host file system.
pub trait FileSystem: Send + Sync {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn detect_charset(&self, _path: &Path, bytes: &[u8]) -> Charset {
        Charset::detect(bytes)
    }

    /// Direct children of a directory, in the order the collector should visit them.
    fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    fn is_directory(&self, path: &Path) -> bool;

    fn simple_name(&self, path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Read and decode a file using its detected charset.
    fn read_text(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read_bytes(path)?;
        Ok(self.detect_charset(path, &bytes).decode(&bytes))
    }
}

/// [`FileSystem`] backed by `std::fs`.
///
/// Children are returned sorted by file name so collection order does not depend on the
/// platform's directory enumeration order. Symbolic links to directories are not listed, so a
/// walk never leaves the selected tree or loops back into it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut children = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_symlink() && path.is_dir() {
                tracing::debug!(path = %path.display(), "skipping symlinked directory");
                continue;
            }
            children.push(path);
        }
        children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(children)
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    /// Paths such as `.` or `src/..` have no final component; name them after the directory
    /// they resolve to.
    fn simple_name(&self, path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .or_else(|| {
                fs::canonicalize(path).ok().and_then(|canonical| {
                    canonical
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                })
            })
            .unwrap_or_default()
    }
}
