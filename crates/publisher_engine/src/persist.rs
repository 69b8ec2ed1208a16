use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("drafts directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("no free file name for {0}")]
    NameExhausted(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the drafts directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes whole files into one directory via temp file + rename.
/// Existing files are never replaced; a numeric suffix is added instead.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    const MAX_SUFFIX: u32 = 100;

    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write_new(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        let (stem, ext) = split_extension(filename);
        for attempt in 1..=Self::MAX_SUFFIX {
            let candidate = if attempt == 1 {
                filename.to_string()
            } else {
                format!("{stem}-{attempt}{ext}")
            };
            let target = self.dir.join(&candidate);
            match tmp.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => tmp = err.file,
                Err(err) => return Err(PersistError::Io(err.error)),
            }
        }
        Err(PersistError::NameExhausted(filename.to_string()))
    }
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::split_extension;

    #[test]
    fn extension_split() {
        assert_eq!(split_extension("a_1.md"), ("a_1", ".md"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }
}
