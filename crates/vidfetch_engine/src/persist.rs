use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
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

/// Streams content into `{dir}/{filename}` through a temp file in the same
/// directory, so the target only ever appears complete.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn begin(&self, filename: &str) -> Result<StagedFile, PersistError> {
        ensure_output_dir(&self.dir)?;
        let tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| PersistError::OutputDir(e.to_string()))?;
        Ok(StagedFile {
            tmp,
            target: self.dir.join(filename),
            written: 0,
        })
    }
}

/// A file being written. Dropping it without [`StagedFile::commit`] removes
/// the temp file and leaves no trace.
pub struct StagedFile {
    tmp: NamedTempFile,
    target: PathBuf,
    written: u64,
}

impl StagedFile {
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn commit(mut self) -> Result<PathBuf, PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        // Rename over an earlier retrieval of the same name in one step.
        self.tmp
            .persist(&self.target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(self.target)
    }
}
