//! # Diagnostic artifacts
//!
//! Named byte blobs written for postmortem inspection: the raw bytecode of
//! an aborted run, and optionally the token list and compiled program of
//! every run.

use crate::error::{self, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Bytecode of the last aborted run
pub const ABORT_DUMP: &str = "bytecode.log";
/// Token list of the last run
pub const TOKENS_DUMP: &str = "tokens.log";
/// Compiled bytecode of the last run
pub const BYTECODE_DUMP: &str = "bytecode.bin";

/// Dump store backend trait
pub trait DumpStore: Send {
    /// Create or replace the artifact `name`
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<()>;
    fn read(&self, name: &str) -> Option<Vec<u8>>;
    fn names(&self) -> Vec<String>;
    fn backend_name(&self) -> &'static str;
}

/// In-memory store (default, and used in tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryDumps {
    data: BTreeMap<String, Vec<u8>>,
}

impl MemoryDumps {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DumpStore for MemoryDumps {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.data.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, name: &str) -> Option<Vec<u8>> {
        self.data.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct FileDumps {
    base_path: PathBuf,
}

impl FileDumps {
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path).map_err(|e| {
            error::io_error(format!(
                "failed to create dump dir {}: {}",
                base_path.display(),
                e
            ))
            .set_source(e)
        })?;
        Ok(Self { base_path })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        // artifact names are plain file names
        let safe = name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.base_path.join(safe)
    }
}

impl DumpStore for FileDumps {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        std::fs::write(&path, bytes).map_err(|e| {
            error::io_error(format!("failed to write {}: {}", path.display(), e)).set_source(e)
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote dump");
        Ok(())
    }

    fn read(&self, name: &str) -> Option<Vec<u8>> {
        std::fs::read(self.path_for(name)).ok()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.base_path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_file())
                    .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
