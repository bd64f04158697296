/*!
 * Lock Registry
 * Known lock implementations and their header locations
 */

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ahash::RandomState;

use crate::core::{GenError, GenResult};

/// Where a lock's declaration text lives and how generated wrappers include it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSource {
    /// Directory holding `<name>.h`
    pub header_dir: PathBuf,
    /// Include prefix emitted into the generated wrapper
    pub include_path: String,
}

impl LockSource {
    pub fn new(header_dir: impl Into<PathBuf>, include_path: impl Into<String>) -> Self {
        Self {
            header_dir: header_dir.into(),
            include_path: include_path.into(),
        }
    }

    /// Expected header path for `name`
    pub fn header_path(&self, name: &str) -> PathBuf {
        self.header_dir.join(format!("{name}.h"))
    }
}

/// Registry of known lock names, split into flat locks and auxiliary
/// (hierarchical and other non-flat) locks
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    flat: HashMap<String, LockSource, RandomState>,
    auxiliary: HashMap<String, LockSource, RandomState>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_flat(&mut self, name: impl Into<String>, source: LockSource) {
        self.flat.insert(name.into(), source);
    }

    pub fn register_auxiliary(&mut self, name: impl Into<String>, source: LockSource) {
        self.auxiliary.insert(name.into(), source);
    }

    /// Register every `*.h` stem found in `header_dir` as a flat lock
    pub fn register_flat_dir(&mut self, header_dir: &Path, include_path: &str) -> GenResult<usize> {
        let entries = fs::read_dir(header_dir).map_err(|e| GenError::io(header_dir, e))?;

        let mut stems: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "h"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        stems.sort();

        let count = stems.len();
        for stem in stems {
            self.register_flat(stem, LockSource::new(header_dir, include_path));
        }
        Ok(count)
    }

    pub fn resolve_flat(&self, name: &str) -> Option<&LockSource> {
        self.flat.get(name)
    }

    pub fn resolve_auxiliary(&self, name: &str) -> Option<&LockSource> {
        self.auxiliary.get(name)
    }

    /// Known flat lock names, sorted for deterministic batch order
    pub fn flat_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.flat.keys().cloned().collect();
        names.sort();
        names
    }

    /// Known auxiliary lock names, sorted for deterministic batch order
    pub fn auxiliary_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.auxiliary.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Human-readable label for a known lock name, for logs and plot legends
pub fn display_name(lock: &str) -> &str {
    match lock {
        "" | "default" => "Baseline (glibc pthread_mutex)",
        "caslock" => "CAS lock",
        "ticketlock" => "Ticket lock",
        "ttaslock" => "TTAS lock",
        "mcslock" => "MCS lock",
        "clhlock" => "CLH lock",
        "hemlock" => "Hemlock",
        "numa_cnalock" => "CNA lock",
        "numa_hmcslock" => "HMCS lock",
        other => other,
    }
}
