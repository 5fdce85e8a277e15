//! Unit loading
//!
//! The interpreter asks a [`UnitLoader`] for the lines of the initial unit and
//! of every `#include`. Search-path policy belongs to the loader, never to the
//! interpreter.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PreprocessorError, Result};

/// Produces the raw lines of a translation unit
pub trait UnitLoader {
    fn load(&self, path: &str) -> Result<Vec<String>>;
}

/// Loads units from the file system
///
/// A path is tried as given first, then relative to each include directory
/// in the order they were added (like gcc's `-I`).
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    include_paths: Vec<PathBuf>,
}

impl FsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            include_paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add_include_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// First existing file for `path`, if any
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let direct = Path::new(path);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        self.include_paths
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
    }
}

impl UnitLoader for FsLoader {
    fn load(&self, path: &str) -> Result<Vec<String>> {
        let resolved = self.resolve(path).unwrap_or_else(|| PathBuf::from(path));
        log::debug!("loading {}", resolved.display());

        let text = fs::read_to_string(&resolved).map_err(|source| PreprocessorError::Io {
            path: resolved,
            source,
        })?;
        Ok(text.lines().map(str::to_string).collect())
    }
}

/// Serves units from memory, keyed by the exact include path
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    units: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, text: &str) -> &mut Self {
        self.units.insert(path.to_string(), text.to_string());
        self
    }

    pub fn with_unit(mut self, path: &str, text: &str) -> Self {
        self.insert(path, text);
        self
    }
}

impl UnitLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<Vec<String>> {
        self.units
            .get(path)
            .map(|text| text.lines().map(str::to_string).collect())
            .ok_or_else(|| PreprocessorError::Io {
                path: PathBuf::from(path),
                source: io::Error::new(io::ErrorKind::NotFound, "no such unit"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_unit("a.h", "#define A 1\n#define B 2\n");
        assert_eq!(loader.load("a.h").unwrap(), ["#define A 1", "#define B 2"]);
        assert!(matches!(
            loader.load("missing.h"),
            Err(PreprocessorError::Io { .. })
        ));
    }

    #[test]
    fn test_fs_loader_missing_file() {
        let loader = FsLoader::with_include_paths(["does/not/exist"]);
        let err = loader.load("no_such_header.h").unwrap_err();
        assert!(err.to_string().contains("no_such_header.h"));
    }

    #[test]
    fn test_fs_loader_search_order() {
        let mut loader = FsLoader::new();
        loader.add_include_path("first").add_include_path("second");
        assert_eq!(
            loader.include_paths(),
            [PathBuf::from("first"), PathBuf::from("second")]
        );
        assert!(loader.resolve("definitely_missing.h").is_none());
    }
}
