//! Fatal, whole-process setup errors. Anything that reaches here means
//! the run cannot start at all; `main` logs it with an `ERROR:` prefix
//! and exits non-zero. Per-region and per-chunk failures never surface
//! here — they are counted and logged by the worker/controller instead.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SetupError {
    WorldPathMissing(PathBuf),
    RegionFolderMissing(PathBuf),
    NoRegionFiles(PathBuf),
    MappingFileMissing(PathBuf),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::WorldPathMissing(p) => {
                write!(f, "world path does not exist: {}", p.display())
            }
            SetupError::RegionFolderMissing(p) => {
                write!(f, "region folder not found: {}", p.display())
            }
            SetupError::NoRegionFiles(p) => {
                write!(f, "no region files found in: {}", p.display())
            }
            SetupError::MappingFileMissing(p) => {
                write!(f, "mapping INI not found: {}", p.display())
            }
        }
    }
}

impl std::error::Error for SetupError {}
