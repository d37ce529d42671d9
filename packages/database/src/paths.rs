#![allow(clippy::module_name_repetitions)]
//! Canonical file names for the population stores.
//!
//! All paths are relative to a data directory chosen by the caller (the
//! server's `POPBUILDER_DB_DIR`, or the ingest tool's `--data-dir`).

use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory.
pub const DEFAULT_DB_DIR: &str = "db";

/// File name of the 10-year band summary store.
pub const SUMMARY_DB_FILE: &str = "popzones-10.db";

/// File name of the 5-year band detail store.
pub const DETAIL_DB_FILE: &str = "popzones-5.db";

/// Returns the path of the summary store inside `dir`.
#[must_use]
pub fn summary_db_path(dir: &Path) -> PathBuf {
    dir.join(SUMMARY_DB_FILE)
}

/// Returns the path of the detail store inside `dir`.
#[must_use]
pub fn detail_db_path(dir: &Path) -> PathBuf {
    dir.join(DETAIL_DB_FILE)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_paths_join_the_data_dir() {
        let dir = Path::new("data");
        assert_eq!(summary_db_path(dir), Path::new("data/popzones-10.db"));
        assert_eq!(detail_db_path(dir), Path::new("data/popzones-5.db"));
    }
}
