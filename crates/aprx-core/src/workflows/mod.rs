//! High-level orchestration of a complete APR setup.
//!
//! This layer ties the lower modules together: it turns a declarative
//! [`SetupConfig`](setup::SetupConfig) into an on-disk tree of window
//! directories, each holding the restraint file its simulation needs.

pub mod setup;

pub use setup::{RestraintConfig, SetupConfig, SetupError, SetupSummary};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

/// Name of the directory that holds the per-window subdirectories.
pub const WINDOW_DIR_NAME: &str = "windows";

/// Creates `windows/<label>` under `path` for every window label.
///
/// With `stash_existing`, a pre-existing `windows` tree is moved aside to
/// `windows_<timestamp>` first, so reruns never mix files from different
/// setups. Without it, existing directories are left in place and only
/// missing ones are created.
pub fn make_window_dirs(
    window_list: &[String],
    path: &Path,
    stash_existing: bool,
) -> io::Result<PathBuf> {
    let window_dir = path.join(WINDOW_DIR_NAME);

    if stash_existing && window_dir.is_dir() {
        let stamp = Local::now().format("%Y.%m.%d_%H.%M.%S");
        let stash_dir = path.join(format!("{}_{}", WINDOW_DIR_NAME, stamp));
        info!(from = %window_dir.display(), to = %stash_dir.display(), "stashing window tree");
        fs::rename(&window_dir, &stash_dir)?;
    }

    for window in window_list {
        let window_path = window_dir.join(window);
        if !window_path.exists() {
            fs::create_dir_all(&window_path)?;
        }
    }
    Ok(window_dir)
}
