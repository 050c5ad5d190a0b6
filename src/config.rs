//! Runtime configuration
//!
//! Everything is read from the environment.

use std::path::{Path, PathBuf};

pub const DATABASE_PATH_VAR: &str = "KYLO_DATABASE_PATH";

/// Default log filter directive, extended by `RUST_LOG`
pub const DEFAULT_LOG_DIRECTIVE: &str = "kylo=info";

/// Database path from `KYLO_DATABASE_PATH`, else `<project>/data/kylo.db`
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));
            default_database_path(&exe_dir)
        })
}

/// `data/kylo.db` under the project root, taken as two levels above
/// `target/{debug,release}` when the binary runs from there
fn default_database_path(exe_dir: &Path) -> PathBuf {
    let mut path = exe_dir.to_path_buf();
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(project_root) = path.parent().and_then(Path::parent) {
            path = project_root.to_path_buf();
        }
    }

    path.push("data");
    path.push("kylo.db");
    path
}
