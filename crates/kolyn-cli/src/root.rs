use kolyn_core::paths;
use std::path::{Path, PathBuf};

/// Markers that identify a project directory, checked per ancestor.
const ROOT_MARKERS: [&str; 3] = [paths::AGENT_MD, paths::PROJECT_CONFIG_FILE, ".git"];

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `KOLYN_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of the cwd holding `Agent.md`, `.kolyn.json` or `.git`
/// 3. Fall back to the cwd
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd).unwrap_or(cwd)
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}
