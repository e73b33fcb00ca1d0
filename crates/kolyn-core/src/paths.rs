use crate::error::{KolynError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

/// Default kolyn home, relative to the user's home directory.
pub const KOLYN_DIR: &str = ".kolyn";
pub const SKILLS_DIR: &str = "skills";
pub const SOURCES_DIR: &str = "sources";
pub const SERVICES_DIR: &str = "services";
pub const TEMPLATES_DIR: &str = "templates";
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

pub const AGENT_MD: &str = "Agent.md";
pub const PROJECT_CONFIG_FILE: &str = ".kolyn.json";
pub const PROJECT_SKILLS_DIR: &str = ".kolyn/skills";
pub const PACKAGE_JSON: &str = "package.json";
pub const ENV_FILE: &str = ".env";
pub const COMPOSE_FILE: &str = "docker-compose.yml";

// ---------------------------------------------------------------------------
// Home resolution
// ---------------------------------------------------------------------------

/// The user's home directory.
pub fn user_home() -> Result<PathBuf> {
    home::home_dir().ok_or(KolynError::HomeNotFound)
}

/// Resolve the kolyn home: explicit override first, then `~/.kolyn`.
pub fn kolyn_home(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    Ok(user_home()?.join(KOLYN_DIR))
}

/// Expand a leading `~/` against the user's home directory.
pub fn resolve_home_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = user_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn skills_dir(home: &Path) -> PathBuf {
    home.join(SKILLS_DIR)
}

pub fn sources_dir(home: &Path) -> PathBuf {
    home.join(SOURCES_DIR)
}

pub fn services_dir(home: &Path) -> PathBuf {
    home.join(SERVICES_DIR)
}

pub fn service_dir(home: &Path, name: &str) -> PathBuf {
    services_dir(home).join(name)
}

pub fn templates_dir(home: &Path) -> PathBuf {
    home.join(TEMPLATES_DIR)
}

pub fn global_config_path(home: &Path) -> PathBuf {
    home.join(GLOBAL_CONFIG_FILE)
}

pub fn agent_md_path(root: &Path) -> PathBuf {
    root.join(AGENT_MD)
}

pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(PROJECT_CONFIG_FILE)
}

pub fn project_skills_dir(root: &Path) -> PathBuf {
    root.join(PROJECT_SKILLS_DIR)
}

/// Turn a git remote URL into a flat directory name.
///
/// `git@github.com:org/skills.git` → `github.com-org-skills`
pub fn sanitize_repo_name(url: &str) -> String {
    let mut name = url;
    for prefix in ["https://", "http://", "git@"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }
    let name = name.strip_suffix(".git").unwrap_or(name);
    name.replace([':', '/'], "-")
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_skill_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(KolynError::InvalidSkillName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
