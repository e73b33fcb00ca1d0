//! Global (`<home>/config.json`) and per-project (`.kolyn.json`) settings.

use crate::error::Result;
use crate::locale::Locale;
use crate::{io, paths};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut data = serde_json::to_string_pretty(value)?;
    data.push('\n');
    io::atomic_write(path, data.as_bytes())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub language: Locale,
    #[serde(default)]
    pub skills_sources: Vec<String>,
}

impl GlobalConfig {
    /// `None` when the file does not exist yet.
    pub fn load(home: &Path) -> Result<Option<Self>> {
        let path = paths::global_config_path(home);
        tracing::debug!(path = %path.display(), "loading global config");
        load_json(&path)
    }

    pub fn save(&self, home: &Path) -> Result<()> {
        save_json(&paths::global_config_path(home), self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub skills_sources: Vec<String>,
}

impl ProjectConfig {
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = paths::project_config_path(root);
        tracing::debug!(path = %path.display(), "loading project config");
        load_json(&path)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        save_json(&paths::project_config_path(root), self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Project,
    Global,
    None,
}

/// Sources to sync: `.kolyn.json` wins when present, otherwise the global config.
pub fn effective_sources(root: &Path, home: &Path) -> Result<(SourceOrigin, Vec<String>)> {
    if let Some(project) = ProjectConfig::load(root)? {
        return Ok((SourceOrigin::Project, project.skills_sources));
    }
    if let Some(global) = GlobalConfig::load(home)? {
        return Ok((SourceOrigin::Global, global.skills_sources));
    }
    Ok((SourceOrigin::None, Vec::new()))
}

/// Language from the global config, falling back to the default.
pub fn configured_locale(home: &Path) -> Locale {
    match GlobalConfig::load(home) {
        Ok(Some(cfg)) => cfg.language,
        Ok(None) => Locale::default(),
        Err(e) => {
            tracing::warn!(%e, "ignoring unreadable global config");
            Locale::default()
        }
    }
}
