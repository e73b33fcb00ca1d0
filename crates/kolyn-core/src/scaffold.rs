//! Scaffold skills: frontmatter describing how to create a project and which
//! directories/files it must contain.
//!
//! ```text
//! ---
//! type: web
//! framework: nextjs
//! create_command: npx create-next-app@latest {name} --ts
//! structure:
//!   directories: [src/components, src/lib]
//!   files:
//!     - path: src/lib/utils.ts
//!       content: |
//!         export const cn = () => {};
//! ---
//! ```

use crate::error::{KolynError, Result};
use crate::io;
use crate::skill;
use crate::tool::{self, ExternalTool};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScaffoldFile {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScaffoldStructure {
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub files: Vec<ScaffoldFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScaffoldSpec {
    #[serde(default, rename = "type")]
    pub project_type: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub create_command: String,
    #[serde(default)]
    pub structure: ScaffoldStructure,
}

impl ScaffoldSpec {
    /// The create command with `{name}` substituted, split on whitespace.
    pub fn command_for(&self, name: &str) -> Vec<String> {
        self.create_command
            .replace("{name}", name)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

pub fn parse_scaffold(content: &str) -> Result<ScaffoldSpec> {
    let invalid = |reason: String| KolynError::InvalidFrontmatter {
        path: "<scaffold>".to_string(),
        reason,
    };
    match skill::parse_frontmatter::<ScaffoldSpec>(content) {
        Ok(Some(spec)) => Ok(spec),
        Ok(None) => Err(invalid("missing frontmatter block".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

pub fn load_scaffold(path: &Path) -> Result<ScaffoldSpec> {
    skill::load_skill_strict(path)
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Existing,
    Missing,
    Created,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureEntry {
    pub path: String,
    pub kind: EntryKind,
    pub state: EntryState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureReport {
    pub entries: Vec<StructureEntry>,
}

impl StructureReport {
    fn count(&self, state: EntryState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }

    pub fn missing(&self) -> usize {
        self.count(EntryState::Missing)
    }

    pub fn created(&self) -> usize {
        self.count(EntryState::Created)
    }

    pub fn is_complete(&self) -> bool {
        self.missing() == 0
    }
}

/// Compare `base` against the declared structure. With `create_missing`,
/// absent directories are created and absent files written with their
/// declared content. Existing files are never touched.
pub fn apply_structure(
    base: &Path,
    structure: &ScaffoldStructure,
    create_missing: bool,
) -> Result<StructureReport> {
    let mut report = StructureReport::default();

    for dir in &structure.directories {
        let path = base.join(dir);
        let state = if path.exists() {
            EntryState::Existing
        } else if create_missing {
            io::ensure_dir(&path)?;
            EntryState::Created
        } else {
            EntryState::Missing
        };
        report.entries.push(StructureEntry {
            path: dir.clone(),
            kind: EntryKind::Directory,
            state,
        });
    }

    for file in &structure.files {
        let path = base.join(&file.path);
        let state = if path.exists() {
            EntryState::Existing
        } else if create_missing {
            io::atomic_write(&path, file.content.as_bytes())?;
            EntryState::Created
        } else {
            EntryState::Missing
        };
        report.entries.push(StructureEntry {
            path: file.path.clone(),
            kind: EntryKind::File,
            state,
        });
    }

    tracing::debug!(
        base = %base.display(),
        missing = report.missing(),
        created = report.created(),
        "structure applied"
    );
    Ok(report)
}

/// Run the create command in `parent`, then lay down the structure inside
/// `parent/<name>`.
pub fn create_project(
    tool: &dyn ExternalTool,
    parent: &Path,
    spec: &ScaffoldSpec,
    name: &str,
) -> Result<(PathBuf, StructureReport)> {
    let project = parent.join(name);
    let argv = spec.command_for(name);
    if let Some((program, args)) = argv.split_first() {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let status = tool.run_interactive(program, &args, Some(parent))?;
        tool::require_success(program, status)?;
    } else {
        tracing::debug!("scaffold has no create_command, creating directory only");
    }
    io::ensure_dir(&project)?;
    let report = apply_structure(&project, &spec.structure, true)?;
    Ok((project, report))
}
