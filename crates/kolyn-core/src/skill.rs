//! Skill documents: markdown files with an optional YAML frontmatter block.
//!
//! ```text
//! ---
//! name: react-hooks
//! description: Hook conventions
//! agent_rules:
//!   - "**Hooks:** Only call hooks at the top level."
//! check:
//!   required_deps: [react]
//!   fail_message: Install react first
//! ---
//! # body...
//! ```
//!
//! A file without frontmatter is still a valid skill (a plain reference doc);
//! it simply carries no rules.

use crate::error::{KolynError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Category assigned to skills that sit directly in a scan root.
pub const ROOT_CATEGORY: &str = "root";

// ---------------------------------------------------------------------------
// Frontmatter model
// ---------------------------------------------------------------------------

/// Declarative assertions a skill makes about a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckRules {
    #[serde(default, deserialize_with = "nullable")]
    pub required_deps: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub deps_exist_any: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub forbidden_deps: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub files_exist: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub files_exist_any: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub env_vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_message: Option<String>,
}

impl CheckRules {
    /// True when no list carries an entry. `fail_message` alone does not count.
    pub fn is_empty(&self) -> bool {
        self.required_deps.is_empty()
            && self.deps_exist_any.is_empty()
            && self.forbidden_deps.is_empty()
            && self.files_exist.is_empty()
            && self.files_exist_any.is_empty()
            && self.env_vars.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillFrontmatter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub applies_to: Vec<String>,
    #[serde(default)]
    pub capability: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub agent_rules: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub check: CheckRules,
}

/// Treat an explicit YAML `null` (e.g. `required_deps:` with no value) as empty.
fn nullable<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skill {
    pub name: String,
    pub category: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(skip)]
    pub agent_rules: Vec<String>,
    #[serde(skip)]
    pub check: CheckRules,
    #[serde(skip)]
    pub has_frontmatter: bool,
}

impl Skill {
    /// Whether the audit engine should evaluate this skill at all.
    pub fn has_rules(&self) -> bool {
        self.has_frontmatter && !self.check.is_empty()
    }

    /// `category/name`, or just `name` for root-level skills.
    pub fn display_name(&self) -> String {
        if self.category == ROOT_CATEGORY || self.category.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.category, self.name)
        }
    }

    /// File name without the `.md` extension.
    pub fn file_stem(&self) -> String {
        file_stem(&self.path)
    }

    pub fn applies_to_type(&self, project_type: &str) -> bool {
        self.applies_to.iter().any(|t| t == project_type)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Split `content` into `(frontmatter, body)`.
///
/// Returns `None` when the file does not open with a `---` line or the block
/// is never closed.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = if let Some(r) = rest.strip_prefix('\n') {
        r
    } else if let Some(r) = rest.strip_prefix("\r\n") {
        r
    } else {
        return None;
    };

    let (fm_end, closing_start) = if rest.starts_with("---") {
        (0, 0)
    } else {
        let end = rest.find("\n---")?;
        (end, end + 1)
    };
    let after_close = &rest[closing_start + 3..];
    let body = match after_close.find('\n') {
        Some(i) => &after_close[i + 1..],
        None => "",
    };
    Some((&rest[..fm_end], body))
}

/// Deserialize the frontmatter block into `T`.
///
/// `Ok(None)` when there is no block; `Err` when the YAML is malformed.
pub fn parse_frontmatter<T: DeserializeOwned>(content: &str) -> Result<Option<T>> {
    let Some((fm, _)) = split_frontmatter(content) else {
        return Ok(None);
    };
    if fm.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_yaml::from_str(fm)?))
}

/// Fallback description for skills written before frontmatter existed.
pub fn description_from_markers(content: &str) -> Option<String> {
    for line in content.lines() {
        let line = line.trim();
        let marked = line.starts_with("- **Description**")
            || line.starts_with("**Description**")
            || line.starts_with("description:");
        if !marked {
            continue;
        }
        if let Some((_, value)) = line.split_once(':') {
            let value = value.trim().trim_start_matches("**").trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Build a `Skill` from file content. Never fails: malformed frontmatter
/// yields a rule-less skill.
pub fn parse_skill(path: &Path, category: &str, content: &str) -> Skill {
    let fm = match parse_frontmatter::<SkillFrontmatter>(content) {
        Ok(fm) => fm,
        Err(e) => {
            tracing::debug!(path = %path.display(), %e, "ignoring malformed frontmatter");
            None
        }
    };
    let has_frontmatter = fm.is_some();
    let fm = fm.unwrap_or_default();

    let name = fm
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| file_stem(path));
    let description = fm
        .description
        .filter(|d| !d.trim().is_empty())
        .map(|d| d.trim().to_string())
        .or_else(|| description_from_markers(content))
        .unwrap_or_default();

    Skill {
        name,
        category: category.to_string(),
        path: path.to_path_buf(),
        description,
        applies_to: fm.applies_to,
        capability: fm.capability,
        agent_rules: fm.agent_rules,
        check: fm.check,
        has_frontmatter,
    }
}

/// Read a skill file, replacing invalid UTF-8 instead of rejecting it.
pub fn read_skill_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read and parse a single skill file.
pub fn load_skill(path: &Path, category: &str) -> Result<Skill> {
    let content = read_skill_file(path)?;
    Ok(parse_skill(path, category, &content))
}

/// Parse a skill whose frontmatter must be present and valid.
pub fn load_skill_strict<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_skill_file(path)?;
    let invalid = |reason: String| KolynError::InvalidFrontmatter {
        path: path.display().to_string(),
        reason,
    };
    match parse_frontmatter::<T>(&content) {
        Ok(Some(v)) => Ok(v),
        Ok(None) => Err(invalid("missing frontmatter block".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Standard template written by `kolyn skills new`.
pub fn skill_template(name: &str) -> String {
    format!(
        r#"---
name: {name}
description: Short description of the skill...
agent_rules:
  - "**Rule 1:** Description of rule 1."
  - "**Rule 2:** Description of rule 2."
  - "**Quality:** No prints, clean code."
applies_to: [generic]
capability: core
check:
  required_deps: []
  files_exist_any: []
---

# {name}

## 1. Overview
Describe the purpose of this skill and when it should be used.

## 2. Core Concepts
Fundamental concepts the agent must understand.

## 3. Code Snippets
Examples ready to copy and paste.

### Example 1
```
// Code here
```

## 4. Checklist
- [ ] Rule 1 satisfied
- [ ] Rule 2 satisfied
"#
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
