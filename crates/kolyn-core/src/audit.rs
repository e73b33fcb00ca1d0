//! Audit engine: evaluates skill check rules against a project directory.
//!
//! Check order per skill is fixed: required deps, any-of deps, forbidden deps,
//! required files, any-of files, env vars. Any-of rules count as a single
//! check no matter how many candidates they list.

use crate::context::AgentContext;
use crate::error::{KolynError, Result};
use crate::manifest::ProjectManifest;
use crate::skill::{self, Skill};
use crate::{io, paths};
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    RequiredDep,
    DepsAny,
    ForbiddenDep,
    File,
    FilesAny,
    EnvVar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    /// The dependency/file/variable checked. For any-of rules this is the
    /// first match on success, or every candidate joined by `, ` on failure.
    pub subject: String,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillReport {
    pub name: String,
    pub path: PathBuf,
    pub passed: bool,
    pub checks: Vec<CheckOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditResult {
    pub total_checks: usize,
    pub passed_checks: usize,
    pub warnings: usize,
    pub manifest_found: bool,
    pub skills: Vec<SkillReport>,
    /// Skill references that no longer resolve to a file. Each counts as a warning.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_skills: Vec<String>,
}

impl AuditResult {
    pub fn is_clean(&self) -> bool {
        self.warnings == 0
    }

    pub fn record_missing(&mut self, reference: impl Into<String>) {
        self.missing_skills.push(reference.into());
        self.warnings += 1;
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluate every rule-bearing skill against `project_root`.
///
/// Skills without rules are skipped entirely. When `manifest` is `None`,
/// dependency rules are skipped and contribute nothing to the totals.
pub fn audit(
    project_root: &Path,
    skills: &[Skill],
    manifest: Option<&ProjectManifest>,
) -> AuditResult {
    let mut result = AuditResult {
        manifest_found: manifest.is_some(),
        ..Default::default()
    };
    let mut env: Option<String> = None;

    for skill in skills.iter().filter(|s| s.has_rules()) {
        let report = audit_skill(project_root, skill, manifest, &mut env);
        for check in &report.checks {
            result.total_checks += 1;
            if check.passed {
                result.passed_checks += 1;
            } else {
                result.warnings += 1;
            }
        }
        result.skills.push(report);
    }

    result
}

fn audit_skill(
    root: &Path,
    skill: &Skill,
    manifest: Option<&ProjectManifest>,
    env: &mut Option<String>,
) -> SkillReport {
    let rules = &skill.check;
    let mut checks = Vec::new();

    if let Some(m) = manifest {
        for dep in &rules.required_deps {
            checks.push(CheckOutcome {
                kind: CheckKind::RequiredDep,
                subject: dep.clone(),
                passed: m.has_dependency(dep),
            });
        }
        if !rules.deps_exist_any.is_empty() {
            checks.push(any_of(CheckKind::DepsAny, &rules.deps_exist_any, |d| {
                m.has_dependency(d)
            }));
        }
        for dep in &rules.forbidden_deps {
            checks.push(CheckOutcome {
                kind: CheckKind::ForbiddenDep,
                subject: dep.clone(),
                passed: !m.has_dependency(dep),
            });
        }
    }

    for file in &rules.files_exist {
        checks.push(CheckOutcome {
            kind: CheckKind::File,
            subject: file.clone(),
            passed: root.join(file).exists(),
        });
    }
    if !rules.files_exist_any.is_empty() {
        checks.push(any_of(CheckKind::FilesAny, &rules.files_exist_any, |f| {
            root.join(f).exists()
        }));
    }

    if !rules.env_vars.is_empty() {
        let content = env.get_or_insert_with(|| load_env(root));
        for var in &rules.env_vars {
            checks.push(CheckOutcome {
                kind: CheckKind::EnvVar,
                subject: var.clone(),
                passed: env_has_var(content, var),
            });
        }
    }

    let passed = checks.iter().all(|c| c.passed);
    let advice = if passed {
        None
    } else {
        rules.fail_message.clone().filter(|m| !m.trim().is_empty())
    };

    SkillReport {
        name: skill.display_name(),
        path: skill.path.clone(),
        passed,
        checks,
        advice,
    }
}

fn any_of(kind: CheckKind, candidates: &[String], present: impl Fn(&str) -> bool) -> CheckOutcome {
    match candidates.iter().find(|c| present(c)) {
        Some(hit) => CheckOutcome {
            kind,
            subject: hit.clone(),
            passed: true,
        },
        None => CheckOutcome {
            kind,
            subject: candidates.join(", "),
            passed: false,
        },
    }
}

fn load_env(root: &Path) -> String {
    let path = root.join(paths::ENV_FILE);
    io::read_or_empty(&path).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), %e, "failed to read .env, treating as empty");
        String::new()
    })
}

/// True when some line declares `NAME=` (an `export ` prefix is allowed).
pub fn env_has_var(content: &str, name: &str) -> bool {
    let prefix = format!("{name}=");
    content.lines().any(|line| {
        let line = line.trim_start();
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        line.starts_with(&prefix)
    })
}

// ---------------------------------------------------------------------------
// Project-level entry point
// ---------------------------------------------------------------------------

/// Everything `kolyn check` needs: the parsed context plus the audit.
#[derive(Debug, Clone, Serialize)]
pub struct CheckRun {
    pub project_type: String,
    pub active_skills: usize,
    pub result: AuditResult,
}

/// Audit the project at `root` using the skills referenced from its `Agent.md`.
pub fn run_check(root: &Path) -> Result<CheckRun> {
    let agent_path = paths::agent_md_path(root);
    if !agent_path.exists() {
        return Err(KolynError::AgentFileMissing(root.display().to_string()));
    }
    let ctx = AgentContext::load(&agent_path)?;

    let mut skills = Vec::new();
    let mut missing = Vec::new();
    for reference in &ctx.skill_paths {
        let resolved = resolve_skill_reference(root, reference);
        if !resolved.is_file() {
            missing.push(reference.clone());
            continue;
        }
        let category = resolved
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match skill::load_skill(&resolved, &category) {
            Ok(s) => skills.push(s),
            Err(e) => tracing::warn!(path = %resolved.display(), %e, "failed to read skill"),
        }
    }

    let manifest = ProjectManifest::load(root);
    let mut result = audit(root, &skills, manifest.as_ref());
    for reference in missing {
        result.record_missing(reference);
    }

    Ok(CheckRun {
        project_type: ctx.project_type,
        active_skills: ctx.skill_paths.len(),
        result,
    })
}

/// `~/x` expands to the user's home; relative references resolve against `root`.
pub fn resolve_skill_reference(root: &Path, reference: &str) -> PathBuf {
    let expanded = paths::resolve_home_path(reference);
    if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
