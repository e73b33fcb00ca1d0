//! `Agent.md`: parsing the active skill list and (re)generating the file.
//!
//! Regeneration only touches the bodies of `### Skills Reference` and
//! `### Rules`; anything a user wrote elsewhere in the file survives.

use crate::cancel::CancelFlag;
use crate::error::{KolynError, Result};
use crate::scan::{self, SkillScanner};
use crate::skill::{self, Skill};
use crate::{io, paths};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

pub const SKILLS_HEADING: &str = "### Skills Reference";
pub const RULES_HEADING: &str = "### Rules";
pub const DEFAULT_PROJECT_TYPE: &str = "generic";
pub const INSTALLED_CATEGORY: &str = "Installed";

const GENERAL_RULES: [&str; 3] = [
    "**Follow the Skills:** Read the reference files above before writing code.",
    "**Directory Structure:** Respect the existing project structure.",
    "**Consistency:** Use the same libraries and patterns defined in the stack.",
];

static LINK_RE: OnceLock<Regex> = OnceLock::new();

fn link_re() -> &'static Regex {
    LINK_RE.get_or_init(|| Regex::new(r"\[.*?\]\((.*?)\)").unwrap())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentContext {
    pub project_type: String,
    /// Link targets under `### Skills Reference`, in file order.
    pub skill_paths: Vec<String>,
}

impl AgentContext {
    pub fn parse(content: &str) -> Self {
        let project_type = content
            .lines()
            .find_map(|l| l.trim().strip_prefix("Project Type:"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_PROJECT_TYPE.to_string());

        let mut skill_paths = Vec::new();
        let mut in_section = false;
        for line in content.lines() {
            if line.trim_end() == SKILLS_HEADING {
                in_section = true;
                continue;
            }
            if !in_section {
                continue;
            }
            if line.starts_with("### ") {
                break;
            }
            if let Some(target) = link_re().captures(line).and_then(|c| c.get(1)) {
                let target = target.as_str().trim();
                if !target.is_empty() {
                    skill_paths.push(target.to_string());
                }
            }
        }

        Self {
            project_type,
            skill_paths,
        }
    }

    /// Read and parse an `Agent.md` file.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                KolynError::AgentFileMissing(
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                ),
            ),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// A vendored skill as it appears in `Agent.md`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSkill {
    pub name: String,
    pub category: String,
    pub link: String,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateOutcome {
    Created,
    Updated,
}

fn sorted(skills: &[ContextSkill]) -> Vec<&ContextSkill> {
    let mut v: Vec<&ContextSkill> = skills.iter().collect();
    v.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.link.cmp(&b.link)));
    v
}

pub fn render_skills_section(skills: &[ContextSkill]) -> String {
    if skills.is_empty() {
        return "No skills selected. Run 'kolyn init --skill <name>' to add skills.\n".to_string();
    }
    let mut out = String::from("The following skills are active for this project.\n\n");
    for s in sorted(skills) {
        let category = if s.category.is_empty() {
            "Skill"
        } else {
            s.category.as_str()
        };
        out.push_str(&format!("- [{} ({})]({})\n", s.name, category, s.link));
    }
    out
}

pub fn render_rules_section(skills: &[ContextSkill]) -> String {
    let mut out = String::new();
    let mut n = 1;
    for s in sorted(skills).into_iter().filter(|s| !s.rules.is_empty()) {
        out.push_str(&format!("\n#### From {}:\n", s.name));
        for rule in &s.rules {
            out.push_str(&format!("{n}. {rule}\n"));
            n += 1;
        }
    }
    out.push_str("\n#### General:\n");
    for rule in GENERAL_RULES {
        out.push_str(&format!("{n}. {rule}\n"));
        n += 1;
    }
    out
}

fn render_template(
    project_name: &str,
    project_type: &str,
    skills: &[ContextSkill],
    version: &str,
    date: NaiveDate,
) -> String {
    format!(
        "# Agent Context - {project_name}\n\n\
         Kolyn Version: {version}\n\
         Generated: {date}\n\
         Project Type: {project_type}\n\n\
         ---\n\n\
         ## Project Context\n\n\
         ### Stack & Architecture\n\
         This project is defined by the following selected skills.\n\
         Type: {upper}\n\n\
         {SKILLS_HEADING}\n{skills_body}\n\
         {RULES_HEADING}\n{rules_body}",
        date = date.format("%Y-%m-%d"),
        upper = project_type.to_uppercase(),
        skills_body = render_skills_section(skills),
        rules_body = render_rules_section(skills),
    )
}

/// Byte span of a section body: from after the heading line up to the next
/// `### ` line (exclusive) or EOF.
fn section_span(content: &str, heading: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    let mut start = None;
    for line in content.split_inclusive('\n') {
        let next = offset + line.len();
        match start {
            None if line.trim_end() == heading => start = Some(next),
            Some(s) if line.starts_with("### ") => return Some((s, offset)),
            _ => {}
        }
        offset = next;
    }
    start.map(|s| (s, content.len()))
}

fn replace_section(content: &str, heading: &str, body: &str) -> Option<String> {
    let (start, end) = section_span(content, heading)?;
    let mut out = String::with_capacity(content.len() + body.len());
    out.push_str(&content[..start]);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(body);
    if end < content.len() {
        out.push('\n');
    }
    out.push_str(&content[end..]);
    Some(out)
}

/// Write `<root>/Agent.md`, updating the two generated sections in place
/// when the file already has them.
pub fn generate(
    root: &Path,
    project_type: &str,
    skills: &[ContextSkill],
    version: &str,
    date: NaiveDate,
) -> Result<GenerateOutcome> {
    let path = paths::agent_md_path(root);
    let existing = io::read_or_empty(&path)?;

    let updated = replace_section(&existing, SKILLS_HEADING, &render_skills_section(skills))
        .and_then(|c| replace_section(&c, RULES_HEADING, &render_rules_section(skills)));

    let (content, outcome) = match updated {
        Some(c) => (c, GenerateOutcome::Updated),
        None => {
            let project_name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string());
            (
                render_template(&project_name, project_type, skills, version, date),
                GenerateOutcome::Created,
            )
        }
    };

    tracing::debug!(path = %path.display(), ?outcome, "writing Agent.md");
    io::atomic_write(&path, content.as_bytes())?;
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Project detection and vendoring
// ---------------------------------------------------------------------------

pub fn detect_project_type(root: &Path) -> &'static str {
    let has = |f: &str| root.join(f).exists();
    if ["next.config.ts", "next.config.js", "next.config.mjs"]
        .into_iter()
        .any(has)
    {
        "nextjs"
    } else if has("go.mod") {
        "go"
    } else if has("requirements.txt") || has("pyproject.toml") {
        "python"
    } else if has(paths::PACKAGE_JSON) {
        "node"
    } else {
        DEFAULT_PROJECT_TYPE
    }
}

/// Copy a skill into `<root>/.kolyn/skills/` and return its `./`-relative link.
pub fn vendor_skill(root: &Path, skill: &Skill) -> Result<String> {
    let file_name = skill
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| KolynError::SkillNotFound(skill.path.display().to_string()))?;
    let content = std::fs::read(&skill.path)?;
    let dest = paths::project_skills_dir(root).join(&file_name);
    io::atomic_write(&dest, &content)?;
    tracing::debug!(from = %skill.path.display(), to = %dest.display(), "vendored skill");
    Ok(format!("./{}/{}", paths::PROJECT_SKILLS_DIR, file_name))
}

/// Every vendored skill in the project, in file-name order.
pub fn load_local_skills(root: &Path) -> Result<Vec<ContextSkill>> {
    let dir = paths::project_skills_dir(root);
    let entries = match std::fs::read_dir(&dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == "md"))
        .collect();
    files.sort();

    let mut skills = Vec::new();
    for path in files {
        let content = match skill::read_skill_file(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), %e, "failed to read local skill");
                continue;
            }
        };
        let parsed = skill::parse_skill(&path, INSTALLED_CATEGORY, &content);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        skills.push(ContextSkill {
            name: parsed.name,
            category: INSTALLED_CATEGORY.to_string(),
            link: format!("./{}/{}", paths::PROJECT_SKILLS_DIR, file_name),
            rules: parsed.agent_rules,
        });
    }
    Ok(skills)
}

/// Resolve selectors against the catalog. With `auto`, also pick every skill
/// whose `applies_to` names the project type. Duplicates are dropped.
pub fn select_skills<'a>(
    catalog: &'a [Skill],
    selectors: &[String],
    project_type: &str,
    auto: bool,
) -> Result<Vec<&'a Skill>> {
    let mut selected: Vec<&Skill> = Vec::new();
    for sel in selectors {
        let s = scan::find_skill(catalog, sel)
            .ok_or_else(|| KolynError::SkillNotFound(sel.clone()))?;
        push_unique(&mut selected, s);
    }
    if auto {
        for s in catalog.iter().filter(|s| s.applies_to_type(project_type)) {
            push_unique(&mut selected, s);
        }
    }
    Ok(selected)
}

fn push_unique<'a>(selected: &mut Vec<&'a Skill>, skill: &'a Skill) {
    if !selected.iter().any(|s| s.path == skill.path) {
        selected.push(skill);
    }
}

// ---------------------------------------------------------------------------
// Init flow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub selectors: Vec<String>,
    pub auto: bool,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub project_type: String,
    pub vendored: Vec<String>,
    pub active_skills: usize,
    pub outcome: GenerateOutcome,
}

/// Detect, select, vendor, and regenerate `Agent.md` for the project at `root`.
pub fn init_project(
    root: &Path,
    home: &Path,
    opts: &InitOptions,
    cancel: &CancelFlag,
) -> Result<InitReport> {
    let project_type = detect_project_type(root);

    let mut vendored = Vec::new();
    if !opts.selectors.is_empty() || opts.auto {
        let mut catalog = SkillScanner::for_home(home).scan(cancel)?;
        scan::sort_skills(&mut catalog);
        for s in select_skills(&catalog, &opts.selectors, project_type, opts.auto)? {
            vendored.push(vendor_skill(root, s)?);
        }
    }

    let local = load_local_skills(root)?;
    let today = chrono::Local::now().date_naive();
    let outcome = generate(root, project_type, &local, &opts.version, today)?;

    Ok(InitReport {
        project_type: project_type.to_string(),
        vendored,
        active_skills: local.len(),
        outcome,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn cs(name: &str, rules: &[&str]) -> ContextSkill {
        ContextSkill {
            name: name.to_string(),
            category: INSTALLED_CATEGORY.to_string(),
            link: format!("./.kolyn/skills/{name}.md"),
            rules: rules.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn parse_extracts_type_and_links() {
        let content = "# Agent Context - app\n\nProject Type: nextjs\n\n### Skills Reference\n\
                       The following skills are active.\n\n\
                       - [react (Installed)](./.kolyn/skills/react.md)\n\
                       - [go (Installed)](~/.kolyn/skills/go.md)\n\n\
                       ### Rules\n- [not a skill](./x.md)\n";
        let ctx = AgentContext::parse(content);
        assert_eq!(ctx.project_type, "nextjs");
        assert_eq!(
            ctx.skill_paths,
            vec!["./.kolyn/skills/react.md", "~/.kolyn/skills/go.md"]
        );
    }

    #[test]
    fn parse_defaults_to_generic() {
        let ctx = AgentContext::parse("# nothing here\n");
        assert_eq!(ctx.project_type, "generic");
        assert!(ctx.skill_paths.is_empty());
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = AgentContext::load(&dir.path().join("Agent.md")).unwrap_err();
        assert!(matches!(err, KolynError::AgentFileMissing(_)));
    }

    #[test]
    fn rules_are_numbered_continuously() {
        let rules = render_rules_section(&[cs("b", &["B1"]), cs("a", &["A1", "A2"]), cs("c", &[])]);
        assert_eq!(
            rules,
            "\n#### From a:\n1. A1\n2. A2\n\n#### From b:\n3. B1\n\n#### General:\n\
             4. **Follow the Skills:** Read the reference files above before writing code.\n\
             5. **Directory Structure:** Respect the existing project structure.\n\
             6. **Consistency:** Use the same libraries and patterns defined in the stack.\n"
        );
    }

    #[test]
    fn skills_section_sorted_by_name() {
        let body = render_skills_section(&[cs("zod", &[]), cs("axios", &[])]);
        let lines: Vec<&str> = body.lines().filter(|l| l.starts_with("- ")).collect();
        assert_eq!(
            lines,
            vec![
                "- [axios (Installed)](./.kolyn/skills/axios.md)",
                "- [zod (Installed)](./.kolyn/skills/zod.md)",
            ]
        );
    }

    #[test]
    fn empty_skill_list_renders_notice() {
        assert!(render_skills_section(&[]).starts_with("No skills selected"));
        let dir = TempDir::new().unwrap();
        generate(dir.path(), "go", &[], "0.3.0", date()).unwrap();
        let content = std::fs::read_to_string(dir.path().join("Agent.md")).unwrap();
        assert!(content.contains("#### General:\n1. **Follow the Skills:**"));
    }

    #[test]
    fn generate_creates_template() {
        let dir = TempDir::new().unwrap();
        let outcome = generate(dir.path(), "node", &[cs("react", &["Use hooks"])], "0.3.0", date())
            .unwrap();
        assert_eq!(outcome, GenerateOutcome::Created);

        let content = std::fs::read_to_string(dir.path().join("Agent.md")).unwrap();
        assert!(content.starts_with("# Agent Context - "));
        assert!(content.contains("Kolyn Version: 0.3.0\nGenerated: 2026-01-15\nProject Type: node\n"));
        assert!(content.contains("Type: NODE\n"));
        assert!(content.contains("- [react (Installed)](./.kolyn/skills/react.md)\n"));
        assert!(content.contains("#### From react:\n1. Use hooks\n"));

        let ctx = AgentContext::parse(&content);
        assert_eq!(ctx.project_type, "node");
        assert_eq!(ctx.skill_paths, vec!["./.kolyn/skills/react.md"]);
    }

    #[test]
    fn regeneration_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let skills = [cs("react", &["Use hooks"]), cs("axios", &[])];
        generate(dir.path(), "node", &skills, "0.3.0", date()).unwrap();
        let first = std::fs::read_to_string(dir.path().join("Agent.md")).unwrap();

        let outcome = generate(dir.path(), "node", &skills, "0.3.0", date()).unwrap();
        assert_eq!(outcome, GenerateOutcome::Updated);
        let second = std::fs::read_to_string(dir.path().join("Agent.md")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn update_preserves_user_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Agent.md");
        std::fs::write(
            &path,
            "# My notes\n\nKeep me.\n\n### Skills Reference\n- [old](./old.md)\n\n\
             ### Rules\n1. old rule\n\n### Deployment\nShip on Fridays.\n",
        )
        .unwrap();

        let outcome = generate(dir.path(), "go", &[cs("go", &["gofmt"])], "0.3.0", date()).unwrap();
        assert_eq!(outcome, GenerateOutcome::Updated);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# My notes\n\nKeep me.\n\n### Skills Reference\n"));
        assert!(!content.contains("old.md"));
        assert!(!content.contains("old rule"));
        assert!(content.contains("#### From go:\n1. gofmt\n"));
        assert!(content.ends_with("\n\n### Deployment\nShip on Fridays.\n"));
    }

    #[test]
    fn file_without_headings_is_recreated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Agent.md"), "# random\n").unwrap();
        let outcome = generate(dir.path(), "go", &[], "0.3.0", date()).unwrap();
        assert_eq!(outcome, GenerateOutcome::Created);
    }

    #[test]
    fn detect_types() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect_project_type(dir.path()), "generic");
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(detect_project_type(dir.path()), "node");
        std::fs::write(dir.path().join("pyproject.toml"), "").unwrap();
        assert_eq!(detect_project_type(dir.path()), "python");
        std::fs::write(dir.path().join("go.mod"), "").unwrap();
        assert_eq!(detect_project_type(dir.path()), "go");
        std::fs::write(dir.path().join("next.config.mjs"), "").unwrap();
        assert_eq!(detect_project_type(dir.path()), "nextjs");
    }

    fn home_with_skills() -> TempDir {
        let home = TempDir::new().unwrap();
        let web = home.path().join("skills/web");
        std::fs::create_dir_all(&web).unwrap();
        std::fs::write(
            web.join("react.md"),
            "---\nname: react\napplies_to: [node]\nagent_rules: [\"Use hooks\"]\n---\n",
        )
        .unwrap();
        std::fs::write(
            web.join("vue.md"),
            "---\nname: vue\napplies_to: [nuxt]\n---\n",
        )
        .unwrap();
        home
    }

    #[test]
    fn select_by_selector_and_auto() {
        let home = home_with_skills();
        let catalog = SkillScanner::for_home(home.path())
            .scan(&CancelFlag::new())
            .unwrap();

        let picked = select_skills(&catalog, &["web/vue".to_string()], "node", true).unwrap();
        let names: Vec<&str> = picked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["vue", "react"]);

        let err = select_skills(&catalog, &["svelte".to_string()], "node", false).unwrap_err();
        assert!(matches!(err, KolynError::SkillNotFound(s) if s == "svelte"));
    }

    #[test]
    fn init_project_vendors_and_generates() {
        let home = home_with_skills();
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("package.json"), "{}").unwrap();

        let opts = InitOptions {
            selectors: vec![],
            auto: true,
            version: "0.3.0".into(),
        };
        let report = init_project(project.path(), home.path(), &opts, &CancelFlag::new()).unwrap();
        assert_eq!(report.project_type, "node");
        assert_eq!(report.vendored, vec!["./.kolyn/skills/react.md"]);
        assert_eq!(report.active_skills, 1);
        assert_eq!(report.outcome, GenerateOutcome::Created);
        assert!(project.path().join(".kolyn/skills/react.md").exists());

        let local = load_local_skills(project.path()).unwrap();
        assert_eq!(local[0].rules, vec!["Use hooks"]);

        // Second run without selection keeps the vendored skill active.
        let report = init_project(
            project.path(),
            home.path(),
            &InitOptions::default(),
            &CancelFlag::new(),
        )
        .unwrap();
        assert_eq!(report.outcome, GenerateOutcome::Updated);
        assert_eq!(report.active_skills, 1);
    }

    #[test]
    fn local_skill_with_invalid_utf8_stays_active() {
        let project = TempDir::new().unwrap();
        let dir = project.path().join(".kolyn/skills");
        std::fs::create_dir_all(&dir).unwrap();
        let mut content = b"---\nname: go-api\nagent_rules:\n  - Use chi\n---\nNi".to_vec();
        content.push(0xF1);
        content.extend_from_slice(b"o\n");
        std::fs::write(dir.join("go-api.md"), content).unwrap();

        let local = load_local_skills(project.path()).unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].rules, vec!["Use chi"]);
    }
}
