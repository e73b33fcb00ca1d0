//! Skill discovery across the local skill library and synced sources.

use crate::cancel::CancelFlag;
use crate::error::{KolynError, Result};
use crate::paths;
use crate::skill::{self, Skill, ROOT_CATEGORY};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct SkillScanner {
    roots: Vec<PathBuf>,
    require_any_root: bool,
    include_readme: bool,
}

impl SkillScanner {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            require_any_root: false,
            include_readme: false,
        }
    }

    /// Scanner over `<home>/skills` and every directory in `<home>/sources/`.
    pub fn for_home(home: &Path) -> Self {
        Self::new(default_roots(home))
    }

    /// Fail with `NoSkillRoots` when none of the roots exist.
    pub fn require_any_root(mut self) -> Self {
        self.require_any_root = true;
        self
    }

    pub fn include_readme(mut self, include: bool) -> Self {
        self.include_readme = include;
        self
    }

    /// Walk every root and parse each markdown file found.
    ///
    /// Results are in traversal order; use [`sort_skills`] for display.
    pub fn scan(&self, cancel: &CancelFlag) -> Result<Vec<Skill>> {
        let mut skills = Vec::new();
        let mut any_root = false;

        for root in &self.roots {
            if !root.is_dir() {
                tracing::debug!(root = %root.display(), "skill root missing, skipping");
                continue;
            }
            any_root = true;
            self.scan_root(root, cancel, &mut skills)?;
        }

        if !any_root && self.require_any_root {
            return Err(KolynError::NoSkillRoots);
        }
        Ok(skills)
    }

    fn scan_root(&self, root: &Path, cancel: &CancelFlag, skills: &mut Vec<Skill>) -> Result<()> {
        let walker = WalkDir::new(root).sort_by_file_name().into_iter();
        for entry in walker {
            cancel.check()?;

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(%e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_skill_file(entry.path()) {
                continue;
            }

            let path = entry.path();
            let content = match skill::read_skill_file(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path.display(), %e, "failed to read skill");
                    continue;
                }
            };
            let category = category_for(root, path);
            skills.push(skill::parse_skill(path, &category, &content));
        }
        Ok(())
    }

    fn is_skill_file(&self, path: &Path) -> bool {
        let is_md = path.extension().is_some_and(|ext| ext == "md");
        let is_readme = path.file_name().is_some_and(|n| n == "README.md");
        is_md && (self.include_readme || !is_readme)
    }
}

/// `<home>/skills` followed by each synced source, sorted by directory name.
pub fn default_roots(home: &Path) -> Vec<PathBuf> {
    let mut roots = vec![paths::skills_dir(home)];
    let mut sources: Vec<PathBuf> = std::fs::read_dir(paths::sources_dir(home))
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect()
        })
        .unwrap_or_default();
    sources.sort();
    roots.extend(sources);
    roots
}

/// Parent directory relative to the scan root, or `"root"`.
pub fn category_for(root: &Path, path: &Path) -> String {
    let parent = path
        .strip_prefix(root)
        .ok()
        .and_then(|rel| rel.parent())
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    if parent.is_empty() {
        ROOT_CATEGORY.to_string()
    } else {
        parent
    }
}

/// Deterministic display order: (category, name).
pub fn sort_skills(skills: &mut [Skill]) {
    skills.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Find a skill by name, `category/name`, file stem, or exact path.
pub fn find_skill<'a>(skills: &'a [Skill], selector: &str) -> Option<&'a Skill> {
    let selector = selector.trim().trim_end_matches(".md");
    skills.iter().find(|s| {
        s.name == selector
            || s.file_stem() == selector
            || format!("{}/{}", s.category, s.name) == selector
            || format!("{}/{}", s.category, s.file_stem()) == selector
            || s.path.with_extension("") == Path::new(selector)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn library() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            &root.join("web/react.md"),
            "---\nname: react\ndescription: React rules\ncheck:\n  required_deps: [react]\n---\n",
        );
        write(&root.join("web/nested/deep.md"), "# Deep\n");
        write(&root.join("general.md"), "**Description**: Plain doc\n");
        write(&root.join("README.md"), "# Readme\n");
        write(&root.join("notes.txt"), "not a skill");
        dir
    }

    #[test]
    fn scan_finds_markdown_and_assigns_categories() {
        let lib = library();
        let mut skills = SkillScanner::new(vec![lib.path().to_path_buf()])
            .scan(&CancelFlag::new())
            .unwrap();
        sort_skills(&mut skills);

        let summary: Vec<(String, String)> = skills
            .iter()
            .map(|s| (s.category.clone(), s.name.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("root".to_string(), "general".to_string()),
                ("web".to_string(), "react".to_string()),
                ("web/nested".to_string(), "deep".to_string()),
            ]
        );
        assert_eq!(skills[0].description, "Plain doc");
        assert!(skills[1].has_rules());
    }

    #[test]
    fn scan_keeps_skill_with_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let mut content = b"---\nname: react\ncheck:\n  required_deps: [react]\n---\nCaf".to_vec();
        content.push(0xE9);
        std::fs::write(dir.path().join("react.md"), content).unwrap();

        let skills = SkillScanner::new(vec![dir.path().to_path_buf()])
            .scan(&CancelFlag::new())
            .unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "react");
        assert!(skills[0].has_rules());
    }

    #[test]
    fn readme_can_be_included() {
        let lib = library();
        let skills = SkillScanner::new(vec![lib.path().to_path_buf()])
            .include_readme(true)
            .scan(&CancelFlag::new())
            .unwrap();
        assert!(skills.iter().any(|s| s.name == "README"));
    }

    #[test]
    fn scanning_twice_is_stable() {
        let lib = library();
        let scanner = SkillScanner::new(vec![lib.path().to_path_buf()]);
        let a = scanner.scan(&CancelFlag::new()).unwrap();
        let b = scanner.scan(&CancelFlag::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_roots_are_zero_skills() {
        let dir = TempDir::new().unwrap();
        let scanner = SkillScanner::new(vec![dir.path().join("nope")]);
        assert!(scanner.scan(&CancelFlag::new()).unwrap().is_empty());
    }

    #[test]
    fn missing_roots_fail_when_required() {
        let dir = TempDir::new().unwrap();
        let scanner = SkillScanner::new(vec![dir.path().join("nope")]).require_any_root();
        assert!(matches!(
            scanner.scan(&CancelFlag::new()),
            Err(KolynError::NoSkillRoots)
        ));
    }

    #[test]
    fn one_present_root_is_enough() {
        let lib = library();
        let scanner = SkillScanner::new(vec![
            lib.path().join("missing"),
            lib.path().to_path_buf(),
        ])
        .require_any_root();
        assert_eq!(scanner.scan(&CancelFlag::new()).unwrap().len(), 3);
    }

    #[test]
    fn cancelled_scan_stops() {
        let lib = library();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = SkillScanner::new(vec![lib.path().to_path_buf()]).scan(&cancel);
        assert!(matches!(result, Err(KolynError::Cancelled)));
    }

    #[test]
    fn default_roots_include_sources() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(home.path().join("sources/b-repo")).unwrap();
        std::fs::create_dir_all(home.path().join("sources/a-repo")).unwrap();
        let roots = default_roots(home.path());
        assert_eq!(
            roots,
            vec![
                home.path().join("skills"),
                home.path().join("sources/a-repo"),
                home.path().join("sources/b-repo"),
            ]
        );
    }

    #[test]
    fn find_skill_by_various_selectors() {
        let lib = library();
        let skills = SkillScanner::new(vec![lib.path().to_path_buf()])
            .scan(&CancelFlag::new())
            .unwrap();
        assert_eq!(find_skill(&skills, "react").unwrap().name, "react");
        assert_eq!(find_skill(&skills, "web/react").unwrap().name, "react");
        assert_eq!(find_skill(&skills, "react.md").unwrap().name, "react");
        let path = lib.path().join("general.md");
        assert_eq!(
            find_skill(&skills, &path.to_string_lossy()).unwrap().name,
            "general"
        );
        assert!(find_skill(&skills, "vue").is_none());
    }
}
