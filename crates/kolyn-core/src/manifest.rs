use crate::error::Result;
use crate::paths;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    dev_dependencies: Option<BTreeMap<String, serde_json::Value>>,
}

/// Dependency names declared by a project. Versions are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectManifest {
    names: BTreeSet<String>,
}

impl ProjectManifest {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse `package.json` content: union of `dependencies` and `devDependencies`.
    pub fn parse(content: &str) -> Result<Self> {
        let pkg: PackageJson = serde_json::from_str(content)?;
        let names = pkg
            .dependencies
            .into_iter()
            .chain(pkg.dev_dependencies)
            .flat_map(|m| m.into_keys())
            .collect();
        Ok(Self { names })
    }

    /// Load `<root>/package.json`. Missing or malformed manifests yield `None`,
    /// which disables dependency checks instead of failing them.
    pub fn load(root: &Path) -> Option<Self> {
        let path = root.join(paths::PACKAGE_JSON);
        let content = std::fs::read_to_string(&path).ok()?;
        match Self::parse(&content) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(path = %path.display(), %e, "ignoring malformed package.json");
                None
            }
        }
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_union_of_both_sections() {
        let m = ProjectManifest::parse(
            r#"{"name":"app","dependencies":{"react":"^18"},"devDependencies":{"jquery":"3"}}"#,
        )
        .unwrap();
        assert!(m.has_dependency("react"));
        assert!(m.has_dependency("jquery"));
        assert!(!m.has_dependency("vue"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn parse_without_sections() {
        let m = ProjectManifest::parse(r#"{"name":"empty","dependencies":null}"#).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(ProjectManifest::load(dir.path()).is_none());
    }

    #[test]
    fn load_malformed_is_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{ not json").unwrap();
        assert!(ProjectManifest::load(dir.path()).is_none());
    }
}
