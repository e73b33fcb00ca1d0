use crate::error::{KolynError, Result};
use crate::paths;
use crate::tool::ExternalTool;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Output fragments (lower-cased) that mean the remote refused us rather than
/// git itself failing.
const ACCESS_MARKERS: [&str; 6] = [
    "permission denied",
    "authentication failed",
    "could not read username",
    "repository not found",
    "could not read from remote repository",
    "publickey",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Cloned,
    Pulled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncedSource {
    pub url: String,
    pub dest: PathBuf,
    pub action: SyncAction,
}

/// Where a source URL lands under `sources_dir`.
pub fn source_dest(sources_dir: &Path, url: &str) -> PathBuf {
    sources_dir.join(paths::sanitize_repo_name(url))
}

/// Clone `url` into `sources_dir`, or pull if it was cloned before.
pub fn sync_source(tool: &dyn ExternalTool, url: &str, sources_dir: &Path) -> Result<SyncedSource> {
    let dest = source_dest(sources_dir, url);

    let (op, action, output) = if dest.exists() {
        tracing::debug!(dest = %dest.display(), "pulling existing source");
        let out = tool.run("git", &["pull"], Some(&dest))?;
        ("pull", SyncAction::Pulled, out)
    } else {
        std::fs::create_dir_all(sources_dir)?;
        let dest_str = dest.to_string_lossy().into_owned();
        tracing::debug!(url, dest = %dest_str, "cloning source");
        let out = tool.run("git", &["clone", url, dest_str.as_str()], None)?;
        ("clone", SyncAction::Cloned, out)
    };

    if !output.success() {
        return Err(classify_git_failure(op, url, &output.combined()));
    }
    Ok(SyncedSource {
        url: url.to_string(),
        dest,
        action,
    })
}

/// `RepoAccess` for auth/permission problems, `GitFailed` otherwise.
pub fn classify_git_failure(op: &str, url: &str, output: &str) -> KolynError {
    let lower = output.to_lowercase();
    if ACCESS_MARKERS.iter().any(|m| lower.contains(m)) {
        KolynError::RepoAccess {
            url: url.to_string(),
            output: output.to_string(),
        }
    } else {
        KolynError::GitFailed {
            op: op.to_string(),
            url: url.to_string(),
            output: output.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::fake::ScriptedTool;
    use tempfile::TempDir;

    const URL: &str = "git@github.com:org/skills.git";

    #[test]
    fn clones_when_missing() {
        let home = TempDir::new().unwrap();
        let sources = home.path().join("sources");
        let tool = ScriptedTool::new().respond("", 0);

        let synced = sync_source(&tool, URL, &sources).unwrap();
        assert_eq!(synced.action, SyncAction::Cloned);
        assert_eq!(synced.dest, sources.join("github.com-org-skills"));

        let calls = tool.calls.borrow();
        assert_eq!(calls[0].program, "git");
        assert_eq!(calls[0].args[..2], ["clone".to_string(), URL.to_string()]);
        assert!(sources.is_dir());
    }

    #[test]
    fn pulls_when_present() {
        let home = TempDir::new().unwrap();
        let sources = home.path().join("sources");
        let dest = sources.join("github.com-org-skills");
        std::fs::create_dir_all(&dest).unwrap();
        let tool = ScriptedTool::new().respond("Already up to date.", 0);

        let synced = sync_source(&tool, URL, &sources).unwrap();
        assert_eq!(synced.action, SyncAction::Pulled);
        assert_eq!(tool.lines(), vec!["git pull"]);
        assert_eq!(tool.calls.borrow()[0].cwd.as_deref(), Some(dest.as_path()));
    }

    #[test]
    fn auth_failure_is_repo_access() {
        let home = TempDir::new().unwrap();
        let tool = ScriptedTool::new().respond_stderr(
            "git@github.com: Permission denied (publickey).\nfatal: Could not read from remote repository.",
            128,
        );
        let err = sync_source(&tool, URL, home.path()).unwrap_err();
        match err {
            KolynError::RepoAccess { url, output } => {
                assert_eq!(url, URL);
                assert!(output.contains("Permission denied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_failure_is_git_failed() {
        let home = TempDir::new().unwrap();
        let tool = ScriptedTool::new().respond_stderr("fatal: destination path exists", 128);
        let err = sync_source(&tool, URL, home.path()).unwrap_err();
        assert!(matches!(err, KolynError::GitFailed { ref op, .. } if op == "clone"));
    }

    #[test]
    fn spawn_failure_propagates() {
        let home = TempDir::new().unwrap();
        let tool = ScriptedTool::new().fail_spawn("git");
        assert!(matches!(
            sync_source(&tool, URL, home.path()),
            Err(KolynError::ToolSpawnFailed { .. })
        ));
    }

    #[test]
    fn classification_is_case_insensitive() {
        for text in [
            "remote: Repository not found.",
            "fatal: Authentication failed for 'https://x'",
            "fatal: could not read Username for 'https://github.com'",
        ] {
            assert!(matches!(
                classify_git_failure("clone", URL, text),
                KolynError::RepoAccess { .. }
            ));
        }
    }
}
