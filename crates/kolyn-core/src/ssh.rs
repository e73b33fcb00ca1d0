use crate::error::{KolynError, Result};
use crate::io;
use crate::paths;
use crate::tool::{self, ExternalTool};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const SSH_CONFIG_FILE: &str = "config";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SshKey {
    pub name: String,
    pub host: String,
    pub user: String,
    pub key_path: PathBuf,
    pub config_path: PathBuf,
}

impl SshKey {
    pub fn public_key_path(&self) -> PathBuf {
        let mut p = self.key_path.clone().into_os_string();
        p.push(".pub");
        PathBuf::from(p)
    }
}

/// `~/.ssh`
pub fn default_ssh_dir() -> Result<PathBuf> {
    Ok(paths::user_home()?.join(".ssh"))
}

/// The `Host` block appended to the ssh config for a new key.
pub fn config_entry(name: &str, host: &str, user: &str, key_path: &Path) -> String {
    format!(
        "\n# Generated by kolyn ({name})\nHost {name}\n  HostName {host}\n  User {user}\n  IdentityFile {key}\n  IdentitiesOnly yes\n",
        key = key_path.display()
    )
}

/// Generate an ed25519 key at `<ssh_dir>/<name>` and register a `Host` alias.
/// An existing key is never overwritten.
pub fn create_key(
    tool: &dyn ExternalTool,
    ssh_dir: &Path,
    name: &str,
    host: &str,
    user: &str,
) -> Result<SshKey> {
    let key_path = ssh_dir.join(name);
    if key_path.exists() {
        return Err(KolynError::KeyExists(key_path.display().to_string()));
    }
    io::ensure_dir(ssh_dir)?;

    let key_str = key_path.to_string_lossy().into_owned();
    let comment = format!("kolyn-{name}");
    let out = tool.run(
        "ssh-keygen",
        &["-t", "ed25519", "-f", &key_str, "-C", &comment, "-N", ""],
        None,
    )?;
    if !out.success() {
        tracing::warn!(output = %out.combined(), "ssh-keygen failed");
        return Err(KolynError::ToolFailed {
            program: "ssh-keygen".to_string(),
            status: out.status,
        });
    }

    let config_path = ssh_dir.join(SSH_CONFIG_FILE);
    io::append_text(&config_path, &config_entry(name, host, user, &key_path))?;

    Ok(SshKey {
        name: name.to_string(),
        host: host.to_string(),
        user: user.to_string(),
        key_path,
        config_path,
    })
}

/// `ssh-copy-id -i <key>.pub user@host`, attached to the terminal.
pub fn copy_key(tool: &dyn ExternalTool, key: &SshKey) -> Result<()> {
    let pub_path = key.public_key_path().to_string_lossy().into_owned();
    let target = format!("{}@{}", key.user, key.host);
    let status = tool.run_interactive("ssh-copy-id", &["-i", &pub_path, &target], None)?;
    tool::require_success("ssh-copy-id", status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::fake::ScriptedTool;
    use tempfile::TempDir;

    #[test]
    fn creates_key_and_appends_config() {
        let dir = TempDir::new().unwrap();
        let ssh = dir.path().join(".ssh");
        let tool = ScriptedTool::new();

        let key = create_key(&tool, &ssh, "client", "10.0.0.5", "root").unwrap();
        assert_eq!(key.key_path, ssh.join("client"));

        let key_str = ssh.join("client").to_string_lossy().into_owned();
        let calls = tool.calls.borrow();
        assert_eq!(calls[0].program, "ssh-keygen");
        assert_eq!(
            calls[0].args,
            vec!["-t", "ed25519", "-f", key_str.as_str(), "-C", "kolyn-client", "-N", ""]
        );

        let config = std::fs::read_to_string(ssh.join("config")).unwrap();
        assert!(config.contains("Host client\n  HostName 10.0.0.5\n  User root\n"));
        assert!(config.contains("IdentitiesOnly yes"));
    }

    #[test]
    fn existing_key_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("client"), "PRIVATE").unwrap();
        let tool = ScriptedTool::new();

        let err = create_key(&tool, dir.path(), "client", "h", "root").unwrap_err();
        assert!(matches!(err, KolynError::KeyExists(_)));
        assert!(tool.calls.borrow().is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("client")).unwrap(),
            "PRIVATE"
        );
    }

    #[test]
    fn keygen_failure_leaves_config_alone() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedTool::new().respond_stderr("boom", 1);
        assert!(create_key(&tool, dir.path(), "client", "h", "root").is_err());
        assert!(!dir.path().join("config").exists());
    }

    #[test]
    fn copy_key_targets_user_at_host() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedTool::new();
        let key = create_key(&tool, dir.path(), "web", "example.com", "deploy").unwrap();
        copy_key(&tool, &key).unwrap();
        let calls = tool.calls.borrow();
        assert_eq!(calls[1].program, "ssh-copy-id");
        assert_eq!(calls[1].args[2], "deploy@example.com");
        assert!(calls[1].args[1].ends_with("web.pub"));
    }
}
