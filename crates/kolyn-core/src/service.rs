//! Docker Compose services living under `<home>/services/<id>/`.

use crate::error::{KolynError, Result};
use crate::tool::{self, ExternalTool, OutputMode};
use crate::{io, paths};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceStatus::Running => "running",
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
}

impl Service {
    pub fn compose_path(&self) -> PathBuf {
        self.path.join(paths::COMPOSE_FILE)
    }
}

/// `postgres-dev` → `Postgres dev`
pub fn display_name(id: &str) -> String {
    let spaced = id.replace('-', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Service directories that contain a compose file, sorted by id.
pub fn list_services(services_dir: &Path) -> Result<Vec<Service>> {
    let entries = match std::fs::read_dir(services_dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut services: Vec<Service> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.join(paths::COMPOSE_FILE).is_file())
        .filter_map(|path| {
            let id = path.file_name()?.to_string_lossy().into_owned();
            Some(Service {
                name: display_name(&id),
                id,
                path,
            })
        })
        .collect();
    services.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(services)
}

pub fn find_service(services_dir: &Path, id: &str) -> Result<Service> {
    list_services(services_dir)?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| KolynError::ServiceNotFound(id.to_string()))
}

/// Ask docker whether the service's first container is running.
/// Any invocation failure maps to `Unknown`.
pub fn service_status(tool: &dyn ExternalTool, path: &Path) -> ServiceStatus {
    let ps = match tool.run("docker", &["compose", "ps", "-q"], Some(path)) {
        Ok(out) if out.success() => out,
        Ok(out) => {
            tracing::debug!(path = %path.display(), status = out.status, "docker compose ps failed");
            return ServiceStatus::Unknown;
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), %e, "docker unavailable");
            return ServiceStatus::Unknown;
        }
    };

    let Some(container) = ps.stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return ServiceStatus::Stopped;
    };

    match tool.run(
        "docker",
        &["inspect", "-f", "{{.State.Running}}", container],
        Some(path),
    ) {
        Ok(out) if out.success() => {
            if out.stdout.contains("true") {
                ServiceStatus::Running
            } else {
                ServiceStatus::Stopped
            }
        }
        _ => ServiceStatus::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeTemplate {
    pub name: String,
    pub port: String,
    pub path: PathBuf,
}

/// First host port in a compose file, e.g. `"5432:5432"` → `5432`; `?` if none.
pub fn template_port(content: &str) -> String {
    for line in content.lines() {
        let line = line.trim();
        if !(line.contains('-') && line.contains(':')) {
            continue;
        }
        let mut parts = line.split(':');
        let (Some(first), Some(_)) = (parts.next(), parts.next()) else {
            continue;
        };
        let candidate = first.trim_matches(|c: char| matches!(c, ' ' | '-' | '"' | '\''));
        if candidate.starts_with(|c: char| c.is_ascii_digit()) {
            return candidate.to_string();
        }
    }
    "?".to_string()
}

fn is_compose_template(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
}

/// `<home>/templates/*.{yml,yaml}`, sorted by name.
pub fn list_templates(home: &Path) -> Result<Vec<ComposeTemplate>> {
    let dir = paths::templates_dir(home);
    let entries = match std::fs::read_dir(&dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut templates = Vec::new();
    for path in entries.flatten().map(|e| e.path()).filter(|p| is_compose_template(p)) {
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), %e, "skipping unreadable template");
                continue;
            }
        };
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        templates.push(ComposeTemplate {
            name,
            port: template_port(&content),
            path,
        });
    }
    templates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(templates)
}

fn find_template(home: &Path, name: &str) -> Option<PathBuf> {
    let dir = paths::templates_dir(home);
    ["yml", "yaml"]
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|p| p.is_file())
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedService {
    pub service: Service,
    /// True when the compose file was (re)written from a template.
    pub from_template: bool,
    pub port: String,
}

/// Make sure `<home>/services/<name>/docker-compose.yml` exists, copying it
/// from the matching template when missing (or always, with `recreate`).
pub fn prepare_service(home: &Path, name: &str, recreate: bool) -> Result<PreparedService> {
    let dir = paths::service_dir(home, name);
    let compose = dir.join(paths::COMPOSE_FILE);

    let from_template = recreate || !compose.is_file();
    let content = if from_template {
        let template = find_template(home, name)
            .ok_or_else(|| KolynError::ServiceNotFound(name.to_string()))?;
        let content = std::fs::read_to_string(&template)?;
        io::atomic_write(&compose, content.as_bytes())?;
        tracing::debug!(from = %template.display(), to = %compose.display(), "wrote compose file");
        content
    } else {
        std::fs::read_to_string(&compose)?
    };

    Ok(PreparedService {
        service: Service {
            id: name.to_string(),
            name: display_name(name),
            path: dir,
        },
        from_template,
        port: template_port(&content),
    })
}

/// Prepare the service and run `docker compose up -d` in its directory.
pub fn service_up(
    tool: &dyn ExternalTool,
    home: &Path,
    name: &str,
    recreate: bool,
    mode: OutputMode,
) -> Result<PreparedService> {
    let prepared = prepare_service(home, name, recreate)?;
    tool::run_checked(
        tool,
        mode,
        "docker compose up",
        "docker",
        &["compose", "up", "-d"],
        Some(&prepared.service.path),
    )?;
    Ok(prepared)
}

/// `docker compose down`, with `-v` to drop volumes.
pub fn service_down(
    tool: &dyn ExternalTool,
    path: &Path,
    volumes: bool,
    mode: OutputMode,
) -> Result<()> {
    if !path.join(paths::COMPOSE_FILE).is_file() {
        return Err(KolynError::ServiceNotFound(path.display().to_string()));
    }
    let mut args = vec!["compose", "down"];
    if volumes {
        args.push("-v");
    }
    tool::run_checked(tool, mode, "docker compose down", "docker", &args, Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::fake::ScriptedTool;
    use tempfile::TempDir;

    const PG: &str = "services:\n  postgres:\n    image: postgres:15-alpine\n    ports:\n      - \"5432:5432\"\n";

    fn home_with_template() -> TempDir {
        let home = TempDir::new().unwrap();
        let templates = home.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("postgres.yml"), PG).unwrap();
        std::fs::write(templates.join("redis.yaml"), "services:\n  redis:\n    image: redis\n").unwrap();
        std::fs::write(templates.join("notes.txt"), "ignored").unwrap();
        home
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("postgres-dev"), "Postgres dev");
        assert_eq!(display_name("n8n"), "N8n");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn port_extraction() {
        assert_eq!(template_port(PG), "5432");
        assert_eq!(template_port("image: redis:7\n"), "?");
        assert_eq!(template_port("ports:\n  - 8080:80\n"), "8080");
    }

    #[test]
    fn templates_are_listed_sorted() {
        let home = home_with_template();
        let t = list_templates(home.path()).unwrap();
        let names: Vec<&str> = t.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["postgres", "redis"]);
        assert_eq!(t[0].port, "5432");
        assert_eq!(t[1].port, "?");
    }

    #[test]
    fn up_copies_template_then_runs_compose() {
        let home = home_with_template();
        let tool = ScriptedTool::new();
        let prepared = service_up(&tool, home.path(), "postgres", false, OutputMode::Inherit).unwrap();

        assert!(prepared.from_template);
        assert_eq!(prepared.port, "5432");
        let compose = home.path().join("services/postgres/docker-compose.yml");
        assert_eq!(std::fs::read_to_string(compose).unwrap(), PG);

        let calls = tool.calls.borrow();
        assert_eq!(calls[0].line(), "docker compose up -d");
        assert!(calls[0].interactive);
        assert_eq!(calls[0].cwd.as_deref(), Some(prepared.service.path.as_path()));
    }

    #[test]
    fn up_keeps_existing_compose() {
        let home = home_with_template();
        let dir = home.path().join("services/postgres");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("docker-compose.yml"), "custom: true\n").unwrap();

        let prepared = service_up(&ScriptedTool::new(), home.path(), "postgres", false, OutputMode::Inherit).unwrap();
        assert!(!prepared.from_template);
        assert_eq!(
            std::fs::read_to_string(dir.join("docker-compose.yml")).unwrap(),
            "custom: true\n"
        );

        let prepared = prepare_service(home.path(), "postgres", true).unwrap();
        assert!(prepared.from_template);
        assert_eq!(std::fs::read_to_string(dir.join("docker-compose.yml")).unwrap(), PG);
    }

    #[test]
    fn up_without_template_is_not_found() {
        let home = home_with_template();
        let err = service_up(&ScriptedTool::new(), home.path(), "mongodb", false, OutputMode::Inherit).unwrap_err();
        assert!(matches!(err, KolynError::ServiceNotFound(n) if n == "mongodb"));
    }

    #[test]
    fn up_failure_is_tool_failed() {
        let home = home_with_template();
        let tool = ScriptedTool::new().respond("", 1);
        assert!(matches!(
            service_up(&tool, home.path(), "redis", false, OutputMode::Inherit),
            Err(KolynError::ToolFailed { status: 1, .. })
        ));
    }

    #[test]
    fn up_captured_keeps_output_off_the_terminal() {
        let home = home_with_template();
        let tool = ScriptedTool::new();
        service_up(&tool, home.path(), "postgres", false, OutputMode::Capture).unwrap();

        let calls = tool.calls.borrow();
        assert_eq!(calls[0].line(), "docker compose up -d");
        assert!(!calls[0].interactive);
    }

    #[test]
    fn up_captured_failure_carries_output() {
        let home = home_with_template();
        let tool = ScriptedTool::new().respond_stderr("port is already allocated", 1);
        let err = service_up(&tool, home.path(), "postgres", false, OutputMode::Capture).unwrap_err();
        assert!(matches!(
            err,
            KolynError::ToolOutputFailed { status: 1, ref output, .. } if output.contains("already allocated")
        ));
    }

    #[test]
    fn list_only_dirs_with_compose() {
        let home = home_with_template();
        prepare_service(home.path(), "redis", false).unwrap();
        prepare_service(home.path(), "postgres", false).unwrap();
        std::fs::create_dir_all(home.path().join("services/empty")).unwrap();

        let services = list_services(&home.path().join("services")).unwrap();
        let ids: Vec<&str> = services.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["postgres", "redis"]);
        assert_eq!(services[0].name, "Postgres");
        assert!(find_service(&home.path().join("services"), "nope").is_err());
    }

    #[test]
    fn status_stopped_when_no_containers() {
        let tool = ScriptedTool::new().respond("\n", 0);
        assert_eq!(service_status(&tool, Path::new("/svc")), ServiceStatus::Stopped);
        assert_eq!(tool.lines(), vec!["docker compose ps -q"]);
    }

    #[test]
    fn status_running_from_inspect() {
        let tool = ScriptedTool::new().respond("abc123\ndef456\n", 0).respond("true\n", 0);
        assert_eq!(service_status(&tool, Path::new("/svc")), ServiceStatus::Running);
        assert_eq!(
            tool.lines()[1],
            "docker inspect -f {{.State.Running}} abc123"
        );
    }

    #[test]
    fn status_stopped_from_inspect() {
        let tool = ScriptedTool::new().respond("abc123\n", 0).respond("false\n", 0);
        assert_eq!(service_status(&tool, Path::new("/svc")), ServiceStatus::Stopped);
    }

    #[test]
    fn status_unknown_on_failures() {
        let tool = ScriptedTool::new().fail_spawn("docker");
        assert_eq!(service_status(&tool, Path::new("/svc")), ServiceStatus::Unknown);

        let tool = ScriptedTool::new().respond("", 1);
        assert_eq!(service_status(&tool, Path::new("/svc")), ServiceStatus::Unknown);

        let tool = ScriptedTool::new().respond("abc\n", 0).respond("", 1);
        assert_eq!(service_status(&tool, Path::new("/svc")), ServiceStatus::Unknown);
    }

    #[test]
    fn down_adds_volume_flag() {
        let home = home_with_template();
        let prepared = prepare_service(home.path(), "redis", false).unwrap();
        let tool = ScriptedTool::new();
        service_down(&tool, &prepared.service.path, true, OutputMode::Inherit).unwrap();
        service_down(&tool, &prepared.service.path, false, OutputMode::Inherit).unwrap();
        assert_eq!(
            tool.lines(),
            vec!["docker compose down -v", "docker compose down"]
        );
    }

    #[test]
    fn down_without_compose_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            service_down(&ScriptedTool::new(), dir.path(), false, OutputMode::Inherit),
            Err(KolynError::ServiceNotFound(_))
        ));
    }
}
