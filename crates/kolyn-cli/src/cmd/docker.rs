use super::Ctx;
use crate::output::{self, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use kolyn_core::paths;
use kolyn_core::service::{self, ServiceStatus};
use kolyn_core::tool::{ExternalTool, OutputMode};
use serde::Serialize;

#[derive(Subcommand)]
pub enum DockerSubcommand {
    /// Start a service from ~/.kolyn/templates/<name>.yml (lists templates when no name is given)
    Up {
        /// Template / service name
        name: Option<String>,
        /// Rewrite the service's compose file from its template first
        #[arg(long)]
        recreate: bool,
    },

    /// Stop a running service
    Down {
        /// Service name
        name: String,
        /// Also remove the service's volumes
        #[arg(long, short = 'V')]
        volumes: bool,
    },

    /// Show every service and whether it is running
    #[command(visible_alias = "ls")]
    Status,
}

pub fn run(ctx: &Ctx, tool: &dyn ExternalTool, subcmd: DockerSubcommand) -> anyhow::Result<()> {
    match subcmd {
        DockerSubcommand::Up { name: None, .. } => templates(ctx),
        DockerSubcommand::Up {
            name: Some(name),
            recreate,
        } => up(ctx, tool, &name, recreate),
        DockerSubcommand::Down { name, volumes } => down(ctx, tool, &name, volumes),
        DockerSubcommand::Status => status(ctx, tool),
    }
}

/// With `--json`, compose output is captured so stdout holds one document.
fn compose_output(ctx: &Ctx) -> OutputMode {
    if ctx.json {
        OutputMode::Capture
    } else {
        OutputMode::Inherit
    }
}

fn templates(ctx: &Ctx) -> anyhow::Result<()> {
    let templates = service::list_templates(&ctx.home).context("failed to read templates")?;
    if ctx.json {
        return print_json(&templates);
    }
    let dir = paths::templates_dir(&ctx.home);
    if templates.is_empty() {
        output::warning(format!("No templates found in {}", dir.display()));
        output::hint("Add docker compose files there as <name>.yml.");
        return Ok(());
    }
    let rows = templates
        .iter()
        .map(|t| vec![t.name.clone(), t.port.clone(), t.path.display().to_string()])
        .collect();
    print_table(&["TEMPLATE", "PORT", "PATH"], rows);
    output::hint("Start one with 'kolyn docker up <name>'.");
    Ok(())
}

fn up(ctx: &Ctx, tool: &dyn ExternalTool, name: &str, recreate: bool) -> anyhow::Result<()> {
    if !ctx.json {
        output::step(format!("Starting service '{name}'..."));
    }
    let prepared = service::service_up(tool, &ctx.home, name, recreate, compose_output(ctx))
        .with_context(|| format!("failed to start service '{name}'"))?;

    if ctx.json {
        return print_json(&prepared);
    }
    let dir = prepared.service.path.display();
    if prepared.from_template {
        println!("  created: {}", prepared.service.compose_path().display());
    }
    output::success(format!("Service '{}' started", prepared.service.name));
    output::hint(format!("Logs:   cd {dir} && docker compose logs -f"));
    output::hint(format!("Stop:   kolyn docker down {name}"));
    output::hint(format!("Access: http://localhost:{}", prepared.port));
    Ok(())
}

fn down(ctx: &Ctx, tool: &dyn ExternalTool, name: &str, volumes: bool) -> anyhow::Result<()> {
    let svc = service::find_service(&paths::services_dir(&ctx.home), name)?;
    if !ctx.json {
        output::step(format!("Stopping service '{}'...", svc.name));
    }
    service::service_down(tool, &svc.path, volumes, compose_output(ctx))
        .with_context(|| format!("failed to stop service '{name}'"))?;

    if ctx.json {
        return print_json(&serde_json::json!({ "service": svc, "stopped": true, "volumes_removed": volumes }));
    }
    output::success(format!("Service '{}' stopped", svc.name));
    Ok(())
}

#[derive(Serialize)]
struct StatusRow {
    id: String,
    name: String,
    path: String,
    status: ServiceStatus,
}

fn status(ctx: &Ctx, tool: &dyn ExternalTool) -> anyhow::Result<()> {
    let services = service::list_services(&paths::services_dir(&ctx.home))
        .context("failed to list services")?;

    let rows: Vec<StatusRow> = services
        .into_iter()
        .map(|s| StatusRow {
            status: service::service_status(tool, &s.path),
            path: s.path.display().to_string(),
            id: s.id,
            name: s.name,
        })
        .collect();

    if ctx.json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        output::info("No services yet. Start one with 'kolyn docker up <name>'.");
        return Ok(());
    }
    print_table(
        &["SERVICE", "NAME", "STATUS", "PATH"],
        rows.into_iter()
            .map(|r| vec![r.id, r.name, r.status.to_string(), r.path])
            .collect(),
    );
    Ok(())
}
