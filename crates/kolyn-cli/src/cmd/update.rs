use super::version::VERSION;
use super::Ctx;
use crate::output::{self, print_json};
use anyhow::Context;
use kolyn_core::tool::{self, ExternalTool};
use std::io::Write;

const REPO_RAW: &str = "https://raw.githubusercontent.com/isai-arellano/kolyn-cli/main";
const INSTALL_SCRIPT: &str = "install.sh";
const UNINSTALL_SCRIPT: &str = "uninstall.sh";

fn script_url(script: &str) -> String {
    format!("{REPO_RAW}/{script}")
}

/// Download a release script and run it with `sh`, attached to the terminal.
fn run_remote_script(tool: &dyn ExternalTool, script: &str) -> anyhow::Result<()> {
    let shell = which::which("sh").context("'sh' not found in PATH")?;
    let url = script_url(script);
    tracing::debug!(%url, "downloading script");

    let body = ureq::get(&url)
        .call()
        .with_context(|| format!("failed to download {url}"))?
        .into_string()
        .with_context(|| format!("failed to read {url}"))?;

    let mut file = tempfile::Builder::new()
        .prefix("kolyn-")
        .suffix(".sh")
        .tempfile()
        .context("failed to create temporary script")?;
    file.write_all(body.as_bytes())?;
    file.flush()?;

    let shell = shell.to_string_lossy().into_owned();
    let path = file.path().to_string_lossy().into_owned();
    let status = tool.run_interactive(&shell, &[path.as_str()], None)?;
    tool::require_success(script, status)?;
    Ok(())
}

pub fn run(ctx: &Ctx, tool: &dyn ExternalTool) -> anyhow::Result<()> {
    if !ctx.json {
        output::section("Kolyn update");
        output::step(format!("Current version: {VERSION}"));
        output::step(format!("Running {}", script_url(INSTALL_SCRIPT)));
    }
    run_remote_script(tool, INSTALL_SCRIPT)?;

    if ctx.json {
        return print_json(&serde_json::json!({ "previous_version": VERSION, "updated": true }));
    }
    output::success("Update finished. Run 'kolyn version' to confirm.");
    Ok(())
}

pub fn uninstall(ctx: &Ctx, tool: &dyn ExternalTool, yes: bool) -> anyhow::Result<()> {
    if !yes {
        if ctx.json {
            return print_json(&serde_json::json!({ "uninstalled": false, "script": script_url(UNINSTALL_SCRIPT) }));
        }
        output::warning("This removes the kolyn binary. Skills in ~/.kolyn are kept.");
        output::hint("Run 'kolyn uninstall --yes' to continue.");
        return Ok(());
    }

    if !ctx.json {
        output::step(format!("Running {}", script_url(UNINSTALL_SCRIPT)));
    }
    run_remote_script(tool, UNINSTALL_SCRIPT)?;

    if ctx.json {
        return print_json(&serde_json::json!({ "uninstalled": true }));
    }
    output::success("kolyn uninstalled");
    Ok(())
}
