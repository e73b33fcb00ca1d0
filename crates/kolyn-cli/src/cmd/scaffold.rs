use super::init::{init_at, print_report};
use super::version::VERSION;
use super::Ctx;
use crate::output::{self, print_json};
use anyhow::Context;
use kolyn_core::context::InitOptions;
use kolyn_core::locale::{Locale, Msg};
use kolyn_core::scaffold::{self, EntryState, ScaffoldSpec, StructureReport};
use kolyn_core::scan::{self, SkillScanner};
use kolyn_core::tool::ExternalTool;
use kolyn_core::KolynError;

pub fn run(
    ctx: &Ctx,
    tool: &dyn ExternalTool,
    skill: &str,
    fix: bool,
    new: Option<&str>,
) -> anyhow::Result<()> {
    let spec = load_spec(ctx, skill)?;
    match new {
        Some(name) => create(ctx, tool, &spec, name),
        None => audit(ctx, &spec, fix),
    }
}

fn load_spec(ctx: &Ctx, selector: &str) -> anyhow::Result<ScaffoldSpec> {
    let catalog = SkillScanner::for_home(&ctx.home)
        .require_any_root()
        .scan(&ctx.cancel)?;
    let skill = scan::find_skill(&catalog, selector)
        .ok_or_else(|| KolynError::SkillNotFound(selector.to_string()))?;
    let spec = scaffold::load_scaffold(&skill.path)
        .with_context(|| format!("'{}' is not a scaffold skill", skill.display_name()))?;
    Ok(spec)
}

fn audit(ctx: &Ctx, spec: &ScaffoldSpec, fix: bool) -> anyhow::Result<()> {
    let report = scaffold::apply_structure(&ctx.root, &spec.structure, fix)
        .with_context(|| format!("failed to apply structure in {}", ctx.root.display()))?;

    if ctx.json {
        print_json(&report)?;
    } else {
        output::section(ctx.locale.text(Msg::ScaffoldTitle));
        output::step(ctx.locale.checking_structure(&ctx.root.display().to_string()));
        print_entries(ctx.locale, &report);
    }

    let missing = report.missing();
    if missing > 0 {
        if !ctx.json {
            output::hint(ctx.locale.text(Msg::ScaffoldFixHint));
        }
        anyhow::bail!(ctx.locale.scaffold_missing(missing));
    }
    Ok(())
}

fn create(ctx: &Ctx, tool: &dyn ExternalTool, spec: &ScaffoldSpec, name: &str) -> anyhow::Result<()> {
    if name.trim().is_empty() || name.contains(['/', '\\']) || name == ".." {
        anyhow::bail!("invalid project name '{name}'");
    }
    let parent = std::env::current_dir().context("failed to read current directory")?;
    if parent.join(name).exists() {
        anyhow::bail!("'{name}' already exists in {}", parent.display());
    }

    if !ctx.json {
        output::section(ctx.locale.text(Msg::ScaffoldTitle));
        let argv = spec.command_for(name);
        if !argv.is_empty() {
            output::step(ctx.locale.running_command(&argv.join(" ")));
        }
    }

    let (project, report) = scaffold::create_project(tool, &parent, spec, name)
        .with_context(|| format!("failed to create project '{name}'"))?;
    let init = init_at(
        ctx,
        &project,
        &InitOptions {
            version: VERSION.to_string(),
            ..Default::default()
        },
    )?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "project": project,
            "structure": report,
            "init": init,
        }));
    }

    print_entries(ctx.locale, &report);
    print_report(ctx.locale, &init);
    output::separator();
    output::success(ctx.locale.project_ready(name));
    output::hint(format!("cd {name} && kolyn check"));
    Ok(())
}

fn print_entries(locale: Locale, report: &StructureReport) {
    for entry in &report.entries {
        let line = locale.structure_entry(entry.state, entry.kind, &entry.path);
        match entry.state {
            EntryState::Existing | EntryState::Created => output::success(line),
            EntryState::Missing => output::fail(line),
        }
    }
}
