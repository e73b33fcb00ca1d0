use super::version::VERSION;
use super::Ctx;
use crate::output::{self, print_json};
use anyhow::Context;
use kolyn_core::context::{self, InitOptions, InitReport};
use kolyn_core::locale::{Locale, Msg};
use std::path::Path;

/// `kolyn init`: vendor the selected skills and (re)generate Agent.md.
///
/// Skills already vendored in `.kolyn/skills/` stay active; the selection
/// only adds to them.
pub fn run(ctx: &Ctx, skills: &[String], auto: bool) -> anyhow::Result<()> {
    let opts = InitOptions {
        selectors: skills.to_vec(),
        auto,
        version: VERSION.to_string(),
    };
    let report = init_at(ctx, &ctx.root, &opts)?;

    if ctx.json {
        return print_json(&report);
    }
    print_report(ctx.locale, &report);
    Ok(())
}

pub(crate) fn init_at(ctx: &Ctx, root: &Path, opts: &InitOptions) -> anyhow::Result<InitReport> {
    context::init_project(root, &ctx.home, opts, &ctx.cancel)
        .with_context(|| format!("failed to initialize {}", root.display()))
}

pub(crate) fn print_report(locale: Locale, report: &InitReport) {
    output::section(locale.text(Msg::InitTitle));
    output::info(locale.project_type(&report.project_type));
    for link in &report.vendored {
        output::success(locale.vendored(link));
    }
    println!("  {}", locale.agent_file(report.outcome));
    println!("  {}", locale.active_skills(report.active_skills));
    if report.active_skills == 0 {
        output::hint(locale.text(Msg::AddSkillsHint));
    }
}
