use super::Ctx;
use crate::output::{self, print_json};
use colored::Colorize;
use kolyn_core::audit::{self, CheckRun};
use kolyn_core::locale::Msg;
use kolyn_core::KolynError;

/// `kolyn check`: audit the project against the skills listed in Agent.md.
///
/// Exits non-zero when any check fails or a referenced skill is missing.
pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let run = match audit::run_check(&ctx.root) {
        Ok(run) => run,
        Err(KolynError::AgentFileMissing(dir)) => {
            if ctx.json {
                return print_json(&serde_json::json!({ "agent_md": false, "root": dir }));
            }
            output::warning(format!("Agent.md not found in {dir}"));
            output::hint("Run 'kolyn init' first.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if ctx.json {
        print_json(&run)?;
    } else {
        render(ctx, &run);
    }

    let warnings = run.result.warnings;
    if warnings > 0 {
        anyhow::bail!(ctx.locale.audit_issues(warnings));
    }
    Ok(())
}

/// Only JavaScript projects are expected to carry a package.json.
fn expects_manifest(project_type: &str) -> bool {
    matches!(project_type, "nextjs" | "node")
}

fn render(ctx: &Ctx, run: &CheckRun) {
    let l = ctx.locale;
    let result = &run.result;

    output::section(l.text(Msg::CheckStart));
    output::info(l.project_overview(&run.project_type, run.active_skills));
    if !result.manifest_found && expects_manifest(&run.project_type) {
        output::warning(l.text(Msg::NoPackageJson));
    }
    if result.skills.is_empty() && result.missing_skills.is_empty() {
        output::info(l.text(Msg::NoSkills));
    }

    for report in &result.skills {
        println!();
        output::step(l.evaluating_skill(&report.name).bold());
        for check in &report.checks {
            let line = format!("  {}", l.describe_check(check));
            if check.passed {
                output::success(line);
            } else {
                output::fail(line);
            }
        }
        if let Some(advice) = &report.advice {
            println!("  {} {}", format!("{}:", l.text(Msg::Tip)).yellow(), advice);
        }
    }

    if !result.missing_skills.is_empty() {
        println!();
        for reference in &result.missing_skills {
            output::fail(l.missing_skill(reference));
        }
    }

    println!();
    output::separator();
    let summary = l.audit_summary(result.total_checks, result.passed_checks, result.warnings);
    if result.is_clean() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
}
