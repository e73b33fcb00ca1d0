use super::Ctx;
use crate::output::{self, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use kolyn_core::scan::{self, SkillScanner};
use kolyn_core::skill::{self, Skill};
use kolyn_core::tool::{self, ExternalTool};
use kolyn_core::{io, paths, KolynError};
use serde::Serialize;

#[derive(Subcommand)]
pub enum SkillsSubcommand {
    /// List every skill in the library and synced sources (default)
    List,

    /// Print one skill path per line
    Paths,

    /// Print a skill's content
    Show {
        /// Skill name, category/name or path
        name: String,
    },

    /// Open a skill in $EDITOR
    Edit {
        /// Skill name, category/name or path
        name: String,
    },

    /// Create a new skill from the standard template
    New {
        /// Lowercase name with hyphens, e.g. flutter-riverpod
        name: String,
        /// Overwrite an existing skill
        #[arg(long)]
        force: bool,
    },
}

pub fn run(
    ctx: &Ctx,
    tool: &dyn ExternalTool,
    subcmd: Option<SkillsSubcommand>,
) -> anyhow::Result<()> {
    match subcmd.unwrap_or(SkillsSubcommand::List) {
        SkillsSubcommand::List => list(ctx),
        SkillsSubcommand::Paths => list_paths(ctx),
        SkillsSubcommand::Show { name } => show(ctx, &name),
        SkillsSubcommand::Edit { name } => edit(ctx, tool, &name),
        SkillsSubcommand::New { name, force } => new(ctx, &name, force),
    }
}

fn catalog(ctx: &Ctx) -> anyhow::Result<Vec<Skill>> {
    let mut skills = SkillScanner::for_home(&ctx.home).scan(&ctx.cancel)?;
    scan::sort_skills(&mut skills);
    Ok(skills)
}

fn lookup(ctx: &Ctx, name: &str) -> anyhow::Result<Skill> {
    let skills = catalog(ctx)?;
    let found = scan::find_skill(&skills, name)
        .ok_or_else(|| KolynError::SkillNotFound(name.to_string()))?;
    Ok(found.clone())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SkillsJson<'a> {
    total_skills: usize,
    skills_dir: String,
    skills: &'a [Skill],
}

fn list(ctx: &Ctx) -> anyhow::Result<()> {
    let skills = catalog(ctx)?;
    let skills_dir = paths::skills_dir(&ctx.home);

    if ctx.json {
        return print_json(&SkillsJson {
            total_skills: skills.len(),
            skills_dir: skills_dir.display().to_string(),
            skills: &skills,
        });
    }

    if skills.is_empty() {
        output::warning(format!(
            "No skills found in {} or {}",
            skills_dir.display(),
            paths::sources_dir(&ctx.home).display()
        ));
        output::hint("Run 'kolyn sync' or 'kolyn skills new <name>'.");
        return Ok(());
    }

    let rows = skills
        .iter()
        .map(|s| {
            vec![
                s.category.clone(),
                s.name.clone(),
                if s.has_rules() { "yes" } else { "" }.to_string(),
                s.description.clone(),
            ]
        })
        .collect();
    print_table(&["CATEGORY", "NAME", "RULES", "DESCRIPTION"], rows);
    println!("\n{} skills", skills.len());
    Ok(())
}

fn list_paths(ctx: &Ctx) -> anyhow::Result<()> {
    let skills = catalog(ctx)?;
    if ctx.json {
        let paths: Vec<_> = skills.iter().map(|s| &s.path).collect();
        return print_json(&paths);
    }
    for s in &skills {
        println!("{}", s.path.display());
    }
    Ok(())
}

fn show(ctx: &Ctx, name: &str) -> anyhow::Result<()> {
    let skill = lookup(ctx, name)?;
    let content = std::fs::read_to_string(&skill.path)
        .with_context(|| format!("failed to read {}", skill.path.display()))?;
    if ctx.json {
        return print_json(&serde_json::json!({ "skill": skill, "content": content }));
    }
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn edit(ctx: &Ctx, tool: &dyn ExternalTool, name: &str) -> anyhow::Result<()> {
    let skill = lookup(ctx, name)?;
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| "vim".to_string());

    // EDITOR may carry flags, e.g. "code --wait".
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vim");
    let path = skill.path.to_string_lossy().into_owned();
    let args: Vec<&str> = parts.chain(std::iter::once(path.as_str())).collect();

    let status = tool.run_interactive(program, &args, None)?;
    tool::require_success(program, status)?;
    Ok(())
}

fn new(ctx: &Ctx, name: &str, force: bool) -> anyhow::Result<()> {
    paths::validate_skill_name(name)?;
    let path = paths::skills_dir(&ctx.home).join(format!("{name}.md"));
    if path.exists() && !force {
        return Err(KolynError::SkillExists(path.display().to_string()).into());
    }

    let existed = path.exists();
    io::atomic_write(&path, skill::skill_template(name).as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    if ctx.json {
        return print_json(&serde_json::json!({ "name": name, "path": path }));
    }
    if existed {
        println!("  updated: {}", path.display());
    } else {
        println!("  created: {}", path.display());
    }
    output::hint(format!("Edit it with 'kolyn skills edit {name}'."));
    Ok(())
}
