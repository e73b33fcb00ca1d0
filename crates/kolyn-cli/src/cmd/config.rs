use super::Ctx;
use crate::output::{self, print_json};
use anyhow::Context;
use clap::Subcommand;
use kolyn_core::config::{GlobalConfig, ProjectConfig};
use kolyn_core::locale::{Locale, Msg};
use kolyn_core::paths;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write the global config (~/.kolyn/config.json)
    Init {
        /// Message language: en or es
        #[arg(long, default_value = "es")]
        language: Locale,
        /// Skill repository URL; repeatable
        #[arg(long = "source", value_name = "URL")]
        sources: Vec<String>,
    },

    /// Show the global config
    Show,

    /// Write the project config (.kolyn.json)
    Project {
        /// Project name (default: the project directory name)
        #[arg(long)]
        name: Option<String>,
        /// Skill repository URL; repeatable
        #[arg(long = "source", value_name = "URL")]
        sources: Vec<String>,
    },
}

pub fn run(ctx: &Ctx, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init { language, sources } => init(ctx, language, sources),
        ConfigSubcommand::Show => show(ctx),
        ConfigSubcommand::Project { name, sources } => project(ctx, name, sources),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn init(ctx: &Ctx, language: Locale, sources: Vec<String>) -> anyhow::Result<()> {
    let cfg = GlobalConfig {
        language,
        skills_sources: sources,
    };
    cfg.save(&ctx.home).context("failed to write global config")?;

    if ctx.json {
        return print_json(&cfg);
    }
    // Confirm in the newly chosen language.
    output::success(language.text(Msg::GlobalCreated));
    println!("  path: {}", paths::global_config_path(&ctx.home).display());
    if cfg.skills_sources.is_empty() {
        output::hint("No skill sources configured. Add them later with 'kolyn config init --source <url>'.");
    } else {
        output::hint("Run 'kolyn sync' to download these skills.");
    }
    Ok(())
}

fn show(ctx: &Ctx) -> anyhow::Result<()> {
    let cfg = GlobalConfig::load(&ctx.home).context("failed to read global config")?;
    if ctx.json {
        return print_json(&cfg);
    }
    let Some(cfg) = cfg else {
        output::info("No global config found. Run 'kolyn config init'.");
        return Ok(());
    };
    println!("path:      {}", paths::global_config_path(&ctx.home).display());
    println!("language:  {}", cfg.language);
    if cfg.skills_sources.is_empty() {
        println!("sources:   (none)");
    } else {
        println!("sources:");
        for s in &cfg.skills_sources {
            println!("  - {s}");
        }
    }
    Ok(())
}

fn project(ctx: &Ctx, name: Option<String>, sources: Vec<String>) -> anyhow::Result<()> {
    let existing = ProjectConfig::load(&ctx.root).context("failed to read .kolyn.json")?;
    let created = existing.is_none();
    let mut cfg = existing.unwrap_or_default();

    if let Some(n) = name {
        cfg.project_name = n;
    }
    if cfg.project_name.is_empty() {
        cfg.project_name = ctx
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
    }
    if !sources.is_empty() {
        cfg.skills_sources = sources;
    }
    cfg.save(&ctx.root).context("failed to write .kolyn.json")?;

    if ctx.json {
        return print_json(&cfg);
    }
    if created {
        println!("  created: {}", paths::PROJECT_CONFIG_FILE);
    } else {
        println!("  updated: {}", paths::PROJECT_CONFIG_FILE);
    }
    println!("  project: {}", cfg.project_name);
    println!("  sources: {}", cfg.skills_sources.len());
    Ok(())
}
