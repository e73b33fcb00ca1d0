mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, docker::DockerSubcommand, skills::SkillsSubcommand,
    ssh::SshSubcommand, Ctx,
};
use kolyn_core::cancel::CancelFlag;
use kolyn_core::locale::Locale;
use kolyn_core::tool::SystemTool;
use kolyn_core::{config, paths, KolynError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kolyn",
    about = "AI skill orchestrator: Agent.md context, project audits, skill sync and local services",
    version,
    propagate_version = true,
    arg_required_else_help = true
)]
struct Cli {
    /// Project root (default: auto-detect from Agent.md, .kolyn.json or .git)
    #[arg(long, global = true, env = "KOLYN_ROOT")]
    root: Option<PathBuf>,

    /// Kolyn home holding skills, sources, services and templates (default: ~/.kolyn)
    #[arg(long, global = true, env = "KOLYN_HOME")]
    home: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Message language: en or es (default: from config.json)
    #[arg(long, global = true)]
    lang: Option<Locale>,

    /// Enable debug logging
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vendor skills into .kolyn/skills/ and generate Agent.md
    Init {
        /// Skill to vendor (name, category/name or path); repeatable
        #[arg(long = "skill", short = 's', value_name = "SKILL")]
        skills: Vec<String>,
        /// Also vendor every skill whose applies_to matches the detected project type
        #[arg(long)]
        auto: bool,
    },

    /// Audit the project against the rules of its active skills
    Check,

    /// Clone or pull the configured skill sources
    Sync,

    /// Audit a project's structure against a scaffold skill, or create a new project
    Scaffold {
        /// Scaffold skill (name, category/name or path)
        skill: String,
        /// Create missing directories and files
        #[arg(long)]
        fix: bool,
        /// Create a new project with this name in the current directory
        #[arg(long, value_name = "NAME", conflicts_with = "fix")]
        new: Option<String>,
    },

    /// Manage global and project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Browse and author skills
    Skills {
        #[command(subcommand)]
        subcommand: Option<SkillsSubcommand>,
    },

    /// Manage local Docker Compose services
    Docker {
        #[command(subcommand)]
        subcommand: DockerSubcommand,
    },

    /// Provision SSH keys and host aliases
    Ssh {
        #[command(subcommand)]
        subcommand: SshSubcommand,
    },

    /// Show version and build information
    Version,

    /// Download and run the latest installer
    Update,

    /// Remove kolyn from this machine
    Uninstall {
        /// Confirm removal
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_flag.is_cancelled() {
            std::process::exit(130);
        }
        handler_flag.cancel();
    }) {
        tracing::debug!(%e, "ctrl-c handler not installed");
    }

    let home = match paths::kolyn_home(cli.home.as_deref()) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let root = root::resolve_root(cli.root.as_deref());
    let locale = cli
        .lang
        .unwrap_or_else(|| config::configured_locale(&home));
    tracing::debug!(root = %root.display(), home = %home.display(), %locale, "resolved context");

    let ctx = Ctx {
        root,
        home,
        json: cli.json,
        locale,
        cancel,
    };
    let tool = SystemTool;

    let result = match cli.command {
        Commands::Init { skills, auto } => cmd::init::run(&ctx, &skills, auto),
        Commands::Check => cmd::check::run(&ctx),
        Commands::Sync => cmd::sync::run(&ctx, &tool),
        Commands::Scaffold { skill, fix, new } => {
            cmd::scaffold::run(&ctx, &tool, &skill, fix, new.as_deref())
        }
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
        Commands::Skills { subcommand } => cmd::skills::run(&ctx, &tool, subcommand),
        Commands::Docker { subcommand } => cmd::docker::run(&ctx, &tool, subcommand),
        Commands::Ssh { subcommand } => cmd::ssh::run(&ctx, &tool, subcommand),
        Commands::Version => cmd::version::run(&ctx),
        Commands::Update => cmd::update::run(&ctx, &tool),
        Commands::Uninstall { yes } => cmd::update::uninstall(&ctx, &tool, yes),
    };

    if let Err(e) = result {
        if matches!(e.downcast_ref::<KolynError>(), Some(KolynError::Cancelled)) {
            eprintln!("cancelled");
            std::process::exit(130);
        }
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
