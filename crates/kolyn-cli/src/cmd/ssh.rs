use super::Ctx;
use crate::output::{self, print_json};
use anyhow::Context;
use clap::Subcommand;
use kolyn_core::ssh;
use kolyn_core::tool::ExternalTool;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum SshSubcommand {
    /// Generate an ed25519 key and add a Host alias to ~/.ssh/config
    Create {
        /// Key and host alias name
        name: String,
        /// Server address
        host: String,
        /// Remote user
        #[arg(default_value = "root")]
        user: String,
        /// Copy the public key to the server with ssh-copy-id
        #[arg(long)]
        copy: bool,
        /// SSH directory (default: ~/.ssh)
        #[arg(long, env = "KOLYN_SSH_DIR")]
        ssh_dir: Option<PathBuf>,
    },
}

pub fn run(ctx: &Ctx, tool: &dyn ExternalTool, subcmd: SshSubcommand) -> anyhow::Result<()> {
    match subcmd {
        SshSubcommand::Create {
            name,
            host,
            user,
            copy,
            ssh_dir,
        } => {
            let ssh_dir = match ssh_dir {
                Some(d) => d,
                None => ssh::default_ssh_dir()?,
            };
            create(ctx, tool, &ssh_dir, &name, &host, &user, copy)
        }
    }
}

fn create(
    ctx: &Ctx,
    tool: &dyn ExternalTool,
    ssh_dir: &std::path::Path,
    name: &str,
    host: &str,
    user: &str,
    copy: bool,
) -> anyhow::Result<()> {
    if !ctx.json {
        output::section(format!("SSH access: {name}"));
        output::step("Generating ed25519 key pair...");
    }
    let key = ssh::create_key(tool, ssh_dir, name, host, user)
        .with_context(|| format!("failed to create ssh key '{name}'"))?;

    if ctx.json {
        print_json(&key)?;
    } else {
        output::success(format!("Key written to {}", key.key_path.display()));
        output::success(format!("Host '{name}' added to {}", key.config_path.display()));
    }

    let pub_path = key.public_key_path();
    if copy {
        if !ctx.json {
            output::step("Copying public key (the server will ask for a password)...");
        }
        ssh::copy_key(tool, &key).context("ssh-copy-id failed")?;
        if !ctx.json {
            output::success(format!("Access configured. Connect with: ssh {name}"));
        }
    } else if !ctx.json {
        output::info("Public key not copied. Add it to the server manually:");
        output::hint(format!("ssh-copy-id -i {} {user}@{host}", pub_path.display()));
        if let Ok(content) = std::fs::read_to_string(&pub_path) {
            println!("{}", content.trim_end());
        }
    }
    Ok(())
}
