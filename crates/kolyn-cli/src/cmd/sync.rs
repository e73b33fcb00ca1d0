use super::Ctx;
use crate::output::{self, print_json};
use anyhow::Context;
use kolyn_core::config::{self, SourceOrigin};
use kolyn_core::locale::Msg;
use kolyn_core::sync::{self, SyncAction};
use kolyn_core::tool::ExternalTool;
use kolyn_core::{paths, KolynError};
use serde::Serialize;

#[derive(Serialize)]
struct SyncRow {
    url: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `kolyn sync`: clone or pull every configured skill source.
///
/// A failing source does not stop the others; the command fails at the end
/// if any of them did.
pub fn run(ctx: &Ctx, tool: &dyn ExternalTool) -> anyhow::Result<()> {
    let l = ctx.locale;
    let (origin, sources) = config::effective_sources(&ctx.root, &ctx.home)
        .context("failed to read skill source configuration")?;

    if sources.is_empty() {
        if ctx.json {
            return print_json(&Vec::<SyncRow>::new());
        }
        output::info(l.text(Msg::NoSources));
        return Ok(());
    }

    if !ctx.json {
        match origin {
            SourceOrigin::Project => output::info(l.text(Msg::UsingLocal)),
            SourceOrigin::Global => output::info(l.text(Msg::UsingGlobal)),
            SourceOrigin::None => {}
        }
        output::section(l.text(Msg::SyncStart));
    }

    let sources_dir = paths::sources_dir(&ctx.home);
    let mut rows = Vec::with_capacity(sources.len());
    for url in &sources {
        ctx.cancel.check()?;

        if !ctx.json {
            let dest = sync::source_dest(&sources_dir, url);
            if dest.exists() {
                output::step(l.updating_skills(&dest.display().to_string()));
            } else {
                output::step(l.installing_skills(url));
            }
        }

        match sync::sync_source(tool, url, &sources_dir) {
            Ok(synced) => {
                let status = match synced.action {
                    SyncAction::Cloned => "cloned",
                    SyncAction::Pulled => "pulled",
                };
                if !ctx.json {
                    output::success(format!("{status}: {}", synced.dest.display()));
                }
                rows.push(SyncRow {
                    url: url.clone(),
                    status,
                    error: None,
                });
            }
            Err(e) => {
                if !ctx.json {
                    output::fail(format!("{url}: {e}"));
                    if matches!(e, KolynError::RepoAccess { .. }) {
                        output::hint(l.text(Msg::RepoAccessError));
                    }
                }
                rows.push(SyncRow {
                    url: url.clone(),
                    status: "failed",
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    if ctx.json {
        print_json(&rows)?;
    } else if failed == 0 {
        output::separator();
        output::success(l.text(Msg::SyncSuccess));
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} sources failed to sync", rows.len());
    }
    Ok(())
}
