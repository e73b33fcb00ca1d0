use super::Ctx;
use crate::output::print_json;
use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
struct VersionInfo {
    version: &'static str,
    commit: &'static str,
    build_date: &'static str,
}

fn info() -> VersionInfo {
    VersionInfo {
        version: VERSION,
        commit: option_env!("KOLYN_COMMIT").unwrap_or("none"),
        build_date: option_env!("KOLYN_BUILD_DATE").unwrap_or("unknown"),
    }
}

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let info = info();
    if ctx.json {
        return print_json(&info);
    }
    println!("kolyn v{}", info.version);
    println!("  commit: {}", info.commit);
    println!("  built:  {}", info.build_date);
    Ok(())
}
