pub mod check;
pub mod config;
pub mod docker;
pub mod init;
pub mod scaffold;
pub mod skills;
pub mod ssh;
pub mod sync;
pub mod update;
pub mod version;

use kolyn_core::cancel::CancelFlag;
use kolyn_core::locale::Locale;
use std::path::PathBuf;

/// Resolved global options shared by every command.
pub struct Ctx {
    pub root: PathBuf,
    pub home: PathBuf,
    pub json: bool,
    pub locale: Locale,
    pub cancel: CancelFlag,
}
