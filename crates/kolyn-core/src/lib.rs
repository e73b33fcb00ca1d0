pub mod audit;
pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod io;
pub mod locale;
pub mod manifest;
pub mod paths;
pub mod scaffold;
pub mod scan;
pub mod service;
pub mod skill;
pub mod ssh;
pub mod sync;
pub mod tool;

pub use error::{KolynError, Result};
