//! `hql-drv` — the `hqlc` binary's library half: CLI parsing, pipeline
//! orchestration, and diagnostic rendering, kept separate from `main.rs`
//! so the driver is testable without spawning a process (mirrors
//! `faxc-drv`'s split between its library and `faxc` binary crates).

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;

pub use cli::{Cli, Commands, CompileCommand};
pub use config::{default_cache_dir, CompileTarget, Config};
pub use error::{DriverError, Result};
pub use pipeline::{compile, CompileOutcome};
