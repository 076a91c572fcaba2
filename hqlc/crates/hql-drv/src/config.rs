//! Compiler configuration (spec.md section 6 "CLI surface"), parsed out
//! of [`crate::cli::Cli`] into the plain value type the rest of the
//! driver consumes — grounded on `faxc-drv`'s `Config`/`OptLevel`/
//! `EmitType` shape, generalized from "what native artifact to produce"
//! to "what JS/TS syntax and source-map mode to emit".

use std::path::PathBuf;

use hql_gen::{EmitOptions, SourceMapMode, TargetSyntax};

/// What `--target` asked the driver to ultimately produce.
///
/// `Js` is the only target this build can carry all the way through: JS
/// is the pipeline's native output. `Native` is accepted (and parsed) so
/// the CLI surface matches spec.md section 6 in full, but the core
/// "does not execute code itself" (spec.md section 1's non-goal list),
/// so invoking "the platform's native packager" is left to a caller that
/// wants to shell out to one — this build reports it as unsupported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileTarget {
    Js,
    Native(String),
}

impl CompileTarget {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("js") {
            CompileTarget::Js
        } else {
            CompileTarget::Native(raw.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub target: CompileTarget,
    pub emit_syntax: TargetSyntax,
    pub source_map: SourceMapMode,
    pub verbose: bool,
    pub time: bool,
    pub debug: bool,
    pub cache_dir: PathBuf,
    pub force: bool,
    pub project_root: PathBuf,
    pub source_dir: PathBuf,
}

impl Config {
    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            target_syntax: self.emit_syntax,
            indent_width: 2,
            source_map_mode: self.source_map,
        }
    }
}

/// `$HOME`/`%USERPROFILE%` are consulted only for the cache directory
/// location (spec.md section 6 "Environment") — never for anything that
/// would change compilation semantics.
pub fn default_cache_dir() -> PathBuf {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    match home {
        Some(home) => PathBuf::from(home).join(".cache").join("hql"),
        None => PathBuf::from(".hql-cache"),
    }
}
