//! Command-line surface (spec.md section 6): a single `compile` operation,
//! grounded on `faxt/src/main.rs`'s `#[derive(Parser)]`/`#[derive(Subcommand)]`
//! shape — global flags with `env` fallbacks, one struct per subcommand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{default_cache_dir, CompileTarget, Config};
use hql_gen::{SourceMapMode, TargetSyntax};

/// `hqlc` - the HQL-to-JavaScript compiler driver.
#[derive(Parser, Debug)]
#[command(name = "hqlc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiles HQL source to JavaScript or TypeScript", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print phase-by-phase progress to stderr.
    #[arg(short, long, global = true, env = "HQLC_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile an HQL entry file and its imports.
    Compile(CompileCommand),
}

#[derive(Parser, Debug)]
pub struct CompileCommand {
    /// Entry `.hql` source file.
    pub input: PathBuf,

    /// What to ultimately produce. `js` (the default) is the only target
    /// this build carries all the way through; any other value names a
    /// native platform and is reported as unsupported.
    #[arg(long, default_value = "js")]
    pub target: String,

    /// Write the compiled output to this path instead of leaving it in
    /// the cache directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit TypeScript instead of JavaScript.
    #[arg(long, default_value = "js")]
    pub emit: String,

    /// Source map mode: `none`, `inline`, or `external`.
    #[arg(long, default_value = "external")]
    pub source_map: String,

    /// Print timing for each pipeline phase.
    #[arg(long)]
    pub time: bool,

    /// Keep intermediate diagnostics and enable debug-level logging.
    #[arg(long)]
    pub debug: bool,

    /// Cache directory for transpiled modules (default: `$HOME/.cache/hql`).
    #[arg(long, env = "HQLC_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Re-transpile every file even if a fresh cache entry exists.
    #[arg(long)]
    pub force: bool,

    /// Project root used for the `project_root`-relative import step
    /// (default: the entry file's directory).
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Source directory used for the `source_dir`-relative import step
    /// (default: the entry file's directory).
    #[arg(long)]
    pub source_dir: Option<PathBuf>,
}

impl CompileCommand {
    pub fn into_config(self, verbose: bool) -> Config {
        let input = self.input;
        let entry_dir = input.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

        let emit_syntax = if self.emit.eq_ignore_ascii_case("ts") { TargetSyntax::Ts } else { TargetSyntax::Js };
        let source_map = match self.source_map.as_str() {
            "none" => SourceMapMode::None,
            "inline" => SourceMapMode::Inline,
            _ => SourceMapMode::External,
        };

        Config {
            target: CompileTarget::parse(&self.target),
            output: self.output,
            emit_syntax,
            source_map,
            verbose,
            time: self.time,
            debug: self.debug,
            cache_dir: self.cache_dir.unwrap_or_else(default_cache_dir),
            force: self.force,
            project_root: self.project_root.unwrap_or_else(|| entry_dir.clone()),
            source_dir: self.source_dir.unwrap_or(entry_dir),
            input,
        }
    }
}
