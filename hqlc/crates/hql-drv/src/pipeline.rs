//! Pipeline orchestration (spec.md section 2 "pull-based multi-stage
//! pipeline"): parse → macro-expand → analyze first, against the entry
//! file's own source map so diagnostics render with full source context;
//! then `hql-bundler` re-walks the same file (and its whole import
//! graph) to produce the cached, ESM-valid output this command actually
//! ships. Grounded on `faxc-drv::Session::compile`'s phase-by-phase shape,
//! generalized from Fax's single-file native chain to HQL's
//! resolve-and-cache whole-program chain.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use hql_bundler::{BundleOptions, Bundler, NativeBundler};
use hql_util::{diagnostic::Diagnostic, Handler, SourceMap as HqlSourceMap};

use crate::config::{CompileTarget, Config};
use crate::diagnostics::{error_count, render_all};
use crate::error::{DriverError, Result};

pub struct CompileOutcome {
    pub output_path: PathBuf,
    pub map_path: Option<PathBuf>,
    pub rendered_diagnostics: String,
    pub timings: Vec<(&'static str, Duration)>,
}

pub fn compile(config: &Config) -> Result<CompileOutcome> {
    if let CompileTarget::Native(name) = &config.target {
        return Err(DriverError::UnsupportedTarget(name.clone()));
    }

    let mut timings = Vec::new();
    let source = fs::read_to_string(&config.input).map_err(|e| DriverError::Io(config.input.clone(), e))?;

    let mut sources = HqlSourceMap::new();
    let file_id = sources.add_file(config.input.to_string_lossy().into_owned(), source.clone());
    let handler = Handler::new();

    let started = Instant::now();
    let forms = hql_par::parse(&source, file_id, &handler);
    timings.push(("parse", started.elapsed()));

    let started = Instant::now();
    let expanded = hql_macro::expand(forms, &handler);
    timings.push(("macro-expand", started.elapsed()));

    let started = Instant::now();
    let _symbols = hql_sem::analyze(&expanded, &handler);
    timings.push(("analyze", started.elapsed()));

    let front_diags = handler.diagnostics();
    let mut rendered = render_all(&sources, &front_diags);
    if handler.has_errors() {
        tracing::error!("{rendered}");
        return Err(DriverError::CompilationFailed(config.input.clone(), error_count(&front_diags)));
    }

    let bundle_opts = BundleOptions {
        project_root: config.project_root.clone(),
        source_dir: config.source_dir.clone(),
        cache_dir: config.cache_dir.clone(),
        emit: config.emit_options(),
        force: config.force,
    };
    let native_bundler = NativeBundler;
    let bundler = Bundler::new(bundle_opts, &native_bundler)
        .map_err(|e| DriverError::Io(config.cache_dir.clone(), e))?;

    let bundle_handler = Handler::new();
    let started = Instant::now();
    let manifest = bundler.bundle(&config.input, &bundle_handler)?;
    timings.push(("bundle", started.elapsed()));

    let bundle_diags = bundle_handler.diagnostics();
    rendered.push_str(&render_without_snippets(&bundle_diags));
    if bundle_handler.has_errors() {
        tracing::error!("{rendered}");
        return Err(DriverError::CompilationFailed(config.input.clone(), error_count(&bundle_diags)));
    }

    let (output_path, map_path) = place_output(config, &manifest.entry.code_path, manifest.entry.map_path.as_deref())?;

    Ok(CompileOutcome { output_path, map_path, rendered_diagnostics: rendered, timings })
}

/// Copies the cache entry to `--output`, if one was given; otherwise the
/// cache entry itself is the compiled artifact.
fn place_output(
    config: &Config,
    code_path: &std::path::Path,
    map_path: Option<&std::path::Path>,
) -> Result<(PathBuf, Option<PathBuf>)> {
    let Some(output) = &config.output else {
        return Ok((code_path.to_path_buf(), map_path.map(Path::to_path_buf)));
    };
    fs::copy(code_path, output).map_err(|e| DriverError::Io(output.clone(), e))?;
    let out_map = map_path.map(|map| {
        let sibling = PathBuf::from(format!("{}.map", output.display()));
        let _ = fs::copy(map, &sibling);
        sibling
    });
    Ok((output.clone(), out_map))
}

/// The bundler's own diagnostics (import resolution, identifier
/// collisions across the dependency graph) don't carry a per-file source
/// map this driver can format a snippet against, so they render as plain
/// `level: message` lines rather than through [`render_all`].
fn render_without_snippets(diags: &[Diagnostic]) -> String {
    diags.iter().map(|d| format!("{}: {}\n", d.level, d.message)).collect()
}
