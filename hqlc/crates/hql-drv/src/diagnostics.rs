//! Diagnostic rendering — turns the `Handler`'s accumulated
//! [`Diagnostic`]s into the source-annotated text `SourceMap::format_span`
//! already knows how to produce, printed error-then-warning the way
//! `faxc-drv`'s driver reports everything it collected before exiting
//! rather than failing on the first problem it sees.

use hql_util::diagnostic::{Diagnostic, Level};
use hql_util::SourceMap;

pub fn render_all(sources: &SourceMap, diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diag in diagnostics {
        out.push_str(&render_one(sources, diag));
        out.push('\n');
    }
    out
}

fn render_one(sources: &SourceMap, diag: &Diagnostic) -> String {
    let mut out = String::new();
    let code = diag.code.map(|c| format!("[{c}] ")).unwrap_or_default();
    out.push_str(&format!("{}: {}{}\n", diag.level, code, diag.message));
    if let Some(snippet) = sources.format_span(diag.span) {
        out.push_str(&snippet);
        out.push('\n');
    }
    for note in &diag.notes {
        out.push_str(&format!("  note: {note}\n"));
    }
    for help in &diag.helps {
        out.push_str(&format!("  help: {help}\n"));
    }
    out
}

pub fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.level == Level::Error).count()
}
