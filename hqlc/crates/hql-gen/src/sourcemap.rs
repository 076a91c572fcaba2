//! Source map construction (spec.md section 4.7 "Source maps"): one
//! mapping per emitted line, pointing to the earliest source position
//! that contributed to that line. Built with `oxc_sourcemap`'s VLQ
//! segment encoder rather than hand-rolled, per the "enrich from the rest
//! of the pack" rule — `oxc_sourcemap` is a real published crate already
//! in this workspace's dependency set for exactly this purpose.

use hql_util::{FileId, SourceMap as HqlSourceMap, Span};
use oxc_sourcemap::SourceMapBuilder;

/// Accumulates (generated line, generated column) -> source position
/// mappings as the emitter writes text, then finalizes into a standard
/// source-map v3 payload.
pub struct SourceMapRecorder<'a> {
    builder: SourceMapBuilder,
    sources: &'a HqlSourceMap,
    registered: Vec<Option<u32>>,
    /// Tracks the earliest mapping recorded for each generated line so a
    /// second token on the same line never overwrites the first, per the
    /// "earliest source position that contributed to that line" rule.
    lines_mapped: std::collections::HashSet<u32>,
}

impl<'a> SourceMapRecorder<'a> {
    pub fn new(sources: &'a HqlSourceMap, output_name: &str) -> Self {
        let mut builder = SourceMapBuilder::default();
        builder.set_file(Some(output_name));
        let file_count = sources.file_count();
        let mut registered = Vec::with_capacity(file_count);
        for i in 0..file_count {
            let file_id = FileId::new(i);
            if let Some(file) = sources.get(file_id) {
                let id = builder.set_source_and_content(file.name(), file.content());
                registered.push(Some(id));
            } else {
                registered.push(None);
            }
        }
        SourceMapRecorder { builder, sources, registered, lines_mapped: std::collections::HashSet::new() }
    }

    /// Records a mapping from `(generated_line, generated_column)` (both
    /// 0-based, as `oxc_sourcemap` expects) to `span`, unless that
    /// generated line already has an earlier mapping.
    pub fn record(&mut self, generated_line: u32, generated_column: u32, span: Span) {
        if self.lines_mapped.contains(&generated_line) {
            return;
        }
        let Some(Some(source_id)) = self.registered.get(span.file_id.index()) else {
            return;
        };
        // HQL spans are 1-based; source-map tokens are 0-based.
        let src_line = span.line.saturating_sub(1);
        let src_col = span.column.saturating_sub(1);
        self.builder.add_token(generated_line, generated_column, src_line, src_col, Some(*source_id), None);
        self.lines_mapped.insert(generated_line);
    }

    pub fn finish(self) -> oxc_sourcemap::SourceMap {
        let _ = self.sources;
        self.builder.into_sourcemap()
    }
}

/// Renders the trailer comment a `.ts`/`.js` file ends with when a source
/// map was produced (spec.md section 6, "ends with a `sourceMappingURL`
/// trailer comment").
pub fn trailer_comment(mode: super::SourceMapMode, map: &oxc_sourcemap::SourceMap, external_basename: &str) -> String {
    match mode {
        super::SourceMapMode::None => String::new(),
        super::SourceMapMode::External => format!("\n//# sourceMappingURL={external_basename}.map\n"),
        super::SourceMapMode::Inline => {
            let json = map.to_json_string();
            let encoded = base64_encode(json.as_bytes());
            format!("\n//# sourceMappingURL=data:application/json;base64,{encoded}\n")
        }
    }
}

const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();
        out.push(B64[(b0 >> 2) as usize] as char);
        out.push(B64[(((b0 & 0x03) << 4) | (b1.unwrap_or(0) >> 4)) as usize] as char);
        if let Some(b1) = b1 {
            out.push(B64[(((b1 & 0x0f) << 2) | (b2.unwrap_or(0) >> 6)) as usize] as char);
        } else {
            out.push('=');
        }
        if let Some(b2) = b2 {
            out.push(B64[(b2 & 0x3f) as usize] as char);
        } else {
            out.push('=');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_matches_known_vector() {
        assert_eq!(base64_encode(b"Man"), "TWFu");
        assert_eq!(base64_encode(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn external_trailer_names_the_map_sibling() {
        let trailer = trailer_comment(super::super::SourceMapMode::External, &sample_map(), "out.ts");
        assert!(trailer.contains("out.ts.map"));
    }

    fn sample_map() -> oxc_sourcemap::SourceMap {
        SourceMapBuilder::default().into_sourcemap()
    }
}
