//! Emission options (spec.md section 4.7 "Contract").

/// Output language. `Ts` mode emits `name: Type` parameter annotations and
/// `: Type` return annotations wherever the IR carries one; `Js` mode
/// drops every type annotation on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSyntax {
    Js,
    Ts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMapMode {
    None,
    Inline,
    External,
}

#[derive(Debug, Clone, Copy)]
pub struct EmitOptions {
    pub target_syntax: TargetSyntax,
    pub indent_width: usize,
    pub source_map_mode: SourceMapMode,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            target_syntax: TargetSyntax::Js,
            indent_width: 2,
            source_map_mode: SourceMapMode::None,
        }
    }
}
