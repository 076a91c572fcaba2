//! The codegen walker (spec.md section 4.7): turns a [`hql_lir::PreparedProgram`]
//! into target text plus an optional source map. Pure tree walk, no
//! analysis of its own — every decision (identifier spelling, which
//! helpers to prepend) was already made by `hql-lir`.

use hql_ir::{ClassField, ClassMethod, EnumCase, ExportKind, Ir, IrKind, ImportKind, ObjectProperty, Param};
use hql_lir::PreparedProgram;
use hql_util::SourceMap as HqlSourceMap;

use crate::error::{CodeGenError, Result};
use crate::options::{EmitOptions, SourceMapMode, TargetSyntax};
use crate::sourcemap::{trailer_comment, SourceMapRecorder};

pub struct Emission {
    pub code: String,
    pub source_map: Option<oxc_sourcemap::SourceMap>,
}

/// Emits `prepared` as `output_name` (used as the `file` field of the
/// source map and the external `.map` sibling's basename).
pub fn generate(
    prepared: &PreparedProgram,
    sources: &HqlSourceMap,
    output_name: &str,
    options: EmitOptions,
) -> Result<Emission> {
    if let Some((original, other)) = prepared.collisions.first() {
        return Err(CodeGenError::IdentifierCollision {
            sanitized: hql_lir::sanitize_identifier(original),
            original: original.clone(),
            other: other.clone(),
        });
    }
    for name in &prepared.referenced_helpers {
        if hql_runtime::helper_source(name).is_none() {
            return Err(CodeGenError::UnknownHelper((*name).to_string()));
        }
    }

    let mut emitter = Emitter::new(options, sources, output_name);
    emitter.emit_prelude(prepared);
    if let IrKind::Program(stmts) = &prepared.ir.kind {
        for stmt in stmts {
            emitter.emit_stmt(stmt);
        }
    }

    let source_map = match options.source_map_mode {
        SourceMapMode::None => None,
        _ => Some(emitter.recorder.take().expect("recorder present when mapping requested").finish()),
    };
    let mut code = emitter.buf;
    if let Some(map) = &source_map {
        code.push_str(&trailer_comment(options.source_map_mode, map, output_name));
    }
    Ok(Emission { code, source_map })
}

struct Emitter<'a> {
    buf: String,
    indent: usize,
    indent_width: usize,
    target: TargetSyntax,
    line: u32,
    col: u32,
    recorder: Option<SourceMapRecorder<'a>>,
}

impl<'a> Emitter<'a> {
    fn new(options: EmitOptions, sources: &'a HqlSourceMap, output_name: &str) -> Self {
        let recorder = match options.source_map_mode {
            SourceMapMode::None => None,
            _ => Some(SourceMapRecorder::new(sources, output_name)),
        };
        Emitter {
            buf: String::new(),
            indent: 0,
            indent_width: options.indent_width,
            target: options.target_syntax,
            line: 0,
            col: 0,
            recorder,
        }
    }

    fn is_ts(&self) -> bool {
        matches!(self.target, TargetSyntax::Ts)
    }

    fn write(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.buf.push_str(text);
    }

    fn pad(&mut self) {
        let width = self.indent * self.indent_width;
        self.write(&" ".repeat(width));
    }

    fn mark(&mut self, node: &Ir) {
        if let (Some(recorder), Some(span)) = (self.recorder.as_mut(), node.pos) {
            recorder.record(self.line, self.col, span);
        }
    }

    fn line_stmt(&mut self, node: &Ir, text: &str) {
        self.pad();
        self.mark(node);
        self.write(text);
        self.write("\n");
    }

    fn emit_prelude(&mut self, prepared: &PreparedProgram) {
        let mut any = false;
        for spec in hql_runtime::HELPER_SPECS {
            if prepared.referenced_helpers.contains(spec.name) {
                let src = hql_runtime::helper_source(spec.name).expect("checked in generate()");
                self.write(src);
                self.write("\n\n");
                any = true;
            }
        }
        if any {
            self.write("\n");
        }
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn emit_stmt(&mut self, node: &Ir) {
        match &node.kind {
            IrKind::Program(stmts) | IrKind::Block(stmts) => {
                self.pad();
                self.mark(node);
                self.write("{\n");
                self.indent += 1;
                for s in stmts {
                    self.emit_stmt(s);
                }
                self.indent -= 1;
                self.pad();
                self.write("}\n");
            }
            IrKind::ExprStmt(inner) => {
                let text = self.expr(inner);
                self.line_stmt(node, &format!("{text};"));
            }
            IrKind::VarDecl { .. } => {
                let text = self.var_decl_text(node);
                self.line_stmt(node, &format!("{text};"));
            }
            IrKind::FunctionDecl { name, params, return_type, body, is_async } => {
                let kw = if *is_async { "async function" } else { "function" };
                let params_text = self.params_text(params);
                let ret = if self.is_ts() {
                    return_type.as_deref().map(|t| format!(": {t}")).unwrap_or_default()
                } else {
                    String::new()
                };
                self.pad();
                self.mark(node);
                self.write(&format!("{kw} {name}({params_text}){ret} {{\n"));
                self.indent += 1;
                for s in body {
                    self.emit_stmt(s);
                }
                self.indent -= 1;
                self.pad();
                self.write("}\n");
            }
            IrKind::If { test, consequent, alternate } => {
                let test_text = self.expr(test);
                self.pad();
                self.mark(node);
                self.write(&format!("if ({test_text}) "));
                self.emit_block_inline(consequent);
                if let Some(alt) = alternate {
                    self.write(" else ");
                    if matches!(alt.kind, IrKind::If { .. }) {
                        self.write(&self.stmt_inline(alt));
                    } else {
                        self.emit_block_inline(alt);
                    }
                } else {
                    self.write("\n");
                }
            }
            IrKind::While { test, body } => {
                let test_text = self.expr(test);
                self.pad();
                self.mark(node);
                self.write(&format!("while ({test_text}) "));
                self.emit_block_inline(body);
            }
            IrKind::For { init, test, update, body } => {
                let init_text = init.as_ref().map(|i| self.for_clause_text(i)).unwrap_or_default();
                let test_text = test.as_ref().map(|t| self.expr(t)).unwrap_or_default();
                let update_text = update.as_ref().map(|u| self.expr(u)).unwrap_or_default();
                self.pad();
                self.mark(node);
                self.write(&format!("for ({init_text}; {test_text}; {update_text}) "));
                self.emit_block_inline(body);
            }
            IrKind::Try { block, handler, finalizer } => {
                self.pad();
                self.mark(node);
                self.write("try {\n");
                self.indent += 1;
                for s in block {
                    self.emit_stmt(s);
                }
                self.indent -= 1;
                self.pad();
                self.write("}");
                if let Some(h) = handler {
                    let param = h.param.as_deref().unwrap_or("_");
                    self.write(&format!(" catch ({param}) {{\n"));
                    self.indent += 1;
                    for s in &h.body {
                        self.emit_stmt(s);
                    }
                    self.indent -= 1;
                    self.pad();
                    self.write("}");
                }
                if let Some(f) = finalizer {
                    self.write(" finally {\n");
                    self.indent += 1;
                    for s in f {
                        self.emit_stmt(s);
                    }
                    self.indent -= 1;
                    self.pad();
                    self.write("}");
                }
                self.write("\n");
            }
            IrKind::Throw(inner) => {
                let text = self.expr(inner);
                self.line_stmt(node, &format!("throw {text};"));
            }
            IrKind::Return(value) => {
                let text = value.as_ref().map(|v| self.expr(v)).unwrap_or_default();
                let line = if text.is_empty() { "return;".to_string() } else { format!("return {text};") };
                self.line_stmt(node, &line);
            }
            IrKind::Break(label) => {
                let text = label.as_deref().map(|l| format!("break {l};")).unwrap_or_else(|| "break;".to_string());
                self.line_stmt(node, &text);
            }
            IrKind::Continue(label) => {
                let text = label.as_deref().map(|l| format!("continue {l};")).unwrap_or_else(|| "continue;".to_string());
                self.line_stmt(node, &text);
            }
            IrKind::Labeled { label, body } => {
                self.pad();
                self.mark(node);
                self.write(&format!("{label}: "));
                self.write(&self.stmt_inline(body));
            }
            IrKind::ClassDecl { .. } => self.emit_class(node),
            IrKind::EnumDecl { name, cases } => self.emit_enum(node, name, cases),
            IrKind::Import { kind, module } => {
                let text = self.import_text(kind, module);
                self.line_stmt(node, &text);
            }
            IrKind::Export(kind) => {
                let text = self.export_text(kind);
                self.line_stmt(node, &text);
            }
            // Any other node reaching statement position is a bare
            // expression used for effect (e.g. a literal at top level).
            _ => {
                let text = self.expr(node);
                self.line_stmt(node, &format!("{text};"));
            }
        }
    }

    /// Renders a statement node into a standalone string without touching
    /// `self`'s position tracking — used only for the `else if` chain and
    /// `label:` bodies, where the caller has already written the prefix.
    fn stmt_inline(&self, node: &Ir) -> String {
        let mut sub = Emitter {
            buf: String::new(),
            indent: self.indent,
            indent_width: self.indent_width,
            target: self.target,
            line: self.line,
            col: self.col,
            recorder: None,
        };
        sub.emit_stmt(node);
        sub.buf.trim_start_matches(|c: char| c == ' ').to_string()
    }

    fn emit_block_inline(&mut self, node: &Ir) {
        match &node.kind {
            IrKind::Block(stmts) => {
                self.mark(node);
                self.write("{\n");
                self.indent += 1;
                for s in stmts {
                    self.emit_stmt(s);
                }
                self.indent -= 1;
                self.pad();
                self.write("}\n");
            }
            _ => {
                self.write("{\n");
                self.indent += 1;
                self.emit_stmt(node);
                self.indent -= 1;
                self.pad();
                self.write("}\n");
            }
        }
    }

    fn for_clause_text(&mut self, node: &Ir) -> String {
        match &node.kind {
            IrKind::VarDecl { .. } => self.var_decl_text(node),
            _ => self.expr(node),
        }
    }

    fn var_decl_text(&mut self, node: &Ir) -> String {
        let IrKind::VarDecl { kind, name, type_annotation, init } = &node.kind else { unreachable!() };
        let kw = match kind {
            hql_ir::DeclKind::Const => "const",
            hql_ir::DeclKind::Let => "let",
            hql_ir::DeclKind::Var => "var",
        };
        let ty = if self.is_ts() {
            type_annotation.as_deref().map(|t| format!(": {t}")).unwrap_or_default()
        } else {
            String::new()
        };
        match init {
            Some(i) => {
                let text = self.expr(i);
                format!("{kw} {name}{ty} = {text}")
            }
            None => format!("{kw} {name}{ty}"),
        }
    }

    fn params_text(&mut self, params: &[Param]) -> String {
        params
            .iter()
            .map(|p| {
                let prefix = if p.rest { "..." } else { "" };
                let ty = if self.is_ts() {
                    p.type_annotation.as_deref().map(|t| format!(": {t}")).unwrap_or_default()
                } else {
                    String::new()
                };
                match &p.default {
                    Some(d) => {
                        let default_text = self.expr(d);
                        format!("{prefix}{}{ty} = {default_text}", p.name)
                    }
                    None => format!("{prefix}{}{ty}", p.name),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn import_text(&self, kind: &ImportKind, module: &str) -> String {
        match kind {
            ImportKind::Named(specs) => {
                let inner = specs
                    .iter()
                    .map(|s| {
                        if s.imported == s.local {
                            s.imported.clone()
                        } else {
                            format!("{} as {}", s.imported, s.local)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("import {{ {inner} }} from {};", quote_string(module))
            }
            ImportKind::Namespace(name) => format!("import * as {name} from {};", quote_string(module)),
            ImportKind::SideEffect => format!("import {};", quote_string(module)),
        }
    }

    fn export_text(&mut self, kind: &ExportKind) -> String {
        match kind {
            ExportKind::Named(names) => format!("export {{ {} }};", names.join(", ")),
            ExportKind::Default(value) => {
                let text = self.expr(value);
                format!("export default {text};")
            }
        }
    }

    fn emit_class(&mut self, node: &Ir) {
        let IrKind::ClassDecl { name, superclass, fields, constructor, methods } = &node.kind else { unreachable!() };
        self.pad();
        self.mark(node);
        let ext = superclass.as_deref().map(|s| format!(" extends {s}")).unwrap_or_default();
        self.write(&format!("class {name}{ext} {{\n"));
        self.indent += 1;
        for field in fields {
            self.emit_class_field(field);
        }
        if let Some(ctor) = constructor {
            self.emit_method("constructor", ctor, false);
        }
        for m in methods {
            self.emit_method(&m.name, m, m.is_static);
        }
        self.indent -= 1;
        self.pad();
        self.write("}\n");
    }

    fn emit_class_field(&mut self, field: &ClassField) {
        self.pad();
        let prefix = if self.is_ts() && !field.mutable { "readonly " } else { "" };
        match &field.value {
            Some(v) => {
                let text = self.expr(v);
                self.write(&format!("{prefix}{} = {text};\n", field.name));
            }
            None => self.write(&format!("{prefix}{};\n", field.name)),
        }
    }

    fn emit_method(&mut self, name: &str, method: &ClassMethod, is_static: bool) {
        let params_text = self.params_text(&method.params);
        let prefix = match (is_static, method.is_async) {
            (true, true) => "static async ",
            (true, false) => "static ",
            (false, true) => "async ",
            (false, false) => "",
        };
        self.pad();
        self.write(&format!("{prefix}{name}({params_text}) {{\n"));
        self.indent += 1;
        for s in &method.body {
            self.emit_stmt(s);
        }
        self.indent -= 1;
        self.pad();
        self.write("}\n");
    }

    fn emit_enum(&mut self, node: &Ir, name: &str, cases: &[EnumCase]) {
        self.pad();
        self.mark(node);
        self.write(&format!("const {name} = Object.freeze({{\n"));
        self.indent += 1;
        for case in cases {
            self.pad();
            if !case.associated_fields.is_empty() {
                let params = case.associated_fields.join(", ");
                self.write(&format!(
                    "{}: ({params}) => ({{ tag: {}, {params} }}),\n",
                    case.name,
                    quote_string(&case.name)
                ));
            } else if let Some(raw) = &case.raw_value {
                let text = self.expr(raw);
                self.write(&format!("{}: {text},\n", case.name));
            } else {
                self.write(&format!("{}: {},\n", case.name, quote_string(&case.name)));
            }
        }
        self.indent -= 1;
        self.pad();
        self.write("});\n");
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn expr(&mut self, node: &Ir) -> String {
        match &node.kind {
            IrKind::Identifier { name, .. } => name.clone(),
            IrKind::NumberLit(n) => format_number(*n),
            IrKind::StringLit(s) => quote_string(s),
            IrKind::BoolLit(b) => b.to_string(),
            IrKind::NullLit => "null".to_string(),
            IrKind::ArrayExpr(items) => {
                let inner = items.iter().map(|i| self.expr(i)).collect::<Vec<_>>().join(", ");
                format!("[{inner}]")
            }
            IrKind::ObjectExpr(props) => {
                let inner = props
                    .iter()
                    .map(|p| self.object_prop_text(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{ {inner} }}")
            }
            IrKind::Call { callee, args } => {
                let callee_text = self.expr(callee);
                let args_text = self.args_text(args);
                format!("{callee_text}({args_text})")
            }
            IrKind::CallMember { object, property, computed, args } => {
                let object_text = self.expr(object);
                let args_text = self.args_text(args);
                if *computed {
                    format!("{object_text}[{}]({args_text})", quote_string(property))
                } else {
                    format!("{object_text}.{property}({args_text})")
                }
            }
            IrKind::New { callee, args } => {
                let callee_text = self.expr(callee);
                let args_text = self.args_text(args);
                format!("new {callee_text}({args_text})")
            }
            IrKind::Member { object, property, computed } => {
                let object_text = self.expr(object);
                if *computed {
                    let prop_text = self.expr(property);
                    format!("{object_text}[{prop_text}]")
                } else {
                    format!("{object_text}.{}", member_name(property))
                }
            }
            IrKind::JsMethodAccess { object, method } => {
                let object_text = self.expr(object);
                format!("{object_text}.{method}.bind({object_text})")
            }
            IrKind::Binary { op, left, right } => {
                let l = self.expr(left);
                let r = self.expr(right);
                format!("({l} {op} {r})")
            }
            IrKind::Unary { op, operand, prefix } => {
                let o = self.expr(operand);
                if *prefix {
                    format!("({op}{o})")
                } else {
                    format!("({o}{op})")
                }
            }
            IrKind::Assignment { op, target, value } => {
                let t = self.expr(target);
                let v = self.expr(value);
                format!("{t} {op} {v}")
            }
            IrKind::Conditional { test, consequent, alternate } => {
                let t = self.expr(test);
                let c = self.expr(consequent);
                let a = self.expr(alternate);
                format!("({t} ? {c} : {a})")
            }
            IrKind::Await(inner) => {
                let text = self.expr(inner);
                format!("(await {text})")
            }
            IrKind::FunctionExpr { name, params, return_type, body, is_async, is_arrow } => {
                self.func_expr_text(name.as_deref(), params, return_type.as_deref(), body, *is_async, *is_arrow)
            }
            // The remaining kinds are statement-shaped nodes that only
            // appear in expression position inside an IIFE arrow body;
            // they are walked through `emit_stmt`, never reached here.
            _ => self.stmt_inline(node).trim().to_string(),
        }
    }

    fn func_expr_text(
        &mut self,
        name: Option<&str>,
        params: &[Param],
        return_type: Option<&str>,
        body: &[Ir],
        is_async: bool,
        is_arrow: bool,
    ) -> String {
        let params_text = self.params_text(params);
        let ret = if self.is_ts() {
            return_type.map(|t| format!(": {t}")).unwrap_or_default()
        } else {
            String::new()
        };
        let async_kw = if is_async { "async " } else { "" };
        let header = if is_arrow {
            format!("{async_kw}({params_text}){ret} =>")
        } else {
            match name {
                Some(n) => format!("{async_kw}function {n}({params_text}){ret}"),
                None => format!("{async_kw}function ({params_text}){ret}"),
            }
        };
        // Rendered into an isolated sub-emitter rather than `self`: this
        // text is returned as a fragment for the caller to splice into a
        // parent expression, so it has no fixed line/column yet and must
        // not advance `self`'s own position tracking or feed the real
        // source-map recorder.
        let mut sub = Emitter {
            buf: String::new(),
            indent: 0,
            indent_width: self.indent_width,
            target: self.target,
            line: 0,
            col: 0,
            recorder: None,
        };
        sub.write("{\n");
        sub.indent += 1;
        for s in body {
            sub.emit_stmt(s);
        }
        sub.indent -= 1;
        sub.pad();
        sub.write("}");
        format!("{header} {}", sub.buf)
    }

    fn object_prop_text(&mut self, prop: &ObjectProperty) -> String {
        match prop {
            ObjectProperty::KeyValue { key, computed, value } => {
                let value_text = self.expr(value);
                if *computed {
                    format!("[{}]: {value_text}", quote_string(key))
                } else {
                    format!("{key}: {value_text}")
                }
            }
            ObjectProperty::Spread(v) => {
                let text = self.expr(v);
                format!("...{text}")
            }
        }
    }

    fn args_text(&mut self, args: &[Ir]) -> String {
        args.iter().map(|a| self.expr(a)).collect::<Vec<_>>().join(", ")
    }
}

fn member_name(node: &Ir) -> String {
    match &node.kind {
        IrKind::StringLit(s) => s.clone(),
        IrKind::Identifier { name, .. } => name.clone(),
        _ => String::new(),
    }
}

/// Renders a JS number literal, dropping the `.0` suffix Rust's `f64`
/// formatting would otherwise leave on whole numbers.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_ir::{lower_and_optimize, OptimizeOptions};
    use hql_util::{FileId, Handler};

    fn compile(src: &str, options: EmitOptions) -> String {
        let handler = Handler::new();
        let forms = hql_par::parse(src, FileId::DUMMY, &handler);
        let expanded = hql_macro::expand(forms, &handler);
        let ir = lower_and_optimize(&expanded, OptimizeOptions::default());
        let prepared = hql_lir::prepare(ir);
        let sources = HqlSourceMap::new();
        generate(&prepared, &sources, "out.js", options).expect("generation succeeds").code
    }

    #[test]
    fn emits_plain_arithmetic() {
        let out = compile("(+ (* 2 3) (- 10 5))", EmitOptions::default());
        assert!(out.contains("((2 * 3) + (10 - 5))"));
    }

    #[test]
    fn emits_first_class_operator_through_get_op() {
        let out = compile("(defn apply-op [f a b] (f a b)) (apply-op + 1 2)", EmitOptions::default());
        assert!(out.contains("__hql_get_op(\"+\")"));
        assert!(out.contains("function __hql_get_op"));
    }

    #[test]
    fn for_loop_optimization_emits_native_for() {
        let out = compile("(defn f [] (for [i 0 10] (print i)))", EmitOptions::default());
        assert!(out.contains("for (let i = 0; (i < 10); i += 1)"));
        assert!(!out.contains("__hql_for_each"));
    }

    #[test]
    fn ts_mode_emits_parameter_annotations() {
        let out = compile(
            "(defn add [a:Number b:Number] :Number (+ a b))",
            EmitOptions { target_syntax: TargetSyntax::Ts, ..EmitOptions::default() },
        );
        assert!(out.contains("a: Number"));
        assert!(out.contains("): Number"));
    }

    #[test]
    fn sanitizes_predicate_identifiers_in_output() {
        let out = compile("(defn empty? [xs] xs)", EmitOptions::default());
        assert!(out.contains("function empty_QMARK_"));
    }
}
