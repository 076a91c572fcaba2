//! The analyzer itself (spec.md section 4.4): a single top-down walk over
//! the expanded AST that populates a [`SymbolTable`] and reports
//! unbound-symbol, duplicate-binding, `set!`-on-immutable, and
//! `recur`-out-of-tail-position diagnostics.
//!
//! The walk never mutates the AST; lowering re-walks the same tree with
//! the table this pass produced to make the same scoping decisions a
//! second time, deterministically, without re-deriving them from scratch.

use hql_par::{could_be_pattern, Ast};
use hql_util::diagnostic::{E_SEMANTIC_MUT_REQUIRED, E_SEMANTIC_UNDEFINED_VAR};
use hql_util::{Handler, Span, Symbol};

use crate::kernel::{is_kernel_primitive, is_operator, KERNEL_PRIMITIVES, OPERATOR_TABLE};
use crate::scope::{ScopeId, ScopeKind, SymbolEntry, SymbolKind};
use crate::suggest::suggest_similar;
use crate::types::split_type_annotation;
use crate::SymbolTable;

/// JS globals an HQL program may reference without a local binding.
/// Kept intentionally small: it covers what the end-to-end examples in
/// spec.md section 8 need (`print` from the embedded stdlib macro layer is
/// a macro, not listed here) without turning "unbound symbol" into a dead
/// letter for every interop call.
const BUILTIN_GLOBALS: &[&str] = &[
    "console", "Math", "JSON", "Array", "Object", "String", "Number", "Boolean", "Date",
    "RegExp", "Promise", "Symbol", "Map", "Set", "Error", "TypeError", "RangeError",
    "parseInt", "parseFloat", "isNaN", "isFinite", "undefined", "NaN", "Infinity", "globalThis",
    "print", "println",
];

pub struct Analyzer<'a> {
    pub table: SymbolTable,
    handler: &'a Handler,
}

/// Runs semantic analysis over `forms`, returning the populated symbol
/// table. Diagnostics are reported through `handler` as they are found;
/// the caller decides whether `handler.has_errors()` should abort the
/// pipeline before lowering.
pub fn analyze(forms: &[Ast], handler: &Handler) -> SymbolTable {
    let mut analyzer = Analyzer::new(handler);
    for form in forms {
        analyzer.analyze_top_level(form);
    }
    analyzer.table
}

impl<'a> Analyzer<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        let mut table = SymbolTable::new();
        let global = table.current();
        for name in BUILTIN_GLOBALS {
            let _ = table.bind(SymbolEntry::new(
                Symbol::intern(name),
                SymbolKind::Builtin,
                global,
            ));
        }
        for name in OPERATOR_TABLE {
            let _ = table.bind(SymbolEntry::new(Symbol::intern(name), SymbolKind::Operator, global));
        }
        for name in KERNEL_PRIMITIVES {
            let _ = table.bind(SymbolEntry::new(
                Symbol::intern(name),
                SymbolKind::SpecialForm,
                global,
            ));
        }
        Analyzer { table, handler }
    }

    fn analyze_top_level(&mut self, form: &Ast) {
        self.analyze_form(form);
    }

    /// Dispatches on the list head. A bare (non-list) form is just a
    /// reference expression.
    fn analyze_form(&mut self, form: &Ast) {
        match form {
            Ast::Symbol { name, pos } => self.resolve_reference(*name, *pos),
            Ast::Literal { .. } => {}
            Ast::List { elements, pos } => self.analyze_list(elements, *pos),
            Ast::Vector { elements, .. } => {
                for el in elements {
                    self.analyze_form(el);
                }
            }
            Ast::Set { elements, .. } => {
                for el in elements {
                    self.analyze_form(el);
                }
            }
            Ast::Map { entries, .. } => {
                for (k, v) in entries {
                    self.analyze_form(k);
                    self.analyze_form(v);
                }
            }
        }
    }

    fn analyze_list(&mut self, elements: &[Ast], pos: Span) {
        if elements.is_empty() {
            return;
        }
        let head_name = elements[0].as_symbol().map(|s| s.as_str().to_string());
        let args = &elements[1..];

        match head_name.as_deref() {
            Some("quote") => { /* quoted data: never resolved */ }
            Some("quasiquote") => {
                for a in args {
                    self.analyze_quasiquoted(a);
                }
            }
            Some("if") | Some("while") => {
                for a in args {
                    self.analyze_form(a);
                }
            }
            Some("cond") => {
                for pair in args {
                    if let Some(pair_elems) = pair.as_list() {
                        for e in pair_elems {
                            self.analyze_form(e);
                        }
                    }
                }
            }
            Some("case") => {
                if let Some(subject) = args.first() {
                    self.analyze_form(subject);
                }
                for clause in &args[1.min(args.len())..] {
                    if let Some(clause_elems) = clause.as_list() {
                        // First element of a clause is a literal key (or
                        // `else`), never a reference.
                        for e in clause_elems.iter().skip(1) {
                            self.analyze_form(e);
                        }
                    }
                }
            }
            Some("do") | Some("label") | Some("async") | Some("await") | Some("lazy-seq")
            | Some("break") | Some("continue") | Some("throw") => {
                for a in args {
                    self.analyze_form(a);
                }
            }
            Some("let") | Some("const") => self.analyze_binding_form(args, pos, false),
            Some("var") => self.analyze_binding_form(args, pos, true),
            Some("set!") => self.analyze_set(args, pos),
            Some("fn") => self.analyze_fn(args, pos, None),
            Some("defn") => self.analyze_defn(args, pos),
            Some("class") => self.analyze_class(args, pos),
            Some("enum") => self.analyze_enum(args, pos),
            Some("new") => {
                for a in args {
                    self.analyze_form(a);
                }
            }
            Some("try") => self.analyze_try(args),
            Some("catch") => {
                // only reached if visited directly (normally consumed by
                // analyze_try); treat the bound name as a fresh binding.
                self.analyze_catch_clause(args);
            }
            Some("finally") => {
                for a in args {
                    self.analyze_form(a);
                }
            }
            Some("import") => self.analyze_import(args, pos),
            Some("export") => self.analyze_export(args, pos),
            Some("loop") => self.analyze_loop(args, pos),
            Some("recur") => self.analyze_recur(args, pos),
            Some("for") => self.analyze_for(args, pos),
            Some("doseq") => self.analyze_doseq(args, pos),
            Some("get") => {
                for a in args {
                    self.analyze_form(a);
                }
            }
            Some(op) if is_operator(op) => {
                for a in args {
                    self.analyze_form(a);
                }
            }
            _ => {
                // An ordinary call: resolve the callee (which may itself
                // be a first-class operator reference) and each argument.
                self.analyze_form(&elements[0]);
                for a in args {
                    self.analyze_form(a);
                }
            }
        }
    }

    /// Inside `(quasiquote X)`, only `(unquote E)`/`(unquote-splice E)`
    /// contain live code; everything else is template data copied as-is.
    fn analyze_quasiquoted(&mut self, node: &Ast) {
        if let Some(elements) = node.as_list() {
            if let Some(head) = elements.first().and_then(Ast::as_symbol) {
                if head.as_str() == "unquote" || head.as_str() == "unquote-splice" {
                    for e in &elements[1..] {
                        self.analyze_form(e);
                    }
                    return;
                }
            }
            for e in elements {
                self.analyze_quasiquoted(e);
            }
            return;
        }
        match node {
            Ast::Vector { elements, .. } | Ast::Set { elements, .. } => {
                for e in elements {
                    self.analyze_quasiquoted(e);
                }
            }
            Ast::Map { entries, .. } => {
                for (k, v) in entries {
                    self.analyze_quasiquoted(k);
                    self.analyze_quasiquoted(v);
                }
            }
            _ => {}
        }
    }

    fn resolve_reference(&mut self, name: Symbol, pos: Span) {
        let text = name.as_str();
        if text.starts_with(':') {
            return; // keyword literal, self-evaluating
        }
        // Dotted member access (`console.log`) resolves on its head
        // segment only; the rest is a property path checked at codegen.
        let head = text.split('.').next().unwrap_or(text);
        let head_sym = if head == text { name } else { Symbol::intern(head) };

        if self.table.resolve(head_sym).is_some() {
            return;
        }

        let pool = self.table.visible_names(self.table.current());
        let suggestions = suggest_similar(head, pool, 3);
        let mut builder = self
            .handler
            .build_error(pos, format!("unbound symbol `{head}`"))
            .code(E_SEMANTIC_UNDEFINED_VAR);
        if !suggestions.is_empty() {
            let names: Vec<&str> = suggestions.iter().map(|s| s.as_str()).collect();
            builder = builder.with_help(format!("did you mean: {}?", names.join(", ")));
        }
        builder.emit(self.handler);
    }

    fn bind_simple(&mut self, name: Symbol, kind: SymbolKind, pos: Span, mutable: bool) {
        let scope = self.table.current();
        let entry = SymbolEntry::new(name, kind, scope)
            .with_pos(pos)
            .with_mutable(mutable);
        if let Err(prior) = self.table.bind(entry) {
            if self.table.bound_in_scope(scope, name) {
                self.handler
                    .build_error(pos, format!("`{}` is already bound in this scope", name.as_str()))
                    .with_note(format!(
                        "previous binding at {:?}",
                        prior.pos.unwrap_or(Span::DUMMY)
                    ))
                    .emit(self.handler);
            }
        }
    }

    /// `(let x e)` / `(let (x1 e1 x2 e2 ...) body...)` and the `var`/`const`
    /// forms, which share this shape (`mutable` distinguishes `var`).
    fn analyze_binding_form(&mut self, args: &[Ast], pos: Span, mutable: bool) {
        if args.is_empty() {
            return;
        }
        match &args[0] {
            Ast::Symbol { name, pos: npos } => {
                // `(let x e)`: single binding, no body.
                if let Some(init) = args.get(1) {
                    self.analyze_form(init);
                }
                self.bind_binding_target(&args[0], *name, *npos, mutable);
            }
            Ast::Vector { .. } if could_be_pattern(&args[0]) => {
                if let Some(init) = args.get(1) {
                    self.analyze_form(init);
                }
                self.bind_pattern(&args[0], mutable);
                for body in &args[2..] {
                    self.analyze_form(body);
                }
            }
            Ast::List { elements: pairs, .. } => {
                let mut i = 0;
                while i + 1 < pairs.len() {
                    self.analyze_form(&pairs[i + 1]);
                    self.bind_binding_target_node(&pairs[i], mutable);
                    i += 2;
                }
                for body in &args[1..] {
                    self.analyze_form(body);
                }
            }
            other => self.analyze_form(other),
        }
    }

    fn bind_binding_target_node(&mut self, target: &Ast, mutable: bool) {
        match target {
            Ast::Symbol { name, pos } => self.bind_binding_target(target, *name, *pos, mutable),
            Ast::Vector { .. } if could_be_pattern(target) => self.bind_pattern(target, mutable),
            _ => {}
        }
    }

    fn bind_binding_target(&mut self, _target: &Ast, name: Symbol, pos: Span, mutable: bool) {
        if name.as_str() == "_" {
            return;
        }
        self.bind_simple(name, SymbolKind::Variable, pos, mutable);
    }

    /// Binds every identifier in a destructuring pattern vector (rest via
    /// `&`, defaults via `(= value)`, nested vectors recursively).
    fn bind_pattern(&mut self, pattern: &Ast, mutable: bool) {
        let elements = match pattern {
            Ast::Vector { elements, .. } => elements,
            _ => return,
        };
        let mut i = 0;
        while i < elements.len() {
            let el = &elements[i];
            if el.as_symbol().map(|s| s.as_str() == "&").unwrap_or(false) {
                if let Some(rest) = elements.get(i + 1) {
                    self.bind_binding_target_node(rest, mutable);
                }
                break;
            }
            match el {
                Ast::Symbol { name, pos } => self.bind_binding_target(el, *name, *pos, mutable),
                Ast::Vector { .. } => self.bind_pattern(el, mutable),
                Ast::List { elements: def_elems, .. } if def_elems.len() == 2 => {
                    // `(= default)` attached to the preceding binding slot
                    // is represented positionally in the pattern vector by
                    // the parser as its own element; default values are
                    // expressions evaluated in the *enclosing* scope, not
                    // the pattern's.
                    self.analyze_form(&def_elems[1]);
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn analyze_set(&mut self, args: &[Ast], pos: Span) {
        if args.len() < 2 {
            return;
        }
        self.analyze_form(&args[1]);
        if let Some(name) = args[0].as_symbol() {
            match self.table.resolve(name) {
                Some(entry) if !entry.mutable => {
                    self.handler
                        .build_error(
                            pos,
                            format!("cannot `set!` immutable binding `{}`", name.as_str()),
                        )
                        .code(E_SEMANTIC_MUT_REQUIRED)
                        .emit(self.handler);
                }
                Some(_) => {}
                None => self.resolve_reference(name, args[0].pos()),
            }
        }
    }

    /// Splits a parameter vector into `(bindable_elements, defaults)`,
    /// binding each parameter name (after colon-annotation split) in the
    /// current (already-pushed function) scope.
    fn bind_params(&mut self, params: &Ast) {
        let elements = match params {
            Ast::Vector { elements, .. } => elements,
            _ => return,
        };
        let mut i = 0;
        while i < elements.len() {
            let el = &elements[i];
            if el.as_symbol().map(|s| s.as_str() == "&").unwrap_or(false) {
                if let Some(rest) = elements.get(i + 1) {
                    if let Some(raw) = rest.as_symbol() {
                        let (name, _ty, ok) = split_type_annotation(raw);
                        if !ok {
                            self.report_bad_annotation(rest.pos());
                        }
                        self.bind_simple(name, SymbolKind::Variable, rest.pos(), false);
                    }
                }
                break;
            }
            match el {
                Ast::Symbol { name: raw, pos } => {
                    let (name, _ty, ok) = split_type_annotation(*raw);
                    if !ok {
                        self.report_bad_annotation(*pos);
                    }
                    self.bind_simple(name, SymbolKind::Variable, *pos, false);
                }
                Ast::Vector { .. } => self.bind_pattern(el, false),
                Ast::List { elements: def_elems, .. } if def_elems.len() == 2 => {
                    self.analyze_form(&def_elems[1]);
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn report_bad_annotation(&self, pos: Span) {
        self.handler
            .build_error(pos, "malformed type annotation: expected `name:Type`")
            .emit(self.handler);
    }

    /// `(fn [name] [params] [:RetType] body...)`. `bind_name_as` lets
    /// `defn` bind the function's own name in the *enclosing* scope before
    /// descending, so the function can call itself recursively.
    fn analyze_fn(&mut self, args: &[Ast], pos: Span, bind_name_as: Option<Symbol>) {
        let mut idx = 0;
        let mut fn_name: Option<Symbol> = None;
        if let Some(name) = args.first().and_then(Ast::as_symbol) {
            fn_name = Some(name);
            idx = 1;
        }
        if let Some(bound) = bind_name_as.or(fn_name) {
            self.bind_simple(bound, SymbolKind::Function, pos, false);
        }

        let params = args.get(idx);
        if params.is_none() {
            return;
        }
        idx += 1;
        // optional `:RetType` keyword-symbol immediately after params
        if let Some(next) = args.get(idx) {
            if next.as_symbol().map(|s| s.as_str().starts_with(':')).unwrap_or(false) {
                idx += 1;
            }
        }

        let parent = self.table.current();
        self.table.push_scope(ScopeKind::Function);
        if let Some(p) = params {
            self.bind_params(p);
        }
        for body in &args[idx..] {
            self.analyze_form(body);
        }
        self.table.pop_scope(parent);
    }

    fn analyze_defn(&mut self, args: &[Ast], pos: Span) {
        match args.first().and_then(Ast::as_symbol) {
            Some(name) => self.analyze_fn(&args[1..], pos, Some(name)),
            None => {
                self.report_malformed_defn_name(pos);
                // Best-effort: a non-symbol first argument still leaves a
                // params/body shape worth analyzing; a bare `(defn)` has
                // nothing left to descend into.
                if !args.is_empty() {
                    self.analyze_fn(&args[1..], pos, None);
                }
            }
        }
    }

    fn report_malformed_defn_name(&self, pos: Span) {
        self.handler
            .build_error(pos, "`defn` requires a symbol name: expected `(defn name [params] ...)`")
            .emit(self.handler);
    }

    /// `(class Name (constructor [params] body) (fn m [params] body)
    ///   (var f v) (let f v))`
    fn analyze_class(&mut self, args: &[Ast], pos: Span) {
        if let Some(name) = args.first().and_then(Ast::as_symbol) {
            self.bind_simple(name, SymbolKind::Class, pos, false);
        }
        let parent = self.table.current();
        self.table.push_scope(ScopeKind::Function);
        self.bind_simple(Symbol::intern("this"), SymbolKind::Variable, pos, false);
        for member in &args[1..] {
            let Some(elements) = member.as_list() else { continue };
            match elements.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()).as_deref() {
                Some("constructor") | Some("fn") => {
                    self.analyze_fn(&elements[1..], member.pos(), None);
                }
                Some("var") => {
                    if elements.len() >= 3 {
                        self.analyze_form(&elements[2]);
                    }
                    if let Some(field) = elements.get(1).and_then(Ast::as_symbol) {
                        self.bind_simple(field, SymbolKind::Property, member.pos(), true);
                    }
                }
                Some("let") => {
                    if elements.len() >= 3 {
                        self.analyze_form(&elements[2]);
                    }
                    if let Some(field) = elements.get(1).and_then(Ast::as_symbol) {
                        self.bind_simple(field, SymbolKind::Property, member.pos(), false);
                    }
                }
                _ => {}
            }
        }
        self.table.pop_scope(parent);
    }

    /// `(enum E (case A) (case B rawValue))`
    fn analyze_enum(&mut self, args: &[Ast], pos: Span) {
        if let Some(name) = args.first().and_then(Ast::as_symbol) {
            self.bind_simple(name, SymbolKind::Enum, pos, false);
        }
        for case in &args[1..] {
            let Some(elements) = case.as_list() else { continue };
            if elements.first().and_then(Ast::as_symbol).map(|s| s.as_str() == "case").unwrap_or(false) {
                if let Some(case_name) = elements.get(1).and_then(Ast::as_symbol) {
                    self.bind_simple(case_name, SymbolKind::EnumCase, case.pos(), false);
                }
                for raw in &elements[2..] {
                    self.analyze_form(raw);
                }
            }
        }
    }

    fn analyze_try(&mut self, args: &[Ast]) {
        for clause in args {
            if let Some(elements) = clause.as_list() {
                match elements.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()).as_deref() {
                    Some("catch") => self.analyze_catch_clause(&elements[1..]),
                    Some("finally") => {
                        for e in &elements[1..] {
                            self.analyze_form(e);
                        }
                    }
                    _ => self.analyze_form(clause),
                }
            } else {
                self.analyze_form(clause);
            }
        }
    }

    fn analyze_catch_clause(&mut self, args: &[Ast]) {
        let parent = self.table.current();
        self.table.push_scope(ScopeKind::Block);
        if let Some(binding) = args.first().and_then(Ast::as_symbol) {
            self.bind_simple(binding, SymbolKind::Variable, args[0].pos(), false);
        }
        for body in &args[1..] {
            self.analyze_form(body);
        }
        self.table.pop_scope(parent);
    }

    /// `(import [a b as c] from "m")` / `(import m from "m")` /
    /// `(import "m")`.
    fn analyze_import(&mut self, args: &[Ast], pos: Span) {
        match args.first() {
            Some(Ast::Vector { elements, .. }) => {
                let mut i = 0;
                while i < elements.len() {
                    if elements[i].as_symbol().map(|s| s.as_str() == "as").unwrap_or(false) {
                        i += 1;
                        continue;
                    }
                    if let Some(name) = elements[i].as_symbol() {
                        let alias = if elements.get(i + 1).and_then(Ast::as_symbol).map(|s| s.as_str() == "as").unwrap_or(false) {
                            elements.get(i + 2).and_then(Ast::as_symbol)
                        } else {
                            None
                        };
                        let bound = alias.unwrap_or(name);
                        let mut entry = SymbolEntry::new(bound, SymbolKind::Import, self.table.current())
                            .with_pos(pos);
                        entry.imported = true;
                        entry.alias_target = alias.map(|_| name);
                        let _ = self.table.bind(entry);
                        if alias.is_some() {
                            i += 3;
                            continue;
                        }
                    }
                    i += 1;
                }
            }
            Some(Ast::Symbol { name, pos: npos }) => {
                let mut entry = SymbolEntry::new(*name, SymbolKind::Namespace, self.table.current())
                    .with_pos(*npos);
                entry.imported = true;
                let _ = self.table.bind(entry);
            }
            _ => {}
        }
    }

    fn analyze_export(&mut self, args: &[Ast], _pos: Span) {
        match args.first() {
            Some(Ast::Vector { elements, .. }) => {
                for el in elements {
                    if let Some(name) = el.as_symbol() {
                        self.resolve_reference(name, el.pos());
                        if let Some(entry) = self.table.resolve(name).cloned() {
                            let mut updated = entry;
                            updated.exported = true;
                            let scope = updated.scope;
                            let _ = self.table.bind_in(scope, updated);
                        }
                    }
                }
            }
            Some(other) if other.as_symbol().map(|s| s.as_str() == "default").unwrap_or(false) => {
                for a in &args[1..] {
                    self.analyze_form(a);
                }
            }
            Some(other) => self.analyze_form(other),
            None => {}
        }
    }

    /// `(loop [b v ...] body...)`, paired with `(recur v ...)`.
    fn analyze_loop(&mut self, args: &[Ast], pos: Span) {
        let Some(bindings) = args.first() else { return };
        let Some(pairs) = bindings.as_list().or_else(|| match bindings {
            Ast::Vector { elements, .. } => Some(elements.as_slice()),
            _ => None,
        }) else {
            return;
        };
        let mut names = Vec::new();
        let mut i = 0;
        while i + 1 < pairs.len() {
            self.analyze_form(&pairs[i + 1]);
            if let Some(name) = pairs[i].as_symbol() {
                names.push(name);
            }
            i += 2;
        }
        let parent = self.table.current();
        self.table.push_scope(ScopeKind::Loop);
        for name in names {
            self.bind_simple(name, SymbolKind::Variable, pos, true);
        }
        for body in &args[1..] {
            self.analyze_form(body);
        }
        self.table.pop_scope(parent);
    }

    fn analyze_recur(&mut self, args: &[Ast], pos: Span) {
        if self.table.nearest_enclosing_loop(self.table.current()).is_none() {
            self.handler
                .build_error(pos, "`recur` used outside an eligible tail position")
                .with_help("`recur` must appear inside the body of an enclosing `loop`")
                .emit(self.handler);
        }
        for a in args {
            self.analyze_form(a);
        }
    }

    /// `(for [i start end [step]] body...)`.
    fn analyze_for(&mut self, args: &[Ast], pos: Span) {
        let Some(Ast::Vector { elements: clause, .. }) = args.first() else {
            for a in args {
                self.analyze_form(a);
            }
            return;
        };
        let parent = self.table.current();
        self.table.push_scope(ScopeKind::Loop);
        if let Some(var) = clause.first().and_then(Ast::as_symbol) {
            self.bind_simple(var, SymbolKind::Variable, pos, true);
        }
        for bound in &clause[1..] {
            self.analyze_form(bound);
        }
        for body in &args[1..] {
            self.analyze_form(body);
        }
        self.table.pop_scope(parent);
    }

    /// `(doseq [x coll] body...)`.
    fn analyze_doseq(&mut self, args: &[Ast], pos: Span) {
        let Some(Ast::Vector { elements: clause, .. }) = args.first() else {
            for a in args {
                self.analyze_form(a);
            }
            return;
        };
        if clause.len() >= 2 {
            self.analyze_form(&clause[1]);
        }
        let parent = self.table.current();
        self.table.push_scope(ScopeKind::Block);
        if let Some(var) = clause.first().and_then(Ast::as_symbol) {
            self.bind_simple(var, SymbolKind::Variable, pos, false);
        }
        for body in &args[1..] {
            self.analyze_form(body);
        }
        self.table.pop_scope(parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_par::parse;
    use hql_util::FileId;

    fn analyze_src(src: &str) -> (SymbolTable, Handler) {
        let handler = Handler::new();
        let forms = parse(src, FileId::DUMMY, &handler);
        let expanded = hql_macro::expand(forms, &handler);
        let table = analyze(&expanded, &handler);
        (table, handler)
    }

    #[test]
    fn resolves_let_bound_variable() {
        let (_, handler) = analyze_src("(let x 1) (println x)");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn unbound_symbol_is_an_error() {
        let (_, handler) = analyze_src("(println totally-unbound-name)");
        assert!(handler.has_errors());
    }

    #[test]
    fn unbound_symbol_suggests_similar_name() {
        let (_, handler) = analyze_src("(let reduction 1) (println reducton)");
        assert!(handler.has_errors());
        let diag = handler.diagnostics().into_iter().find(|d| d.code == Some(E_SEMANTIC_UNDEFINED_VAR)).unwrap();
        assert!(diag.helps.iter().any(|h| h.contains("reduction")));
    }

    #[test]
    fn defn_with_non_symbol_name_is_an_error() {
        let (_, handler) = analyze_src("(defn 5 [] 1)");
        assert!(handler.has_errors());
    }

    #[test]
    fn bare_defn_is_an_error_and_does_not_panic() {
        let (_, handler) = analyze_src("(defn)");
        assert!(handler.has_errors());
    }

    #[test]
    fn set_on_let_binding_is_rejected() {
        let (_, handler) = analyze_src("(let x 1) (set! x 2)");
        assert!(handler.has_errors());
    }

    #[test]
    fn set_on_var_binding_is_accepted() {
        let (_, handler) = analyze_src("(var x 1) (set! x 2)");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn duplicate_binding_in_same_scope_is_rejected() {
        let (_, handler) = analyze_src("(let x 1) (let x 2)");
        assert!(handler.has_errors());
    }

    #[test]
    fn shadowing_in_nested_scope_is_fine() {
        let (_, handler) = analyze_src("(defn f [x] (let x 2) x)");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn recur_inside_loop_is_fine() {
        let (_, handler) = analyze_src("(loop [i 0] (if (< i 10) (recur (+ i 1)) i))");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn recur_outside_loop_is_rejected() {
        let (_, handler) = analyze_src("(defn f [] (recur))");
        assert!(handler.has_errors());
    }

    #[test]
    fn destructuring_with_rest_and_default_binds_all_names() {
        let (_, handler) =
            analyze_src("(defn f [[x (= 10) y & rest]] (println x) (println y) (println rest))");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn colon_type_annotation_forwards_without_error() {
        let (_, handler) = analyze_src("(fn add [a:Number b:Number] :Number (+ a b))");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }
}
