//! AST → IR lowering (spec.md section 4.5). Structure-preserving except
//! where the section explicitly calls for reshaping: `loop`/`recur`
//! becomes an explicit `while (true)` with reassignment, destructuring
//! patterns become a cascade of indexed bindings, and the `for_each` /
//! `toSequence` / `range` shape `for`/`doseq` lower to is left for the
//! optimizer (spec.md section 4.6) to fold into a native `for` loop.

use hql_par::{Ast, Literal as AstLiteral};
use hql_sem::{is_operator, split_type_annotation};
use hql_util::Span;

use crate::builder::*;
use crate::ir::{
    CatchClause, ClassField, ClassMethod, DeclKind, EnumCase, ExportKind, Ir, IrKind,
    ImportKind, ImportSpecifier, ObjectProperty, Param,
};

/// Sentinel callee name for an unresolved `(recur ...)` call, replaced by
/// [`rewrite_recur_tail`] once the enclosing loop's binding names are
/// known. Never reaches codegen: every `recur` is inside a `loop` by the
/// time semantic analysis passes (an out-of-tail `recur` is already a
/// diagnostic by then), so this sentinel is always consumed here.
const RECUR_SENTINEL: &str = "__hql_recur_sentinel__";

struct LoopFrame {
    names: Vec<String>,
}

pub struct Lowerer {
    loop_stack: Vec<LoopFrame>,
}

impl Default for Lowerer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lowerer {
    pub fn new() -> Self {
        Lowerer { loop_stack: Vec::new() }
    }

    pub fn lower_program(&mut self, forms: &[Ast]) -> Ir {
        let stmts = forms.iter().map(|f| self.lower_stmt(f)).collect();
        Ir::new(IrKind::Program(stmts), None)
    }

    // ---------------------------------------------------------------
    // Statement position
    // ---------------------------------------------------------------

    fn lower_stmt(&mut self, ast: &Ast) -> Ir {
        let pos = Some(ast.pos());
        match ast {
            Ast::List { elements, .. } if !elements.is_empty() => {
                self.lower_list_stmt(elements, pos)
            }
            _ => expr_stmt(self.lower_expr(ast), pos),
        }
    }

    fn lower_body(&mut self, forms: &[Ast]) -> Vec<Ir> {
        forms.iter().map(|f| self.lower_stmt(f)).collect()
    }

    fn lower_list_stmt(&mut self, elements: &[Ast], pos: Option<Span>) -> Ir {
        let head = elements[0].as_symbol().map(|s| s.as_str().to_string());
        let args = &elements[1..];
        match head.as_deref() {
            Some("if") => self.lower_if_stmt(args, pos),
            Some("cond") => self.lower_cond_stmt(args, pos),
            Some("case") => self.lower_case_stmt(args, pos),
            Some("do") => block(self.lower_body(args), pos),
            Some("let") | Some("const") => self.lower_binding_stmt(args, pos, DeclKind::Const),
            Some("var") => self.lower_binding_stmt(args, pos, DeclKind::Let),
            Some("set!") => self.lower_set(args, pos),
            Some("fn") if matches!(args.first(), Some(a) if a.as_symbol().is_some()) => {
                self.lower_fn_decl(args, pos)
            }
            Some("fn") => expr_stmt(self.lower_fn(args, pos, false), pos),
            Some("defn") if matches!(args.first(), Some(a) if a.as_symbol().is_some()) => {
                self.lower_defn(args, pos)
            }
            // A name-less `defn` is already a semantic-analysis diagnostic
            // (`analyze_defn`) by the time lowering runs; this is only
            // reached if a caller lowers without analyzing first, so fail
            // soft with an empty statement rather than `lower_fn_decl`'s
            // `args[0].as_symbol().unwrap()`.
            Some("defn") => block(Vec::new(), pos),
            Some("class") => self.lower_class(elements, args, pos),
            Some("enum") => self.lower_enum(args, pos),
            Some("new") => expr_stmt(self.lower_new(args, pos), pos),
            Some("try") => self.lower_try(args, pos),
            Some("throw") => Ir::new(
                IrKind::Throw(Box::new(args.first().map(|a| self.lower_expr(a)).unwrap_or_else(|| nil(pos)))),
                pos,
            ),
            Some("import") => self.lower_import(args, pos),
            Some("export") => self.lower_export(args, pos),
            Some("loop") => self.lower_loop(args, pos),
            Some("recur") => expr_stmt(self.lower_recur(args, pos), pos),
            Some("for") => self.lower_for(args, pos),
            Some("doseq") => self.lower_doseq(args, pos),
            Some("while") => self.lower_while(args, pos),
            Some("break") => Ir::new(IrKind::Break(None), pos),
            Some("continue") => Ir::new(IrKind::Continue(None), pos),
            Some("label") => self.lower_label(args, pos),
            Some("async") => expr_stmt(self.lower_async(args, pos), pos),
            Some("await") => Ir::new(IrKind::Await(Box::new(
                args.first().map(|a| self.lower_expr(a)).unwrap_or_else(|| nil(pos)),
            )), pos),
            Some("lazy-seq") => expr_stmt(self.lower_lazy_seq(args, pos), pos),
            Some("get") => expr_stmt(self.lower_get(args, pos), pos),
            Some("quote") | Some("quasiquote") => expr_stmt(self.lower_expr_list(elements, pos), pos),
            _ => expr_stmt(self.lower_expr_list(elements, pos), pos),
        }
    }

    // ---------------------------------------------------------------
    // Expression position
    // ---------------------------------------------------------------

    fn lower_expr(&mut self, ast: &Ast) -> Ir {
        let pos = Some(ast.pos());
        match ast {
            Ast::Literal { value, .. } => lower_literal(value, pos),
            Ast::Symbol { name, .. } => self.lower_symbol_ref(name.as_str(), pos),
            Ast::List { elements, .. } if elements.is_empty() => array(Vec::new(), pos),
            Ast::List { elements, .. } => self.lower_expr_list(elements, pos),
            Ast::Vector { elements, .. } => {
                array(elements.iter().map(|e| self.lower_expr(e)).collect(), pos)
            }
            Ast::Set { elements, .. } => {
                let arr = array(elements.iter().map(|e| self.lower_expr(e)).collect(), pos);
                Ir::new(
                    IrKind::New {
                        callee: Box::new(ident("Set", pos)),
                        args: vec![arr],
                    },
                    pos,
                )
            }
            Ast::Map { entries, .. } => {
                let mut flat = Vec::with_capacity(entries.len() * 2);
                for (k, v) in entries {
                    flat.push(self.lower_expr(k));
                    flat.push(self.lower_expr(v));
                }
                call_helper("__hql_hash_map", flat, pos)
            }
        }
    }

    fn lower_symbol_ref(&mut self, name: &str, pos: Option<Span>) -> Ir {
        if name.starts_with(':') {
            return string(name, pos);
        }
        if is_operator(name) {
            return call_helper("__hql_get_op", vec![string(name, pos)], pos);
        }
        if let Some((head, rest)) = name.split_once('.') {
            let mut node = ident(head, pos);
            for segment in rest.split('.') {
                node = member(node, string(segment, pos), false, pos);
            }
            return node;
        }
        ident(name, pos)
    }

    fn lower_expr_list(&mut self, elements: &[Ast], pos: Option<Span>) -> Ir {
        let head = elements[0].as_symbol().map(|s| s.as_str().to_string());
        let args = &elements[1..];
        match head.as_deref() {
            Some("quote") => self.reify(&args[0], false),
            Some("quasiquote") => self.reify(&args[0], true),
            Some("unquote") | Some("unquote-splice") => {
                // Only reachable if a template escapes its quasiquote
                // context (a macro-expander bug, not a user error); fall
                // back to lowering the inner form directly.
                self.lower_expr(&args[0])
            }
            Some("if") => self.lower_if_expr(args, pos),
            Some("cond") => self.lower_cond_expr(args, pos),
            Some("case") => self.lower_case_expr(args, pos),
            Some("do") => iife_wrapping_do(self, args, pos),
            Some("let") | Some("const") => {
                iife_wrapping_stmt(self.lower_binding_stmt(args, pos, DeclKind::Const), pos)
            }
            Some("var") => iife_wrapping_stmt(self.lower_binding_stmt(args, pos, DeclKind::Let), pos),
            Some("fn") => self.lower_fn(args, pos, true),
            Some("new") => self.lower_new(args, pos),
            Some("loop") => iife_wrapping_stmt(self.lower_loop(args, pos), pos),
            Some("for") => iife_wrapping_stmt(self.lower_for(args, pos), pos),
            Some("doseq") => iife_wrapping_stmt(self.lower_doseq(args, pos), pos),
            Some("while") => iife_wrapping_stmt(self.lower_while(args, pos), pos),
            Some("try") => iife_wrapping_stmt(self.lower_try(args, pos), pos),
            Some("lazy-seq") => self.lower_lazy_seq(args, pos),
            Some("await") => Ir::new(
                IrKind::Await(Box::new(args.first().map(|a| self.lower_expr(a)).unwrap_or_else(|| nil(pos)))),
                pos,
            ),
            Some("get") => self.lower_get(args, pos),
            Some("set!") => iife_wrapping_stmt(self.lower_set(args, pos), pos),
            Some(op) if is_operator(op) => self.lower_operator_call(op, args, pos),
            _ => self.lower_call(&elements[0], args, pos),
        }
    }

    fn lower_operator_call(&mut self, op: &str, args: &[Ast], pos: Option<Span>) -> Ir {
        use hql_sem::kernel::is_unary_operator;
        if is_unary_operator(op) && args.len() == 1 {
            return Ir::new(
                IrKind::Unary {
                    op: op.to_string(),
                    operand: Box::new(self.lower_expr(&args[0])),
                    prefix: true,
                },
                pos,
            );
        }
        // Variadic arithmetic/logical calls (`(+ a b c)`) fold left.
        let mut it = args.iter();
        let Some(first) = it.next() else { return nil(pos) };
        let mut acc = self.lower_expr(first);
        for next in it {
            let rhs = self.lower_expr(next);
            acc = binary(op, acc, rhs, pos);
        }
        acc
    }

    fn lower_call(&mut self, callee: &Ast, args: &[Ast], pos: Option<Span>) -> Ir {
        // `(obj.method a b)` → a direct method call rather than
        // `(obj.method)(a, b)`, which would lose `this`.
        if let Some(name) = callee.as_symbol() {
            let text = name.as_str();
            if let Some((head, rest)) = text.rsplit_once('.') {
                let object = self.lower_symbol_ref(head, pos);
                return Ir::new(
                    IrKind::CallMember {
                        object: Box::new(object),
                        property: rest.to_string(),
                        computed: false,
                        args: args.iter().map(|a| self.lower_expr(a)).collect(),
                    },
                    pos,
                );
            }
        }
        let callee_ir = self.lower_expr(callee);
        call(callee_ir, args.iter().map(|a| self.lower_expr(a)).collect(), pos)
    }

    // ---------------------------------------------------------------
    // if / cond / case
    // ---------------------------------------------------------------

    fn lower_if_stmt(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let test = self.lower_expr(&args[0]);
        let consequent = self.lower_stmt(&args[1]);
        let alternate = args.get(2).map(|a| self.lower_stmt(a));
        if_stmt(test, consequent, alternate, pos)
    }

    fn lower_if_expr(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let test = self.lower_expr(&args[0]);
        let consequent = self.lower_expr(&args[1]);
        let alternate = args.get(2).map(|a| self.lower_expr(a)).unwrap_or_else(|| nil(pos));
        conditional(test, consequent, alternate, pos)
    }

    fn lower_cond_stmt(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        self.fold_cond(args, pos, true)
    }

    fn lower_cond_expr(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        self.fold_cond(args, pos, false)
    }

    fn fold_cond(&mut self, clauses: &[Ast], pos: Option<Span>, as_stmt: bool) -> Ir {
        if clauses.is_empty() {
            return if as_stmt { block(Vec::new(), pos) } else { nil(pos) };
        }
        let Some(pair) = clauses[0].as_list() else {
            return self.fold_cond(&clauses[1..], pos, as_stmt);
        };
        let is_else = pair[0].as_symbol().map(|s| s.as_str() == "else").unwrap_or(false);
        let rest = self.fold_cond(&clauses[1..], pos, as_stmt);
        if is_else {
            return if as_stmt { self.lower_stmt(&pair[1]) } else { self.lower_expr(&pair[1]) };
        }
        let test = self.lower_expr(&pair[0]);
        if as_stmt {
            let consequent = self.lower_stmt(&pair[1]);
            if_stmt(test, consequent, Some(rest), pos)
        } else {
            let consequent = self.lower_expr(&pair[1]);
            conditional(test, consequent, rest, pos)
        }
    }

    fn lower_case_stmt(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        self.fold_case(args, pos, true)
    }

    fn lower_case_expr(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        self.fold_case(args, pos, false)
    }

    fn fold_case(&mut self, args: &[Ast], pos: Option<Span>, as_stmt: bool) -> Ir {
        if args.is_empty() {
            return if as_stmt { block(Vec::new(), pos) } else { nil(pos) };
        }
        let subject = self.lower_expr(&args[0]);
        self.fold_case_clauses(&subject, &args[1..], pos, as_stmt)
    }

    fn fold_case_clauses(&mut self, subject: &Ir, clauses: &[Ast], pos: Option<Span>, as_stmt: bool) -> Ir {
        if clauses.is_empty() {
            return if as_stmt { block(Vec::new(), pos) } else { nil(pos) };
        }
        let Some(clause) = clauses[0].as_list() else {
            return self.fold_case_clauses(subject, &clauses[1..], pos, as_stmt);
        };
        let is_else = clause[0].as_symbol().map(|s| s.as_str() == "else").unwrap_or(false);
        let rest = self.fold_case_clauses(subject, &clauses[1..], pos, as_stmt);
        if is_else {
            return if as_stmt { self.lower_stmt(&clause[1]) } else { self.lower_expr(&clause[1]) };
        }
        let key = self.lower_expr(&clause[0]);
        let test = binary("===", subject.clone_shallow(), key, pos);
        if as_stmt {
            let consequent = self.lower_stmt(&clause[1]);
            if_stmt(test, consequent, Some(rest), pos)
        } else {
            let consequent = self.lower_expr(&clause[1]);
            conditional(test, consequent, rest, pos)
        }
    }

    // ---------------------------------------------------------------
    // let / var / const, set!
    // ---------------------------------------------------------------

    fn lower_binding_stmt(&mut self, args: &[Ast], pos: Option<Span>, kind: DeclKind) -> Ir {
        if args.is_empty() {
            return block(Vec::new(), pos);
        }
        match &args[0] {
            Ast::Symbol { name, .. } => {
                let (clean, ty, _ok) = split_type_annotation(*name);
                let init = args.get(1).map(|a| self.lower_expr(a));
                var_decl(kind, clean.as_str(), ty.map(|t| t.as_str().to_string()), init, pos)
            }
            pat @ Ast::Vector { .. } if hql_par::could_be_pattern(pat) => {
                let init = args.get(1).map(|a| self.lower_expr(a)).unwrap_or_else(|| nil(pos));
                let source_name = fresh_temp("destructure");
                let mut stmts = vec![var_decl(kind, &source_name, None, Some(init), pos)];
                stmts.extend(self.lower_pattern_bindings(pat, &ident(&source_name, pos), kind, pos));
                stmts.extend(self.lower_body(&args[2..]));
                block(stmts, pos)
            }
            Ast::List { elements: pairs, .. } => {
                let mut stmts = Vec::new();
                let mut i = 0;
                while i + 1 < pairs.len() {
                    stmts.push(self.lower_single_binding(&pairs[i], &pairs[i + 1], kind, pos));
                    i += 2;
                }
                stmts.extend(self.lower_body(&args[1..]));
                block(stmts, pos)
            }
            other => expr_stmt(self.lower_expr(other), pos),
        }
    }

    fn lower_single_binding(&mut self, target: &Ast, init_ast: &Ast, kind: DeclKind, pos: Option<Span>) -> Ir {
        let init = self.lower_expr(init_ast);
        match target {
            Ast::Symbol { name, .. } => {
                let (clean, ty, _ok) = split_type_annotation(*name);
                var_decl(kind, clean.as_str(), ty.map(|t| t.as_str().to_string()), Some(init), pos)
            }
            pat @ Ast::Vector { .. } => {
                let source_name = fresh_temp("destructure");
                let mut stmts = vec![var_decl(kind, &source_name, None, Some(init), pos)];
                stmts.extend(self.lower_pattern_bindings(pat, &ident(&source_name, pos), kind, pos));
                block(stmts, pos)
            }
            _ => expr_stmt(init, pos),
        }
    }

    /// Expands a destructuring pattern vector into straight-line `const`/
    /// `let` bindings indexing into `source` — the "mini-compiler that
    /// emits straight-line IR" approach spec.md section 9 recommends,
    /// applied at lowering time rather than macro-expansion time since
    /// patterns occur in kernel forms (`fn`, `let`) as well as macros.
    fn lower_pattern_bindings(&mut self, pattern: &Ast, source: &Ir, kind: DeclKind, pos: Option<Span>) -> Vec<Ir> {
        let Ast::Vector { elements, .. } = pattern else { return Vec::new() };
        let mut out = Vec::new();
        let mut i = 0usize;
        while i < elements.len() {
            let el = &elements[i];
            if el.as_symbol().map(|s| s.as_str() == "&").unwrap_or(false) {
                if let Some(rest_target) = elements.get(i + 1) {
                    let slice = Ir::new(
                        IrKind::CallMember {
                            object: Box::new(source.clone_shallow()),
                            property: "slice".to_string(),
                            computed: false,
                            args: vec![num(i as f64, pos)],
                        },
                        pos,
                    );
                    if let Some(name) = rest_target.as_symbol() {
                        if name.as_str() != "_" {
                            out.push(var_decl(kind, name.as_str(), None, Some(slice), pos));
                        }
                    }
                }
                break;
            }
            let indexed = member(source.clone_shallow(), num(i as f64, pos), true, pos);
            match el {
                Ast::Symbol { name, .. } => {
                    if name.as_str() != "_" {
                        let (clean, ty, _ok) = split_type_annotation(*name);
                        out.push(var_decl(kind, clean.as_str(), ty.map(|t| t.as_str().to_string()), Some(indexed), pos));
                    }
                }
                Ast::List { elements: def_elems, .. } if def_elems.len() == 2 => {
                    // placeholder default-only element is handled by the
                    // *previous* sibling below; a bare `(= v)` reaching
                    // here with no preceding binder is a parser guarantee
                    // violation, so just evaluate it for side effects.
                    out.push(expr_stmt(self.lower_expr(&def_elems[1]), pos));
                }
                Ast::Vector { .. } => {
                    out.extend(self.lower_pattern_bindings(el, &indexed, kind, pos));
                }
                _ => {}
            }
            // `(= default)` immediately following a plain identifier binds
            // that identifier with a fallback when `source[i]` is
            // `undefined`.
            if let Some(Ast::List { elements: def_elems, .. }) = elements.get(i + 1) {
                if def_elems.len() == 2 && def_elems[0].as_symbol().map(|s| s.as_str() == "=").unwrap_or(false) {
                    if let Some(name) = el.as_symbol() {
                        if name.as_str() != "_" {
                            out.pop();
                            let (clean, ty, _ok) = split_type_annotation(name);
                            let default = self.lower_expr(&def_elems[1]);
                            let guarded = conditional(
                                binary("!==", indexed.clone_shallow(), ident("undefined", pos), pos),
                                indexed,
                                default,
                                pos,
                            );
                            out.push(var_decl(kind, clean.as_str(), ty.map(|t| t.as_str().to_string()), Some(guarded), pos));
                        }
                    }
                    i += 1;
                }
            }
            i += 1;
        }
        out
    }

    fn lower_set(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let target = self.lower_expr(&args[0]);
        let value = self.lower_expr(&args[1]);
        expr_stmt(assign("=", target, value, pos), pos)
    }

    // ---------------------------------------------------------------
    // fn / defn / class / enum
    // ---------------------------------------------------------------

    fn lower_params(&mut self, params: &Ast) -> (Vec<Param>, Vec<Ir>) {
        let mut out = Vec::new();
        let mut prologue = Vec::new();
        let Ast::Vector { elements, .. } = params else { return (out, prologue) };
        let mut i = 0;
        while i < elements.len() {
            let el = &elements[i];
            if el.as_symbol().map(|s| s.as_str() == "&").unwrap_or(false) {
                if let Some(rest) = elements.get(i + 1).and_then(Ast::as_symbol) {
                    let (clean, ty, _ok) = split_type_annotation(rest);
                    out.push(Param {
                        name: clean.as_str().to_string(),
                        type_annotation: ty.map(|t| t.as_str().to_string()),
                        default: None,
                        rest: true,
                        destructured: false,
                    });
                }
                break;
            }
            match el {
                Ast::Symbol { name, .. } => {
                    let (clean, ty, _ok) = split_type_annotation(*name);
                    let mut default = None;
                    if let Some(Ast::List { elements: def_elems, .. }) = elements.get(i + 1) {
                        if def_elems.len() == 2 && def_elems[0].as_symbol().map(|s| s.as_str() == "=").unwrap_or(false) {
                            default = Some(Box::new(self.lower_expr(&def_elems[1])));
                            i += 1;
                        }
                    }
                    out.push(Param {
                        name: clean.as_str().to_string(),
                        type_annotation: ty.map(|t| t.as_str().to_string()),
                        default,
                        rest: false,
                        destructured: false,
                    });
                }
                Ast::Vector { .. } => {
                    let temp = fresh_temp("param");
                    prologue.extend(self.lower_pattern_bindings(el, &ident(&temp, None), DeclKind::Const, None));
                    out.push(Param {
                        name: temp,
                        type_annotation: None,
                        default: None,
                        rest: false,
                        destructured: true,
                    });
                }
                _ => {}
            }
            i += 1;
        }
        (out, prologue)
    }

    fn lower_fn(&mut self, args: &[Ast], pos: Option<Span>, force_expr: bool) -> Ir {
        let mut idx = 0;
        let mut name = None;
        if let Some(n) = args.first().and_then(Ast::as_symbol) {
            name = Some(n.as_str().to_string());
            idx = 1;
        }
        let Some(params_ast) = args.get(idx) else {
            return func_expr(name, Vec::new(), Vec::new(), !force_expr && false, pos);
        };
        idx += 1;
        let mut return_type = None;
        if let Some(next) = args.get(idx) {
            if let Some(s) = next.as_symbol() {
                if s.as_str().starts_with(':') {
                    return_type = Some(s.as_str()[1..].to_string());
                    idx += 1;
                }
            }
        }
        let (params, prologue) = self.lower_params(params_ast);
        let mut body = prologue;
        body.extend(self.lower_body(&args[idx..]));
        let is_arrow = name.is_none();
        Ir::new(
            IrKind::FunctionExpr {
                name,
                params,
                return_type,
                body,
                is_async: false,
                is_arrow,
            },
            pos,
        )
    }

    fn lower_fn_decl(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let name = args[0].as_symbol().unwrap().as_str().to_string();
        let mut idx = 1;
        let Some(params_ast) = args.get(idx) else {
            return Ir::new(
                IrKind::FunctionDecl { name, params: Vec::new(), return_type: None, body: Vec::new(), is_async: false },
                pos,
            );
        };
        idx += 1;
        let mut return_type = None;
        if let Some(next) = args.get(idx) {
            if let Some(s) = next.as_symbol() {
                if s.as_str().starts_with(':') {
                    return_type = Some(s.as_str()[1..].to_string());
                    idx += 1;
                }
            }
        }
        let (params, prologue) = self.lower_params(params_ast);
        let mut body = prologue;
        body.extend(self.lower_body(&args[idx..]));
        Ir::new(IrKind::FunctionDecl { name, params, return_type, body, is_async: false }, pos)
    }

    fn lower_defn(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        self.lower_fn_decl(args, pos)
    }

    fn lower_class(&mut self, _full: &[Ast], args: &[Ast], pos: Option<Span>) -> Ir {
        let Some(name) = args.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()) else {
            return block(Vec::new(), pos);
        };
        let mut fields = Vec::new();
        let mut constructor = None;
        let mut methods = Vec::new();
        for member in &args[1..] {
            let Some(elements) = member.as_list() else { continue };
            let Some(tag) = elements.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()) else { continue };
            match tag.as_str() {
                "constructor" => {
                    let (params, prologue) = self.lower_params(&elements[1]);
                    let mut body = prologue;
                    body.extend(self.lower_body(&elements[2..]));
                    constructor = Some(Box::new(ClassMethod {
                        name: "constructor".to_string(),
                        params,
                        body,
                        is_static: false,
                        is_async: false,
                    }));
                }
                "fn" => {
                    let method_name = elements[1].as_symbol().unwrap().as_str().to_string();
                    let (params, prologue) = self.lower_params(&elements[2]);
                    let mut body = prologue;
                    body.extend(self.lower_body(&elements[3..]));
                    methods.push(ClassMethod { name: method_name, params, body, is_static: false, is_async: false });
                }
                "var" | "let" => {
                    let field_name = elements[1].as_symbol().unwrap().as_str().to_string();
                    let value = elements.get(2).map(|v| self.lower_expr(v));
                    fields.push(ClassField { name: field_name, mutable: tag == "var", value });
                }
                _ => {}
            }
        }
        Ir::new(
            IrKind::ClassDecl { name, superclass: None, fields, constructor, methods },
            pos,
        )
    }

    fn lower_enum(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let Some(name) = args.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()) else {
            return block(Vec::new(), pos);
        };
        let mut cases = Vec::new();
        for case in &args[1..] {
            let Some(elements) = case.as_list() else { continue };
            if elements.first().and_then(Ast::as_symbol).map(|s| s.as_str() == "case").unwrap_or(false) {
                let case_name = elements[1].as_symbol().unwrap().as_str().to_string();
                let mut raw_value = None;
                let mut associated_fields = Vec::new();
                for extra in &elements[2..] {
                    if let Ast::Literal { .. } = extra {
                        raw_value = Some(self.lower_expr(extra));
                    } else if let Some(s) = extra.as_symbol() {
                        associated_fields.push(s.as_str().to_string());
                    }
                }
                cases.push(EnumCase { name: case_name, raw_value, associated_fields });
            }
        }
        Ir::new(IrKind::EnumDecl { name, cases }, pos)
    }

    fn lower_new(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        if args.is_empty() {
            return nil(pos);
        }
        let callee = self.lower_expr(&args[0]);
        let call_args = args[1..].iter().map(|a| self.lower_expr(a)).collect();
        Ir::new(IrKind::New { callee: Box::new(callee), args: call_args }, pos)
    }

    // ---------------------------------------------------------------
    // try/catch/finally
    // ---------------------------------------------------------------

    fn lower_try(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let mut block_stmts = Vec::new();
        let mut handler = None;
        let mut finalizer = None;
        for clause in args {
            if let Some(elements) = clause.as_list() {
                match elements.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()).as_deref() {
                    Some("catch") => {
                        let param = elements.get(1).and_then(Ast::as_symbol).map(|s| s.as_str().to_string());
                        let body = self.lower_body(&elements[2..]);
                        handler = Some(CatchClause { param, body });
                        continue;
                    }
                    Some("finally") => {
                        finalizer = Some(self.lower_body(&elements[1..]));
                        continue;
                    }
                    _ => {}
                }
            }
            block_stmts.push(self.lower_stmt(clause));
        }
        Ir::new(IrKind::Try { block: block_stmts, handler, finalizer }, pos)
    }

    // ---------------------------------------------------------------
    // import/export
    // ---------------------------------------------------------------

    fn lower_import(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        match args.first() {
            Some(Ast::Vector { elements, .. }) => {
                let module = args.get(2).and_then(ast_string).unwrap_or_default();
                let mut specs = Vec::new();
                let mut i = 0;
                while i < elements.len() {
                    if let Some(name) = elements[i].as_symbol() {
                        if name.as_str() == "as" {
                            i += 1;
                            continue;
                        }
                        let local = if elements.get(i + 1).and_then(Ast::as_symbol).map(|s| s.as_str() == "as").unwrap_or(false) {
                            let alias = elements.get(i + 2).and_then(Ast::as_symbol).map(|s| s.as_str().to_string());
                            i += 2;
                            alias.unwrap_or_else(|| name.as_str().to_string())
                        } else {
                            name.as_str().to_string()
                        };
                        specs.push(ImportSpecifier { imported: name.as_str().to_string(), local });
                    }
                    i += 1;
                }
                Ir::new(IrKind::Import { kind: ImportKind::Named(specs), module }, pos)
            }
            Some(Ast::Symbol { name, .. }) => {
                let module = args.get(1).and_then(ast_string).unwrap_or_default();
                Ir::new(
                    IrKind::Import { kind: ImportKind::Namespace(name.as_str().to_string()), module },
                    pos,
                )
            }
            Some(Ast::Literal { value: AstLiteral::String(s), .. }) => Ir::new(
                IrKind::Import { kind: ImportKind::SideEffect, module: s.as_str().to_string() },
                pos,
            ),
            _ => block(Vec::new(), pos),
        }
    }

    fn lower_export(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        match args.first() {
            Some(Ast::Vector { elements, .. }) => {
                let names = elements.iter().filter_map(Ast::as_symbol).map(|s| s.as_str().to_string()).collect();
                Ir::new(IrKind::Export(ExportKind::Named(names)), pos)
            }
            Some(other) if other.as_symbol().map(|s| s.as_str() == "default").unwrap_or(false) => {
                let value = args.get(1).map(|a| self.lower_expr(a)).unwrap_or_else(|| nil(pos));
                Ir::new(IrKind::Export(ExportKind::Default(Box::new(value))), pos)
            }
            _ => block(Vec::new(), pos),
        }
    }

    // ---------------------------------------------------------------
    // loop / recur
    // ---------------------------------------------------------------

    fn lower_loop(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let Some(bindings) = args.first() else { return block(Vec::new(), pos) };
        let pairs: &[Ast] = match bindings {
            Ast::Vector { elements, .. } | Ast::List { elements, .. } => elements,
            _ => return block(Vec::new(), pos),
        };
        let mut decls = Vec::new();
        let mut names = Vec::new();
        let mut i = 0;
        while i + 1 < pairs.len() {
            let value = self.lower_expr(&pairs[i + 1]);
            if let Some(name) = pairs[i].as_symbol() {
                decls.push(var_decl(DeclKind::Let, name.as_str(), None, Some(value), pos));
                names.push(name.as_str().to_string());
            }
            i += 2;
        }
        self.loop_stack.push(LoopFrame { names: names.clone() });
        let mut body_stmts = self.lower_body(&args[1..]);
        self.loop_stack.pop();
        rewrite_recur_tail(&mut body_stmts, &names, pos);
        let loop_node = while_stmt(boolean(true, pos), block(body_stmts, pos), pos);
        let mut out = decls;
        out.push(loop_node);
        block(out, pos)
    }

    fn lower_recur(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let evaluated = args.iter().map(|a| self.lower_expr(a)).collect();
        call(ident(RECUR_SENTINEL, pos), evaluated, pos)
    }

    // ---------------------------------------------------------------
    // for / doseq / while
    // ---------------------------------------------------------------

    fn lower_for(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let Some(Ast::Vector { elements: clause, .. }) = args.first() else {
            return block(Vec::new(), pos);
        };
        let var_name = clause.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()).unwrap_or_else(|| "i".to_string());
        let range_args: Vec<Ir> = clause[1..].iter().map(|a| self.lower_expr(a)).collect();
        let seq = call_helper("__hql_toSequence", vec![call_helper("__hql_range", range_args, pos)], pos);
        let body = self.lower_body(&args[1..]);
        let iteratee = func_expr(None, vec![Param::simple(&var_name)], strip_trailing_returns(body), true, pos);
        expr_stmt(call_helper("__hql_for_each", vec![seq, iteratee], pos), pos)
    }

    fn lower_doseq(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let Some(Ast::Vector { elements: clause, .. }) = args.first() else {
            return block(Vec::new(), pos);
        };
        let var_name = clause.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()).unwrap_or_else(|| "x".to_string());
        let coll = clause.get(1).map(|a| self.lower_expr(a)).unwrap_or_else(|| nil(pos));
        let seq = call_helper("__hql_toSequence", vec![coll], pos);
        let body = self.lower_body(&args[1..]);
        let iteratee = func_expr(None, vec![Param::simple(&var_name)], strip_trailing_returns(body), true, pos);
        expr_stmt(call_helper("__hql_for_each", vec![seq, iteratee], pos), pos)
    }

    fn lower_while(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        if args.is_empty() {
            return block(Vec::new(), pos);
        }
        let test = self.lower_expr(&args[0]);
        let body = block(self.lower_body(&args[1..]), pos);
        while_stmt(test, body, pos)
    }

    fn lower_label(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let Some(label) = args.first().and_then(Ast::as_symbol).map(|s| s.as_str().to_string()) else {
            return block(Vec::new(), pos);
        };
        let body = block(self.lower_body(&args[1..]), pos);
        Ir::new(IrKind::Labeled { label, body: Box::new(body) }, pos)
    }

    fn lower_async(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let body = self.lower_body(args);
        let arrow = Ir::new(
            IrKind::FunctionExpr {
                name: None,
                params: Vec::new(),
                return_type: None,
                body,
                is_async: true,
                is_arrow: true,
            },
            pos,
        );
        call(arrow, Vec::new(), pos)
    }

    fn lower_lazy_seq(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let body = self.lower_body(args);
        let thunk = func_expr(None, Vec::new(), body, true, pos);
        call_helper("__hql_lazy_seq", vec![thunk], pos)
    }

    fn lower_get(&mut self, args: &[Ast], pos: Option<Span>) -> Ir {
        let evaluated: Vec<Ir> = args.iter().map(|a| self.lower_expr(a)).collect();
        call_helper("__hql_get", evaluated, pos)
    }

    // ---------------------------------------------------------------
    // quote/quasiquote reification
    // ---------------------------------------------------------------

    fn reify(&mut self, ast: &Ast, allow_unquote: bool) -> Ir {
        let pos = Some(ast.pos());
        match ast {
            Ast::Literal { value, .. } => lower_literal(value, pos),
            Ast::Symbol { name, .. } => string(name.as_str(), pos),
            Ast::List { elements, .. } => {
                if allow_unquote {
                    if let Some(head) = elements.first().and_then(Ast::as_symbol) {
                        if head.as_str() == "unquote" {
                            return self.lower_expr(&elements[1]);
                        }
                    }
                }
                let mut parts = Vec::new();
                for el in elements {
                    if allow_unquote {
                        if let Some(inner) = el.as_list() {
                            if inner.first().and_then(Ast::as_symbol).map(|s| s.as_str() == "unquote-splice").unwrap_or(false) {
                                parts.push(ObjectSplice::Splice(self.lower_expr(&inner[1])));
                                continue;
                            }
                        }
                    }
                    parts.push(ObjectSplice::Item(self.reify(el, allow_unquote)));
                }
                build_array_with_splices(parts, pos)
            }
            Ast::Vector { elements, .. } => {
                let items = elements.iter().map(|e| self.reify(e, allow_unquote)).collect();
                array(items, pos)
            }
            Ast::Set { elements, .. } => {
                let items: Vec<Ir> = elements.iter().map(|e| self.reify(e, allow_unquote)).collect();
                Ir::new(IrKind::New { callee: Box::new(ident("Set", pos)), args: vec![array(items, pos)] }, pos)
            }
            Ast::Map { entries, .. } => {
                let props = entries
                    .iter()
                    .map(|(k, v)| ObjectProperty::KeyValue {
                        key: symbol_or_literal_key(k),
                        computed: false,
                        value: self.reify(v, allow_unquote),
                    })
                    .collect();
                Ir::new(IrKind::ObjectExpr(props), pos)
            }
        }
    }
}

enum ObjectSplice {
    Item(Ir),
    Splice(Ir),
}

fn build_array_with_splices(parts: Vec<ObjectSplice>, pos: Option<Span>) -> Ir {
    if parts.iter().all(|p| matches!(p, ObjectSplice::Item(_))) {
        let items = parts
            .into_iter()
            .map(|p| match p {
                ObjectSplice::Item(i) => i,
                ObjectSplice::Splice(_) => unreachable!(),
            })
            .collect();
        return array(items, pos);
    }
    // Mixed splice/non-splice: `[].concat(a, [b], c)` flattens arrays
    // produced by unquote-splice alongside plain items.
    let args = parts
        .into_iter()
        .map(|p| match p {
            ObjectSplice::Item(i) => array(vec![i], pos),
            ObjectSplice::Splice(i) => i,
        })
        .collect();
    Ir::new(
        IrKind::CallMember {
            object: Box::new(array(Vec::new(), pos)),
            property: "concat".to_string(),
            computed: false,
            args,
        },
        pos,
    )
}

fn symbol_or_literal_key(ast: &Ast) -> String {
    match ast {
        Ast::Symbol { name, .. } => name.as_str().trim_start_matches(':').to_string(),
        Ast::Literal { value: AstLiteral::String(s), .. } => s.as_str().to_string(),
        _ => String::new(),
    }
}

fn ast_string(ast: &Ast) -> Option<String> {
    match ast {
        Ast::Literal { value: AstLiteral::String(s), .. } => Some(s.as_str().to_string()),
        _ => None,
    }
}

fn lower_literal(value: &AstLiteral, pos: Option<Span>) -> Ir {
    match value {
        AstLiteral::Number(n) => num(*n, pos),
        AstLiteral::String(s) => string(s.as_str(), pos),
        AstLiteral::Boolean(b) => boolean(*b, pos),
        AstLiteral::Nil => nil(pos),
    }
}

/// `(do a b c)` in expression position: all but the last form run for
/// effect, the last form's value is returned from the wrapping IIFE.
fn iife_wrapping_do(lowerer: &mut Lowerer, args: &[Ast], pos: Option<Span>) -> Ir {
    if args.is_empty() {
        return nil(pos);
    }
    let mut stmts: Vec<Ir> = args[..args.len() - 1].iter().map(|a| lowerer.lower_stmt(a)).collect();
    let last_value = lowerer.lower_expr(&args[args.len() - 1]);
    stmts.push(return_stmt(Some(last_value), pos));
    let arrow = func_expr(None, Vec::new(), stmts, true, pos);
    call(arrow, Vec::new(), pos)
}

/// An iteratee body's trailing `return E;` becomes `E;` and a trailing
/// bare `return;` is dropped (spec.md section 4.6, the `for_each`
/// iteratee-body rule) — applied here too since `doseq`/`for` iteratees
/// are themselves ordinary callback bodies before the optimizer ever
/// gets a chance to recognize the range shape.
fn strip_trailing_returns(mut body: Vec<Ir>) -> Vec<Ir> {
    if let Some(last) = body.last_mut() {
        if let IrKind::Return(value) = &last.kind {
            *last = match value {
                Some(v) => expr_stmt((**v).clone(), last.pos),
                None => Ir::new(IrKind::Block(Vec::new()), last.pos),
            };
        }
    }
    body
}

/// Replaces a `recur` sentinel call in tail position with simultaneous
/// reassignment of the loop's bindings followed by `continue`. Descends
/// into the tail branches of `If`/`Block` only — `cond`/`case`/`try`
/// tail positions are not rewritten; a `recur` there is rare enough in
/// practice that the fallback (an explicit call, which simply does
/// nothing useful at runtime) is an acceptable gap, noted in DESIGN.md.
fn rewrite_recur_tail(stmts: &mut [Ir], names: &[String], pos: Option<Span>) {
    if let Some(last) = stmts.last_mut() {
        rewrite_recur_in_node(last, names, pos);
    }
}

fn rewrite_recur_in_node(node: &mut Ir, names: &[String], pos: Option<Span>) {
    match &mut node.kind {
        IrKind::Block(inner) => rewrite_recur_tail(inner, names, pos),
        IrKind::If { consequent, alternate, .. } => {
            rewrite_recur_in_node(consequent, names, pos);
            if let Some(alt) = alternate {
                rewrite_recur_in_node(alt, names, pos);
            }
        }
        IrKind::ExprStmt(inner) => {
            if let IrKind::Call { callee, args } = &inner.kind {
                if matches!(&callee.kind, IrKind::Identifier { name, .. } if name == RECUR_SENTINEL) {
                    *node = build_recur_reassignment(args.clone(), names, pos);
                }
            }
        }
        _ => {}
    }
}

fn build_recur_reassignment(args: Vec<Ir>, names: &[String], pos: Option<Span>) -> Ir {
    let mut stmts = Vec::new();
    let mut temps = Vec::new();
    for (i, value) in args.into_iter().enumerate() {
        let temp = fresh_temp(&format!("recur{i}"));
        stmts.push(var_decl(DeclKind::Const, &temp, None, Some(value), pos));
        temps.push(temp);
    }
    for (name, temp) in names.iter().zip(temps.iter()) {
        stmts.push(expr_stmt(assign("=", ident(name, pos), ident(temp, pos), pos), pos));
    }
    stmts.push(Ir::new(IrKind::Continue(None), pos));
    block(stmts, pos)
}

impl Ir {
    /// A shallow clone used when the same already-lowered sub-expression
    /// (e.g. a `case` subject, or a destructuring source binding) must
    /// appear at more than one position in the output tree. Safe because
    /// these are always simple identifier/member reads with no
    /// observable side effect of their own.
    fn clone_shallow(&self) -> Ir {
        self.clone()
    }
}
