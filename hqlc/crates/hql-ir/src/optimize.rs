//! IR optimizer (spec.md section 4.6): a small fixed set of pattern
//! rewrites applied to the lowered tree, not a general optimization
//! pipeline. Each rewrite is structural and deterministic; none of them
//! change observable behavior, only the emitted shape.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::builder::{binary, block, for_stmt, ident, num};
use crate::ir::{DeclKind, Ir, IrKind};

static TEMP_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Fresh binding name for a range operand hoisted out of the loop header,
/// unique across the process lifetime (same convention as
/// `hql_macro::gensym`).
fn fresh_temp_name() -> String {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("__hql_opt_tmp{n}")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeOptions {
    /// Opt-in trampolining for non-tail self-recursive calls that the
    /// lowering stage could not already rewrite to a `loop`/`recur`
    /// `while` (spec.md section 4.6, "opt-in trampolining"). Off by
    /// default: it changes a function's return shape (wraps it to return
    /// a thunk or a value, consumed by `__hql_trampoline`), which is only
    /// correct when the caller expects it.
    pub trampoline: bool,
}

pub fn optimize_program(mut program: Ir, opts: OptimizeOptions) -> Ir {
    if let IrKind::Program(stmts) = &mut program.kind {
        for stmt in stmts.iter_mut() {
            rewrite_node(stmt, opts);
        }
    }
    program
}

fn rewrite_node(node: &mut Ir, opts: OptimizeOptions) {
    if let Some(for_loop) = try_recognize_for_each(node) {
        *node = for_loop;
    }
    walk_children(node, opts);
    if opts.trampoline {
        if let IrKind::FunctionDecl { name, body, .. } = &mut node.kind {
            trampoline_self_recursive(name.clone(), body);
        }
    }
}

fn walk_children(node: &mut Ir, opts: OptimizeOptions) {
    match &mut node.kind {
        IrKind::Program(stmts) | IrKind::Block(stmts) => {
            for s in stmts.iter_mut() {
                rewrite_node(s, opts);
            }
        }
        IrKind::If { test, consequent, alternate } => {
            rewrite_node(test, opts);
            rewrite_node(consequent, opts);
            if let Some(alt) = alternate {
                rewrite_node(alt, opts);
            }
        }
        IrKind::While { test, body } => {
            rewrite_node(test, opts);
            rewrite_node(body, opts);
        }
        IrKind::For { init, test, update, body } => {
            if let Some(i) = init {
                rewrite_node(i, opts);
            }
            if let Some(t) = test {
                rewrite_node(t, opts);
            }
            if let Some(u) = update {
                rewrite_node(u, opts);
            }
            rewrite_node(body, opts);
        }
        IrKind::Try { block, handler, finalizer } => {
            for s in block.iter_mut() {
                rewrite_node(s, opts);
            }
            if let Some(h) = handler {
                for s in h.body.iter_mut() {
                    rewrite_node(s, opts);
                }
            }
            if let Some(f) = finalizer {
                for s in f.iter_mut() {
                    rewrite_node(s, opts);
                }
            }
        }
        IrKind::FunctionDecl { body, .. } => {
            for s in body.iter_mut() {
                rewrite_node(s, opts);
            }
        }
        IrKind::FunctionExpr { body, .. } => {
            for s in body.iter_mut() {
                rewrite_node(s, opts);
            }
        }
        IrKind::ExprStmt(inner)
        | IrKind::Throw(inner)
        | IrKind::Await(inner)
        | IrKind::Labeled { body: inner, .. } => rewrite_node(inner, opts),
        IrKind::Return(Some(inner)) => rewrite_node(inner, opts),
        IrKind::VarDecl { init: Some(inner), .. } => rewrite_node(inner, opts),
        IrKind::Call { callee, args } => {
            rewrite_node(callee, opts);
            for a in args.iter_mut() {
                rewrite_node(a, opts);
            }
        }
        IrKind::CallMember { object, args, .. } => {
            rewrite_node(object, opts);
            for a in args.iter_mut() {
                rewrite_node(a, opts);
            }
        }
        IrKind::New { callee, args } => {
            rewrite_node(callee, opts);
            for a in args.iter_mut() {
                rewrite_node(a, opts);
            }
        }
        IrKind::ArrayExpr(items) => {
            for i in items.iter_mut() {
                rewrite_node(i, opts);
            }
        }
        IrKind::ObjectExpr(props) => {
            for p in props.iter_mut() {
                match p {
                    crate::ir::ObjectProperty::KeyValue { value, .. } => rewrite_node(value, opts),
                    crate::ir::ObjectProperty::Spread(v) => rewrite_node(v, opts),
                }
            }
        }
        IrKind::Member { object, property, .. } => {
            rewrite_node(object, opts);
            rewrite_node(property, opts);
        }
        IrKind::Binary { left, right, .. } => {
            rewrite_node(left, opts);
            rewrite_node(right, opts);
        }
        IrKind::Unary { operand, .. } => rewrite_node(operand, opts),
        IrKind::Assignment { target, value, .. } => {
            rewrite_node(target, opts);
            rewrite_node(value, opts);
        }
        IrKind::Conditional { test, consequent, alternate } => {
            rewrite_node(test, opts);
            rewrite_node(consequent, opts);
            rewrite_node(alternate, opts);
        }
        IrKind::ClassDecl { constructor, methods, fields, .. } => {
            if let Some(ctor) = constructor {
                for s in ctor.body.iter_mut() {
                    rewrite_node(s, opts);
                }
            }
            for m in methods.iter_mut() {
                for s in m.body.iter_mut() {
                    rewrite_node(s, opts);
                }
            }
            for f in fields.iter_mut() {
                if let Some(v) = &mut f.value {
                    rewrite_node(v, opts);
                }
            }
        }
        _ => {}
    }
}

/// Recognizes `__hql_for_each(__hql_toSequence(__hql_range(start, end,
/// step)), (i) => { ...body... })` and rewrites it to a native
/// `for (let i = start; i < end; i += step) { ...body... }`, which every
/// JS engine loop-optimizes far better than a callback per iteration.
/// Range operands that are not already trivial (a literal or a bare
/// identifier) are bound to a fresh temporary evaluated once, before the
/// loop, per spec.md section 4.6's soundness discipline — otherwise a
/// non-trivial `end`/`step` expression with a side effect would be
/// re-evaluated on every iteration instead of once, as the unoptimized
/// `__hql_range` call evaluates it.
fn try_recognize_for_each(node: &Ir) -> Option<Ir> {
    let IrKind::ExprStmt(inner) = &node.kind else { return None };
    let IrKind::Call { callee, args } = &inner.kind else { return None };
    let IrKind::Identifier { name, .. } = &callee.kind else { return None };
    if name != "__hql_for_each" || args.len() != 2 {
        return None;
    }
    let seq = &args[0];
    let iteratee = &args[1];

    let IrKind::Call { callee: seq_callee, args: seq_args } = &seq.kind else { return None };
    let IrKind::Identifier { name: seq_name, .. } = &seq_callee.kind else { return None };
    if seq_name != "__hql_toSequence" || seq_args.len() != 1 {
        return None;
    }
    let range_call = &seq_args[0];
    let IrKind::Call { callee: range_callee, args: range_args } = &range_call.kind else { return None };
    let IrKind::Identifier { name: range_name, .. } = &range_callee.kind else { return None };
    if range_name != "__hql_range" || range_args.is_empty() {
        return None;
    }

    let mut temp_decls = Vec::new();
    let range_args: Vec<Ir> = range_args
        .iter()
        .map(|arg| {
            if is_simple_operand(arg) {
                arg.clone()
            } else {
                let temp_name = fresh_temp_name();
                temp_decls.push(Ir::new(
                    IrKind::VarDecl {
                        kind: DeclKind::Const,
                        name: temp_name.clone(),
                        type_annotation: None,
                        init: Some(Box::new(arg.clone())),
                    },
                    arg.pos,
                ));
                ident(&temp_name, arg.pos)
            }
        })
        .collect();
    let range_args = &range_args[..];

    let IrKind::FunctionExpr { params, body, is_async: false, .. } = &iteratee.kind else { return None };
    if params.len() != 1 || params[0].rest || params[0].destructured {
        return None;
    }
    let var_name = params[0].name.clone();

    let (start, end, step) = match range_args.len() {
        1 => (num(0.0, node.pos), range_args[0].clone(), None),
        2 => (range_args[0].clone(), range_args[1].clone(), None),
        _ => (range_args[0].clone(), range_args[1].clone(), Some(range_args[2].clone())),
    };

    let init = Ir::new(
        IrKind::VarDecl {
            kind: DeclKind::Let,
            name: var_name.clone(),
            type_annotation: None,
            init: Some(Box::new(start)),
        },
        node.pos,
    );
    let step_value = step.unwrap_or_else(|| num(1.0, node.pos));
    // A step that is a syntactically negative literal or unary-minus
    // expression counts down, so the loop condition flips to `i > end`.
    let cmp_op = if is_syntactically_negative(&step_value) { ">" } else { "<" };
    let test = binary(cmp_op, ident(&var_name, node.pos), end, node.pos);
    let update = Ir::new(
        IrKind::Assignment {
            op: "+=".to_string(),
            target: Box::new(ident(&var_name, node.pos)),
            value: Box::new(step_value),
        },
        node.pos,
    );
    let body_block = block(body.clone(), node.pos);
    let for_loop = for_stmt(Some(init), Some(test), Some(update), body_block, node.pos);
    if temp_decls.is_empty() {
        Some(for_loop)
    } else {
        temp_decls.push(for_loop);
        Some(block(temp_decls, node.pos))
    }
}

/// True for a number literal `< 0` or a prefix `-expr` unary, the two
/// shapes spec.md section 4.6 names for recognizing a descending range.
fn is_syntactically_negative(ir: &Ir) -> bool {
    match &ir.kind {
        IrKind::NumberLit(n) => *n < 0.0,
        IrKind::Unary { op, prefix, .. } => op == "-" && *prefix,
        _ => false,
    }
}

fn is_simple_operand(ir: &Ir) -> bool {
    matches!(ir.kind, IrKind::NumberLit(_) | IrKind::Identifier { .. })
}

/// Rewrites non-tail self-recursive calls to `fn_name` inside its own
/// body into `__hql_trampoline`-compatible thunks: every direct call to
/// `fn_name` becomes `() => fn_name(args)`, and the function's own
/// returns are wrapped so the trampoline driver can bounce without
/// growing the JS call stack. Conservative: bails out (leaves the body
/// untouched) if it finds anything other than a call/return/if/block
/// shape, rather than risk miscompiling a control-flow shape it does not
/// recognize.
fn trampoline_self_recursive(name: String, body: &mut Vec<Ir>) {
    let mut found = false;
    for stmt in body.iter_mut() {
        mark_recursive_returns(stmt, &name, &mut found);
    }
    if !found {
        return;
    }
    for stmt in body.iter_mut() {
        wrap_recursive_calls(stmt, &name);
    }
}

fn mark_recursive_returns(node: &Ir, name: &str, found: &mut bool) {
    match &node.kind {
        IrKind::Return(Some(inner)) => {
            if is_direct_call_to(inner, name) {
                *found = true;
            }
        }
        IrKind::Block(stmts) => {
            for s in stmts {
                mark_recursive_returns(s, name, found);
            }
        }
        IrKind::If { consequent, alternate, .. } => {
            mark_recursive_returns(consequent, name, found);
            if let Some(alt) = alternate {
                mark_recursive_returns(alt, name, found);
            }
        }
        _ => {}
    }
}

fn is_direct_call_to(ir: &Ir, name: &str) -> bool {
    matches!(&ir.kind, IrKind::Call { callee, .. } if matches!(&callee.kind, IrKind::Identifier { name: n, .. } if n == name))
}

fn wrap_recursive_calls(node: &mut Ir, name: &str) {
    match &mut node.kind {
        IrKind::Return(Some(inner)) => {
            if is_direct_call_to(inner, name) {
                let original = (**inner).clone();
                let thunk = Ir::new(
                    IrKind::FunctionExpr {
                        name: None,
                        params: Vec::new(),
                        return_type: None,
                        body: vec![Ir::new(IrKind::Return(Some(Box::new(original))), node.pos)],
                        is_async: false,
                        is_arrow: true,
                    },
                    node.pos,
                );
                *inner = Box::new(thunk);
            }
        }
        IrKind::Block(stmts) => {
            for s in stmts.iter_mut() {
                wrap_recursive_calls(s, name);
            }
        }
        IrKind::If { consequent, alternate, .. } => {
            wrap_recursive_calls(consequent, name);
            if let Some(alt) = alternate {
                wrap_recursive_calls(alt, name);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{array, call, call_helper, func_expr, ident, num};
    use crate::ir::Param;

    #[test]
    fn recognizes_for_each_over_range_as_native_for() {
        let range = call_helper("__hql_range", vec![num(0.0, None), num(10.0, None)], None);
        let seq = call_helper("__hql_toSequence", vec![range], None);
        let iteratee = func_expr(
            None,
            vec![Param::simple("i")],
            vec![Ir::new(
                IrKind::ExprStmt(Box::new(call(ident("print", None), vec![ident("i", None)], None))),
                None,
            )],
            true,
            None,
        );
        let stmt = Ir::new(
            IrKind::ExprStmt(Box::new(call_helper("__hql_for_each", vec![seq, iteratee], None))),
            None,
        );
        let program = Ir::new(IrKind::Program(vec![stmt]), None);
        let optimized = optimize_program(program, OptimizeOptions::default());
        let IrKind::Program(stmts) = &optimized.kind else { panic!() };
        assert!(matches!(stmts[0].kind, IrKind::For { .. }));
    }

    #[test]
    fn flips_comparison_for_a_negative_literal_step() {
        let range = call_helper(
            "__hql_range",
            vec![num(10.0, None), num(0.0, None), num(-1.0, None)],
            None,
        );
        let seq = call_helper("__hql_toSequence", vec![range], None);
        let iteratee = func_expr(None, vec![Param::simple("i")], Vec::new(), true, None);
        let stmt = Ir::new(
            IrKind::ExprStmt(Box::new(call_helper("__hql_for_each", vec![seq, iteratee], None))),
            None,
        );
        let program = Ir::new(IrKind::Program(vec![stmt]), None);
        let optimized = optimize_program(program, OptimizeOptions::default());
        let IrKind::Program(stmts) = &optimized.kind else { panic!() };
        let IrKind::For { test: Some(test), .. } = &stmts[0].kind else { panic!("expected a native for loop") };
        let IrKind::Binary { op, .. } = &test.kind else { panic!() };
        assert_eq!(op, ">");
    }

    #[test]
    fn hoists_a_non_trivial_range_bound_into_a_temporary() {
        let side_effecting_end = call(ident("next_bound", None), Vec::new(), None);
        let range = call_helper("__hql_range", vec![num(0.0, None), side_effecting_end], None);
        let seq = call_helper("__hql_toSequence", vec![range], None);
        let iteratee = func_expr(None, vec![Param::simple("i")], Vec::new(), true, None);
        let stmt = Ir::new(
            IrKind::ExprStmt(Box::new(call_helper("__hql_for_each", vec![seq, iteratee], None))),
            None,
        );
        let program = Ir::new(IrKind::Program(vec![stmt]), None);
        let optimized = optimize_program(program, OptimizeOptions::default());
        let IrKind::Program(stmts) = &optimized.kind else { panic!() };
        let IrKind::Block(inner) = &stmts[0].kind else { panic!("expected a block hoisting the temporary") };
        assert!(matches!(inner[0].kind, IrKind::VarDecl { .. }));
        assert!(matches!(inner.last().unwrap().kind, IrKind::For { .. }));
    }

    #[test]
    fn leaves_non_range_for_each_untouched() {
        let coll = array(vec![num(1.0, None), num(2.0, None)], None);
        let seq = call_helper("__hql_toSequence", vec![coll], None);
        let iteratee = func_expr(None, vec![Param::simple("x")], Vec::new(), true, None);
        let stmt = Ir::new(
            IrKind::ExprStmt(Box::new(call_helper("__hql_for_each", vec![seq, iteratee], None))),
            None,
        );
        let program = Ir::new(IrKind::Program(vec![stmt]), None);
        let optimized = optimize_program(program, OptimizeOptions::default());
        let IrKind::Program(stmts) = &optimized.kind else { panic!() };
        assert!(matches!(stmts[0].kind, IrKind::ExprStmt(_)));
    }
}
