//! Collects the set of fixed runtime helpers (spec.md section 4.5/4.7)
//! actually referenced by a lowered program, so `hql-gen` only prepends
//! the definitions a given bundle needs.

use hql_ir::{Ir, IrKind, ObjectProperty};
use hql_sem::is_runtime_helper;
use hql_util::FxHashSet;

pub fn collect_referenced_helpers(program: &Ir) -> FxHashSet<&'static str> {
    let mut out = FxHashSet::default();
    walk(program, &mut out);
    out
}

fn note(name: &str, out: &mut FxHashSet<&'static str>) {
    if is_runtime_helper(name) {
        if let Some(&helper) = hql_sem::RUNTIME_HELPERS.iter().find(|h| **h == name) {
            out.insert(helper);
        }
    }
}

fn walk(node: &Ir, out: &mut FxHashSet<&'static str>) {
    if let IrKind::Identifier { name, .. } = &node.kind {
        note(name, out);
    }
    match &node.kind {
        IrKind::Program(stmts) | IrKind::Block(stmts) => stmts.iter().for_each(|s| walk(s, out)),
        IrKind::ExprStmt(inner)
        | IrKind::Throw(inner)
        | IrKind::Await(inner)
        | IrKind::Labeled { body: inner, .. } => walk(inner, out),
        IrKind::Return(Some(inner)) => walk(inner, out),
        IrKind::VarDecl { init: Some(inner), .. } => walk(inner, out),
        IrKind::If { test, consequent, alternate } => {
            walk(test, out);
            walk(consequent, out);
            if let Some(a) = alternate {
                walk(a, out);
            }
        }
        IrKind::While { test, body } => {
            walk(test, out);
            walk(body, out);
        }
        IrKind::For { init, test, update, body } => {
            if let Some(i) = init {
                walk(i, out);
            }
            if let Some(t) = test {
                walk(t, out);
            }
            if let Some(u) = update {
                walk(u, out);
            }
            walk(body, out);
        }
        IrKind::Try { block, handler, finalizer } => {
            block.iter().for_each(|s| walk(s, out));
            if let Some(h) = handler {
                h.body.iter().for_each(|s| walk(s, out));
            }
            if let Some(f) = finalizer {
                f.iter().for_each(|s| walk(s, out));
            }
        }
        IrKind::FunctionDecl { body, .. } | IrKind::FunctionExpr { body, .. } => {
            body.iter().for_each(|s| walk(s, out));
        }
        IrKind::Call { callee, args } => {
            walk(callee, out);
            args.iter().for_each(|a| walk(a, out));
        }
        IrKind::CallMember { object, args, .. } => {
            walk(object, out);
            args.iter().for_each(|a| walk(a, out));
        }
        IrKind::New { callee, args } => {
            walk(callee, out);
            args.iter().for_each(|a| walk(a, out));
        }
        IrKind::ArrayExpr(items) => items.iter().for_each(|i| walk(i, out)),
        IrKind::ObjectExpr(props) => props.iter().for_each(|p| match p {
            ObjectProperty::KeyValue { value, .. } => walk(value, out),
            ObjectProperty::Spread(v) => walk(v, out),
        }),
        IrKind::Member { object, property, .. } => {
            walk(object, out);
            walk(property, out);
        }
        IrKind::Binary { left, right, .. } => {
            walk(left, out);
            walk(right, out);
        }
        IrKind::Unary { operand, .. } => walk(operand, out),
        IrKind::Assignment { target, value, .. } => {
            walk(target, out);
            walk(value, out);
        }
        IrKind::Conditional { test, consequent, alternate } => {
            walk(test, out);
            walk(consequent, out);
            walk(alternate, out);
        }
        IrKind::ClassDecl { constructor, methods, fields, .. } => {
            if let Some(ctor) = constructor {
                ctor.body.iter().for_each(|s| walk(s, out));
            }
            methods.iter().for_each(|m| m.body.iter().for_each(|s| walk(s, out)));
            fields.iter().for_each(|f| {
                if let Some(v) = &f.value {
                    walk(v, out);
                }
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_ir::{lower_and_optimize, OptimizeOptions};
    use hql_util::{FileId, Handler};

    fn lower(src: &str) -> Ir {
        let handler = Handler::new();
        let forms = hql_par::parse(src, FileId::DUMMY, &handler);
        let expanded = hql_macro::expand(forms, &handler);
        lower_and_optimize(&expanded, OptimizeOptions::default())
    }

    #[test]
    fn collects_helper_used_by_get() {
        let ir = lower("(get obj :k)");
        let helpers = collect_referenced_helpers(&ir);
        assert!(helpers.contains("__hql_get"));
    }

    #[test]
    fn collects_no_helpers_for_plain_arithmetic() {
        let ir = lower("(+ 1 2)");
        let helpers = collect_referenced_helpers(&ir);
        assert!(helpers.is_empty());
    }
}
