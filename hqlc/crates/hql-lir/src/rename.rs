//! Rewrites every binding/reference name in an IR tree through
//! [`sanitize_identifier`], tracking collisions as it goes. Module
//! specifier strings, object-literal property keys, and quoted string
//! data are left untouched — sanitization applies only to names that
//! become JS identifiers, not to HQL data that happens to be a string.

use hql_ir::{Ir, IrKind, ObjectProperty};

use crate::sanitize::{sanitize_identifier, CollisionTracker};

pub struct RenameResult {
    pub collisions: Vec<(String, String)>,
}

pub fn sanitize_program(program: &mut Ir) -> RenameResult {
    let mut tracker = CollisionTracker::new();
    let mut collisions = Vec::new();
    walk(program, &mut tracker, &mut collisions);
    RenameResult { collisions }
}

fn rename(name: &mut String, tracker: &mut CollisionTracker, collisions: &mut Vec<(String, String)>) {
    if let Some(prev) = tracker.record(name) {
        collisions.push((prev, name.clone()));
    }
    *name = sanitize_identifier(name);
}

fn rename_opt(name: &mut Option<String>, tracker: &mut CollisionTracker, collisions: &mut Vec<(String, String)>) {
    if let Some(n) = name {
        rename(n, tracker, collisions);
    }
}

fn walk(node: &mut Ir, tracker: &mut CollisionTracker, collisions: &mut Vec<(String, String)>) {
    match &mut node.kind {
        IrKind::Program(stmts) | IrKind::Block(stmts) => {
            stmts.iter_mut().for_each(|s| walk(s, tracker, collisions));
        }
        IrKind::VarDecl { name, init, .. } => {
            rename(name, tracker, collisions);
            if let Some(i) = init {
                walk(i, tracker, collisions);
            }
        }
        IrKind::FunctionDecl { name, params, body, .. } => {
            rename(name, tracker, collisions);
            for p in params.iter_mut() {
                rename(&mut p.name, tracker, collisions);
                if let Some(d) = &mut p.default {
                    walk(d, tracker, collisions);
                }
            }
            body.iter_mut().for_each(|s| walk(s, tracker, collisions));
        }
        IrKind::FunctionExpr { name, params, body, .. } => {
            rename_opt(name, tracker, collisions);
            for p in params.iter_mut() {
                rename(&mut p.name, tracker, collisions);
                if let Some(d) = &mut p.default {
                    walk(d, tracker, collisions);
                }
            }
            body.iter_mut().for_each(|s| walk(s, tracker, collisions));
        }
        IrKind::If { test, consequent, alternate } => {
            walk(test, tracker, collisions);
            walk(consequent, tracker, collisions);
            if let Some(a) = alternate {
                walk(a, tracker, collisions);
            }
        }
        IrKind::While { test, body } => {
            walk(test, tracker, collisions);
            walk(body, tracker, collisions);
        }
        IrKind::For { init, test, update, body } => {
            if let Some(i) = init {
                walk(i, tracker, collisions);
            }
            if let Some(t) = test {
                walk(t, tracker, collisions);
            }
            if let Some(u) = update {
                walk(u, tracker, collisions);
            }
            walk(body, tracker, collisions);
        }
        IrKind::Try { block, handler, finalizer } => {
            block.iter_mut().for_each(|s| walk(s, tracker, collisions));
            if let Some(h) = handler {
                rename_opt(&mut h.param, tracker, collisions);
                h.body.iter_mut().for_each(|s| walk(s, tracker, collisions));
            }
            if let Some(f) = finalizer {
                f.iter_mut().for_each(|s| walk(s, tracker, collisions));
            }
        }
        IrKind::ExprStmt(inner)
        | IrKind::Throw(inner)
        | IrKind::Await(inner) => walk(inner, tracker, collisions),
        IrKind::Labeled { label, body } => {
            rename(label, tracker, collisions);
            walk(body, tracker, collisions);
        }
        IrKind::Return(Some(inner)) => walk(inner, tracker, collisions),
        IrKind::Call { callee, args } => {
            walk(callee, tracker, collisions);
            args.iter_mut().for_each(|a| walk(a, tracker, collisions));
        }
        IrKind::CallMember { object, args, .. } => {
            walk(object, tracker, collisions);
            args.iter_mut().for_each(|a| walk(a, tracker, collisions));
        }
        IrKind::New { callee, args } => {
            walk(callee, tracker, collisions);
            args.iter_mut().for_each(|a| walk(a, tracker, collisions));
        }
        IrKind::ArrayExpr(items) => items.iter_mut().for_each(|i| walk(i, tracker, collisions)),
        IrKind::ObjectExpr(props) => props.iter_mut().for_each(|p| match p {
            ObjectProperty::KeyValue { value, .. } => walk(value, tracker, collisions),
            ObjectProperty::Spread(v) => walk(v, tracker, collisions),
        }),
        IrKind::Member { object, property, computed } => {
            walk(object, tracker, collisions);
            if *computed {
                walk(property, tracker, collisions);
            }
            // A non-computed `.prop` access names a JS-side property
            // (runtime object shape, not an HQL binding) and is left as-is.
        }
        IrKind::JsMethodAccess { object, .. } => walk(object, tracker, collisions),
        IrKind::Binary { left, right, .. } => {
            walk(left, tracker, collisions);
            walk(right, tracker, collisions);
        }
        IrKind::Unary { operand, .. } => walk(operand, tracker, collisions),
        IrKind::Assignment { target, value, .. } => {
            walk(target, tracker, collisions);
            walk(value, tracker, collisions);
        }
        IrKind::Conditional { test, consequent, alternate } => {
            walk(test, tracker, collisions);
            walk(consequent, tracker, collisions);
            walk(alternate, tracker, collisions);
        }
        IrKind::Identifier { name, .. } => rename(name, tracker, collisions),
        IrKind::ClassDecl { name, fields, constructor, methods, .. } => {
            rename(name, tracker, collisions);
            for f in fields.iter_mut() {
                rename(&mut f.name, tracker, collisions);
                if let Some(v) = &mut f.value {
                    walk(v, tracker, collisions);
                }
            }
            if let Some(ctor) = constructor {
                for p in ctor.params.iter_mut() {
                    rename(&mut p.name, tracker, collisions);
                }
                ctor.body.iter_mut().for_each(|s| walk(s, tracker, collisions));
            }
            for m in methods.iter_mut() {
                rename(&mut m.name, tracker, collisions);
                for p in m.params.iter_mut() {
                    rename(&mut p.name, tracker, collisions);
                }
                m.body.iter_mut().for_each(|s| walk(s, tracker, collisions));
            }
        }
        IrKind::EnumDecl { name, cases } => {
            rename(name, tracker, collisions);
            for c in cases.iter_mut() {
                if let Some(v) = &mut c.raw_value {
                    walk(v, tracker, collisions);
                }
            }
        }
        IrKind::Import { kind, .. } => match kind {
            hql_ir::ImportKind::Named(specs) => {
                for s in specs.iter_mut() {
                    rename(&mut s.local, tracker, collisions);
                }
            }
            hql_ir::ImportKind::Namespace(name) => rename(name, tracker, collisions),
            hql_ir::ImportKind::SideEffect => {}
        },
        IrKind::Export(kind) => match kind {
            hql_ir::ExportKind::Named(names) => {
                for n in names.iter_mut() {
                    rename(n, tracker, collisions);
                }
            }
            hql_ir::ExportKind::Default(value) => walk(value, tracker, collisions),
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_ir::{lower_and_optimize, OptimizeOptions};
    use hql_util::{FileId, Handler};

    #[test]
    fn sanitizes_predicate_and_kebab_case_names() {
        let handler = Handler::new();
        let forms = hql_par::parse("(defn is-empty? [xs] (== 0 1))", FileId::DUMMY, &handler);
        let expanded = hql_macro::expand(forms, &handler);
        let mut ir = lower_and_optimize(&expanded, OptimizeOptions::default());
        sanitize_program(&mut ir);
        let IrKind::Program(stmts) = &ir.kind else { panic!() };
        let IrKind::FunctionDecl { name, params, .. } = &stmts[0].kind else { panic!() };
        assert_eq!(name, "is_empty_QMARK_");
        assert_eq!(params[0].name, "xs");
    }
}
