//! Assigns each first-class-operator reference (`__hql_get_op("+")`, from
//! an operator used as a value rather than a call head) a slot in the
//! single per-bundle operator lookup table `hql-gen` emits once
//! (spec.md section 4.7).

use hql_ir::{Ir, IrKind};
use hql_util::FxHashMap;

#[derive(Debug, Default)]
pub struct OperatorTable {
    /// Operator names in first-occurrence order — the order `hql-gen`
    /// emits them in the lookup table, so output stays deterministic for
    /// identical IR.
    slots: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl OperatorTable {
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.slots.len();
        self.slots.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }
}

pub fn collect_operator_table(program: &Ir) -> OperatorTable {
    let mut table = OperatorTable::default();
    walk(program, &mut table);
    table
}

fn walk(node: &Ir, table: &mut OperatorTable) {
    if let IrKind::Call { callee, args } = &node.kind {
        if let IrKind::Identifier { name, .. } = &callee.kind {
            if name == "__hql_get_op" {
                if let Some(Ir { kind: IrKind::StringLit(op), .. }) = args.first() {
                    table.intern(op);
                }
            }
        }
    }
    match &node.kind {
        IrKind::Program(stmts) | IrKind::Block(stmts) => stmts.iter().for_each(|s| walk(s, table)),
        IrKind::ExprStmt(inner)
        | IrKind::Throw(inner)
        | IrKind::Await(inner)
        | IrKind::Labeled { body: inner, .. } => walk(inner, table),
        IrKind::Return(Some(inner)) => walk(inner, table),
        IrKind::VarDecl { init: Some(inner), .. } => walk(inner, table),
        IrKind::If { test, consequent, alternate } => {
            walk(test, table);
            walk(consequent, table);
            if let Some(a) = alternate {
                walk(a, table);
            }
        }
        IrKind::While { test, body } => {
            walk(test, table);
            walk(body, table);
        }
        IrKind::For { init, test, update, body } => {
            if let Some(i) = init {
                walk(i, table);
            }
            if let Some(t) = test {
                walk(t, table);
            }
            if let Some(u) = update {
                walk(u, table);
            }
            walk(body, table);
        }
        IrKind::Try { block, handler, finalizer } => {
            block.iter().for_each(|s| walk(s, table));
            if let Some(h) = handler {
                h.body.iter().for_each(|s| walk(s, table));
            }
            if let Some(f) = finalizer {
                f.iter().for_each(|s| walk(s, table));
            }
        }
        IrKind::FunctionDecl { body, .. } | IrKind::FunctionExpr { body, .. } => {
            body.iter().for_each(|s| walk(s, table));
        }
        IrKind::Call { callee, args } => {
            walk(callee, table);
            args.iter().for_each(|a| walk(a, table));
        }
        IrKind::CallMember { object, args, .. } => {
            walk(object, table);
            args.iter().for_each(|a| walk(a, table));
        }
        IrKind::New { callee, args } => {
            walk(callee, table);
            args.iter().for_each(|a| walk(a, table));
        }
        IrKind::ArrayExpr(items) => items.iter().for_each(|i| walk(i, table)),
        IrKind::ObjectExpr(props) => props.iter().for_each(|p| match p {
            hql_ir::ObjectProperty::KeyValue { value, .. } => walk(value, table),
            hql_ir::ObjectProperty::Spread(v) => walk(v, table),
        }),
        IrKind::Member { object, property, .. } => {
            walk(object, table);
            walk(property, table);
        }
        IrKind::Binary { left, right, .. } => {
            walk(left, table);
            walk(right, table);
        }
        IrKind::Unary { operand, .. } => walk(operand, table),
        IrKind::Assignment { target, value, .. } => {
            walk(target, table);
            walk(value, table);
        }
        IrKind::Conditional { test, consequent, alternate } => {
            walk(test, table);
            walk(consequent, table);
            walk(alternate, table);
        }
        IrKind::ClassDecl { constructor, methods, fields, .. } => {
            if let Some(ctor) = constructor {
                ctor.body.iter().for_each(|s| walk(s, table));
            }
            methods.iter().for_each(|m| m.body.iter().for_each(|s| walk(s, table)));
            fields.iter().for_each(|f| {
                if let Some(v) = &f.value {
                    walk(v, table);
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

    #[test]
    fn assigns_stable_slots_in_first_occurrence_order() {
        let handler = Handler::new();
        let forms = hql_par::parse("(defn apply-op [f a b] (f a b)) (apply-op + 1 2) (apply-op - 3 4)", FileId::DUMMY, &handler);
        let expanded = hql_macro::expand(forms, &handler);
        let ir = lower_and_optimize(&expanded, OptimizeOptions::default());
        let table = collect_operator_table(&ir);
        assert_eq!(table.slot_of("+"), Some(0));
        assert_eq!(table.slot_of("-"), Some(1));
    }
}
