//! Small constructor helpers so lowering and the optimizer do not repeat
//! `Ir::new(IrKind::..., pos)` boilerplate at every call site, and a fresh
//! temporary-name generator the optimizer uses when it must bind a
//! side-effecting operand before rewriting around it (spec.md section 4.6
//! "Soundness discipline").

use hql_util::Span;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::ir::{DeclKind, Ir, IrKind, Param};
use hql_sem::RUNTIME_HELPERS;

pub fn ident(name: impl Into<String>, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::Identifier {
            name: name.into(),
            type_annotation: None,
        },
        pos,
    )
}

pub fn typed_ident(name: impl Into<String>, ty: impl Into<String>, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::Identifier {
            name: name.into(),
            type_annotation: Some(ty.into()),
        },
        pos,
    )
}

pub fn num(value: f64, pos: Option<Span>) -> Ir {
    Ir::new(IrKind::NumberLit(value), pos)
}

pub fn string(value: impl Into<String>, pos: Option<Span>) -> Ir {
    Ir::new(IrKind::StringLit(value.into()), pos)
}

pub fn boolean(value: bool, pos: Option<Span>) -> Ir {
    Ir::new(IrKind::BoolLit(value), pos)
}

pub fn nil(pos: Option<Span>) -> Ir {
    Ir::new(IrKind::NullLit, pos)
}

pub fn call(callee: Ir, args: Vec<Ir>, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::Call {
            callee: Box::new(callee),
            args,
        },
        pos,
    )
}

/// Calls a fixed runtime helper by name. Panics if `name` is not one of
/// the sixteen names in [`crate::kernel::RUNTIME_HELPERS`] — every call
/// site constructs these from a `'static` literal, so this is a
/// programmer error, not a runtime condition.
pub fn call_helper(name: &'static str, args: Vec<Ir>, pos: Option<Span>) -> Ir {
    debug_assert!(
        RUNTIME_HELPERS.contains(&name),
        "{name} is not a recognized runtime helper"
    );
    call(ident(name, pos), args, pos)
}

pub fn var_decl(
    kind: DeclKind,
    name: impl Into<String>,
    type_annotation: Option<String>,
    init: Option<Ir>,
    pos: Option<Span>,
) -> Ir {
    Ir::new(
        IrKind::VarDecl {
            kind,
            name: name.into(),
            type_annotation,
            init: init.map(Box::new),
        },
        pos,
    )
}

pub fn expr_stmt(expr: Ir, pos: Option<Span>) -> Ir {
    Ir::new(IrKind::ExprStmt(Box::new(expr)), pos)
}

pub fn block(stmts: Vec<Ir>, pos: Option<Span>) -> Ir {
    Ir::new(IrKind::Block(stmts), pos)
}

pub fn if_stmt(test: Ir, consequent: Ir, alternate: Option<Ir>, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::If {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: alternate.map(Box::new),
        },
        pos,
    )
}

pub fn conditional(test: Ir, consequent: Ir, alternate: Ir, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        },
        pos,
    )
}

pub fn while_stmt(test: Ir, body: Ir, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::While {
            test: Box::new(test),
            body: Box::new(body),
        },
        pos,
    )
}

pub fn for_stmt(
    init: Option<Ir>,
    test: Option<Ir>,
    update: Option<Ir>,
    body: Ir,
    pos: Option<Span>,
) -> Ir {
    Ir::new(
        IrKind::For {
            init: init.map(Box::new),
            test: test.map(Box::new),
            update: update.map(Box::new),
            body: Box::new(body),
        },
        pos,
    )
}

pub fn binary(op: impl Into<String>, left: Ir, right: Ir, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        },
        pos,
    )
}

pub fn assign(op: impl Into<String>, target: Ir, value: Ir, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::Assignment {
            op: op.into(),
            target: Box::new(target),
            value: Box::new(value),
        },
        pos,
    )
}

pub fn member(object: Ir, property: Ir, computed: bool, pos: Option<Span>) -> Ir {
    Ir::new(
        IrKind::Member {
            object: Box::new(object),
            property: Box::new(property),
            computed,
        },
        pos,
    )
}

pub fn func_expr(
    name: Option<String>,
    params: Vec<Param>,
    body: Vec<Ir>,
    is_arrow: bool,
    pos: Option<Span>,
) -> Ir {
    Ir::new(
        IrKind::FunctionExpr {
            name,
            params,
            return_type: None,
            body,
            is_async: false,
            is_arrow,
        },
        pos,
    )
}

pub fn array(elements: Vec<Ir>, pos: Option<Span>) -> Ir {
    Ir::new(IrKind::ArrayExpr(elements), pos)
}

pub fn return_stmt(value: Option<Ir>, pos: Option<Span>) -> Ir {
    Ir::new(IrKind::Return(value.map(Box::new)), pos)
}

/// An immediately-invoked zero-argument arrow, used to wrap a statement
/// (most commonly a `for`) that must evaluate to a value in expression
/// position — HQL's convention that iteration forms evaluate to `nil`
/// (spec.md glossary, "IIFE-wrapped for").
pub fn iife_wrapping_stmt(stmt: Ir, pos: Option<Span>) -> Ir {
    let arrow = func_expr(
        None,
        Vec::new(),
        vec![stmt, return_stmt(Some(nil(pos)), pos)],
        true,
        pos,
    );
    call(arrow, Vec::new(), pos)
}

/// Monotonically increasing, process-wide so two concurrently compiled
/// files never mint colliding temporaries even if their IR is later
/// spliced together by the bundler.
static TEMP_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A fresh synthetic identifier name for a hoisted side-effecting operand
/// (spec.md section 4.6) or a destructured parameter binding target.
/// Prefixed with a double underscore, which `__hql_*` sanitization in
/// `hql-lir` treats as already-reserved and never remaps.
pub fn fresh_temp(hint: &str) -> String {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("__hql_tmp_{hint}_{n}")
}
