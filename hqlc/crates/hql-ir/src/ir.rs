//! The intermediate representation (spec.md section 3 "IR Node"): a typed
//! tree closely mirroring a small subset of JavaScript/TypeScript. Codegen
//! walks this tree directly; nothing downstream needs a control-flow graph
//! or basic blocks, since the emission target is JS text, not machine code.

use hql_util::Span;

/// The JS declaration keyword a lowered binding should emit as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

/// A function parameter: a plain identifier, an optional `name: Type`
/// annotation (TypeScript mode only), an optional default value, or the
/// rest parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_annotation: Option<String>,
    pub default: Option<Box<Ir>>,
    pub rest: bool,
    /// Set when the parameter position is itself a nested destructuring
    /// pattern (the parameter has already been expanded to binding IR in
    /// the function body prologue; `name` is then the synthetic temporary
    /// the pattern was matched against).
    pub destructured: bool,
}

impl Param {
    pub fn simple(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            type_annotation: None,
            default: None,
            rest: false,
            destructured: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ObjectProperty {
    KeyValue { key: String, computed: bool, value: Ir },
    Spread(Ir),
}

#[derive(Debug, Clone)]
pub struct ClassField {
    pub name: String,
    /// `var` fields are mutable, `let` fields are not.
    pub mutable: bool,
    pub value: Option<Ir>,
}

#[derive(Debug, Clone)]
pub struct ClassMethod {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Ir>,
    pub is_static: bool,
    pub is_async: bool,
}

#[derive(Debug, Clone)]
pub struct EnumCase {
    pub name: String,
    pub raw_value: Option<Ir>,
    /// Associated-value shapes: `(case Circle radius)`-style cases carry
    /// field names with no values of their own.
    pub associated_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<String>,
    pub body: Vec<Ir>,
}

/// What a single `import`/`export` form lowers to. Absent from the
/// spec.md section 3 enumeration of IR node shapes but required by its
/// section 4.5 lowering rules and the ESM module shape of section 4.7;
/// treated here as a first-class node kind rather than improvised as a
/// raw call, since both the bundler (import-path rewriting) and codegen
/// (specifier emission) need to pattern-match on it directly.
#[derive(Debug, Clone)]
pub enum ImportKind {
    /// `(import [a b as c] from "m")`
    Named(Vec<ImportSpecifier>),
    /// `(import m from "m")`
    Namespace(String),
    /// `(import "m")`
    SideEffect,
}

#[derive(Debug, Clone)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
}

#[derive(Debug, Clone)]
pub enum ExportKind {
    Named(Vec<String>),
    Default(Box<Ir>),
}

#[derive(Debug, Clone)]
pub enum IrKind {
    Program(Vec<Ir>),
    ExprStmt(Box<Ir>),
    VarDecl {
        kind: DeclKind,
        name: String,
        type_annotation: Option<String>,
        init: Option<Box<Ir>>,
    },
    FunctionDecl {
        name: String,
        params: Vec<Param>,
        return_type: Option<String>,
        body: Vec<Ir>,
        is_async: bool,
    },
    FunctionExpr {
        name: Option<String>,
        params: Vec<Param>,
        return_type: Option<String>,
        body: Vec<Ir>,
        is_async: bool,
        /// Arrow functions are used for anonymous lambdas passed as
        /// callbacks (e.g. the iteratee of `__hql_for_each`); ordinary
        /// `function` expressions are used where `this` needs to be
        /// dynamic (class methods) or a name is present for self-recursion.
        is_arrow: bool,
    },
    Block(Vec<Ir>),
    If {
        test: Box<Ir>,
        consequent: Box<Ir>,
        alternate: Option<Box<Ir>>,
    },
    While {
        test: Box<Ir>,
        body: Box<Ir>,
    },
    /// C-style `for (init; test; update) body` — the shape the optimizer's
    /// for-loop recognition rewrites a `for_each(toSequence(range(...)))`
    /// call into; also emitted directly by lowering's `doseq`-over-range
    /// shortcuts once the optimizer folds them in a later pass.
    For {
        init: Option<Box<Ir>>,
        test: Option<Box<Ir>>,
        update: Option<Box<Ir>>,
        body: Box<Ir>,
    },
    Try {
        block: Vec<Ir>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Ir>>,
    },
    Throw(Box<Ir>),
    Return(Option<Box<Ir>>),
    Break(Option<String>),
    Continue(Option<String>),
    /// `(label L body)` — a JS labeled statement; gives `break`/`continue`
    /// a target beyond the innermost loop.
    Labeled {
        label: String,
        body: Box<Ir>,
    },
    Call {
        callee: Box<Ir>,
        args: Vec<Ir>,
    },
    /// `obj.method(args)` emitted as one node rather than a `Call` over a
    /// `Member` callee, so codegen can keep the receiver and the call
    /// syntactically adjacent without reconstructing it from two nodes.
    CallMember {
        object: Box<Ir>,
        property: String,
        computed: bool,
        args: Vec<Ir>,
    },
    New {
        callee: Box<Ir>,
        args: Vec<Ir>,
    },
    ArrayExpr(Vec<Ir>),
    ObjectExpr(Vec<ObjectProperty>),
    Member {
        object: Box<Ir>,
        property: Box<Ir>,
        computed: bool,
    },
    /// A bare `obj.method` reference used as a *value* (not called) —
    /// e.g. passed as a callback. Distinguished from `Member` so codegen
    /// can bind `this` correctly when the method is detached from its
    /// receiver.
    JsMethodAccess {
        object: Box<Ir>,
        method: String,
    },
    Binary {
        op: String,
        left: Box<Ir>,
        right: Box<Ir>,
    },
    Unary {
        op: String,
        operand: Box<Ir>,
        prefix: bool,
    },
    Assignment {
        op: String,
        target: Box<Ir>,
        value: Box<Ir>,
    },
    Conditional {
        test: Box<Ir>,
        consequent: Box<Ir>,
        alternate: Box<Ir>,
    },
    Await(Box<Ir>),
    Identifier {
        name: String,
        type_annotation: Option<String>,
    },
    NumberLit(f64),
    StringLit(String),
    BoolLit(bool),
    NullLit,
    ClassDecl {
        name: String,
        superclass: Option<String>,
        fields: Vec<ClassField>,
        constructor: Option<Box<ClassMethod>>,
        methods: Vec<ClassMethod>,
    },
    EnumDecl {
        name: String,
        cases: Vec<EnumCase>,
    },
    Import {
        kind: ImportKind,
        module: String,
    },
    Export(ExportKind),
}

/// A single IR node: its shape plus the source position it was lowered
/// from, propagated for diagnostics and source maps.
#[derive(Debug, Clone)]
pub struct Ir {
    pub kind: IrKind,
    pub pos: Option<Span>,
}

impl Ir {
    pub fn new(kind: IrKind, pos: Option<Span>) -> Self {
        Ir { kind, pos }
    }

    pub fn is_nil_literal(&self) -> bool {
        matches!(self.kind, IrKind::NullLit)
    }
}
