//! Macro definitions and the binding result they produce (spec.md section 3,
//! "Macro Definition").

use hql_par::Ast;
use hql_util::{FxHashMap, Symbol};

/// A value bound to a macro parameter name: either a single argument form,
/// or the tail of arguments captured by a `&rest` binding.
#[derive(Debug, Clone)]
pub enum Bound {
    Single(Ast),
    Rest(Vec<Ast>),
}

/// Bindings produced by matching a macro's parameter pattern against a call.
pub type Bindings = FxHashMap<Symbol, Bound>;

/// `{ name, params: pattern, body: AST template }` (spec.md section 3).
///
/// `hygienic_capture` is not stored on the definition: which names need
/// gensym renaming depends on the bindings actually produced at a given call
/// site (a pattern name shadows an otherwise-introduced template name), so it
/// is computed fresh per expansion in [`crate::hygiene`].
#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: Symbol,
    /// The parameter pattern: a `Vector` node recognized by
    /// [`hql_par::could_be_pattern`].
    pub params: Ast,
    /// Body forms. More than one body form is treated as an implicit `do`.
    pub body: Vec<Ast>,
}

impl MacroDef {
    pub fn param_elements(&self) -> &[Ast] {
        match &self.params {
            Ast::Vector { elements, .. } => elements,
            _ => &[],
        }
    }
}
