//! The macro environment (spec.md section 4.3, "Macro environment").
//!
//! Built by loading the embedded standard-macro source table
//! ([`crate::stdlib::SOURCE`]) and then any `(macro NAME [params] body...)` or
//! `(defmacro NAME [params] body...)` forms a compilation unit defines at the
//! top level. The embedded prefix is parsed once into a shared
//! [`std::sync::Arc`] and cloned cheaply per compilation unit; per-unit
//! `defmacro`s only extend the clone's own table, never the shared prefix.

use std::sync::Arc;

use hql_par::Ast;
use hql_util::{FxHashMap, Handler, Symbol};

use crate::def::MacroDef;
use crate::stdlib;

const DEFINING_FORMS: &[&str] = &["macro", "defmacro"];

#[derive(Debug, Default)]
struct Table(FxHashMap<Symbol, MacroDef>);

/// Holds every macro a compilation unit can call: the embedded standard
/// library plus whatever `(macro ...)`/`(defmacro ...)` forms it defines.
#[derive(Debug, Clone)]
pub struct MacroEnv {
    shared: Arc<Table>,
    local: FxHashMap<Symbol, MacroDef>,
}

impl MacroEnv {
    /// Builds the base environment from the embedded standard macro source.
    /// `handler` receives any diagnostics produced while parsing that
    /// source — in practice these never fire for the shipped table, but a
    /// malformed embedded source is still reported rather than panicking.
    pub fn with_stdlib(handler: &Handler) -> Self {
        let mut table = Table::default();
        let forms = hql_par::parse(stdlib::SOURCE, hql_util::FileId::DUMMY, handler);
        for form in &forms {
            if let Some(def) = parse_macro_def(form) {
                table.0.insert(def.name, def);
            }
        }
        Self {
            shared: Arc::new(table),
            local: FxHashMap::default(),
        }
    }

    /// Registers a macro definition found in user source, shadowing any
    /// standard macro (or earlier user definition) of the same name.
    pub fn define(&mut self, def: MacroDef) {
        self.local.insert(def.name, def);
    }

    /// If `form` is a `(macro ...)`/`(defmacro ...)` top-level definition,
    /// registers it and returns its name.
    pub fn define_if_macro_form(&mut self, form: &Ast) -> Option<Symbol> {
        let def = parse_macro_def(form)?;
        let name = def.name;
        self.define(def);
        Some(name)
    }

    pub fn get(&self, name: Symbol) -> Option<&MacroDef> {
        self.local.get(&name).or_else(|| self.shared.0.get(&name))
    }

    pub fn is_macro(&self, name: Symbol) -> bool {
        self.get(name).is_some()
    }
}

/// Parses a top-level `(macro NAME [params] body...)` or
/// `(defmacro NAME [params] body...)` form into a [`MacroDef`]. Returns
/// `None` for any other shape (not an error — callers treat non-matching
/// forms as ordinary code).
fn parse_macro_def(form: &Ast) -> Option<MacroDef> {
    let elements = form.as_list()?;
    let head = elements.first()?.as_symbol()?;
    if !DEFINING_FORMS.contains(&head.as_str()) {
        return None;
    }
    let name = elements.get(1)?.as_symbol()?;
    let params = elements.get(2)?.clone();
    if !matches!(params, Ast::Vector { .. }) {
        return None;
    }
    let body = elements[3..].to_vec();
    Some(MacroDef { name, params, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hql_util::Handler;

    #[test]
    fn stdlib_loads_without_errors() {
        let handler = Handler::new();
        let env = MacroEnv::with_stdlib(&handler);
        assert!(!handler.has_errors());
        assert!(env.is_macro(Symbol::intern("when")));
        assert!(env.is_macro(Symbol::intern("unless")));
        assert!(env.is_macro(Symbol::intern("->")));
        assert!(env.is_macro(Symbol::intern("->>")));
    }

    #[test]
    fn user_defmacro_shadows_stdlib() {
        let handler = Handler::new();
        let mut env = MacroEnv::with_stdlib(&handler);
        let forms = hql_par::parse(
            "(defmacro when [cond & body] `(if ,cond (do ,@body) nil))",
            hql_util::FileId::DUMMY,
            &handler,
        );
        let name = env.define_if_macro_form(&forms[0]);
        assert_eq!(name, Some(Symbol::intern("when")));
        assert!(env.is_macro(Symbol::intern("when")));
    }
}
