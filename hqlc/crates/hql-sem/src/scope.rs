//! Scope chain and symbol table (spec.md section 3 "Symbol Table").
//!
//! Scopes are an arena (`IndexVec<ScopeId, Scope>`) with parent indices
//! rather than a tree of heap-allocated nodes — cheap to snapshot, which
//! matters for a long-running LSP session walking the same table across
//! many edits.

use hql_util::{define_idx, FxHashMap, Idx, IndexVec, Span, Symbol};

define_idx!(ScopeId);

/// What a scope was opened for. Determines which bindings are visible to
/// `recur` resolution in the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
    /// A `loop` scope, eligible for `recur`.
    Loop,
}

/// The kind of thing a symbol-table entry names (spec.md section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Macro,
    FnLike,
    Type,
    Enum,
    EnumCase,
    Class,
    Method,
    Interface,
    Module,
    Import,
    Export,
    Namespace,
    Operator,
    Constant,
    Property,
    SpecialForm,
    Builtin,
    Alias,
}

/// A single symbol-table entry.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: Symbol,
    pub kind: SymbolKind,
    pub scope: ScopeId,
    pub parent: Option<Symbol>,
    pub params: Option<Vec<Symbol>>,
    pub return_type: Option<Symbol>,
    pub cases: Option<Vec<Symbol>>,
    pub fields: Option<Vec<Symbol>>,
    pub methods: Option<Vec<Symbol>>,
    pub source_module: Option<Symbol>,
    pub alias_target: Option<Symbol>,
    pub exported: bool,
    pub imported: bool,
    pub mutable: bool,
    pub pos: Option<Span>,
    pub doc: Option<String>,
}

impl SymbolEntry {
    pub fn new(name: Symbol, kind: SymbolKind, scope: ScopeId) -> Self {
        let mutable = kind == SymbolKind::Variable;
        Self {
            name,
            kind,
            scope,
            parent: None,
            params: None,
            return_type: None,
            cases: None,
            fields: None,
            methods: None,
            source_module: None,
            alias_target: None,
            exported: false,
            imported: false,
            mutable,
            pos: None,
            doc: None,
        }
    }

    pub fn with_pos(mut self, pos: Span) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn with_mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }
}

/// Per-scope bound on live bindings before the oldest entry is evicted.
/// Exists for long-running LSP sessions that re-analyze the same module
/// repeatedly without ever discarding the table; a normal one-shot `compile`
/// invocation never comes close.
pub const DEFAULT_SCOPE_CAP: usize = 50_000;

struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    bindings: FxHashMap<Symbol, SymbolEntry>,
    /// Insertion order, for eviction and for deterministic iteration
    /// (suggestion candidate lists should not depend on hash order).
    order: Vec<Symbol>,
}

/// The scope chain for one compilation unit: global → module → function →
/// block. Lookups walk parent indices; nothing here is a heap pointer.
pub struct SymbolTable {
    scopes: IndexVec<ScopeId, Scope>,
    current: ScopeId,
    cap: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_SCOPE_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        let mut scopes = IndexVec::new();
        let root = scopes.push(Scope {
            parent: None,
            kind: ScopeKind::Global,
            bindings: FxHashMap::default(),
            order: Vec::new(),
        });
        Self {
            scopes,
            current: root,
            cap,
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId::from_usize(0)
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Opens a new child scope of `current` and makes it current.
    pub fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.current;
        let id = self.scopes.push(Scope {
            parent: Some(parent),
            kind,
            bindings: FxHashMap::default(),
            order: Vec::new(),
        });
        self.current = id;
        id
    }

    /// Restores `current` to `restore_to` (normally the scope active before
    /// the matching `push_scope`).
    pub fn pop_scope(&mut self, restore_to: ScopeId) {
        self.current = restore_to;
    }

    pub fn kind_of(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope].kind
    }

    pub fn parent_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope].parent
    }

    /// The nearest enclosing `loop` scope reachable from `scope` without
    /// crossing a `Function` boundary — the tail-position domain for
    /// `recur`.
    pub fn nearest_enclosing_loop(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            match self.scopes[s].kind {
                ScopeKind::Loop => return Some(s),
                ScopeKind::Function | ScopeKind::Global => return None,
                _ => cur = self.scopes[s].parent,
            }
        }
        None
    }

    /// Binds `entry` in the current scope. Returns `Err` with the prior
    /// entry if `name` is already bound in this exact scope (a duplicate
    /// binding, diagnosed by the caller) — shadowing an outer scope is
    /// always fine and is not an error.
    pub fn bind(&mut self, entry: SymbolEntry) -> Result<(), SymbolEntry> {
        self.bind_in(self.current, entry)
    }

    pub fn bind_in(&mut self, scope: ScopeId, entry: SymbolEntry) -> Result<(), SymbolEntry> {
        let s = &mut self.scopes[scope];
        if let Some(prior) = s.bindings.get(&entry.name) {
            return Err(prior.clone());
        }
        s.order.push(entry.name);
        if s.order.len() > self.cap {
            let evicted = s.order.remove(0);
            s.bindings.remove(&evicted);
        }
        s.bindings.insert(entry.name, entry);
        Ok(())
    }

    /// Walks the scope chain outward from `scope`, returning the nearest
    /// binding for `name`.
    pub fn resolve_from(&self, scope: ScopeId, name: Symbol) -> Option<&SymbolEntry> {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            if let Some(entry) = self.scopes[s].bindings.get(&name) {
                return Some(entry);
            }
            cur = self.scopes[s].parent;
        }
        None
    }

    pub fn resolve(&self, name: Symbol) -> Option<&SymbolEntry> {
        self.resolve_from(self.current, name)
    }

    /// True iff `name` is bound in `scope` itself (not an ancestor) — the
    /// duplicate-binding-in-same-scope check.
    pub fn bound_in_scope(&self, scope: ScopeId, name: Symbol) -> bool {
        self.scopes[scope].bindings.contains_key(&name)
    }

    /// All names visible from `scope`, nearest-scope-first, for
    /// "did you mean?" candidate generation.
    pub fn visible_names(&self, scope: ScopeId) -> Vec<Symbol> {
        let mut names = Vec::new();
        let mut cur = Some(scope);
        while let Some(s) = cur {
            names.extend(self.scopes[s].order.iter().copied());
            cur = self.scopes[s].parent;
        }
        names
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_an_outer_scope_is_not_a_duplicate() {
        let mut table = SymbolTable::new();
        let x = Symbol::intern("x");
        table
            .bind(SymbolEntry::new(x, SymbolKind::Variable, table.current()))
            .unwrap();
        let parent = table.current();
        table.push_scope(ScopeKind::Block);
        assert!(table
            .bind(SymbolEntry::new(x, SymbolKind::Variable, table.current()))
            .is_ok());
        table.pop_scope(parent);
    }

    #[test]
    fn duplicate_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        let x = Symbol::intern("x");
        table
            .bind(SymbolEntry::new(x, SymbolKind::Variable, table.current()))
            .unwrap();
        assert!(table
            .bind(SymbolEntry::new(x, SymbolKind::Variable, table.current()))
            .is_err());
    }

    #[test]
    fn recur_domain_stops_at_function_boundary() {
        let mut table = SymbolTable::new();
        let loop_scope = table.push_scope(ScopeKind::Loop);
        let block_scope = table.push_scope(ScopeKind::Block);
        assert_eq!(table.nearest_enclosing_loop(block_scope), Some(loop_scope));
        table.pop_scope(table.global());
        let func_scope = table.push_scope(ScopeKind::Function);
        assert_eq!(table.nearest_enclosing_loop(func_scope), None);
    }

    #[test]
    fn per_scope_cap_evicts_oldest() {
        let mut table = SymbolTable::with_cap(2);
        for i in 0..5 {
            let name = Symbol::intern(&format!("v{i}"));
            let _ = table.bind(SymbolEntry::new(name, SymbolKind::Variable, table.current()));
        }
        assert!(table.resolve(Symbol::intern("v0")).is_none());
        assert!(table.resolve(Symbol::intern("v4")).is_some());
    }
}
