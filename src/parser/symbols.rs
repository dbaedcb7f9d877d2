//! Symbol table used to tell declarations from expressions
//!
//! Scopes live in an arena and point at their parent by [`ScopeId`]. The
//! parser only really cares about one question, "is this identifier a type
//! name?", but it records variables and functions too so the pointer
//! declaration heuristic can rule out names already known to be values.
//!
//! Bindings are never removed or overwritten: the first `add` of a name in a
//! scope wins and later ones are silent no-ops.

use rustc_hash::FxHashMap;

/// What a name was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Typedef,
    Variable,
    Function,
    Struct,
    Enum,
    Union,
}

/// Handle to a scope inside a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub kind: SymbolKind,
    /// Scope the binding was found in.
    pub scope: ScopeId,
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: FxHashMap<String, SymbolKind>,
}

/// Typedefs from system headers that are rarely visible to a single-file parse.
const PLATFORM_TYPEDEFS: &[&str] = &[
    "size_t",
    "ssize_t",
    "ptrdiff_t",
    "intptr_t",
    "uintptr_t",
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
    "va_list",
    "FILE",
    "DIR",
    "time_t",
    "clock_t",
    "pid_t",
    "uid_t",
    "gid_t",
    "off_t",
    "mode_t",
    "bool",
];

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Table with a global scope pre-seeded with common platform typedefs.
    pub fn new() -> Self {
        let mut table = Self::empty();
        let global = table.global();
        for name in PLATFORM_TYPEDEFS {
            table.add(global, name, SymbolKind::Typedef);
        }
        table
    }

    /// Table with a bare global scope.
    pub fn empty() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// The outermost scope.
    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn create_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            bindings: FxHashMap::default(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.0).and_then(|s| s.parent)
    }

    /// Bind `name` in `scope` unless it is already bound there.
    pub fn add(&mut self, scope: ScopeId, name: &str, kind: SymbolKind) {
        if let Some(s) = self.scopes.get_mut(scope.0) {
            s.bindings.entry(name.to_string()).or_insert(kind);
        }
    }

    /// Nearest binding of `name`, searching outward through parents.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<Binding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scopes.get(id.0)?;
            if let Some(kind) = s.bindings.get(name) {
                return Some(Binding {
                    kind: *kind,
                    scope: id,
                });
            }
            current = s.parent;
        }
        None
    }

    pub fn is_typedef(&self, scope: ScopeId, name: &str) -> bool {
        matches!(
            self.lookup(scope, name),
            Some(Binding {
                kind: SymbolKind::Typedef,
                ..
            })
        )
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
    fn test_preseeded_typedefs() {
        let table = SymbolTable::new();
        let global = table.global();
        assert!(table.is_typedef(global, "size_t"));
        assert!(table.is_typedef(global, "FILE"));
        assert!(table.is_typedef(global, "uint64_t"));
        assert!(!table.is_typedef(global, "foo_t"));
    }

    #[test]
    fn test_first_binding_wins() {
        let mut table = SymbolTable::empty();
        let global = table.global();
        table.add(global, "node_t", SymbolKind::Typedef);
        table.add(global, "node_t", SymbolKind::Variable);
        assert_eq!(
            table.lookup(global, "node_t").map(|b| b.kind),
            Some(SymbolKind::Typedef)
        );
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let mut table = SymbolTable::empty();
        let global = table.global();
        let inner = table.create_scope(Some(global));
        let innermost = table.create_scope(Some(inner));

        table.add(global, "list_t", SymbolKind::Typedef);
        table.add(inner, "count", SymbolKind::Variable);

        let found = table.lookup(innermost, "list_t").unwrap();
        assert_eq!(found.scope, global);
        assert!(table.is_typedef(innermost, "list_t"));
        assert_eq!(
            table.lookup(innermost, "count").map(|b| b.kind),
            Some(SymbolKind::Variable)
        );
        assert!(table.lookup(global, "count").is_none());
        assert_eq!(table.parent(innermost), Some(inner));
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let mut table = SymbolTable::empty();
        let global = table.global();
        let inner = table.create_scope(Some(global));
        table.add(global, "item", SymbolKind::Typedef);
        table.add(inner, "item", SymbolKind::Variable);

        assert!(!table.is_typedef(inner, "item"));
        assert!(table.is_typedef(global, "item"));
    }
}
