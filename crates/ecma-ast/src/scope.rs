//! The scope model consumed read-only by lint rules.
//!
//! Scope analysis happens in the parser collaborator; the linting core only
//! reads the result. The two `Cell` flags on [`Variable`] exist so that a
//! rule context can mark a variable used or exported without a mutable
//! borrow of the whole manager.

use std::cell::Cell;
use std::collections::HashMap;

use crate::node::NodeId;

/// Index of a scope within its [`ScopeManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a variable within its [`ScopeManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(u32);

impl VariableId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a reference within its [`ScopeManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceId(u32);

impl ReferenceId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
    Switch,
    Catch,
    For,
}

/// One lexical scope.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// The node that opened this scope.
    pub node: NodeId,
    pub parent: Option<ScopeId>,
    pub child_scopes: Vec<ScopeId>,
    /// Variables declared directly in this scope.
    pub variables: Vec<VariableId>,
    /// References occurring directly in this scope.
    pub references: Vec<ReferenceId>,
    by_name: HashMap<String, VariableId>,
}

/// A declared variable (or a known global).
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    pub scope: ScopeId,
    /// Declaring `Identifier` nodes. Empty for implicit globals.
    pub identifiers: Vec<NodeId>,
    /// References that resolved to this variable, in source order.
    pub references: Vec<ReferenceId>,
    /// Whether assignment to this variable is a lint-relevant violation
    /// (`false` for `readonly` globals).
    pub writable: bool,
    marked_used: Cell<bool>,
    exported: Cell<bool>,
}

impl Variable {
    /// Flag this variable as used (the `mark_variable_as_used` path).
    pub fn mark_used(&self) {
        self.marked_used.set(true);
    }

    #[must_use]
    pub fn is_marked_used(&self) -> bool {
        self.marked_used.get()
    }

    /// Flag this variable as externally referenced (`exported` directive).
    pub fn mark_exported(&self) {
        self.exported.set(true);
    }

    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.exported.get()
    }
}

/// A use of an identifier in reference position.
#[derive(Debug)]
pub struct Reference {
    pub identifier: NodeId,
    /// The referenced name, as spelled at the use site.
    pub name: String,
    /// The scope the reference occurs in.
    pub from: ScopeId,
    pub resolved: Option<VariableId>,
    pub read: bool,
    pub write: bool,
}

/// Owner of all scopes, variables, and references for one file.
#[derive(Debug, Default)]
pub struct ScopeManager {
    scopes: Vec<Scope>,
    variables: Vec<Variable>,
    references: Vec<Reference>,
    node_scopes: HashMap<NodeId, ScopeId>,
}

impl ScopeManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scope. The first scope added becomes the global scope.
    pub fn add_scope(&mut self, kind: ScopeKind, node: NodeId, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope {
            kind,
            node,
            parent,
            child_scopes: Vec::new(),
            variables: Vec::new(),
            references: Vec::new(),
            by_name: HashMap::new(),
        });
        if let Some(parent) = parent {
            self.scopes[parent.index()].child_scopes.push(id);
        }
        self.node_scopes.insert(node, id);
        id
    }

    /// Declare a variable in a scope. Re-declaring the same name in the same
    /// scope returns the existing variable and records the extra identifier.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        identifier: Option<NodeId>,
    ) -> VariableId {
        if let Some(&existing) = self.scopes[scope.index()].by_name.get(name) {
            if let Some(ident) = identifier {
                self.variables[existing.index()].identifiers.push(ident);
            }
            return existing;
        }
        let id = VariableId(u32::try_from(self.variables.len()).unwrap_or(u32::MAX));
        self.variables.push(Variable {
            name: name.to_string(),
            scope,
            identifiers: identifier.into_iter().collect(),
            references: Vec::new(),
            writable: true,
            marked_used: Cell::new(false),
            exported: Cell::new(false),
        });
        let s = &mut self.scopes[scope.index()];
        s.variables.push(id);
        s.by_name.insert(name.to_string(), id);
        id
    }

    /// Declare a global with an explicit writability (directive or
    /// environment globals).
    pub fn add_global(&mut self, name: &str, writable: bool) -> VariableId {
        let global = self.global_scope();
        let id = self.declare(global, name, None);
        self.variables[id.index()].writable = writable;
        id
    }

    /// Record a reference occurring in `scope`.
    pub fn add_reference(
        &mut self,
        scope: ScopeId,
        identifier: NodeId,
        name: &str,
        read: bool,
        write: bool,
    ) -> ReferenceId {
        let id = ReferenceId(u32::try_from(self.references.len()).unwrap_or(u32::MAX));
        self.references.push(Reference {
            identifier,
            name: name.to_string(),
            from: scope,
            resolved: None,
            read,
            write,
        });
        self.scopes[scope.index()].references.push(id);
        id
    }

    /// Resolve every reference against the scope chain. References to
    /// undeclared names stay unresolved. Safe to call again after new
    /// globals were added; prior resolution state is discarded first.
    pub fn resolve(&mut self) {
        for variable in &mut self.variables {
            variable.references.clear();
        }
        for index in 0..self.references.len() {
            let from = self.references[index].from;
            let name = self.references[index].name.clone();
            let resolved = self.lookup(from, &name);
            self.references[index].resolved = resolved;
            if let Some(variable) = resolved {
                self.variables[variable.index()]
                    .references
                    .push(ReferenceId(u32::try_from(index).unwrap_or(u32::MAX)));
            }
        }
    }

    /// Walk the scope chain upward looking for `name`.
    #[must_use]
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<VariableId> {
        let mut current = Some(from);
        while let Some(scope) = current {
            if let Some(&variable) = self.scopes[scope.index()].by_name.get(name) {
                return Some(variable);
            }
            current = self.scopes[scope.index()].parent;
        }
        None
    }

    #[must_use]
    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    #[must_use]
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    #[must_use]
    pub fn reference(&self, id: ReferenceId) -> &Reference {
        &self.references[id.index()]
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// Ids of every variable, in declaration order.
    pub fn variable_ids(&self) -> impl Iterator<Item = VariableId> {
        (0..self.variables.len() as u32).map(VariableId)
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    /// References that did not resolve to any declared variable.
    pub fn unresolved(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(|r| r.resolved.is_none())
    }

    /// The scope opened by `node`, if any.
    #[must_use]
    pub fn scope_for_node(&self, node: NodeId) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut sm = ScopeManager::new();
        let global = sm.add_scope(ScopeKind::Global, NodeId::from_raw(0), None);
        let func = sm.add_scope(ScopeKind::Function, NodeId::from_raw(1), Some(global));

        let x = sm.declare(global, "x", None);
        let y = sm.declare(func, "y", None);

        assert_eq!(sm.lookup(func, "y"), Some(y));
        assert_eq!(sm.lookup(func, "x"), Some(x), "lookup walks up the chain");
        assert_eq!(sm.lookup(global, "y"), None);
    }

    #[test]
    fn test_redeclaration_reuses_variable() {
        let mut sm = ScopeManager::new();
        let global = sm.add_scope(ScopeKind::Global, NodeId::from_raw(0), None);
        let first = sm.declare(global, "x", Some(NodeId::from_raw(1)));
        let second = sm.declare(global, "x", Some(NodeId::from_raw(2)));
        assert_eq!(first, second);
        assert_eq!(sm.variable(first).identifiers.len(), 2);
    }

    #[test]
    fn test_resolution() {
        let mut sm = ScopeManager::new();
        let global = sm.add_scope(ScopeKind::Global, NodeId::from_raw(0), None);
        let func = sm.add_scope(ScopeKind::Function, NodeId::from_raw(1), Some(global));
        let x = sm.declare(global, "x", None);
        sm.add_reference(func, NodeId::from_raw(2), "x", true, false);
        sm.add_reference(func, NodeId::from_raw(3), "missing", true, false);
        sm.resolve();

        assert_eq!(sm.variable(x).references.len(), 1);
        let unresolved: Vec<_> = sm.unresolved().collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].name, "missing");
    }

    #[test]
    fn test_marking_flags() {
        let mut sm = ScopeManager::new();
        let global = sm.add_scope(ScopeKind::Global, NodeId::from_raw(0), None);
        let x = sm.declare(global, "x", None);
        assert!(!sm.variable(x).is_marked_used());
        sm.variable(x).mark_used();
        assert!(sm.variable(x).is_marked_used());
        sm.variable(x).mark_exported();
        assert!(sm.variable(x).is_exported());
    }

    #[test]
    fn test_readonly_global() {
        let mut sm = ScopeManager::new();
        sm.add_scope(ScopeKind::Global, NodeId::from_raw(0), None);
        let g = sm.add_global("window", false);
        assert!(!sm.variable(g).writable);
    }
}
