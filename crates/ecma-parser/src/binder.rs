//! Scope binding: declarations, references, and resolution over the parsed
//! tree.
//!
//! `var` and function declarations hoist to the nearest function or global
//! scope; `let`/`const` bind in the enclosing block. Identifiers in
//! expression position become references, with write flags for assignment
//! and update targets.

use ecma_ast::{NodeId, NodeKind, PropValue, ScopeId, ScopeKind, ScopeManager, SyntaxTree};

pub fn bind(tree: &SyntaxTree) -> ScopeManager {
    let mut binder = Binder {
        tree,
        scopes: ScopeManager::new(),
    };
    let global = binder
        .scopes
        .add_scope(ScopeKind::Global, tree.root(), None);
    binder.statements(tree.root(), "body", global);
    binder.scopes.resolve();
    binder.scopes
}

struct Binder<'t> {
    tree: &'t SyntaxTree,
    scopes: ScopeManager,
}

impl Binder<'_> {
    fn statements(&mut self, node: NodeId, key: &str, scope: ScopeId) {
        for stmt in self.tree.list(node, key) {
            self.statement(stmt, scope);
        }
    }

    fn statement(&mut self, node: NodeId, scope: ScopeId) {
        match self.tree.kind(node) {
            NodeKind::VariableDeclaration => self.variable_declaration(node, scope),
            NodeKind::FunctionDeclaration => {
                if let Some(id) = self.tree.child(node, "id") {
                    let target = self.var_scope(scope);
                    self.declare_identifier(id, target);
                }
                self.function_body(node, scope);
            }
            NodeKind::BlockStatement => {
                let block = self.scopes.add_scope(ScopeKind::Block, node, Some(scope));
                self.statements(node, "body", block);
            }
            NodeKind::ExpressionStatement => {
                if let Some(expr) = self.tree.child(node, "expression") {
                    self.expression(expr, scope);
                }
            }
            NodeKind::IfStatement => {
                self.opt_expression(node, "test", scope);
                self.opt_statement(node, "consequent", scope);
                self.opt_statement(node, "alternate", scope);
            }
            NodeKind::WhileStatement | NodeKind::DoWhileStatement => {
                self.opt_expression(node, "test", scope);
                self.opt_statement(node, "body", scope);
            }
            NodeKind::ForStatement => {
                let for_scope = self.scopes.add_scope(ScopeKind::For, node, Some(scope));
                if let Some(init) = self.tree.child(node, "init") {
                    if self.tree.kind(init) == NodeKind::VariableDeclaration {
                        self.variable_declaration(init, for_scope);
                    } else {
                        self.expression(init, for_scope);
                    }
                }
                self.opt_expression(node, "test", for_scope);
                self.opt_expression(node, "update", for_scope);
                self.opt_statement(node, "body", for_scope);
            }
            NodeKind::ReturnStatement | NodeKind::ThrowStatement => {
                self.opt_expression(node, "argument", scope);
            }
            NodeKind::TryStatement => {
                self.opt_statement(node, "block", scope);
                if let Some(handler) = self.tree.child(node, "handler") {
                    let catch = self.scopes.add_scope(ScopeKind::Catch, handler, Some(scope));
                    if let Some(param) = self.tree.child(handler, "param") {
                        self.declare_identifier(param, catch);
                    }
                    self.opt_statement(handler, "body", catch);
                }
                self.opt_statement(node, "finalizer", scope);
            }
            NodeKind::SwitchStatement => {
                self.opt_expression(node, "discriminant", scope);
                let switch = self.scopes.add_scope(ScopeKind::Switch, node, Some(scope));
                for case in self.tree.list(node, "cases") {
                    self.opt_expression(case, "test", switch);
                    self.statements(case, "consequent", switch);
                }
            }
            NodeKind::EmptyStatement
            | NodeKind::DebuggerStatement
            | NodeKind::BreakStatement
            | NodeKind::ContinueStatement => {}
            _ => self.expression(node, scope),
        }
    }

    fn opt_statement(&mut self, node: NodeId, key: &str, scope: ScopeId) {
        if let Some(child) = self.tree.child(node, key) {
            self.statement(child, scope);
        }
    }

    fn opt_expression(&mut self, node: NodeId, key: &str, scope: ScopeId) {
        if let Some(child) = self.tree.child(node, key) {
            self.expression(child, scope);
        }
    }

    fn variable_declaration(&mut self, node: NodeId, scope: ScopeId) {
        let hoisted = self.tree.prop(node, "kind").and_then(PropValue::as_str) == Some("var");
        let target = if hoisted { self.var_scope(scope) } else { scope };
        for declarator in self.tree.list(node, "declarations") {
            if let Some(id) = self.tree.child(declarator, "id") {
                self.declare_identifier(id, target);
            }
            if let Some(init) = self.tree.child(declarator, "init") {
                self.expression(init, scope);
            }
        }
    }

    fn function_body(&mut self, function: NodeId, scope: ScopeId) {
        let fn_scope = self
            .scopes
            .add_scope(ScopeKind::Function, function, Some(scope));
        // A function expression's name is visible only inside itself.
        if self.tree.kind(function) == NodeKind::FunctionExpression {
            if let Some(id) = self.tree.child(function, "id") {
                self.declare_identifier(id, fn_scope);
            }
        }
        for param in self.tree.list(function, "params") {
            self.declare_identifier(param, fn_scope);
        }
        if let Some(body) = self.tree.child(function, "body") {
            // The body block shares the function scope.
            self.statements(body, "body", fn_scope);
        }
    }

    fn expression(&mut self, node: NodeId, scope: ScopeId) {
        match self.tree.kind(node) {
            NodeKind::Identifier => self.reference(node, scope, true, false),
            NodeKind::Literal | NodeKind::ThisExpression => {}
            NodeKind::FunctionExpression => self.function_body(node, scope),
            NodeKind::AssignmentExpression => {
                let operator = self.tree.prop(node, "operator").and_then(PropValue::as_str);
                if let Some(left) = self.tree.child(node, "left") {
                    if self.tree.kind(left) == NodeKind::Identifier {
                        // Compound assignment also reads the target.
                        let reads = operator != Some("=");
                        self.reference(left, scope, reads, true);
                    } else {
                        self.expression(left, scope);
                    }
                }
                self.opt_expression(node, "right", scope);
            }
            NodeKind::UpdateExpression => {
                if let Some(argument) = self.tree.child(node, "argument") {
                    if self.tree.kind(argument) == NodeKind::Identifier {
                        self.reference(argument, scope, true, true);
                    } else {
                        self.expression(argument, scope);
                    }
                }
            }
            NodeKind::MemberExpression => {
                self.opt_expression(node, "object", scope);
                let computed =
                    self.tree.prop(node, "computed") == Some(&PropValue::Bool(true));
                if computed {
                    self.opt_expression(node, "property", scope);
                }
            }
            NodeKind::Property => {
                let computed =
                    self.tree.prop(node, "computed") == Some(&PropValue::Bool(true));
                if computed {
                    self.opt_expression(node, "key", scope);
                }
                self.opt_expression(node, "value", scope);
            }
            NodeKind::CallExpression | NodeKind::NewExpression => {
                self.opt_expression(node, "callee", scope);
                for argument in self.tree.list(node, "arguments") {
                    self.expression(argument, scope);
                }
            }
            NodeKind::ArrayExpression => {
                for element in self.tree.list(node, "elements") {
                    self.expression(element, scope);
                }
            }
            NodeKind::ObjectExpression => {
                for property in self.tree.list(node, "properties") {
                    self.expression(property, scope);
                }
            }
            NodeKind::SequenceExpression => {
                for expr in self.tree.list(node, "expressions") {
                    self.expression(expr, scope);
                }
            }
            NodeKind::BinaryExpression | NodeKind::LogicalExpression => {
                self.opt_expression(node, "left", scope);
                self.opt_expression(node, "right", scope);
            }
            NodeKind::UnaryExpression => self.opt_expression(node, "argument", scope),
            NodeKind::ConditionalExpression => {
                self.opt_expression(node, "test", scope);
                self.opt_expression(node, "consequent", scope);
                self.opt_expression(node, "alternate", scope);
            }
            _ => {}
        }
    }

    fn declare_identifier(&mut self, id: NodeId, scope: ScopeId) {
        if let Some(name) = self.tree.prop(id, "name").and_then(PropValue::as_str) {
            let name = name.to_string();
            self.scopes.declare(scope, &name, Some(id));
        }
    }

    fn reference(&mut self, id: NodeId, scope: ScopeId, read: bool, write: bool) {
        if let Some(name) = self.tree.prop(id, "name").and_then(PropValue::as_str) {
            let name = name.to_string();
            self.scopes.add_reference(scope, id, &name, read, write);
        }
    }

    /// Nearest function or global scope, for `var` and function hoisting.
    fn var_scope(&self, from: ScopeId) -> ScopeId {
        let mut current = from;
        loop {
            let scope = self.scopes.scope(current);
            match scope.kind {
                ScopeKind::Global | ScopeKind::Function | ScopeKind::Module => return current,
                _ => match scope.parent {
                    Some(parent) => current = parent,
                    None => return current,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse_program;

    fn bind_source(text: &str) -> (SyntaxTree, ScopeManager) {
        let lexed = tokenize(text).unwrap();
        let tree = parse_program(text, &lexed.tokens).unwrap();
        let scopes = bind(&tree);
        (tree, scopes)
    }

    #[test]
    fn test_global_declaration_and_reference() {
        let (_tree, scopes) = bind_source("var x = 1; x + 1;");
        let global = scopes.global_scope();
        let x = scopes.lookup(global, "x").unwrap();
        assert_eq!(scopes.variable(x).references.len(), 1);
        assert_eq!(scopes.unresolved().count(), 0);
    }

    #[test]
    fn test_undeclared_reference_stays_unresolved() {
        let (_tree, scopes) = bind_source("missing();");
        let unresolved: Vec<_> = scopes.unresolved().collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].name, "missing");
    }

    #[test]
    fn test_var_hoists_out_of_blocks() {
        let (_tree, scopes) = bind_source("{ var x = 1; } { let y = 2; }");
        let global = scopes.global_scope();
        assert!(scopes.lookup(global, "x").is_some(), "var hoists");
        assert!(
            scopes.lookup(global, "y").is_none(),
            "let stays in its block"
        );
    }

    #[test]
    fn test_function_scope_and_params() {
        let (_tree, scopes) = bind_source("function f(a) { var b = a; } f();");
        let global = scopes.global_scope();
        assert!(scopes.lookup(global, "f").is_some());
        assert!(scopes.lookup(global, "a").is_none());
        assert!(scopes.lookup(global, "b").is_none());
        assert_eq!(scopes.unresolved().count(), 0);
    }

    #[test]
    fn test_assignment_is_a_write() {
        let (_tree, scopes) = bind_source("let x = 1; x = 2; x + 1;");
        let global = scopes.global_scope();
        let x = scopes.lookup(global, "x").unwrap();
        let refs = &scopes.variable(x).references;
        assert_eq!(refs.len(), 2);
        let writes = refs
            .iter()
            .filter(|r| scopes.reference(**r).write)
            .count();
        assert_eq!(writes, 1);
    }

    #[test]
    fn test_member_property_is_not_a_reference() {
        let (_tree, scopes) = bind_source("var a = {}; a.missing;");
        assert_eq!(scopes.unresolved().count(), 0);
    }

    #[test]
    fn test_catch_param_scoped_to_handler() {
        let (_tree, scopes) = bind_source("try { f(); } catch (e) { e; }");
        let global = scopes.global_scope();
        assert!(scopes.lookup(global, "e").is_none());
        // Only `f` is unresolved.
        assert_eq!(scopes.unresolved().count(), 1);
    }
}
