//! The arena-backed syntax tree.
//!
//! Nodes live in a single `Vec` owned by [`SyntaxTree`] and are addressed by
//! [`NodeId`]. A node carries its kind, byte range, scalar properties (the
//! attributes selectors can test, e.g. a declaration's `kind` or an
//! identifier's `name`), and ordered child slots. Parent links are plain
//! lookups into the arena, installed lazily by the traverser; dropping the
//! tree drops everything, so the back-references never form an ownership
//! cycle.

use std::cell::Cell;
use std::fmt;

use crate::span::TextRange;

/// Index of a node within its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node type tags, following the ESTree vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    // Statements
    ExpressionStatement,
    BlockStatement,
    EmptyStatement,
    DebuggerStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    IfStatement,
    SwitchStatement,
    SwitchCase,
    ThrowStatement,
    TryStatement,
    CatchClause,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    LabeledStatement,
    // Declarations
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    // Expressions
    FunctionExpression,
    ArrowFunctionExpression,
    Identifier,
    Literal,
    TemplateLiteral,
    TemplateElement,
    ArrayExpression,
    ObjectExpression,
    Property,
    SpreadElement,
    RestElement,
    SequenceExpression,
    UnaryExpression,
    BinaryExpression,
    LogicalExpression,
    AssignmentExpression,
    UpdateExpression,
    ConditionalExpression,
    CallExpression,
    NewExpression,
    MemberExpression,
    ThisExpression,
}

impl NodeKind {
    /// The ESTree type string for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Program => "Program",
            Self::ExpressionStatement => "ExpressionStatement",
            Self::BlockStatement => "BlockStatement",
            Self::EmptyStatement => "EmptyStatement",
            Self::DebuggerStatement => "DebuggerStatement",
            Self::ReturnStatement => "ReturnStatement",
            Self::BreakStatement => "BreakStatement",
            Self::ContinueStatement => "ContinueStatement",
            Self::IfStatement => "IfStatement",
            Self::SwitchStatement => "SwitchStatement",
            Self::SwitchCase => "SwitchCase",
            Self::ThrowStatement => "ThrowStatement",
            Self::TryStatement => "TryStatement",
            Self::CatchClause => "CatchClause",
            Self::WhileStatement => "WhileStatement",
            Self::DoWhileStatement => "DoWhileStatement",
            Self::ForStatement => "ForStatement",
            Self::ForInStatement => "ForInStatement",
            Self::ForOfStatement => "ForOfStatement",
            Self::LabeledStatement => "LabeledStatement",
            Self::VariableDeclaration => "VariableDeclaration",
            Self::VariableDeclarator => "VariableDeclarator",
            Self::FunctionDeclaration => "FunctionDeclaration",
            Self::FunctionExpression => "FunctionExpression",
            Self::ArrowFunctionExpression => "ArrowFunctionExpression",
            Self::Identifier => "Identifier",
            Self::Literal => "Literal",
            Self::TemplateLiteral => "TemplateLiteral",
            Self::TemplateElement => "TemplateElement",
            Self::ArrayExpression => "ArrayExpression",
            Self::ObjectExpression => "ObjectExpression",
            Self::Property => "Property",
            Self::SpreadElement => "SpreadElement",
            Self::RestElement => "RestElement",
            Self::SequenceExpression => "SequenceExpression",
            Self::UnaryExpression => "UnaryExpression",
            Self::BinaryExpression => "BinaryExpression",
            Self::LogicalExpression => "LogicalExpression",
            Self::AssignmentExpression => "AssignmentExpression",
            Self::UpdateExpression => "UpdateExpression",
            Self::ConditionalExpression => "ConditionalExpression",
            Self::CallExpression => "CallExpression",
            Self::NewExpression => "NewExpression",
            Self::MemberExpression => "MemberExpression",
            Self::ThisExpression => "ThisExpression",
        }
    }

    /// Returns `true` for the function-like kinds that open a code path.
    #[must_use]
    pub const fn is_function(self) -> bool {
        matches!(
            self,
            Self::FunctionDeclaration | Self::FunctionExpression | Self::ArrowFunctionExpression
        )
    }

    /// Returns `true` for statement kinds.
    #[must_use]
    pub const fn is_statement(self) -> bool {
        matches!(
            self,
            Self::ExpressionStatement
                | Self::BlockStatement
                | Self::EmptyStatement
                | Self::DebuggerStatement
                | Self::ReturnStatement
                | Self::BreakStatement
                | Self::ContinueStatement
                | Self::IfStatement
                | Self::SwitchStatement
                | Self::ThrowStatement
                | Self::TryStatement
                | Self::WhileStatement
                | Self::DoWhileStatement
                | Self::ForStatement
                | Self::ForInStatement
                | Self::ForOfStatement
                | Self::LabeledStatement
                | Self::VariableDeclaration
                | Self::FunctionDeclaration
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar node property, testable from selectors.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Bool(bool),
    Num(f64),
    Null,
}

impl PropValue {
    #[must_use]
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A child slot value: a single (possibly absent) node or an ordered list
/// with possibly absent elements. Absent entries model ESTree `null`
/// children (e.g. a missing `else` branch or an array hole) and are
/// silently skipped during traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(Option<NodeId>),
    List(Vec<Option<NodeId>>),
}

/// A named, ordered child slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSlot {
    pub key: &'static str,
    pub child: Child,
}

/// The data stored for one node.
#[derive(Debug)]
pub struct NodeData {
    pub kind: NodeKind,
    pub range: TextRange,
    pub props: Vec<(&'static str, PropValue)>,
    pub children: Vec<ChildSlot>,
    parent: Cell<Option<NodeId>>,
}

impl NodeData {
    #[must_use]
    pub fn new(kind: NodeKind, range: TextRange) -> Self {
        Self {
            kind,
            range,
            props: Vec::new(),
            children: Vec::new(),
            parent: Cell::new(None),
        }
    }

    #[must_use]
    pub fn with_prop(mut self, key: &'static str, value: PropValue) -> Self {
        self.props.push((key, value));
        self
    }

    #[must_use]
    pub fn with_child(mut self, key: &'static str, node: Option<NodeId>) -> Self {
        self.children.push(ChildSlot {
            key,
            child: Child::Node(node),
        });
        self
    }

    #[must_use]
    pub fn with_list(mut self, key: &'static str, nodes: Vec<Option<NodeId>>) -> Self {
        self.children.push(ChildSlot {
            key,
            child: Child::List(nodes),
        });
        self
    }

    /// Look up a scalar property by name.
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&PropValue> {
        self.props.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Look up a child slot by key.
    #[must_use]
    pub fn slot(&self, key: &str) -> Option<&Child> {
        self.children
            .iter()
            .find(|slot| slot.key == key)
            .map(|slot| &slot.child)
    }
}

/// The tree itself: an arena of nodes plus the root id.
#[derive(Debug)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    #[must_use]
    pub fn builder() -> SyntaxTreeBuilder {
        SyntaxTreeBuilder { nodes: Vec::new() }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind
    }

    #[must_use]
    pub fn range(&self, id: NodeId) -> TextRange {
        self.get(id).range
    }

    /// Look up a scalar property on a node.
    #[must_use]
    pub fn prop(&self, id: NodeId, key: &str) -> Option<&PropValue> {
        self.get(id).prop(key)
    }

    /// The single node in a named child slot, if present.
    #[must_use]
    pub fn child(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match self.get(id).slot(key) {
            Some(Child::Node(node)) => *node,
            _ => None,
        }
    }

    /// The non-absent nodes in a named list slot, in order.
    #[must_use]
    pub fn list(&self, id: NodeId, key: &str) -> Vec<NodeId> {
        match self.get(id).slot(key) {
            Some(Child::List(nodes)) => nodes.iter().filter_map(|n| *n).collect(),
            _ => Vec::new(),
        }
    }

    /// All non-absent children of a node, in slot order.
    pub fn child_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.get(id).children.iter().flat_map(|slot| {
            let ids: Vec<NodeId> = match &slot.child {
                Child::Node(node) => node.iter().copied().collect(),
                Child::List(nodes) => nodes.iter().filter_map(|n| *n).collect(),
            };
            ids
        })
    }

    /// The parent of a node. `None` for the root, and for any node the
    /// traverser has not reached yet.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent.get()
    }

    /// Install a parent back-link. The traverser is the only caller.
    pub fn set_parent(&self, id: NodeId, parent: NodeId) {
        self.get(id).parent.set(Some(parent));
    }

    /// Ancestors of a node from nearest to the root, via the installed
    /// parent links.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Ids of every node in the arena, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId::from_raw)
    }
}

/// Builder used by parsers and tests to allocate nodes bottom-up.
#[derive(Debug)]
pub struct SyntaxTreeBuilder {
    nodes: Vec<NodeData>,
}

impl SyntaxTreeBuilder {
    /// Allocate a node and return its id.
    pub fn add(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(data);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Range of an already-allocated node (parsers need this while
    /// computing enclosing ranges).
    #[must_use]
    pub fn range(&self, id: NodeId) -> TextRange {
        self.nodes[id.index()].range
    }

    /// Finish the tree with the given root.
    #[must_use]
    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> SyntaxTree {
        // var x;
        let mut b = SyntaxTree::builder();
        let ident = b.add(
            NodeData::new(NodeKind::Identifier, TextRange::new(4, 5))
                .with_prop("name", PropValue::str("x")),
        );
        let declarator = b.add(
            NodeData::new(NodeKind::VariableDeclarator, TextRange::new(4, 5))
                .with_child("id", Some(ident))
                .with_child("init", None),
        );
        let decl = b.add(
            NodeData::new(NodeKind::VariableDeclaration, TextRange::new(0, 6))
                .with_prop("kind", PropValue::str("var"))
                .with_list("declarations", vec![Some(declarator)]),
        );
        let program = b.add(
            NodeData::new(NodeKind::Program, TextRange::new(0, 6))
                .with_list("body", vec![Some(decl)]),
        );
        b.finish(program)
    }

    #[test]
    fn test_child_lookup() {
        let tree = small_tree();
        let root = tree.root();
        assert_eq!(tree.kind(root), NodeKind::Program);

        let body = tree.list(root, "body");
        assert_eq!(body.len(), 1);
        assert_eq!(tree.kind(body[0]), NodeKind::VariableDeclaration);
        assert_eq!(
            tree.prop(body[0], "kind").and_then(PropValue::as_str),
            Some("var")
        );
    }

    #[test]
    fn test_absent_children_skipped() {
        let tree = small_tree();
        let decl = tree.list(tree.root(), "body")[0];
        let declarator = tree.list(decl, "declarations")[0];
        assert_eq!(tree.child(declarator, "init"), None);
        let children: Vec<_> = tree.child_ids(declarator).collect();
        assert_eq!(children.len(), 1, "absent init slot is skipped");
    }

    #[test]
    fn test_parent_links() {
        let tree = small_tree();
        let decl = tree.list(tree.root(), "body")[0];
        assert_eq!(tree.parent(decl), None, "no link before traversal");
        tree.set_parent(decl, tree.root());
        assert_eq!(tree.parent(decl), Some(tree.root()));
        assert_eq!(tree.ancestors(decl), vec![tree.root()]);
    }
}
