//! The per-file source-code object.
//!
//! Owns everything derived from one parse of one file: the BOM-stripped
//! text, the syntax tree, the scope manager, the line index, and the token
//! store. All of it lives for exactly one lint pass; there are no global
//! caches.

use std::collections::HashMap;

use ecma_ast::{
    NodeId, Position, ScopeId, ScopeManager, SourceLocation, SyntaxTree, TextRange, Token,
};

use crate::line_index::LineIndex;
use crate::token_store::{TokenQuery, TokenStore};

/// Opaque services a parser may expose to rules (e.g. type information).
pub type ParserServices = HashMap<String, String>;

/// Parser-provided visitor-key overrides, keyed by node type string.
pub type VisitorKeyOverrides = HashMap<String, Vec<String>>;

/// The source-code object handed to the linting core and to rules.
#[derive(Debug)]
pub struct SourceCode {
    text: String,
    tree: SyntaxTree,
    scopes: ScopeManager,
    line_index: LineIndex,
    token_store: TokenStore,
    parser_services: ParserServices,
    visitor_keys: Option<VisitorKeyOverrides>,
    has_bom: bool,
}

impl SourceCode {
    /// Build the source-code object. `text` is the original input; a UTF-8
    /// BOM is stripped here so that every range is relative to the stripped
    /// text.
    #[must_use]
    pub fn new(
        text: &str,
        tree: SyntaxTree,
        scopes: ScopeManager,
        tokens: Vec<Token>,
        comments: Vec<Token>,
    ) -> Self {
        let (has_bom, stripped) = match text.strip_prefix('\u{feff}') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        Self {
            text: stripped.to_string(),
            line_index: LineIndex::new(stripped),
            token_store: TokenStore::new(tokens, comments),
            tree,
            scopes,
            parser_services: ParserServices::new(),
            visitor_keys: None,
            has_bom,
        }
    }

    #[must_use]
    pub fn with_parser_services(mut self, services: ParserServices) -> Self {
        self.parser_services = services;
        self
    }

    #[must_use]
    pub fn with_visitor_keys(mut self, keys: VisitorKeyOverrides) -> Self {
        self.visitor_keys = Some(keys);
        self
    }

    /// The BOM-stripped source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the original input carried a UTF-8 BOM.
    #[must_use]
    pub const fn has_bom(&self) -> bool {
        self.has_bom
    }

    #[must_use]
    pub const fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    #[must_use]
    pub const fn scopes(&self) -> &ScopeManager {
        &self.scopes
    }

    /// Mutable scope access, for merging configured globals before a lint
    /// run starts.
    pub fn scopes_mut(&mut self) -> &mut ScopeManager {
        &mut self.scopes
    }

    #[must_use]
    pub const fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.token_store
    }

    #[must_use]
    pub const fn parser_services(&self) -> &ParserServices {
        &self.parser_services
    }

    #[must_use]
    pub const fn visitor_key_overrides(&self) -> Option<&VisitorKeyOverrides> {
        self.visitor_keys.as_ref()
    }

    /// Slice of the text covered by `range`.
    #[must_use]
    pub fn slice(&self, range: TextRange) -> &str {
        &self.text[range.start.min(self.text.len())..range.end.min(self.text.len())]
    }

    /// Text of a node.
    #[must_use]
    pub fn node_text(&self, node: NodeId) -> &str {
        self.slice(self.tree.range(node))
    }

    /// Position of a byte offset.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        self.line_index.position(offset)
    }

    /// Byte offset of a position.
    #[must_use]
    pub fn offset(&self, position: Position) -> Option<usize> {
        self.line_index.offset(position)
    }

    /// Start/end positions of a range.
    #[must_use]
    pub fn location(&self, range: TextRange) -> SourceLocation {
        SourceLocation::new(self.position(range.start), self.position(range.end))
    }

    /// The innermost scope containing `node`, found by walking parent links
    /// up to the nearest node that opens a scope.
    #[must_use]
    pub fn scope_for(&self, node: NodeId) -> ScopeId {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(scope) = self.scopes.scope_for_node(id) {
                return scope;
            }
            current = self.tree.parent(id);
        }
        self.scopes.global_scope()
    }

    /// Comments inside a node's range.
    #[must_use]
    pub fn comments_inside(&self, node: NodeId) -> Vec<&Token> {
        let comments = |t: &Token| t.is_comment();
        self.token_store.tokens_inside(
            self.tree.range(node),
            &TokenQuery::with_comments().filter(&comments),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_ast::{NodeData, NodeKind, ScopeKind, TokenKind};

    fn source() -> SourceCode {
        // var x;
        let text = "var x;\n";
        let mut b = SyntaxTree::builder();
        let ident = b.add(NodeData::new(NodeKind::Identifier, TextRange::new(4, 5)));
        let declarator = b.add(
            NodeData::new(NodeKind::VariableDeclarator, TextRange::new(4, 5))
                .with_child("id", Some(ident))
                .with_child("init", None),
        );
        let decl = b.add(
            NodeData::new(NodeKind::VariableDeclaration, TextRange::new(0, 6))
                .with_list("declarations", vec![Some(declarator)]),
        );
        let program =
            b.add(NodeData::new(NodeKind::Program, TextRange::new(0, 7)).with_list(
                "body",
                vec![Some(decl)],
            ));
        let tree = b.finish(program);

        let mut scopes = ScopeManager::new();
        scopes.add_scope(ScopeKind::Global, program, None);

        let tokens = vec![
            Token::new(TokenKind::Keyword, "var", TextRange::new(0, 3)),
            Token::new(TokenKind::Identifier, "x", TextRange::new(4, 5)),
            Token::new(TokenKind::Punctuator, ";", TextRange::new(5, 6)),
        ];
        SourceCode::new(text, tree, scopes, tokens, Vec::new())
    }

    #[test]
    fn test_node_text() {
        let source = source();
        let decl = source.tree().list(source.tree().root(), "body")[0];
        assert_eq!(source.node_text(decl), "var x;");
    }

    #[test]
    fn test_bom_stripped() {
        let text = "\u{feff}var x;\n";
        let source = {
            let mut b = SyntaxTree::builder();
            let program = b.add(NodeData::new(NodeKind::Program, TextRange::new(0, 7)));
            let tree = b.finish(program);
            let mut scopes = ScopeManager::new();
            scopes.add_scope(ScopeKind::Global, program, None);
            SourceCode::new(text, tree, scopes, Vec::new(), Vec::new())
        };
        assert!(source.has_bom());
        assert_eq!(source.text(), "var x;\n");
    }

    #[test]
    fn test_scope_for_falls_back_to_global() {
        let source = source();
        let ident = {
            let decl = source.tree().list(source.tree().root(), "body")[0];
            let declarator = source.tree().list(decl, "declarations")[0];
            // Install parent links the way the traverser would.
            source.tree().set_parent(decl, source.tree().root());
            source.tree().set_parent(declarator, decl);
            let ident = source.tree().child(declarator, "id").unwrap();
            source.tree().set_parent(ident, declarator);
            ident
        };
        assert_eq!(source.scope_for(ident), source.scopes().global_scope());
    }
}
