//! AST-query selectors.
//!
//! A selector subscribes a listener to nodes during traversal. Supported
//! grammar: `*`, type names, attribute tests (`[kind]`, `[kind=var]`,
//! `[computed!=true]`, with dotted paths like `[callee.name=require]`),
//! compounds (`TypeName[attr=value]`), the child (`A > B`) and descendant
//! (`A B`) combinators, comma-separated alternatives, and the `:exit`
//! suffix selecting the leave event.
//!
//! Specificity is `(attribute-test count, identifier count)`; the node
//! event generator fires higher-specificity selectors first and breaks
//! ties by subscription order.

use std::fmt;

use ecma_ast::{NodeId, PropValue, SyntaxTree};
use thiserror::Error;

/// Parse failure for a selector string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct SelectorParseError {
    pub selector: String,
    pub reason: String,
}

impl SelectorParseError {
    fn new(selector: &str, reason: impl Into<String>) -> Self {
        Self {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

/// Specificity of a compiled selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity {
    pub attributes: u32,
    pub identifiers: u32,
}

/// A literal on the right-hand side of an attribute test.
#[derive(Debug, Clone, PartialEq)]
enum AttrLit {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
enum AttrTest {
    Exists,
    Eq(AttrLit),
    Ne(AttrLit),
}

#[derive(Debug, Clone, PartialEq)]
enum Matcher {
    Any,
    Type(String),
    Attr { path: Vec<String>, test: AttrTest },
    Compound(Vec<Matcher>),
    Child(Box<Matcher>, Box<Matcher>),
    Descendant(Box<Matcher>, Box<Matcher>),
    List(Vec<Matcher>),
}

/// A selector compiled once at subscription time.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSelector {
    raw: String,
    exit: bool,
    matcher: Matcher,
    specificity: Specificity,
}

impl CompiledSelector {
    /// Compile a selector string. The `:exit` suffix is recognized here.
    pub fn compile(raw: &str) -> Result<Self, SelectorParseError> {
        let trimmed = raw.trim();
        let (body, exit) = match trimmed.strip_suffix(":exit") {
            Some(body) => (body.trim_end(), true),
            None => (trimmed, false),
        };
        if body.is_empty() {
            return Err(SelectorParseError::new(raw, "empty selector"));
        }
        let mut parser = SelectorParser::new(raw, body);
        let matcher = parser.parse_list()?;
        let mut specificity = Specificity::default();
        count_specificity(&matcher, &mut specificity);
        Ok(Self {
            raw: raw.to_string(),
            exit,
            matcher,
            specificity,
        })
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether this selector targets the leave event.
    #[must_use]
    pub const fn is_exit(&self) -> bool {
        self.exit
    }

    #[must_use]
    pub const fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Match against a node. `ancestors` runs from the immediate parent up
    /// to the root.
    #[must_use]
    pub fn matches(&self, tree: &SyntaxTree, node: NodeId, ancestors: &[NodeId]) -> bool {
        matches(&self.matcher, tree, node, ancestors)
    }
}

impl fmt::Display for CompiledSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn count_specificity(matcher: &Matcher, out: &mut Specificity) {
    match matcher {
        Matcher::Any => {}
        Matcher::Type(_) => out.identifiers += 1,
        Matcher::Attr { .. } => out.attributes += 1,
        Matcher::Compound(parts) | Matcher::List(parts) => {
            for part in parts {
                count_specificity(part, out);
            }
        }
        Matcher::Child(left, right) | Matcher::Descendant(left, right) => {
            count_specificity(left, out);
            count_specificity(right, out);
        }
    }
}

fn matches(matcher: &Matcher, tree: &SyntaxTree, node: NodeId, ancestors: &[NodeId]) -> bool {
    match matcher {
        Matcher::Any => true,
        Matcher::Type(name) => tree.kind(node).as_str() == name,
        Matcher::Attr { path, test } => attr_matches(tree, node, path, test),
        Matcher::Compound(parts) => parts.iter().all(|p| matches(p, tree, node, ancestors)),
        Matcher::List(parts) => parts.iter().any(|p| matches(p, tree, node, ancestors)),
        Matcher::Child(left, right) => {
            matches(right, tree, node, ancestors)
                && !ancestors.is_empty()
                && matches(left, tree, ancestors[0], &ancestors[1..])
        }
        Matcher::Descendant(left, right) => {
            matches(right, tree, node, ancestors)
                && (1..=ancestors.len()).any(|i| {
                    matches(left, tree, ancestors[i - 1], &ancestors[i..])
                })
        }
    }
}

fn attr_matches(tree: &SyntaxTree, node: NodeId, path: &[String], test: &AttrTest) -> bool {
    // Navigate child slots for all but the last segment.
    let mut current = node;
    for segment in &path[..path.len() - 1] {
        match tree.child(current, segment) {
            Some(child) => current = child,
            None => return false,
        }
    }
    let last = &path[path.len() - 1];

    // `type` is a pseudo-property naming the node kind.
    if last == "type" {
        let kind = tree.kind(current).as_str();
        return match test {
            AttrTest::Exists => true,
            AttrTest::Eq(AttrLit::Str(expected)) => kind == expected,
            AttrTest::Ne(AttrLit::Str(expected)) => kind != expected,
            _ => false,
        };
    }

    match tree.prop(current, last) {
        Some(value) => match test {
            AttrTest::Exists => true,
            AttrTest::Eq(lit) => lit_eq(lit, value),
            AttrTest::Ne(lit) => !lit_eq(lit, value),
        },
        // A single-node child slot also satisfies a bare existence test.
        None => matches!(test, AttrTest::Exists) && tree.child(current, last).is_some(),
    }
}

fn lit_eq(lit: &AttrLit, value: &PropValue) -> bool {
    match (lit, value) {
        (AttrLit::Str(a), PropValue::Str(b)) => a == b,
        (AttrLit::Num(a), PropValue::Num(b)) => (a - b).abs() < f64::EPSILON,
        (AttrLit::Bool(a), PropValue::Bool(b)) => a == b,
        (AttrLit::Null, PropValue::Null) => true,
        _ => false,
    }
}

struct SelectorParser<'s> {
    raw: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl<'s> SelectorParser<'s> {
    fn new(raw: &'s str, body: &str) -> Self {
        Self {
            raw,
            chars: body.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> SelectorParseError {
        SelectorParseError::new(self.raw, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<Matcher, SelectorParseError> {
        let mut alternatives = vec![self.parse_combined()?];
        loop {
            self.skip_ws();
            if self.peek() == Some(',') {
                self.bump();
                self.skip_ws();
                alternatives.push(self.parse_combined()?);
            } else {
                break;
            }
        }
        self.skip_ws();
        if self.pos != self.chars.len() {
            return Err(self.error(format!("unexpected trailing input at {}", self.pos)));
        }
        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Matcher::List(alternatives)
        })
    }

    fn parse_combined(&mut self) -> Result<Matcher, SelectorParseError> {
        let mut left = self.parse_compound()?;
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    let right = self.parse_compound()?;
                    left = Matcher::Child(Box::new(left), Box::new(right));
                }
                Some(c) if had_ws && is_compound_start(c) => {
                    let right = self.parse_compound()?;
                    left = Matcher::Descendant(Box::new(left), Box::new(right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_compound(&mut self) -> Result<Matcher, SelectorParseError> {
        let mut parts = Vec::new();
        match self.peek() {
            Some('*') => {
                self.bump();
                parts.push(Matcher::Any);
            }
            Some(c) if is_ident_start(c) => {
                let name = self.parse_ident();
                parts.push(Matcher::Type(name));
            }
            Some('[') => {}
            other => {
                return Err(self.error(match other {
                    Some(c) => format!("unexpected character `{c}`"),
                    None => "unexpected end of selector".to_string(),
                }));
            }
        }
        while self.peek() == Some('[') {
            parts.push(self.parse_attr()?);
        }
        if parts.is_empty() {
            return Err(self.error("expected a type name, `*`, or attribute test"));
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Matcher::Compound(parts)
        })
    }

    fn parse_attr(&mut self) -> Result<Matcher, SelectorParseError> {
        self.bump(); // consume `[`
        self.skip_ws();
        let mut path = vec![self.parse_ident()];
        while self.peek() == Some('.') {
            self.bump();
            path.push(self.parse_ident());
        }
        if path.iter().any(String::is_empty) {
            return Err(self.error("empty attribute name"));
        }
        self.skip_ws();
        let test = match self.peek() {
            Some(']') => AttrTest::Exists,
            Some('=') => {
                self.bump();
                self.skip_ws();
                AttrTest::Eq(self.parse_literal()?)
            }
            Some('!') => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(self.error("expected `!=`"));
                }
                self.skip_ws();
                AttrTest::Ne(self.parse_literal()?)
            }
            _ => return Err(self.error("expected `]`, `=`, or `!=`")),
        };
        self.skip_ws();
        if self.bump() != Some(']') {
            return Err(self.error("unterminated attribute test"));
        }
        Ok(Matcher::Attr { path, test })
    }

    fn parse_literal(&mut self) -> Result<AttrLit, SelectorParseError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some('\\') => match self.bump() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(self.error("unterminated string literal")),
                        },
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string literal")),
                    }
                }
                Ok(AttrLit::Str(value))
            }
            Some(c) if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == '-')
                {
                    text.push(self.bump().unwrap_or_default());
                }
                text.parse::<f64>()
                    .map(AttrLit::Num)
                    .map_err(|_| self.error(format!("invalid number literal `{text}`")))
            }
            Some(c) if is_ident_start(c) => {
                let word = self.parse_ident();
                Ok(match word.as_str() {
                    "true" => AttrLit::Bool(true),
                    "false" => AttrLit::Bool(false),
                    "null" => AttrLit::Null,
                    _ => AttrLit::Str(word),
                })
            }
            _ => Err(self.error("expected an attribute value")),
        }
    }

    fn parse_ident(&mut self) -> String {
        let mut out = String::new();
        while self.peek().is_some_and(is_ident_continue) {
            out.push(self.bump().unwrap_or_default());
        }
        out
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '-'
}

fn is_compound_start(c: char) -> bool {
    c == '*' || c == '[' || is_ident_start(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_ast::{NodeData, NodeKind, TextRange};

    /// `var x = f();` — a declaration with a call initializer.
    fn tree() -> (SyntaxTree, NodeId, NodeId, Vec<NodeId>) {
        let mut b = SyntaxTree::builder();
        let callee = b.add(
            NodeData::new(NodeKind::Identifier, TextRange::new(8, 9))
                .with_prop("name", PropValue::str("f")),
        );
        let call = b.add(
            NodeData::new(NodeKind::CallExpression, TextRange::new(8, 11))
                .with_child("callee", Some(callee))
                .with_list("arguments", vec![]),
        );
        let id = b.add(
            NodeData::new(NodeKind::Identifier, TextRange::new(4, 5))
                .with_prop("name", PropValue::str("x")),
        );
        let declarator = b.add(
            NodeData::new(NodeKind::VariableDeclarator, TextRange::new(4, 11))
                .with_child("id", Some(id))
                .with_child("init", Some(call)),
        );
        let decl = b.add(
            NodeData::new(NodeKind::VariableDeclaration, TextRange::new(0, 12))
                .with_prop("kind", PropValue::str("var"))
                .with_list("declarations", vec![Some(declarator)]),
        );
        let program = b.add(
            NodeData::new(NodeKind::Program, TextRange::new(0, 12))
                .with_list("body", vec![Some(decl)]),
        );
        let tree = b.finish(program);
        let ancestors_of_call = vec![declarator, decl, program];
        (tree, call, decl, ancestors_of_call)
    }

    #[test]
    fn test_type_selector() {
        let (tree, call, decl, ancestors) = tree();
        let sel = CompiledSelector::compile("CallExpression").unwrap();
        assert!(sel.matches(&tree, call, &ancestors));
        assert!(!sel.matches(&tree, decl, &[]));
    }

    #[test]
    fn test_wildcard_and_exit() {
        let (tree, call, _, ancestors) = tree();
        let sel = CompiledSelector::compile("*").unwrap();
        assert!(sel.matches(&tree, call, &ancestors));
        assert!(!sel.is_exit());

        let sel = CompiledSelector::compile("CallExpression:exit").unwrap();
        assert!(sel.is_exit());
        assert!(sel.matches(&tree, call, &ancestors));
    }

    #[test]
    fn test_attribute_tests() {
        let (tree, _, decl, _) = tree();
        assert!(CompiledSelector::compile("VariableDeclaration[kind=var]")
            .unwrap()
            .matches(&tree, decl, &[]));
        assert!(CompiledSelector::compile("VariableDeclaration[kind=\"var\"]")
            .unwrap()
            .matches(&tree, decl, &[]));
        assert!(!CompiledSelector::compile("VariableDeclaration[kind=let]")
            .unwrap()
            .matches(&tree, decl, &[]));
        assert!(CompiledSelector::compile("VariableDeclaration[kind!=let]")
            .unwrap()
            .matches(&tree, decl, &[]));
        assert!(CompiledSelector::compile("[kind]")
            .unwrap()
            .matches(&tree, decl, &[]));
    }

    #[test]
    fn test_dotted_attribute_path() {
        let (tree, call, _, ancestors) = tree();
        let sel = CompiledSelector::compile("CallExpression[callee.name=f]").unwrap();
        assert!(sel.matches(&tree, call, &ancestors));
        let sel = CompiledSelector::compile("CallExpression[callee.name=g]").unwrap();
        assert!(!sel.matches(&tree, call, &ancestors));
    }

    #[test]
    fn test_child_and_descendant() {
        let (tree, call, _, ancestors) = tree();
        assert!(CompiledSelector::compile("VariableDeclarator > CallExpression")
            .unwrap()
            .matches(&tree, call, &ancestors));
        assert!(!CompiledSelector::compile("VariableDeclaration > CallExpression")
            .unwrap()
            .matches(&tree, call, &ancestors));
        assert!(CompiledSelector::compile("VariableDeclaration CallExpression")
            .unwrap()
            .matches(&tree, call, &ancestors));
        assert!(CompiledSelector::compile("Program CallExpression")
            .unwrap()
            .matches(&tree, call, &ancestors));
    }

    #[test]
    fn test_selector_list() {
        let (tree, call, decl, ancestors) = tree();
        let sel = CompiledSelector::compile("VariableDeclaration, CallExpression").unwrap();
        assert!(sel.matches(&tree, call, &ancestors));
        assert!(sel.matches(&tree, decl, &[]));
    }

    #[test]
    fn test_specificity() {
        let bare = CompiledSelector::compile("Identifier").unwrap();
        let attr = CompiledSelector::compile("VariableDeclaration[kind=var]").unwrap();
        let deep = CompiledSelector::compile("Program > VariableDeclaration[kind=var]").unwrap();
        assert_eq!(bare.specificity(), Specificity { attributes: 0, identifiers: 1 });
        assert_eq!(attr.specificity(), Specificity { attributes: 1, identifiers: 1 });
        assert_eq!(deep.specificity(), Specificity { attributes: 1, identifiers: 2 });
        assert!(attr.specificity() > bare.specificity());
    }

    #[test]
    fn test_parse_errors() {
        assert!(CompiledSelector::compile("").is_err());
        assert!(CompiledSelector::compile("[unclosed").is_err());
        assert!(CompiledSelector::compile("Foo >").is_err());
        assert!(CompiledSelector::compile("Foo[=bad]").is_err());
    }
}
