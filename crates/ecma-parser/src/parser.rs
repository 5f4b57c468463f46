//! Recursive-descent parser producing the shared arena tree.
//!
//! Covers the statement and expression subset the linting core's tests
//! exercise: declarations, functions, the control-flow statements, and the
//! usual expression forms with precedence climbing. Semicolons are
//! optional terminators throughout.

use ecma_ast::{
    NodeData, NodeId, NodeKind, PropValue, SyntaxTree, SyntaxTreeBuilder, TextRange, Token,
    TokenKind,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

pub fn parse_program(text: &str, tokens: &[Token]) -> Result<SyntaxTree, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        builder: SyntaxTree::builder(),
        text_len: text.len(),
    };
    let mut body = Vec::new();
    while parser.peek().is_some() {
        body.push(Some(parser.statement()?));
    }
    let program = parser.builder.add(
        NodeData::new(NodeKind::Program, TextRange::new(0, text.len())).with_list("body", body),
    );
    Ok(parser.builder.finish(program))
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    builder: SyntaxTreeBuilder,
    text_len: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.range.end)
    }

    fn current_start(&self) -> usize {
        self.peek().map_or(self.text_len, |t| t.range.start)
    }

    fn bump(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_punct(&self, value: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(value))
    }

    fn at_keyword(&self, value: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(value))
    }

    fn eat_punct(&mut self, value: &str) -> bool {
        if self.at_punct(value) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, value: &str) -> Result<TextRange, ParseError> {
        match self.peek() {
            Some(token) if token.is_punct(value) => {
                let range = token.range;
                self.pos += 1;
                Ok(range)
            }
            Some(token) => Err(ParseError::new(
                format!("Unexpected token '{}', expected '{value}'", token.value),
                token.range.start,
            )),
            None => Err(self.eof_error()),
        }
    }

    fn expect_keyword(&mut self, value: &str) -> Result<TextRange, ParseError> {
        match self.peek() {
            Some(token) if token.is_keyword(value) => {
                let range = token.range;
                self.pos += 1;
                Ok(range)
            }
            Some(token) => Err(ParseError::new(
                format!("Unexpected token '{}', expected '{value}'", token.value),
                token.range.start,
            )),
            None => Err(self.eof_error()),
        }
    }

    fn eof_error(&self) -> ParseError {
        ParseError::new("Unexpected end of input", self.text_len)
    }

    /// Optional terminator; the statement ends at the semicolon when
    /// present, otherwise at the previous token.
    fn finish_statement(&mut self) -> usize {
        if self.at_punct(";") {
            let end = self.tokens[self.pos].range.end;
            self.pos += 1;
            end
        } else {
            self.prev_end()
        }
    }

    // ====================================================================
    // Statements
    // ====================================================================

    fn statement(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.eof_error());
        };
        let start = token.range.start;

        if token.is_punct("{") {
            return self.block();
        }
        if token.is_punct(";") {
            let range = token.range;
            self.pos += 1;
            return Ok(self
                .builder
                .add(NodeData::new(NodeKind::EmptyStatement, range)));
        }
        if token.kind == TokenKind::Keyword {
            match token.value.as_str() {
                "var" | "let" | "const" => {
                    let declaration = self.variable_declaration(true)?;
                    return Ok(declaration);
                }
                "function" => return self.function(true),
                "if" => return self.if_statement(),
                "while" => return self.while_statement(),
                "do" => return self.do_while_statement(),
                "for" => return self.for_statement(),
                "return" => return self.return_statement(),
                "break" | "continue" => return self.break_or_continue(),
                "throw" => return self.throw_statement(),
                "try" => return self.try_statement(),
                "switch" => return self.switch_statement(),
                "debugger" => {
                    self.pos += 1;
                    let end = self.finish_statement();
                    return Ok(self.builder.add(NodeData::new(
                        NodeKind::DebuggerStatement,
                        TextRange::new(start, end),
                    )));
                }
                _ => {}
            }
        }

        let expression = self.expression()?;
        let end = self.finish_statement();
        Ok(self.builder.add(
            NodeData::new(NodeKind::ExpressionStatement, TextRange::new(start, end))
                .with_child("expression", Some(expression)),
        ))
    }

    fn block(&mut self) -> Result<NodeId, ParseError> {
        let open = self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.at_punct("}") {
            if self.peek().is_none() {
                return Err(self.eof_error());
            }
            body.push(Some(self.statement()?));
        }
        let close = self.expect_punct("}")?;
        Ok(self.builder.add(
            NodeData::new(
                NodeKind::BlockStatement,
                TextRange::new(open.start, close.end),
            )
            .with_list("body", body),
        ))
    }

    /// `terminated` controls whether the trailing semicolon belongs to the
    /// declaration (false inside a `for` head).
    fn variable_declaration(&mut self, terminated: bool) -> Result<NodeId, ParseError> {
        let keyword = self
            .bump()
            .cloned()
            .ok_or_else(|| self.eof_error())?;
        let start = keyword.range.start;

        let mut declarations = Vec::new();
        loop {
            let id = self.identifier()?;
            let id_range = self.builder_range(id);
            let init = if self.eat_punct("=") {
                Some(self.assignment()?)
            } else {
                None
            };
            let end = init.map_or(id_range.end, |node| self.builder_range(node).end);
            declarations.push(Some(
                self.builder.add(
                    NodeData::new(
                        NodeKind::VariableDeclarator,
                        TextRange::new(id_range.start, end),
                    )
                    .with_child("id", Some(id))
                    .with_child("init", init),
                ),
            ));
            if !self.eat_punct(",") {
                break;
            }
        }

        let end = if terminated {
            self.finish_statement()
        } else {
            self.prev_end()
        };
        Ok(self.builder.add(
            NodeData::new(
                NodeKind::VariableDeclaration,
                TextRange::new(start, end),
            )
            .with_prop("kind", PropValue::str(keyword.value))
            .with_list("declarations", declarations),
        ))
    }

    fn function(&mut self, declaration: bool) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("function")?;
        let id = if self.peek().is_some_and(|t| t.kind == TokenKind::Identifier) {
            Some(self.identifier()?)
        } else {
            None
        };
        if declaration && id.is_none() {
            return Err(ParseError::new(
                "Function declarations require a name",
                self.current_start(),
            ));
        }
        self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.at_punct(")") {
            params.push(Some(self.identifier()?));
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        let body = self.block()?;
        let end = self.builder_range(body).end;
        let kind = if declaration {
            NodeKind::FunctionDeclaration
        } else {
            NodeKind::FunctionExpression
        };
        Ok(self.builder.add(
            NodeData::new(kind, TextRange::new(keyword.start, end))
                .with_child("id", id)
                .with_list("params", params)
                .with_child("body", Some(body)),
        ))
    }

    fn if_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("if")?;
        self.expect_punct("(")?;
        let test = self.expression()?;
        self.expect_punct(")")?;
        let consequent = self.statement()?;
        let alternate = if self.at_keyword("else") {
            self.pos += 1;
            Some(self.statement()?)
        } else {
            None
        };
        let end = alternate
            .or(Some(consequent))
            .map_or(0, |node| self.builder_range(node).end);
        Ok(self.builder.add(
            NodeData::new(NodeKind::IfStatement, TextRange::new(keyword.start, end))
                .with_child("test", Some(test))
                .with_child("consequent", Some(consequent))
                .with_child("alternate", alternate),
        ))
    }

    fn while_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("while")?;
        self.expect_punct("(")?;
        let test = self.expression()?;
        self.expect_punct(")")?;
        let body = self.statement()?;
        let end = self.builder_range(body).end;
        Ok(self.builder.add(
            NodeData::new(NodeKind::WhileStatement, TextRange::new(keyword.start, end))
                .with_child("test", Some(test))
                .with_child("body", Some(body)),
        ))
    }

    fn do_while_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("do")?;
        let body = self.statement()?;
        self.expect_keyword("while")?;
        self.expect_punct("(")?;
        let test = self.expression()?;
        self.expect_punct(")")?;
        let end = self.finish_statement();
        Ok(self.builder.add(
            NodeData::new(
                NodeKind::DoWhileStatement,
                TextRange::new(keyword.start, end),
            )
            .with_child("body", Some(body))
            .with_child("test", Some(test)),
        ))
    }

    fn for_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("for")?;
        self.expect_punct("(")?;

        let init = if self.at_punct(";") {
            None
        } else if self.at_keyword("var") || self.at_keyword("let") || self.at_keyword("const") {
            Some(self.variable_declaration(false)?)
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(";")?;
        let test = if self.at_punct(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(";")?;
        let update = if self.at_punct(")") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(")")?;
        let body = self.statement()?;
        let end = self.builder_range(body).end;
        Ok(self.builder.add(
            NodeData::new(NodeKind::ForStatement, TextRange::new(keyword.start, end))
                .with_child("init", init)
                .with_child("test", test)
                .with_child("update", update)
                .with_child("body", Some(body)),
        ))
    }

    fn return_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("return")?;
        let argument = if self.at_punct(";") || self.at_punct("}") || self.peek().is_none() {
            None
        } else {
            Some(self.expression()?)
        };
        let end = self.finish_statement();
        Ok(self.builder.add(
            NodeData::new(NodeKind::ReturnStatement, TextRange::new(keyword.start, end))
                .with_child("argument", argument),
        ))
    }

    fn break_or_continue(&mut self) -> Result<NodeId, ParseError> {
        let token = self.bump().cloned().ok_or_else(|| self.eof_error())?;
        let kind = if token.value == "break" {
            NodeKind::BreakStatement
        } else {
            NodeKind::ContinueStatement
        };
        let end = self.finish_statement();
        Ok(self.builder.add(
            NodeData::new(kind, TextRange::new(token.range.start, end)).with_child("label", None),
        ))
    }

    fn throw_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("throw")?;
        let argument = self.expression()?;
        let end = self.finish_statement();
        Ok(self.builder.add(
            NodeData::new(NodeKind::ThrowStatement, TextRange::new(keyword.start, end))
                .with_child("argument", Some(argument)),
        ))
    }

    fn try_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("try")?;
        let block = self.block()?;
        let handler = if self.at_keyword("catch") {
            let catch_start = self.tokens[self.pos].range.start;
            self.pos += 1;
            let param = if self.eat_punct("(") {
                let param = self.identifier()?;
                self.expect_punct(")")?;
                Some(param)
            } else {
                None
            };
            let body = self.block()?;
            let end = self.builder_range(body).end;
            Some(
                self.builder.add(
                    NodeData::new(NodeKind::CatchClause, TextRange::new(catch_start, end))
                        .with_child("param", param)
                        .with_child("body", Some(body)),
                ),
            )
        } else {
            None
        };
        let finalizer = if self.at_keyword("finally") {
            self.pos += 1;
            Some(self.block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(ParseError::new(
                "Missing catch or finally after try",
                self.current_start(),
            ));
        }
        let end = finalizer
            .or(handler)
            .map_or(0, |node| self.builder_range(node).end);
        Ok(self.builder.add(
            NodeData::new(NodeKind::TryStatement, TextRange::new(keyword.start, end))
                .with_child("block", Some(block))
                .with_child("handler", handler)
                .with_child("finalizer", finalizer),
        ))
    }

    fn switch_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.expect_keyword("switch")?;
        self.expect_punct("(")?;
        let discriminant = self.expression()?;
        self.expect_punct(")")?;
        self.expect_punct("{")?;
        let mut cases = Vec::new();
        while !self.at_punct("}") {
            let Some(token) = self.peek().cloned() else {
                return Err(self.eof_error());
            };
            let case_start = token.range.start;
            let test = if self.at_keyword("case") {
                self.pos += 1;
                Some(self.expression()?)
            } else if self.at_keyword("default") {
                self.pos += 1;
                None
            } else {
                return Err(ParseError::new(
                    format!("Unexpected token '{}' in switch body", token.value),
                    case_start,
                ));
            };
            self.expect_punct(":")?;
            let mut consequent = Vec::new();
            while !self.at_punct("}") && !self.at_keyword("case") && !self.at_keyword("default") {
                consequent.push(Some(self.statement()?));
            }
            let case_end = self.prev_end();
            cases.push(Some(
                self.builder.add(
                    NodeData::new(NodeKind::SwitchCase, TextRange::new(case_start, case_end))
                        .with_child("test", test)
                        .with_list("consequent", consequent),
                ),
            ));
        }
        let close = self.expect_punct("}")?;
        Ok(self.builder.add(
            NodeData::new(
                NodeKind::SwitchStatement,
                TextRange::new(keyword.start, close.end),
            )
            .with_child("discriminant", Some(discriminant))
            .with_list("cases", cases),
        ))
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    fn expression(&mut self) -> Result<NodeId, ParseError> {
        let first = self.assignment()?;
        if !self.at_punct(",") {
            return Ok(first);
        }
        let mut expressions = vec![Some(first)];
        while self.eat_punct(",") {
            expressions.push(Some(self.assignment()?));
        }
        let start = self.builder_range(first).start;
        let end = expressions
            .last()
            .and_then(|e| *e)
            .map_or(start, |node| self.builder_range(node).end);
        Ok(self.builder.add(
            NodeData::new(NodeKind::SequenceExpression, TextRange::new(start, end))
                .with_list("expressions", expressions),
        ))
    }

    fn assignment(&mut self) -> Result<NodeId, ParseError> {
        let left = self.conditional()?;
        let operator = match self.peek() {
            Some(t) if t.kind == TokenKind::Punctuator => match t.value.as_str() {
                "=" | "+=" | "-=" | "*=" | "/=" | "%=" => t.value.clone(),
                _ => return Ok(left),
            },
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.assignment()?;
        let range = TextRange::new(
            self.builder_range(left).start,
            self.builder_range(right).end,
        );
        Ok(self.builder.add(
            NodeData::new(NodeKind::AssignmentExpression, range)
                .with_prop("operator", PropValue::str(operator))
                .with_child("left", Some(left))
                .with_child("right", Some(right)),
        ))
    }

    fn conditional(&mut self) -> Result<NodeId, ParseError> {
        let test = self.binary(0)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let consequent = self.assignment()?;
        self.expect_punct(":")?;
        let alternate = self.assignment()?;
        let range = TextRange::new(
            self.builder_range(test).start,
            self.builder_range(alternate).end,
        );
        Ok(self.builder.add(
            NodeData::new(NodeKind::ConditionalExpression, range)
                .with_child("test", Some(test))
                .with_child("consequent", Some(consequent))
                .with_child("alternate", Some(alternate)),
        ))
    }

    fn binary(&mut self, min_precedence: u8) -> Result<NodeId, ParseError> {
        let mut left = self.unary()?;
        loop {
            let Some((operator, precedence, logical)) = self.peek_binary_op() else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.binary(precedence + 1)?;
            let range = TextRange::new(
                self.builder_range(left).start,
                self.builder_range(right).end,
            );
            let kind = if logical {
                NodeKind::LogicalExpression
            } else {
                NodeKind::BinaryExpression
            };
            left = self.builder.add(
                NodeData::new(kind, range)
                    .with_prop("operator", PropValue::str(operator))
                    .with_child("left", Some(left))
                    .with_child("right", Some(right)),
            );
        }
        Ok(left)
    }

    fn peek_binary_op(&self) -> Option<(String, u8, bool)> {
        let token = self.peek()?;
        let (precedence, logical) = match (token.kind, token.value.as_str()) {
            (TokenKind::Punctuator, "||") => (1, true),
            (TokenKind::Punctuator, "&&") => (2, true),
            (TokenKind::Punctuator, "==" | "!=" | "===" | "!==") => (3, false),
            (TokenKind::Punctuator, "<" | ">" | "<=" | ">=") => (4, false),
            (TokenKind::Keyword, "in" | "instanceof") => (4, false),
            (TokenKind::Punctuator, "+" | "-") => (5, false),
            (TokenKind::Punctuator, "*" | "/" | "%") => (6, false),
            _ => return None,
        };
        Some((token.value.clone(), precedence, logical))
    }

    fn unary(&mut self) -> Result<NodeId, ParseError> {
        if let Some(token) = self.peek() {
            let is_unary = matches!(
                (token.kind, token.value.as_str()),
                (TokenKind::Punctuator, "!" | "-" | "+" | "~")
                    | (TokenKind::Keyword, "typeof" | "void" | "delete")
            );
            if is_unary {
                let operator = token.value.clone();
                let start = token.range.start;
                self.pos += 1;
                let argument = self.unary()?;
                let end = self.builder_range(argument).end;
                return Ok(self.builder.add(
                    NodeData::new(NodeKind::UnaryExpression, TextRange::new(start, end))
                        .with_prop("operator", PropValue::str(operator))
                        .with_prop("prefix", PropValue::Bool(true))
                        .with_child("argument", Some(argument)),
                ));
            }
            if token.is_punct("++") || token.is_punct("--") {
                let operator = token.value.clone();
                let start = token.range.start;
                self.pos += 1;
                let argument = self.unary()?;
                let end = self.builder_range(argument).end;
                return Ok(self.builder.add(
                    NodeData::new(NodeKind::UpdateExpression, TextRange::new(start, end))
                        .with_prop("operator", PropValue::str(operator))
                        .with_prop("prefix", PropValue::Bool(true))
                        .with_child("argument", Some(argument)),
                ));
            }
        }
        let expr = self.call_member()?;
        if self.at_punct("++") || self.at_punct("--") {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            let range = TextRange::new(self.builder_range(expr).start, token.range.end);
            return Ok(self.builder.add(
                NodeData::new(NodeKind::UpdateExpression, range)
                    .with_prop("operator", PropValue::str(token.value))
                    .with_prop("prefix", PropValue::Bool(false))
                    .with_child("argument", Some(expr)),
            ));
        }
        Ok(expr)
    }

    fn call_member(&mut self) -> Result<NodeId, ParseError> {
        if self.at_keyword("new") {
            let keyword = self.tokens[self.pos].range;
            self.pos += 1;
            let callee = self.member_only()?;
            let arguments = if self.at_punct("(") {
                self.arguments()?
            } else {
                Vec::new()
            };
            let end = self.prev_end();
            let new_expr = self.builder.add(
                NodeData::new(NodeKind::NewExpression, TextRange::new(keyword.start, end))
                    .with_child("callee", Some(callee))
                    .with_list("arguments", arguments),
            );
            return self.member_chain(new_expr);
        }
        let primary = self.primary()?;
        self.member_chain(primary)
    }

    /// Member accesses without call parentheses, for `new` callees.
    fn member_only(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat_punct(".") {
                let property = self.identifier()?;
                let range = TextRange::new(
                    self.builder_range(expr).start,
                    self.builder_range(property).end,
                );
                expr = self.builder.add(
                    NodeData::new(NodeKind::MemberExpression, range)
                        .with_prop("computed", PropValue::Bool(false))
                        .with_child("object", Some(expr))
                        .with_child("property", Some(property)),
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn member_chain(&mut self, mut expr: NodeId) -> Result<NodeId, ParseError> {
        loop {
            if self.eat_punct(".") {
                let property = self.identifier()?;
                let range = TextRange::new(
                    self.builder_range(expr).start,
                    self.builder_range(property).end,
                );
                expr = self.builder.add(
                    NodeData::new(NodeKind::MemberExpression, range)
                        .with_prop("computed", PropValue::Bool(false))
                        .with_child("object", Some(expr))
                        .with_child("property", Some(property)),
                );
            } else if self.at_punct("[") {
                self.pos += 1;
                let property = self.expression()?;
                let close = self.expect_punct("]")?;
                let range = TextRange::new(self.builder_range(expr).start, close.end);
                expr = self.builder.add(
                    NodeData::new(NodeKind::MemberExpression, range)
                        .with_prop("computed", PropValue::Bool(true))
                        .with_child("object", Some(expr))
                        .with_child("property", Some(property)),
                );
            } else if self.at_punct("(") {
                let arguments = self.arguments()?;
                let end = self.prev_end();
                let range = TextRange::new(self.builder_range(expr).start, end);
                expr = self.builder.add(
                    NodeData::new(NodeKind::CallExpression, range)
                        .with_child("callee", Some(expr))
                        .with_list("arguments", arguments),
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Option<NodeId>>, ParseError> {
        self.expect_punct("(")?;
        let mut arguments = Vec::new();
        while !self.at_punct(")") {
            arguments.push(Some(self.assignment()?));
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(arguments)
    }

    fn primary(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.eof_error());
        };
        match token.kind {
            TokenKind::Identifier => self.identifier(),
            TokenKind::Numeric => {
                self.pos += 1;
                let value = token.value.parse::<f64>().unwrap_or(f64::NAN);
                Ok(self.builder.add(
                    NodeData::new(NodeKind::Literal, token.range)
                        .with_prop("value", PropValue::Num(value))
                        .with_prop("raw", PropValue::str(token.value)),
                ))
            }
            TokenKind::String => {
                self.pos += 1;
                let inner = token.value[1..token.value.len() - 1].to_string();
                Ok(self.builder.add(
                    NodeData::new(NodeKind::Literal, token.range)
                        .with_prop("value", PropValue::Str(inner))
                        .with_prop("raw", PropValue::str(token.value)),
                ))
            }
            TokenKind::Boolean => {
                self.pos += 1;
                Ok(self.builder.add(
                    NodeData::new(NodeKind::Literal, token.range)
                        .with_prop("value", PropValue::Bool(token.value == "true"))
                        .with_prop("raw", PropValue::str(token.value)),
                ))
            }
            TokenKind::Null => {
                self.pos += 1;
                Ok(self.builder.add(
                    NodeData::new(NodeKind::Literal, token.range)
                        .with_prop("value", PropValue::Null)
                        .with_prop("raw", PropValue::str(token.value)),
                ))
            }
            TokenKind::Keyword => match token.value.as_str() {
                "this" => {
                    self.pos += 1;
                    Ok(self
                        .builder
                        .add(NodeData::new(NodeKind::ThisExpression, token.range)))
                }
                "function" => self.function(false),
                "new" => self.call_member(),
                other => Err(ParseError::new(
                    format!("Unexpected token '{other}'"),
                    token.range.start,
                )),
            },
            TokenKind::Punctuator => match token.value.as_str() {
                "(" => {
                    self.pos += 1;
                    let inner = self.expression()?;
                    self.expect_punct(")")?;
                    Ok(inner)
                }
                "[" => self.array_literal(),
                "{" => self.object_literal(),
                other => Err(ParseError::new(
                    format!("Unexpected token '{other}'"),
                    token.range.start,
                )),
            },
            _ => Err(ParseError::new(
                format!("Unexpected token '{}'", token.value),
                token.range.start,
            )),
        }
    }

    fn array_literal(&mut self) -> Result<NodeId, ParseError> {
        let open = self.expect_punct("[")?;
        let mut elements = Vec::new();
        while !self.at_punct("]") {
            if self.at_punct(",") {
                // Elision hole.
                self.pos += 1;
                elements.push(None);
                continue;
            }
            elements.push(Some(self.assignment()?));
            if !self.eat_punct(",") {
                break;
            }
        }
        let close = self.expect_punct("]")?;
        Ok(self.builder.add(
            NodeData::new(
                NodeKind::ArrayExpression,
                TextRange::new(open.start, close.end),
            )
            .with_list("elements", elements),
        ))
    }

    fn object_literal(&mut self) -> Result<NodeId, ParseError> {
        let open = self.expect_punct("{")?;
        let mut properties = Vec::new();
        while !self.at_punct("}") {
            let key = match self.peek() {
                Some(t) if t.kind == TokenKind::Identifier => self.identifier()?,
                Some(t) if t.kind == TokenKind::String => self.primary()?,
                Some(t) => {
                    return Err(ParseError::new(
                        format!("Unexpected token '{}' in object literal", t.value),
                        t.range.start,
                    ))
                }
                None => return Err(self.eof_error()),
            };
            self.expect_punct(":")?;
            let value = self.assignment()?;
            let range = TextRange::new(
                self.builder_range(key).start,
                self.builder_range(value).end,
            );
            properties.push(Some(
                self.builder.add(
                    NodeData::new(NodeKind::Property, range)
                        .with_prop("kind", PropValue::str("init"))
                        .with_prop("computed", PropValue::Bool(false))
                        .with_prop("shorthand", PropValue::Bool(false))
                        .with_child("key", Some(key))
                        .with_child("value", Some(value)),
                ),
            ));
            if !self.eat_punct(",") {
                break;
            }
        }
        let close = self.expect_punct("}")?;
        Ok(self.builder.add(
            NodeData::new(
                NodeKind::ObjectExpression,
                TextRange::new(open.start, close.end),
            )
            .with_list("properties", properties),
        ))
    }

    fn identifier(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                let token = token.clone();
                self.pos += 1;
                Ok(self.builder.add(
                    NodeData::new(NodeKind::Identifier, token.range)
                        .with_prop("name", PropValue::str(token.value)),
                ))
            }
            Some(token) => Err(ParseError::new(
                format!("Unexpected token '{}', expected an identifier", token.value),
                token.range.start,
            )),
            None => Err(self.eof_error()),
        }
    }

    fn builder_range(&self, node: NodeId) -> TextRange {
        self.builder.range(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(text: &str) -> SyntaxTree {
        let lexed = tokenize(text).unwrap();
        parse_program(text, &lexed.tokens).unwrap()
    }

    #[test]
    fn test_var_declaration_shape() {
        let tree = parse("var x = 1;\n");
        let body = tree.list(tree.root(), "body");
        assert_eq!(body.len(), 1);
        let decl = body[0];
        assert_eq!(tree.kind(decl), NodeKind::VariableDeclaration);
        assert_eq!(tree.range(decl), TextRange::new(0, 10));
        assert_eq!(
            tree.prop(decl, "kind").and_then(PropValue::as_str),
            Some("var")
        );
        let declarator = tree.list(decl, "declarations")[0];
        let id = tree.child(declarator, "id").unwrap();
        assert_eq!(tree.prop(id, "name").and_then(PropValue::as_str), Some("x"));
        let init = tree.child(declarator, "init").unwrap();
        assert_eq!(tree.kind(init), NodeKind::Literal);
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let tree = parse("a = 1 + 2 * 3;");
        let stmt = tree.list(tree.root(), "body")[0];
        let assign = tree.child(stmt, "expression").unwrap();
        let sum = tree.child(assign, "right").unwrap();
        assert_eq!(tree.kind(sum), NodeKind::BinaryExpression);
        assert_eq!(
            tree.prop(sum, "operator").and_then(PropValue::as_str),
            Some("+")
        );
        let product = tree.child(sum, "right").unwrap();
        assert_eq!(
            tree.prop(product, "operator").and_then(PropValue::as_str),
            Some("*")
        );
    }

    #[test]
    fn test_logical_vs_binary() {
        let tree = parse("a && b == c;");
        let stmt = tree.list(tree.root(), "body")[0];
        let logical = tree.child(stmt, "expression").unwrap();
        assert_eq!(tree.kind(logical), NodeKind::LogicalExpression);
        let right = tree.child(logical, "right").unwrap();
        assert_eq!(tree.kind(right), NodeKind::BinaryExpression);
    }

    #[test]
    fn test_if_else_chain() {
        let tree = parse("if (a) { b(); } else { c(); }");
        let if_stmt = tree.list(tree.root(), "body")[0];
        assert_eq!(tree.kind(if_stmt), NodeKind::IfStatement);
        assert!(tree.child(if_stmt, "alternate").is_some());
    }

    #[test]
    fn test_function_declaration() {
        let tree = parse("function add(a, b) { return a + b; }");
        let func = tree.list(tree.root(), "body")[0];
        assert_eq!(tree.kind(func), NodeKind::FunctionDeclaration);
        assert_eq!(tree.list(func, "params").len(), 2);
        let body = tree.child(func, "body").unwrap();
        assert_eq!(tree.kind(body), NodeKind::BlockStatement);
    }

    #[test]
    fn test_member_and_call() {
        let tree = parse("console.log(x[0]);");
        let stmt = tree.list(tree.root(), "body")[0];
        let call = tree.child(stmt, "expression").unwrap();
        assert_eq!(tree.kind(call), NodeKind::CallExpression);
        let callee = tree.child(call, "callee").unwrap();
        assert_eq!(tree.kind(callee), NodeKind::MemberExpression);
        let arg = tree.list(call, "arguments")[0];
        assert_eq!(tree.kind(arg), NodeKind::MemberExpression);
        assert_eq!(tree.prop(arg, "computed"), Some(&PropValue::Bool(true)));
    }

    #[test]
    fn test_missing_semicolons_tolerated() {
        let tree = parse("var x = 1\nvar y = 2\n");
        assert_eq!(tree.list(tree.root(), "body").len(), 2);
    }

    #[test]
    fn test_incomplete_input_fails() {
        let lexed = tokenize("var x =").unwrap();
        let error = parse_program("var x =", &lexed.tokens).unwrap_err();
        assert_eq!(error.message, "Unexpected end of input");
        assert_eq!(error.offset, 7);
    }

    #[test]
    fn test_try_without_handler_fails() {
        let lexed = tokenize("try { a(); }").unwrap();
        assert!(parse_program("try { a(); }", &lexed.tokens).is_err());
    }

    #[test]
    fn test_switch_cases() {
        let tree = parse("switch (x) { case 1: a(); break; default: b(); }");
        let switch = tree.list(tree.root(), "body")[0];
        let cases = tree.list(switch, "cases");
        assert_eq!(cases.len(), 2);
        assert!(tree.child(cases[0], "test").is_some());
        assert!(tree.child(cases[1], "test").is_none());
    }
}
