//! Recursive-descent parser for command scripts.

use std::rc::Rc;

use super::ast::{
    Arg, AssignTarget, BinaryOp, Block, ClosureDef, Expr, InterpPart, Literal, Program, Stmt,
    UnaryOp,
};
use super::error::{Position, ScriptError};
use super::lexer::{Lexer, StrPart, Token, TokenKind};

/// Maximum nesting of expressions and blocks. Operator and method chains
/// count one level per link.
pub const MAX_NESTING: usize = 64;

/// Parse a whole script
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(tokens);
    let body = parser.block_body(&TokenKind::Eof)?;
    parser.expect(&TokenKind::Eof, "end of input")?;
    Ok(Program { body })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let position = tokens.last().map(|t| t.position).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                position,
            });
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn position(&self) -> Position {
        self.tokens[self.pos.min(self.tokens.len() - 1)].position
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ScriptError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> ScriptError {
        ScriptError::syntax(
            self.position(),
            format!("expected {}, found {}", what, describe(self.peek())),
        )
    }

    fn ident(&mut self, what: &str) -> Result<String, ScriptError> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn enter(&mut self) -> Result<(), ScriptError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ScriptError::syntax(self.position(), "nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ---- statements ----

    fn block_body(&mut self, terminator: &TokenKind) -> Result<Block, ScriptError> {
        let mut stmts = Vec::new();
        loop {
            while self.eat(&TokenKind::Semi) {}
            if self.check(terminator) || self.check(&TokenKind::Eof) {
                break;
            }
            stmts.push(self.statement()?);
        }
        Ok(Block { stmts })
    }

    fn block(&mut self) -> Result<Block, ScriptError> {
        self.enter()?;
        self.expect(&TokenKind::LBrace, "`{`")?;
        let block = self.block_body(&TokenKind::RBrace)?;
        self.expect(&TokenKind::RBrace, "`}`")?;
        self.leave();
        Ok(block)
    }

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        let stmt = match self.peek() {
            TokenKind::Let => {
                self.advance();
                let name = self.ident("variable name")?;
                self.expect(&TokenKind::Assign, "`=`")?;
                let value = self.expr()?;
                Stmt::Let { name, value }
            }
            TokenKind::Return => {
                self.advance();
                let value = match self.peek() {
                    TokenKind::Semi | TokenKind::RBrace | TokenKind::Eof => None,
                    _ => Some(self.expr()?),
                };
                Stmt::Return(value)
            }
            TokenKind::For => {
                let position = self.advance().position;
                let var = self.ident("loop variable")?;
                self.expect(&TokenKind::In, "`in`")?;
                let iter = self.expr()?;
                let body = self.block()?;
                Stmt::For {
                    var,
                    iter,
                    body,
                    position,
                }
            }
            TokenKind::While => {
                self.advance();
                let cond = self.expr()?;
                let body = self.block()?;
                Stmt::While { cond, body }
            }
            _ => {
                let position = self.position();
                let expr = self.expr()?;
                if self.eat(&TokenKind::Assign) {
                    let target = assign_target(expr, position)?;
                    let value = self.expr()?;
                    Stmt::Assign {
                        target,
                        value,
                        position,
                    }
                } else {
                    Stmt::Expr(expr)
                }
            }
        };
        self.eat(&TokenKind::Semi);
        Ok(stmt)
    }

    // ---- expressions ----

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        self.enter()?;
        let expr = self.binary(0);
        self.leave();
        expr
    }

    /// Precedence climbing over the infix operators. Each operator applied
    /// deepens the tree, so each one counts against the nesting limit.
    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ScriptError> {
        let mut lhs = self.unary()?;
        let mut links = 0;
        while let Some((precedence, infix)) = infix(self.peek()) {
            if precedence < min_precedence {
                break;
            }
            let position = self.advance().position;
            self.enter()?;
            links += 1;
            let rhs = self.binary(precedence + 1)?;
            lhs = match infix {
                Infix::Or => Expr::Or(Box::new(lhs), Box::new(rhs)),
                Infix::And => Expr::And(Box::new(lhs), Box::new(rhs)),
                Infix::Binary(op) => Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    position,
                },
            };
        }
        self.depth -= links;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        let position = self.advance().position;
        self.enter()?;
        let expr = self.unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr?),
            position,
        })
    }

    /// Method calls, properties and indexing. Like infix operators, every
    /// link in a chain counts as one level of nesting.
    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        let mut links = 0;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    self.enter()?;
                    links += 1;
                    let position = self.position();
                    let name = self.ident("method name")?;
                    if self.check(&TokenKind::LParen) {
                        let args = self.call_args()?;
                        expr = Expr::MethodCall {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                            position,
                        };
                    } else {
                        expr = Expr::Property {
                            receiver: Box::new(expr),
                            name,
                            position,
                        };
                    }
                }
                TokenKind::LBracket => {
                    let position = self.advance().position;
                    self.enter()?;
                    links += 1;
                    let index = self.expr()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    expr = Expr::Index {
                        receiver: Box::new(expr),
                        index: Box::new(index),
                        position,
                    };
                }
                _ => break,
            }
        }
        self.depth -= links;
        Ok(expr)
    }

    fn call_args(&mut self) -> Result<Vec<Arg>, ScriptError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let name = match (self.peek().clone(), self.peek_at(1)) {
                (TokenKind::Ident(name), TokenKind::Colon) => {
                    self.advance();
                    self.advance();
                    Some(name)
                }
                _ => None,
            };
            if name.is_none() && args.iter().any(|a: &Arg| a.name.is_some()) {
                return Err(ScriptError::syntax(
                    self.position(),
                    "positional argument after named argument",
                ));
            }
            let value = self.expr()?;
            args.push(Arg { name, value });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "`,` or `)`")?;
        Ok(args)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let token = self.advance();
        let position = token.position;
        let expr = match token.kind {
            TokenKind::Nil => Expr::Literal(Literal::Nil),
            TokenKind::True => Expr::Literal(Literal::Bool(true)),
            TokenKind::False => Expr::Literal(Literal::Bool(false)),
            TokenKind::Int(n) => Expr::Literal(Literal::Int(n)),
            TokenKind::Float(n) => Expr::Literal(Literal::Float(n)),
            TokenKind::Symbol(name) => Expr::Literal(Literal::Str(name)),
            TokenKind::Str(parts) => self.string(parts)?,
            TokenKind::Ident(name) => {
                if self.check(&TokenKind::LParen) {
                    let args = self.call_args()?;
                    Expr::Call {
                        name,
                        args,
                        position,
                    }
                } else {
                    Expr::Ident { name, position }
                }
            }
            TokenKind::LParen => {
                let expr = self.expr()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                expr
            }
            TokenKind::LBracket => {
                let mut items = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    items.push(self.expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket, "`,` or `]`")?;
                Expr::Array(items)
            }
            TokenKind::HashBrace => self.map()?,
            TokenKind::Pipe => {
                let mut params = Vec::new();
                while !self.check(&TokenKind::Pipe) {
                    params.push(self.ident("parameter name")?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::Pipe, "`|`")?;
                self.closure(params, position)?
            }
            TokenKind::PipePipe => self.closure(Vec::new(), position)?,
            TokenKind::If => self.if_expr()?,
            TokenKind::LBrace => {
                self.pos -= 1;
                Expr::Block(self.block()?)
            }
            other => {
                return Err(ScriptError::syntax(
                    position,
                    format!("expected expression, found {}", describe(&other)),
                ))
            }
        };
        Ok(expr)
    }

    fn string(&mut self, parts: Vec<StrPart>) -> Result<Expr, ScriptError> {
        if let [StrPart::Lit(text)] = parts.as_slice() {
            return Ok(Expr::Literal(Literal::Str(text.clone())));
        }
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                StrPart::Lit(text) => out.push(InterpPart::Lit(text)),
                StrPart::Code(tokens) => {
                    let mut inner = Parser::new(tokens);
                    inner.depth = self.depth;
                    let expr = inner.expr()?;
                    inner.expect(&TokenKind::Eof, "`}` closing interpolation")?;
                    out.push(InterpPart::Expr(expr));
                }
            }
        }
        Ok(Expr::Interpolated(out))
    }

    fn map(&mut self) -> Result<Expr, ScriptError> {
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let key = match self.advance().kind {
                TokenKind::Ident(name) | TokenKind::Symbol(name) => name,
                TokenKind::Str(parts) => match parts.as_slice() {
                    [StrPart::Lit(text)] => text.clone(),
                    _ => {
                        return Err(ScriptError::syntax(
                            self.position(),
                            "map keys cannot be interpolated",
                        ))
                    }
                },
                other => {
                    return Err(ScriptError::syntax(
                        self.position(),
                        format!("expected map key, found {}", describe(&other)),
                    ))
                }
            };
            self.expect(&TokenKind::Colon, "`:` after map key")?;
            let value = self.expr()?;
            entries.push((key, value));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`,` or `}`")?;
        Ok(Expr::Map(entries))
    }

    fn closure(&mut self, params: Vec<String>, position: Position) -> Result<Expr, ScriptError> {
        let body = if self.check(&TokenKind::LBrace) {
            self.block()?
        } else {
            Block {
                stmts: vec![Stmt::Expr(self.expr()?)],
            }
        };
        Ok(Expr::Closure(Rc::new(ClosureDef {
            params,
            body,
            position,
        })))
    }

    fn if_expr(&mut self) -> Result<Expr, ScriptError> {
        self.enter()?;
        let cond = self.expr()?;
        let then = self.block()?;
        let otherwise = if self.eat(&TokenKind::Else) {
            if self.eat(&TokenKind::If) {
                Some(Box::new(self.if_expr()?))
            } else {
                Some(Box::new(Expr::Block(self.block()?)))
            }
        } else {
            None
        };
        self.leave();
        Ok(Expr::If {
            cond: Box::new(cond),
            then,
            otherwise,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Infix {
    Or,
    And,
    Binary(BinaryOp),
}

/// Binding power and meaning of an infix operator token
fn infix(kind: &TokenKind) -> Option<(u8, Infix)> {
    let entry = match kind {
        TokenKind::PipePipe => (1, Infix::Or),
        TokenKind::AndAnd => (2, Infix::And),
        TokenKind::EqEq => (3, Infix::Binary(BinaryOp::Eq)),
        TokenKind::NotEq => (3, Infix::Binary(BinaryOp::NotEq)),
        TokenKind::Lt => (4, Infix::Binary(BinaryOp::Lt)),
        TokenKind::Le => (4, Infix::Binary(BinaryOp::Le)),
        TokenKind::Gt => (4, Infix::Binary(BinaryOp::Gt)),
        TokenKind::Ge => (4, Infix::Binary(BinaryOp::Ge)),
        TokenKind::Plus => (5, Infix::Binary(BinaryOp::Add)),
        TokenKind::Minus => (5, Infix::Binary(BinaryOp::Sub)),
        TokenKind::Star => (6, Infix::Binary(BinaryOp::Mul)),
        TokenKind::Slash => (6, Infix::Binary(BinaryOp::Div)),
        TokenKind::Percent => (6, Infix::Binary(BinaryOp::Rem)),
        _ => return None,
    };
    Some(entry)
}

fn assign_target(expr: Expr, position: Position) -> Result<AssignTarget, ScriptError> {
    match expr {
        Expr::Ident { name, .. } => Ok(AssignTarget::Name(name)),
        Expr::Index {
            receiver, index, ..
        } => match *receiver {
            Expr::Ident { name, .. } => Ok(AssignTarget::Index {
                name,
                index: *index,
            }),
            _ => Err(ScriptError::syntax(position, "invalid assignment target")),
        },
        _ => Err(ScriptError::syntax(position, "invalid assignment target")),
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("`{}`", name),
        TokenKind::Symbol(name) => format!("`:{}`", name),
        TokenKind::Int(n) => format!("`{}`", n),
        TokenKind::Float(n) => format!("`{}`", n),
        TokenKind::Str(_) => "string".to_string(),
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::True => "`true`".to_string(),
        TokenKind::False => "`false`".to_string(),
        TokenKind::Nil => "`nil`".to_string(),
        TokenKind::Let => "`let`".to_string(),
        TokenKind::If => "`if`".to_string(),
        TokenKind::Else => "`else`".to_string(),
        TokenKind::For => "`for`".to_string(),
        TokenKind::In => "`in`".to_string(),
        TokenKind::While => "`while`".to_string(),
        TokenKind::Return => "`return`".to_string(),
        TokenKind::LParen => "`(`".to_string(),
        TokenKind::RParen => "`)`".to_string(),
        TokenKind::LBrace => "`{`".to_string(),
        TokenKind::RBrace => "`}`".to_string(),
        TokenKind::LBracket => "`[`".to_string(),
        TokenKind::RBracket => "`]`".to_string(),
        TokenKind::HashBrace => "`#{`".to_string(),
        TokenKind::Comma => "`,`".to_string(),
        TokenKind::Colon => "`:`".to_string(),
        TokenKind::Semi => "`;`".to_string(),
        TokenKind::Dot => "`.`".to_string(),
        TokenKind::Pipe => "`|`".to_string(),
        TokenKind::PipePipe => "`||`".to_string(),
        TokenKind::AndAnd => "`&&`".to_string(),
        TokenKind::Bang => "`!`".to_string(),
        TokenKind::Assign => "`=`".to_string(),
        TokenKind::EqEq => "`==`".to_string(),
        TokenKind::NotEq => "`!=`".to_string(),
        TokenKind::Lt => "`<`".to_string(),
        TokenKind::Le => "`<=`".to_string(),
        TokenKind::Gt => "`>`".to_string(),
        TokenKind::Ge => "`>=`".to_string(),
        TokenKind::Plus => "`+`".to_string(),
        TokenKind::Minus => "`-`".to_string(),
        TokenKind::Star => "`*`".to_string(),
        TokenKind::Slash => "`/`".to_string(),
        TokenKind::Percent => "`%`".to_string(),
    }
}
