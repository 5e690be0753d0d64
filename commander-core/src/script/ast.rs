//! Syntax tree for command scripts.

use std::rc::Rc;

use super::error::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A call argument, optionally named (`default: "world"`)
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpPart {
    Lit(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureDef {
    pub params: Vec<String>,
    pub body: Block,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Interpolated(Vec<InterpPart>),
    Ident {
        name: String,
        position: Position,
    },
    Array(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        position: Position,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        position: Position,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Call {
        name: String,
        args: Vec<Arg>,
        position: Position,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Arg>,
        position: Position,
    },
    Property {
        receiver: Box<Expr>,
        name: String,
        position: Position,
    },
    Index {
        receiver: Box<Expr>,
        index: Box<Expr>,
        position: Position,
    },
    Closure(Rc<ClosureDef>),
    If {
        cond: Box<Expr>,
        then: Block,
        otherwise: Option<Box<Expr>>,
    },
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(String),
    Index { name: String, index: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        value: Expr,
    },
    Assign {
        target: AssignTarget,
        value: Expr,
        position: Position,
    },
    Return(Option<Expr>),
    For {
        var: String,
        iter: Expr,
        body: Block,
        position: Position,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Expr(Expr),
}

/// A parsed script
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Block,
}
