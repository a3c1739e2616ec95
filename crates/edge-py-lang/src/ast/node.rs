use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use smol_str::SmolStr;

use crate::range::Range;

#[derive(PartialEq, Debug, Clone)]
pub struct Node {
    pub range: Range,
    pub expr: Expr,
}

impl Node {
    pub fn new(expr: Expr, range: Range) -> Self {
        Self { range, expr }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Index {
    Single(Box<Node>),
    Slice {
        lower: Option<Box<Node>>,
        upper: Option<Box<Node>>,
        step: Option<Box<Node>>,
    },
}

/// A `lambda` literal. Shared between the AST and every function value created from it.
#[derive(PartialEq, Debug)]
pub struct LambdaDef {
    pub params: Vec<SmolStr>,
    pub body: Node,
    pub range: Range,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Comprehension {
    pub element: Box<Node>,
    pub targets: Vec<SmolStr>,
    pub iter: Box<Node>,
    pub conditions: Vec<Node>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Name(SmolStr),
    List(Vec<Node>),
    Tuple(Vec<Node>),
    Dict(Vec<(Node, Node)>),
    ListComp(Comprehension),
    Unary(UnaryOp, Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Bool(BoolOp, Box<Node>, Box<Node>),
    Compare(Box<Node>, Vec<(CompareOp, Node)>),
    IfElse {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    Lambda(Arc<LambdaDef>),
    Call(Box<Node>, Vec<Node>),
    Attribute(Box<Node>, SmolStr),
    Subscript(Box<Node>, Index),
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "** or pow()",
        };
        write!(f, "{}", op)
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
        };
        write!(f, "{}", op)
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            UnaryOp::Neg => "unary -",
            UnaryOp::Pos => "unary +",
            UnaryOp::Not => "not",
        };
        write!(f, "{}", op)
    }
}
