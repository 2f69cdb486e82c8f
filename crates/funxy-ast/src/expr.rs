//! Expression nodes and literals.

use funxy_common::Span;

use crate::item::{Block, Param};
use crate::pat::Pattern;
use crate::types::TypeExpr;

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Int(i64),
    /// Arbitrary-precision integer, kept as source text.
    BigInt(String),
    /// Rational literal `3/4r`, kept as source text.
    Rational(String),
    Float(f64),
    Char(char),
    Str(String),
    /// Interpolated string: text segments and embedded expressions.
    Interp(Vec<InterpSegment>),
    Bytes(Vec<u8>),
    /// Bit-string literal, kept as its source digits.
    Bits(String),
    Bool(bool),
    Nil,
}

/// One segment of an interpolated string literal.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpSegment {
    Text(String),
    Expr(Box<Expr>),
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident {
        name: String,
        span: Span,
    },
    Lit {
        lit: Lit,
        span: Span,
    },
    Tuple {
        elems: Vec<Expr>,
        span: Span,
    },
    List {
        elems: Vec<Expr>,
        span: Span,
    },
    /// Record literal, with an optional spread base: `{...base, x: 1}`.
    Record {
        fields: Vec<(String, Expr)>,
        spread: Option<Box<Expr>>,
        span: Span,
    },
    /// Map literal: `%{k: v, ...}`.
    Map {
        entries: Vec<(Expr, Expr)>,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    /// Member access; `optional` marks `?.` chaining.
    Member {
        target: Box<Expr>,
        name: String,
        optional: bool,
        span: Span,
    },
    Prefix {
        op: String,
        operand: Box<Expr>,
        span: Span,
    },
    Infix {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Postfix {
        op: String,
        operand: Box<Expr>,
        span: Span,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    /// Destructuring assignment: `(a, b) = pair`.
    PatternAssign {
        pattern: Pattern,
        value: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    /// `...xs` in call or collection position.
    Spread {
        operand: Box<Expr>,
        span: Span,
    },
    /// Explicit type application: `read<Int>(s)`.
    TypeApp {
        target: Box<Expr>,
        args: Vec<TypeExpr>,
        span: Span,
    },
    /// `expr : T`.
    Annotated {
        expr: Box<Expr>,
        ty: TypeExpr,
        span: Span,
    },
    If {
        cond: Box<Expr>,
        then_branch: Block,
        else_branch: Option<Box<Expr>>,
        span: Span,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
        span: Span,
    },
    For {
        kind: ForKind,
        body: Block,
        span: Span,
    },
    Break {
        value: Option<Box<Expr>>,
        span: Span,
    },
    Continue {
        span: Span,
    },
    /// Function literal: `fn x -> x + 1`.
    FnLit {
        params: Vec<Param>,
        variadic: bool,
        ret: Option<TypeExpr>,
        body: Box<Expr>,
        span: Span,
    },
    Block(Block),
}

/// Loop header: `for cond { ... }` or `for pat in xs { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForKind {
    While(Box<Expr>),
    In {
        pattern: Pattern,
        iterable: Box<Expr>,
    },
}

/// One arm of a match expression.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident { span, .. }
            | Expr::Lit { span, .. }
            | Expr::Tuple { span, .. }
            | Expr::List { span, .. }
            | Expr::Record { span, .. }
            | Expr::Map { span, .. }
            | Expr::Index { span, .. }
            | Expr::Member { span, .. }
            | Expr::Prefix { span, .. }
            | Expr::Infix { span, .. }
            | Expr::Postfix { span, .. }
            | Expr::Assign { span, .. }
            | Expr::PatternAssign { span, .. }
            | Expr::Call { span, .. }
            | Expr::Spread { span, .. }
            | Expr::TypeApp { span, .. }
            | Expr::Annotated { span, .. }
            | Expr::If { span, .. }
            | Expr::Match { span, .. }
            | Expr::For { span, .. }
            | Expr::Break { span, .. }
            | Expr::Continue { span }
            | Expr::FnLit { span, .. } => *span,
            Expr::Block(block) => block.span,
        }
    }
}
