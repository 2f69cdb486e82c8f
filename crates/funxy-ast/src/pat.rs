//! Patterns, as used by match arms, pattern bindings and for-in loops.

use funxy_common::Span;

use crate::expr::Lit;
use crate::types::TypeExpr;

/// A pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `_`
    Wildcard { span: Span },
    /// A literal to compare against.
    Literal { lit: Lit, span: Span },
    /// A binding identifier.
    Ident { name: String, span: Span },
    /// A data constructor pattern: `Some(x)`, `Node(l, v, r)`.
    Ctor {
        name: String,
        args: Vec<Pattern>,
        span: Span,
    },
    /// `(a, b)`.
    Tuple { elems: Vec<Pattern>, span: Span },
    /// `[a, b, ...rest]`; `rest` is `Some(None)` for an anonymous tail.
    List {
        elems: Vec<Pattern>,
        rest: Option<Option<String>>,
        span: Span,
    },
    /// `{x, y: pat, ...}`; `rest` admits unmentioned fields.
    Record {
        fields: Vec<(String, Pattern)>,
        rest: bool,
        span: Span,
    },
    /// A bare spread in list/call position: `...xs`.
    Spread { name: Option<String>, span: Span },
    /// Matches by runtime type: `n: Int`.
    Type {
        ty: TypeExpr,
        binding: Option<String>,
        span: Span,
    },
    /// A string with embedded captures: `"hello {name}!"` as a pattern.
    StringCaps {
        segments: Vec<StrSegment>,
        span: Span,
    },
}

/// One segment of a string-with-captures pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum StrSegment {
    /// Literal text that must match exactly.
    Text(String),
    /// A named capture binding the matched slice.
    Capture(String),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard { span }
            | Pattern::Literal { span, .. }
            | Pattern::Ident { span, .. }
            | Pattern::Ctor { span, .. }
            | Pattern::Tuple { span, .. }
            | Pattern::List { span, .. }
            | Pattern::Record { span, .. }
            | Pattern::Spread { span, .. }
            | Pattern::Type { span, .. }
            | Pattern::StringCaps { span, .. } => *span,
        }
    }

    /// Collect the names this pattern binds, in source order.
    pub fn bound_names(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Wildcard { .. } | Pattern::Literal { .. } => {}
            Pattern::Ident { name, .. } => out.push(name.clone()),
            Pattern::Ctor { args, .. } => {
                for p in args {
                    p.bound_names(out);
                }
            }
            Pattern::Tuple { elems, .. } => {
                for p in elems {
                    p.bound_names(out);
                }
            }
            Pattern::List { elems, rest, .. } => {
                for p in elems {
                    p.bound_names(out);
                }
                if let Some(Some(name)) = rest {
                    out.push(name.clone());
                }
            }
            Pattern::Record { fields, .. } => {
                for (_, p) in fields {
                    p.bound_names(out);
                }
            }
            Pattern::Spread { name, .. } => {
                if let Some(name) = name {
                    out.push(name.clone());
                }
            }
            Pattern::Type { binding, .. } => {
                if let Some(name) = binding {
                    out.push(name.clone());
                }
            }
            Pattern::StringCaps { segments, .. } => {
                for seg in segments {
                    if let StrSegment::Capture(name) = seg {
                        out.push(name.clone());
                    }
                }
            }
        }
    }
}
