use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// How severe a diagnostic is.
///
/// Warnings never stop a pipeline; errors may, depending on the kind (an
/// import cycle halts the affected module, a local type mismatch does not).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// The specific kind of diagnostic.
///
/// Type terms inside diagnostics are carried pre-rendered in surface syntax
/// so this crate stays independent of the type representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosticKind {
    /// Lexer/parser error, forwarded from the front-end collaborators.
    Syntax { message: String },
    /// Expected vs actual type mismatch, with an optional context chain
    /// (field name, parameter index, branch label).
    UnificationFailure {
        expected: String,
        actual: String,
        context: Option<String>,
    },
    /// Occurs check violation: a variable would contain itself.
    InfiniteType { var: String, ty: String },
    /// A type applied to the wrong number of arguments, or a non-constructor
    /// applied at all.
    KindMismatch {
        ty: String,
        expected: String,
        found: String,
    },
    /// Name resolution failure, with a did-you-mean candidate when one is
    /// close enough.
    UndefinedSymbol {
        name: String,
        suggestion: Option<String>,
    },
    /// Two instance targets for the same trait unify.
    OverlappingInstances {
        trait_name: String,
        first: String,
        second: String,
    },
    /// An operator or trait method applied to a concrete type with no
    /// registered instance.
    MissingInstance {
        trait_name: String,
        ty: String,
        operator: Option<String>,
    },
    /// An instance declaration omits a required (non-default) method.
    MissingTraitMethod {
        trait_name: String,
        method: String,
        target: String,
    },
    /// Two re-exports with the same name from different origin modules, or a
    /// re-export colliding with a local definition.
    ExportConflict {
        name: String,
        first_origin: String,
        second_origin: String,
    },
    /// Cycle detected during loader traversal.
    ImportCycle { path: Vec<String> },
    /// Files in one directory carry conflicting package declarations.
    MultiplePackages {
        dir: String,
        first: String,
        second: String,
    },
    /// Assignment to a symbol defined with `:-`.
    ConstantReassignment { name: String },
    /// Two top-level symbols share a name in the same module.
    DuplicateDefinition { name: String },
    /// A non-fatal advisory (e.g. the dotted-type placeholder fallback).
    Warning { message: String },
}

impl DiagnosticKind {
    /// The default severity for this kind.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::Warning { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this kind corrupts later phases and must halt the module.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::ImportCycle { .. }
                | DiagnosticKind::MultiplePackages { .. }
                | DiagnosticKind::KindMismatch { .. }
        )
    }
}

/// A diagnostic: a kind plus where it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    pub span: Span,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file: impl Into<String>, span: Span) -> Self {
        let severity = kind.severity();
        Diagnostic {
            kind,
            file: file.into(),
            span,
            severity,
        }
    }

    /// Shorthand for a syntax diagnostic from the front-end collaborators.
    pub fn syntax(message: impl Into<String>, file: impl Into<String>, span: Span) -> Self {
        Diagnostic::new(
            DiagnosticKind::Syntax {
                message: message.into(),
            },
            file,
            span,
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::Syntax { message } => write!(f, "syntax error: {}", message),
            DiagnosticKind::UnificationFailure {
                expected,
                actual,
                context,
            } => {
                write!(f, "type mismatch: expected `{}`, found `{}`", expected, actual)?;
                if let Some(ctx) = context {
                    write!(f, " ({})", ctx)?;
                }
                Ok(())
            }
            DiagnosticKind::InfiniteType { var, ty } => {
                write!(f, "infinite type: `{}` occurs in `{}`", var, ty)
            }
            DiagnosticKind::KindMismatch {
                ty,
                expected,
                found,
            } => write!(
                f,
                "kind mismatch: `{}` has kind `{}`, applied as `{}`",
                ty, expected, found
            ),
            DiagnosticKind::UndefinedSymbol { name, suggestion } => {
                write!(f, "undefined symbol `{}`", name)?;
                if let Some(s) = suggestion {
                    write!(f, "; did you mean `{}`?", s)?;
                }
                Ok(())
            }
            DiagnosticKind::OverlappingInstances {
                trait_name,
                first,
                second,
            } => write!(
                f,
                "overlapping instances of `{}`: `{}` and `{}` unify",
                trait_name, first, second
            ),
            DiagnosticKind::MissingInstance {
                trait_name,
                ty,
                operator,
            } => {
                match operator {
                    Some(op) => write!(
                        f,
                        "operator `{}` requires an instance of `{}` for `{}`",
                        op, trait_name, ty
                    ),
                    None => write!(f, "no instance of `{}` for `{}`", trait_name, ty),
                }
            }
            DiagnosticKind::MissingTraitMethod {
                trait_name,
                method,
                target,
            } => write!(
                f,
                "instance `{}` for `{}` is missing method `{}`",
                trait_name, target, method
            ),
            DiagnosticKind::ExportConflict {
                name,
                first_origin,
                second_origin,
            } => write!(
                f,
                "export conflict: `{}` arrives from both `{}` and `{}`",
                name, first_origin, second_origin
            ),
            DiagnosticKind::ImportCycle { path } => {
                write!(f, "import cycle: {}", path.join(" -> "))
            }
            DiagnosticKind::MultiplePackages { dir, first, second } => write!(
                f,
                "directory `{}` declares multiple packages: `{}` and `{}`",
                dir, first, second
            ),
            DiagnosticKind::ConstantReassignment { name } => {
                write!(f, "cannot reassign constant `{}`", name)
            }
            DiagnosticKind::DuplicateDefinition { name } => {
                write!(f, "`{}` is defined more than once in this module", name)
            }
            DiagnosticKind::Warning { message } => write!(f, "{}", message),
        }
    }
}

/// Pick the closest candidate to `name` within an edit-distance threshold of
/// `max(1, name.len() / 3)`. Ties resolve to the earliest candidate.
pub fn suggest_name<'a, I>(name: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let threshold = (name.len() / 3).max(1);
    let mut best: Option<(usize, &str)> = None;
    for cand in candidates {
        if cand == name {
            continue;
        }
        let d = levenshtein(name, cand);
        if d <= threshold && best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, cand));
        }
    }
    best.map(|(_, c)| c.to_string())
}

/// Classic two-row Levenshtein distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
    }

    #[test]
    fn suggest_within_threshold() {
        let names = ["filter", "foldl", "flatten"];
        assert_eq!(
            suggest_name("filtre", names.iter().copied()),
            Some("filter".to_string())
        );
        // Nothing close enough to a short unrelated name.
        assert_eq!(suggest_name("zz", names.iter().copied()), None);
    }

    #[test]
    fn display_mentions_suggestion() {
        let d = Diagnostic::new(
            DiagnosticKind::UndefinedSymbol {
                name: "lenght".into(),
                suggestion: Some("length".into()),
            },
            "main.fx",
            Span::new(0, 6),
        );
        assert_eq!(
            d.to_string(),
            "undefined symbol `lenght`; did you mean `length`?"
        );
    }

    #[test]
    fn fatal_kinds() {
        assert!(DiagnosticKind::ImportCycle { path: vec![] }.is_fatal());
        assert!(!DiagnosticKind::DuplicateDefinition { name: "x".into() }.is_fatal());
    }
}
