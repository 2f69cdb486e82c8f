//! Shared foundation types for the funxy semantic core.
//!
//! - [`span`]: byte-offset source spans and on-demand line/column lookup
//! - [`diag`]: the diagnostic model shared by the loader, the symbol table
//!   and the analyzer, plus the did-you-mean name suggestion helper

pub mod diag;
pub mod span;

pub use diag::{suggest_name, Diagnostic, DiagnosticKind, Severity};
pub use span::{LineIndex, Span};
