//! Ariadne-based rendering of diagnostics.
//!
//! Turns a [`Diagnostic`] into a labeled, coded terminal report. Colorless
//! output is available for deterministic test assertions; the one-line
//! `Display` form of the diagnostic stays the message, this module adds the
//! span labels and help lines around it.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use funxy_common::{Diagnostic, DiagnosticKind, Severity};

/// Rendering options.
#[derive(Debug, Clone)]
pub struct DiagnosticOptions {
    pub color: bool,
}

impl DiagnosticOptions {
    /// Colorless output for snapshot-stable rendering.
    pub fn colorless() -> Self {
        DiagnosticOptions { color: false }
    }
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions { color: true }
    }
}

/// Stable code per diagnostic kind; warnings get a `W` prefix.
pub fn error_code(kind: &DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::Syntax { .. } => "E0001",
        DiagnosticKind::UnificationFailure { .. } => "E0002",
        DiagnosticKind::InfiniteType { .. } => "E0003",
        DiagnosticKind::KindMismatch { .. } => "E0004",
        DiagnosticKind::UndefinedSymbol { .. } => "E0005",
        DiagnosticKind::OverlappingInstances { .. } => "E0006",
        DiagnosticKind::MissingInstance { .. } => "E0007",
        DiagnosticKind::MissingTraitMethod { .. } => "E0008",
        DiagnosticKind::ExportConflict { .. } => "E0009",
        DiagnosticKind::ImportCycle { .. } => "E0010",
        DiagnosticKind::MultiplePackages { .. } => "E0011",
        DiagnosticKind::ConstantReassignment { .. } => "E0012",
        DiagnosticKind::DuplicateDefinition { .. } => "E0013",
        DiagnosticKind::Warning { .. } => "W0001",
    }
}

/// A label message pointing at the primary span.
fn label_message(kind: &DiagnosticKind) -> String {
    match kind {
        DiagnosticKind::UnificationFailure {
            expected, actual, ..
        } => format!("expected `{}`, found `{}`", expected, actual),
        DiagnosticKind::InfiniteType { .. } => "recursive type here".to_string(),
        DiagnosticKind::KindMismatch { expected, .. } => {
            format!("this constructor has kind `{}`", expected)
        }
        DiagnosticKind::UndefinedSymbol { name, .. } => format!("`{}` is not in scope", name),
        DiagnosticKind::OverlappingInstances { second, .. } => {
            format!("`{}` overlaps an earlier instance", second)
        }
        DiagnosticKind::MissingInstance { trait_name, .. } => {
            format!("no `{}` instance in scope", trait_name)
        }
        DiagnosticKind::MissingTraitMethod { method, .. } => {
            format!("`{}` must be provided", method)
        }
        DiagnosticKind::ExportConflict { name, .. } => {
            format!("`{}` arrives twice", name)
        }
        DiagnosticKind::ConstantReassignment { .. } => "defined with `:-`".to_string(),
        DiagnosticKind::DuplicateDefinition { name } => {
            format!("`{}` is already defined", name)
        }
        _ => "here".to_string(),
    }
}

/// An optional help line per kind.
fn help_message(kind: &DiagnosticKind) -> Option<String> {
    match kind {
        DiagnosticKind::UndefinedSymbol {
            suggestion: Some(s),
            ..
        } => Some(format!("did you mean `{}`?", s)),
        DiagnosticKind::InfiniteType { .. } => {
            Some("a value cannot have a type that refers to itself".to_string())
        }
        DiagnosticKind::ConstantReassignment { .. } => {
            Some("constants cannot be reassigned; bind a new name instead".to_string())
        }
        DiagnosticKind::MissingInstance {
            trait_name, ty, ..
        } => Some(format!("declare `instance {} {}` to allow this", trait_name, ty)),
        _ => None,
    }
}

/// Render one diagnostic against its source text.
pub fn render_diagnostic(
    diag: &Diagnostic,
    source: &str,
    options: &DiagnosticOptions,
) -> String {
    let config = Config::default().with_color(options.color);
    let source_len = source.len();

    // Ariadne wants a non-empty span inside the source.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };
    let span = clamp(diag.span.to_range());

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
    };
    let mut builder = Report::build(kind, span.clone())
        .with_code(error_code(&diag.kind))
        .with_message(diag.to_string())
        .with_config(config);
    builder.add_label(
        Label::new(span)
            .with_message(label_message(&diag.kind))
            .with_color(Color::Red),
    );
    if let Some(help) = help_message(&diag.kind) {
        builder.set_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

/// Render every diagnostic in order, one string each.
pub fn render_all(
    diags: &[Diagnostic],
    source: &str,
    options: &DiagnosticOptions,
) -> Vec<String> {
    diags
        .iter()
        .map(|d| render_diagnostic(d, source, options))
        .collect()
}

/// Serialize diagnostics as JSON, for editor and tooling consumers.
pub fn diagnostics_to_json(diags: &[Diagnostic]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(diags)
}
