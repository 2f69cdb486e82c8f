//! Semantic core of the funxy language.
//!
//! Three tightly coupled subsystems implement the language's static
//! semantics:
//!
//! - types and unification: [`ty`], [`unify`]
//! - scoped name resolution and traits: [`scope`], [`traits`], [`builtins`]
//! - modules: the virtual package [`catalogue`], the filesystem [`loader`]
//!   and the two-phase [`analyze`] driver
//!
//! The lexer and parser are external collaborators behind the
//! [`FileParser`](funxy_ast::FileParser) seam; this crate consumes their
//! AST and either produces typed modules or a list of diagnostics.

pub mod analyze;
pub mod builtins;
pub mod catalogue;
pub mod diagnostics;
pub mod infer;
pub mod loader;
pub mod module;
pub mod scope;
pub mod traits;
pub mod ty;
pub mod unify;

use std::path::{Path, PathBuf};

use funxy_ast::item::{ExportItem, ExportSpec};
use funxy_ast::{FileParser, Program};
use funxy_common::Diagnostic;

pub use analyze::Analyzer;
pub use loader::Loader;
pub use module::{Module, ModuleId, ModuleStore, SourceFile};
pub use scope::{Symbol, SymbolKind, SymbolTable};
pub use ty::{Kind, Subst, Ty};
pub use unify::{unify, UnifyError};

/// The outcome of analyzing a package tree: the module store with every
/// typed module, plus accumulated diagnostics.
pub struct AnalysisResult {
    /// The entry module, absent when loading failed outright.
    pub entry: Option<ModuleId>,
    pub store: ModuleStore,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// The entry module, for assertions and downstream consumers.
    pub fn entry_module(&self) -> Option<&Module> {
        self.entry.map(|id| self.store.get(id))
    }
}

/// Load and analyze the package rooted at `dir`, plus everything it
/// imports.
pub fn analyze_package(dir: &Path, parser: &dyn FileParser) -> AnalysisResult {
    let mut loader = Loader::new(parser);
    let entry = loader.load_package(dir);
    let mut store = std::mem::take(&mut loader.store);
    let mut diagnostics = std::mem::take(&mut loader.diagnostics);
    if let Some(id) = entry {
        let mut analyzer = Analyzer::new(&mut store);
        analyzer.analyze(id);
        diagnostics.extend(analyzer.diagnostics);
    }
    AnalysisResult {
        entry,
        store,
        diagnostics,
    }
}

/// Analyze one already-parsed program as a standalone module. Virtual
/// imports resolve through the catalogue; disk imports need
/// [`analyze_package`].
pub fn analyze_program(file_name: &str, program: Program) -> AnalysisResult {
    let mut store = ModuleStore::new();
    let package_name = program
        .package
        .as_ref()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "main".to_string());

    let mut module = Module::new(package_name.clone(), PathBuf::from(file_name));
    if let Some(decl) = &program.package {
        match &decl.exports {
            ExportSpec::All => module.export_all = true,
            ExportSpec::Names(items) => {
                for item in items {
                    match item {
                        ExportItem::Symbol(name) => {
                            module.exports.insert(name.clone());
                            module
                                .export_origins
                                .insert(name.clone(), package_name.clone());
                        }
                        ExportItem::ReExport(spec) => module.reexports.push(spec.clone()),
                    }
                }
            }
        }
    }
    let mut diagnostics = Vec::new();
    for import in &program.imports {
        if module.path_targets.contains_key(&import.path) {
            continue;
        }
        if let Some(pkg) = catalogue::lookup(&import.path) {
            let dep_id = store
                .by_name(&import.path)
                .unwrap_or_else(|| store.add(Module::from_virtual(pkg)));
            module.path_targets.insert(import.path.clone(), dep_id);
            module.deps.push(dep_id);
        } else {
            diagnostics.push(Diagnostic::new(
                funxy_common::DiagnosticKind::UndefinedSymbol {
                    name: import.path.clone(),
                    suggestion: None,
                },
                file_name,
                import.span,
            ));
        }
    }
    module.files.push(SourceFile {
        path: PathBuf::from(file_name),
        name: file_name.to_string(),
        program,
    });

    let id = store.add(module);
    let mut analyzer = Analyzer::new(&mut store);
    analyzer.analyze(id);
    diagnostics.extend(analyzer.diagnostics);
    AnalysisResult {
        entry: Some(id),
        store,
        diagnostics,
    }
}
