//! The module loader: directory discovery, package-extension detection,
//! package groups, per-file parse orchestration and cycle detection.
//!
//! One package per directory. The entry file `<dirname>.<ext>` names the
//! package and its export list; every other file must agree. Dependency
//! loading is demand-driven and recursive; re-entering a directory that is
//! still being processed is an import cycle. Directory traversal is in
//! sorted filename order throughout, so loading is deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use funxy_ast::item::{ExportItem, ExportSpec};
use funxy_ast::{FileParser, SOURCE_EXTENSIONS};
use funxy_common::{Diagnostic, DiagnosticKind, Span};

use crate::catalogue;
use crate::module::{Module, ModuleId, ModuleStore, SourceFile};

/// Loads packages from disk (and the virtual catalogue) into a
/// [`ModuleStore`].
pub struct Loader<'p> {
    parser: &'p dyn FileParser,
    pub store: ModuleStore,
    pub diagnostics: Vec<Diagnostic>,
    /// Directories currently being loaded, innermost last. Re-entry means a
    /// cycle; the set mirrors the stack for O(1) membership.
    processing: Vec<PathBuf>,
    processing_set: FxHashSet<PathBuf>,
}

impl<'p> Loader<'p> {
    pub fn new(parser: &'p dyn FileParser) -> Self {
        Loader {
            parser,
            store: ModuleStore::new(),
            diagnostics: Vec::new(),
            processing: Vec::new(),
            processing_set: FxHashSet::default(),
        }
    }

    /// Load the package rooted at `dir` and everything it imports.
    pub fn load_package(&mut self, dir: &Path) -> Option<ModuleId> {
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        if let Some(id) = self.store.by_path(&dir) {
            return Some(id);
        }
        if self.processing_set.contains(&dir) {
            self.report_cycle(&dir);
            return None;
        }
        self.processing.push(dir.clone());
        self.processing_set.insert(dir.clone());
        let result = self.load_package_inner(&dir);
        self.processing.pop();
        self.processing_set.remove(&dir);
        result
    }

    fn report_cycle(&mut self, dir: &Path) {
        let start = self
            .processing
            .iter()
            .position(|p| p == dir)
            .unwrap_or(0);
        let mut path: Vec<String> = self.processing[start..]
            .iter()
            .map(|p| dir_label(p))
            .collect();
        path.push(dir_label(dir));
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::ImportCycle { path },
            dir_label(dir),
            Span::DUMMY,
        ));
    }

    fn load_package_inner(&mut self, dir: &Path) -> Option<ModuleId> {
        let dirname = dir_label(dir);
        let (mut file_names, sub_dirs) = match read_sorted(dir) {
            Ok(listing) => listing,
            Err(message) => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Syntax { message },
                    dirname,
                    Span::DUMMY,
                ));
                return None;
            }
        };
        file_names.retain(|name| file_extension(name).is_some());

        if file_names.is_empty() {
            // A directory of sub-packages only is a package group.
            let mut submodules = Vec::new();
            for sub in &sub_dirs {
                if dir_has_sources(&dir.join(sub)) {
                    if let Some(id) = self.load_package(&dir.join(sub)) {
                        submodules.push(id);
                    }
                }
            }
            if submodules.is_empty() {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Syntax {
                        message: format!("`{}` contains no source files", dir.display()),
                    },
                    dirname,
                    Span::DUMMY,
                ));
                return None;
            }
            let mut group = Module::new(dirname, dir.to_path_buf());
            group.is_group = true;
            group.submodules = submodules;
            return Some(self.store.add(group));
        }

        // Package extension: the entry file decides, otherwise the first
        // recognized extension in sorted order.
        let ext = SOURCE_EXTENSIONS
            .iter()
            .find(|ext| file_names.iter().any(|f| f == &format!("{}.{}", dirname, ext)))
            .copied()
            .unwrap_or_else(|| {
                file_extension(&file_names[0]).expect("retained files have extensions")
            });
        for name in &file_names {
            let file_ext = file_extension(name).expect("retained files have extensions");
            if file_ext != ext {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Syntax {
                        message: format!(
                            "`{}` uses extension `.{}` but the package uses `.{}`",
                            name, file_ext, ext
                        ),
                    },
                    name.clone(),
                    Span::DUMMY,
                ));
            }
        }
        file_names.retain(|name| file_extension(name) == Some(ext));

        // Parse every file, sorted order.
        let mut files = Vec::new();
        for name in &file_names {
            let path = dir.join(name);
            let source = match fs::read_to_string(&path) {
                Ok(src) => src,
                Err(err) => {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::Syntax {
                            message: format!("cannot read `{}`: {}", path.display(), err),
                        },
                        name.clone(),
                        Span::DUMMY,
                    ));
                    continue;
                }
            };
            match self.parser.parse(name, &source) {
                Ok(program) => files.push(SourceFile {
                    path,
                    name: name.clone(),
                    program,
                }),
                Err(diag) => self.diagnostics.push(diag),
            }
        }

        // The entry file's package declaration names the package; other
        // files must not disagree.
        let entry_name = format!("{}.{}", dirname, ext);
        let entry_decl = files
            .iter()
            .find(|f| f.name == entry_name)
            .or_else(|| files.iter().find(|f| f.program.package.is_some()))
            .and_then(|f| f.program.package.clone());
        let package_name = entry_decl
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "main".to_string());
        let mut fatal = false;
        for file in &files {
            if let Some(pkg) = &file.program.package {
                if pkg.name != package_name {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::MultiplePackages {
                            dir: dirname.clone(),
                            first: package_name.clone(),
                            second: pkg.name.clone(),
                        },
                        file.name.clone(),
                        pkg.span,
                    ));
                    fatal = true;
                }
            }
        }

        let mut module = Module::new(package_name.clone(), dir.to_path_buf());
        module.failed = fatal;

        // Capture the export list; re-export specs wait for analysis.
        if let Some(decl) = &entry_decl {
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

        // Resolve imports recursively, first-seen order.
        let import_decls: Vec<(String, String, Span)> = files
            .iter()
            .flat_map(|f| {
                f.program
                    .imports
                    .iter()
                    .map(move |i| (i.path.clone(), f.name.clone(), i.span))
            })
            .collect();
        module.files = files;
        for (path, file, span) in import_decls {
            if module.path_targets.contains_key(&path) {
                continue;
            }
            match self.resolve_import(&path, dir, &file, span) {
                Some(dep_id) => {
                    module.path_targets.insert(path, dep_id);
                    module.deps.push(dep_id);
                }
                None => module.failed = true,
            }
        }

        Some(self.store.add(module))
    }

    fn resolve_import(
        &mut self,
        path: &str,
        importer_dir: &Path,
        file: &str,
        span: Span,
    ) -> Option<ModuleId> {
        if catalogue::is_virtual_path(path) {
            if let Some(id) = self.store.by_name(path) {
                return Some(id);
            }
            let pkg = catalogue::lookup(path).expect("checked by is_virtual_path");
            return Some(self.store.add(Module::from_virtual(pkg)));
        }

        let target = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            importer_dir.join(path)
        };
        if !target.is_dir() {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UndefinedSymbol {
                    name: path.to_string(),
                    suggestion: None,
                },
                file.to_string(),
                span,
            ));
            return None;
        }
        self.load_package(&target)
    }
}

/// Directory entries split into (files, directories), each sorted by name.
/// Hidden entries are skipped.
fn read_sorted(dir: &Path) -> Result<(Vec<String>, Vec<String>), String> {
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("cannot read directory `{}`: {}", dir.display(), e))?;
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| e.to_string())?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

/// The recognized source extension of a file name, if any.
fn file_extension(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    SOURCE_EXTENSIONS.iter().find(|e| **e == ext).copied()
}

fn dir_has_sources(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.path().is_file()
                    && e.file_name()
                        .to_str()
                        .map(|n| file_extension(n).is_some())
                        .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

fn dir_label(dir: &Path) -> String {
    dir.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("package")
        .to_string()
}
