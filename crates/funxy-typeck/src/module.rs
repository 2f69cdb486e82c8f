//! Modules and the module store.
//!
//! A [`Module`] is one package: its parsed files, its own symbol table, its
//! export set and its dependency links. Modules live in a [`ModuleStore`]
//! arena and are addressed by [`ModuleId`]; the store keeps two indices, by
//! absolute directory path and by package name.

use std::path::PathBuf;

use rustc_hash::{FxHashMap, FxHashSet};

use funxy_ast::item::ReExportSpec;
use funxy_ast::Program;

use crate::builtins;
use crate::catalogue::VirtualPackage;
use crate::scope::SymbolTable;

/// A unique identifier for a module within one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One parsed source file of a package.
#[derive(Debug, Default)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name for diagnostics (`geometry.fx`).
    pub name: String,
    pub program: Program,
}

/// A loaded package.
#[derive(Debug, Default)]
pub struct Module {
    pub name: String,
    pub dir: PathBuf,
    /// Parsed files in sorted filename order.
    pub files: Vec<SourceFile>,
    pub table: SymbolTable,
    /// Exported names; finalized during header analysis.
    pub exports: FxHashSet<String>,
    /// `(*)` export list: every top-level symbol is exported.
    pub export_all: bool,
    /// Origin module of each export, for re-export conflict detection.
    pub export_origins: FxHashMap<String, String>,
    /// Re-export specs captured verbatim by the loader.
    pub reexports: Vec<ReExportSpec>,
    /// Import path text → loaded dependency.
    pub path_targets: FxHashMap<String, ModuleId>,
    /// Module alias → dependency, filled during header analysis.
    pub alias_targets: FxHashMap<String, ModuleId>,
    /// Dependencies in first-import order.
    pub deps: Vec<ModuleId>,
    /// Sub-packages, when this module is a package group.
    pub submodules: Vec<ModuleId>,
    pub is_virtual: bool,
    pub is_group: bool,
    /// Header analysis hit a fatal diagnostic; bodies are skipped.
    pub failed: bool,
    pub headers_analyzed: bool,
    pub headers_analyzing: bool,
    pub bodies_analyzed: bool,
    pub bodies_analyzing: bool,
}

impl Module {
    /// A fresh disk-backed module with a builtin-seeded root scope.
    pub fn new(name: impl Into<String>, dir: PathBuf) -> Self {
        let mut table = SymbolTable::new();
        builtins::install(&mut table);
        Module {
            name: name.into(),
            dir,
            table,
            ..Default::default()
        }
    }

    /// Materialize a virtual package: symbol table pre-seeded from the
    /// catalogue entry, both phases already analyzed.
    pub fn from_virtual(pkg: &VirtualPackage) -> Self {
        let mut table = SymbolTable::new();
        builtins::install(&mut table);
        for (name, ty, kind) in &pkg.types {
            table.define_type(name, ty.clone(), kind.clone());
        }
        for (name, ty, adt) in &pkg.constructors {
            table.define_constructor(name, ty.clone(), adt);
        }
        for def in &pkg.traits {
            table.define_trait(def.clone());
        }
        for (op, trait_name) in &pkg.operators {
            table.bind_operator(op, trait_name);
        }
        for (name, ty) in &pkg.values {
            table.define(name, ty.clone());
        }
        let exports: FxHashSet<String> =
            pkg.export_names().map(str::to_string).collect();
        let export_origins = exports
            .iter()
            .map(|n| (n.clone(), pkg.name.clone()))
            .collect();
        Module {
            name: pkg.name.clone(),
            dir: PathBuf::from(&pkg.name),
            table,
            exports,
            export_origins,
            is_virtual: true,
            headers_analyzed: true,
            bodies_analyzed: true,
            ..Default::default()
        }
    }

    /// Short alias a bare `import "path"` binds: the last path segment for
    /// virtual packages, the package name otherwise.
    pub fn default_alias(&self) -> String {
        if self.is_virtual {
            self.name
                .rsplit('/')
                .next()
                .unwrap_or(&self.name)
                .to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Arena of loaded modules with path and name indices.
#[derive(Debug, Default)]
pub struct ModuleStore {
    pub modules: Vec<Module>,
    by_path: FxHashMap<PathBuf, ModuleId>,
    by_name: FxHashMap<String, ModuleId>,
}

impl ModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: Module) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.by_path.insert(module.dir.clone(), id);
        self.by_name.insert(module.name.clone(), id);
        self.modules.push(module);
        id
    }

    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    pub fn by_path(&self, path: &PathBuf) -> Option<ModuleId> {
        self.by_path.get(path).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;

    #[test]
    fn store_indexes_by_path_and_name() {
        let mut store = ModuleStore::new();
        let id = store.add(Module::new("geometry", PathBuf::from("/proj/geometry")));
        assert_eq!(store.by_name("geometry"), Some(id));
        assert_eq!(store.by_path(&PathBuf::from("/proj/geometry")), Some(id));
        assert_eq!(store.get(id).name, "geometry");
    }

    #[test]
    fn virtual_modules_arrive_fully_analyzed() {
        let pkg = catalogue::lookup("lib/list").unwrap();
        let module = Module::from_virtual(pkg);
        assert!(module.is_virtual);
        assert!(module.headers_analyzed && module.bodies_analyzed);
        assert!(module.exports.contains("map"));
        assert!(module.table.find("foldl").is_some());
        assert_eq!(module.default_alias(), "list");
    }

    #[test]
    fn meta_lib_materializes_every_function() {
        let pkg = catalogue::lookup("lib").unwrap();
        let module = Module::from_virtual(pkg);
        assert!(module.table.find("map").is_some());
        assert!(module.table.find("json_render").is_some());
        assert!(module.table.find("uuid4").is_some());
        assert_eq!(module.default_alias(), "lib");
    }
}
