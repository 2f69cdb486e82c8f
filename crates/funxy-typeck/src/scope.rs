//! The symbol table: lexically nested scopes for values, types, aliases,
//! constructors, traits, instances, extension methods, kinds and module
//! aliases.
//!
//! A [`SymbolTable`] owns a stack of [`Scope`] frames. Frame 0 is the module
//! root (seeded from the builtins); nested frames are pushed per function or
//! block. Lookups walk from the innermost frame outward; mutations always
//! target the innermost frame, so parent scopes are never changed by their
//! children.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::traits::{InstanceDef, TraitDef, TraitRegistry};
use crate::ty::{Kind, Ty, TyCon};

/// What namespace a symbol lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Value,
    Type,
    Constructor,
    Trait,
    Module,
}

/// One named entry in the table.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Ty,
    pub kind: SymbolKind,
    /// Set while the symbol's type is still being inferred; reading a
    /// pending symbol during its own inference supplies the tentative
    /// signature (this is the intra-module cycle breaker).
    pub pending: bool,
    /// `:-` bindings; reassignment is an error.
    pub constant: bool,
    /// The module that originally defined this symbol, for re-export
    /// conflict detection.
    pub origin: Option<String>,
    /// For alias nominals, the underlying type.
    pub underlying: Option<Ty>,
}

impl Symbol {
    pub fn value(name: impl Into<String>, ty: Ty) -> Symbol {
        Symbol {
            name: name.into(),
            ty,
            kind: SymbolKind::Value,
            pending: false,
            constant: false,
            origin: None,
            underlying: None,
        }
    }
}

/// Why an [`SymbolTable::update`] was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    Undefined,
    Constant,
}

/// Why an instance registration was refused.
#[derive(Debug, Clone)]
pub enum InstanceError {
    UnknownTrait,
    Overlap { existing_target: Ty },
}

/// How a type name was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Found(Ty),
    /// A dotted `mod.Type` whose export was still a placeholder; callers
    /// surface a warning when they see this.
    Fallback(Ty),
}

impl ResolvedType {
    pub fn ty(self) -> Ty {
        match self {
            ResolvedType::Found(ty) | ResolvedType::Fallback(ty) => ty,
        }
    }
}

/// One lexical scope frame.
#[derive(Debug, Default)]
struct Scope {
    values: FxHashMap<String, Symbol>,
    types: FxHashMap<String, Symbol>,
    kinds: FxHashMap<String, Kind>,
    aliases: FxHashMap<String, Ty>,
    /// Constructor name to owning ADT name.
    variants: FxHashMap<String, String>,
    type_params: FxHashSet<String>,
    fn_constraints: FxHashMap<String, Vec<(String, String)>>,
    traits: TraitRegistry,
    /// Extension methods: type name → method → signature.
    extensions: FxHashMap<String, FxHashMap<String, Ty>>,
    module_aliases: FxHashMap<String, String>,
}

/// The symbol table for one module, plus its nested scopes.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn exit_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot exit the module root scope");
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn current(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    // ── Values ──────────────────────────────────────────────────────────

    /// Look up a value symbol, innermost scope first.
    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|s| s.values.get(name))
    }

    pub fn define(&mut self, name: impl Into<String>, ty: Ty) {
        let name = name.into();
        let sym = Symbol::value(name.clone(), ty);
        self.current().values.insert(name, sym);
    }

    pub fn define_constant(&mut self, name: impl Into<String>, ty: Ty) {
        let name = name.into();
        let sym = Symbol {
            constant: true,
            ..Symbol::value(name.clone(), ty)
        };
        self.current().values.insert(name, sym);
    }

    pub fn define_pending(&mut self, name: impl Into<String>, ty: Ty) {
        let name = name.into();
        let sym = Symbol {
            pending: true,
            ..Symbol::value(name.clone(), ty)
        };
        self.current().values.insert(name, sym);
    }

    /// Insert a fully formed symbol into the namespace its kind dictates.
    /// Used when copying exported symbols across modules.
    pub fn define_symbol(&mut self, sym: Symbol) {
        let scope = self.current();
        match sym.kind {
            SymbolKind::Type | SymbolKind::Trait => {
                scope.types.insert(sym.name.clone(), sym);
            }
            _ => {
                scope.values.insert(sym.name.clone(), sym);
            }
        }
    }

    /// Reassign a value symbol. Refuses constants; used for `x = expr`.
    pub fn update(&mut self, name: &str, ty: Ty) -> Result<(), UpdateError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(sym) = scope.values.get_mut(name) {
                if sym.constant {
                    return Err(UpdateError::Constant);
                }
                sym.ty = ty;
                sym.pending = false;
                return Ok(());
            }
        }
        Err(UpdateError::Undefined)
    }

    /// Overwrite a pending symbol with its inferred type, clearing the flag.
    /// Unlike [`update`](Self::update) this also finalizes constants.
    pub fn finalize_pending(&mut self, name: &str, ty: Ty) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(sym) = scope.values.get_mut(name) {
                sym.ty = ty;
                sym.pending = false;
                return;
            }
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .any(|s| s.values.contains_key(name) || s.types.contains_key(name))
    }

    pub fn defined_in_current_scope(&self, name: &str) -> bool {
        let scope = self.scopes.last().expect("scope stack is never empty");
        scope.values.contains_key(name) || scope.types.contains_key(name)
    }

    /// Every visible name, for did-you-mean suggestions.
    pub fn all_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for scope in &self.scopes {
            names.extend(scope.values.keys().cloned());
            names.extend(scope.types.keys().cloned());
        }
        names.sort();
        names.dedup();
        names
    }

    // ── Types, kinds, aliases ───────────────────────────────────────────

    pub fn define_type(&mut self, name: impl Into<String>, ty: Ty, kind: Kind) {
        let name = name.into();
        let sym = Symbol {
            name: name.clone(),
            ty,
            kind: SymbolKind::Type,
            pending: false,
            constant: false,
            origin: None,
            underlying: None,
        };
        let scope = self.current();
        scope.types.insert(name.clone(), sym);
        scope.kinds.insert(name, kind);
    }

    /// Register an alias: the nominal constructor is used for trait lookup,
    /// the underlying type for field access and structural unification.
    pub fn define_type_alias(&mut self, name: impl Into<String>, underlying: Ty) {
        let name = name.into();
        let nominal = Ty::Con(TyCon::alias(name.clone(), underlying.clone()));
        let sym = Symbol {
            name: name.clone(),
            ty: nominal,
            kind: SymbolKind::Type,
            pending: false,
            constant: false,
            origin: None,
            underlying: Some(underlying.clone()),
        };
        let scope = self.current();
        scope.types.insert(name.clone(), sym);
        scope.kinds.insert(name.clone(), Kind::Star);
        scope.aliases.insert(name, underlying);
    }

    pub fn define_constructor(
        &mut self,
        name: impl Into<String>,
        ty: Ty,
        adt: impl Into<String>,
    ) {
        let name = name.into();
        let sym = Symbol {
            name: name.clone(),
            ty,
            kind: SymbolKind::Constructor,
            pending: false,
            constant: false,
            origin: None,
            underlying: None,
        };
        let scope = self.current();
        scope.values.insert(name.clone(), sym);
        scope.variants.insert(name, adt.into());
    }

    pub fn constructor_adt(&self, ctor: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.variants.get(ctor).map(String::as_str))
    }

    pub fn kind_of(&self, name: &str) -> Option<&Kind> {
        self.scopes.iter().rev().find_map(|s| s.kinds.get(name))
    }

    /// Overwrite the registered kind of a type name (parametric aliases).
    pub fn define_kind(&mut self, name: impl Into<String>, kind: Kind) {
        self.current().kinds.insert(name.into(), kind);
    }

    pub fn define_type_param(&mut self, name: impl Into<String>) {
        self.current().type_params.insert(name.into());
    }

    pub fn is_type_param(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.type_params.contains(name))
    }

    pub fn set_fn_constraints(
        &mut self,
        fn_name: impl Into<String>,
        constraints: Vec<(String, String)>,
    ) {
        self.current()
            .fn_constraints
            .insert(fn_name.into(), constraints);
    }

    pub fn fn_constraints(&self, fn_name: &str) -> Option<&[(String, String)]> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.fn_constraints.get(fn_name).map(Vec::as_slice))
    }

    /// Resolve a type name, including the dotted `mod.Type` form.
    ///
    /// Dotted names resolve through the qualified entries installed at
    /// import time; when the module alias is known but the entry is absent
    /// or still pending, resolution falls back to a bare constructor and the
    /// caller surfaces a warning.
    pub fn resolve_type(&self, name: &str) -> Option<ResolvedType> {
        if self.is_type_param(name) {
            return Some(ResolvedType::Found(Ty::var(name)));
        }
        for scope in self.scopes.iter().rev() {
            if let Some(sym) = scope.types.get(name) {
                if sym.pending {
                    let bare = name.rsplit('.').next().unwrap_or(name);
                    return Some(ResolvedType::Fallback(Ty::con(bare)));
                }
                return Some(ResolvedType::Found(sym.ty.clone()));
            }
        }
        if let Some((alias, rest)) = name.split_once('.') {
            if self.module_alias(alias).is_some() {
                return Some(ResolvedType::Fallback(Ty::con(rest)));
            }
        }
        None
    }

    /// Recursively rewrite alias names to their underlying types through
    /// applications, functions, tuples, records and unions.
    pub fn resolve_type_alias(&self, ty: &Ty) -> Ty {
        let mut seen = FxHashSet::default();
        self.resolve_alias_rec(ty, &mut seen)
    }

    fn lookup_alias(&self, name: &str) -> Option<&Ty> {
        self.scopes.iter().rev().find_map(|s| s.aliases.get(name))
    }

    fn resolve_alias_rec(&self, ty: &Ty, seen: &mut FxHashSet<String>) -> Ty {
        match ty {
            Ty::Con(con) => {
                if let Some(under) = self.lookup_alias(&con.name) {
                    // A cyclic alias chain stops expanding at the repeat.
                    if seen.insert(con.name.clone()) {
                        return self.resolve_alias_rec(under, seen);
                    }
                }
                ty.clone()
            }
            Ty::App(head, args) => Ty::App(
                Box::new(self.resolve_alias_rec(head, seen)),
                args.iter()
                    .map(|a| self.resolve_alias_rec(a, seen))
                    .collect(),
            ),
            Ty::Func(func) => {
                let mut resolved = func.clone();
                resolved.params = func
                    .params
                    .iter()
                    .map(|p| self.resolve_alias_rec(p, seen))
                    .collect();
                resolved.ret = Box::new(self.resolve_alias_rec(&func.ret, seen));
                Ty::Func(resolved)
            }
            Ty::Tuple(elems) => Ty::Tuple(
                elems
                    .iter()
                    .map(|e| self.resolve_alias_rec(e, seen))
                    .collect(),
            ),
            Ty::Record { fields, open } => Ty::Record {
                fields: fields
                    .iter()
                    .map(|(n, t)| (n.clone(), self.resolve_alias_rec(t, seen)))
                    .collect(),
                open: *open,
            },
            Ty::Union(members) => Ty::union(
                members
                    .iter()
                    .map(|m| self.resolve_alias_rec(m, seen))
                    .collect(),
            ),
            Ty::Type(inner) => Ty::Type(Box::new(self.resolve_alias_rec(inner, seen))),
            Ty::Var(_) => ty.clone(),
        }
    }

    // ── Modules ─────────────────────────────────────────────────────────

    pub fn define_module(&mut self, alias: impl Into<String>, package: impl Into<String>) {
        let alias = alias.into();
        let package = package.into();
        let sym = Symbol {
            name: alias.clone(),
            ty: Ty::con(package.clone()),
            kind: SymbolKind::Module,
            pending: false,
            constant: false,
            origin: None,
            underlying: None,
        };
        let scope = self.current();
        scope.values.insert(alias.clone(), sym);
        scope.module_aliases.insert(alias, package);
    }

    pub fn module_alias(&self, alias: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.module_aliases.get(alias).map(String::as_str))
    }

    // ── Traits, instances, operators, extensions ────────────────────────

    pub fn define_trait(&mut self, def: TraitDef) {
        let sym = Symbol {
            name: def.name.clone(),
            ty: Ty::con(def.name.clone()),
            kind: SymbolKind::Trait,
            pending: false,
            constant: false,
            origin: None,
            underlying: None,
        };
        let scope = self.current();
        scope.types.insert(def.name.clone(), sym);
        scope.traits.define_trait(def);
    }

    pub fn trait_def(&self, name: &str) -> Option<&TraitDef> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.traits.trait_def(name))
    }

    /// Every instance of a trait visible from the current scope, outer
    /// frames first.
    pub fn visible_instances(&self, trait_name: &str) -> Vec<InstanceDef> {
        let mut out = Vec::new();
        for scope in &self.scopes {
            out.extend_from_slice(scope.traits.instances_of(trait_name));
        }
        out
    }

    /// Register an instance in the current scope after checking the trait
    /// exists and no visible instance target overlaps.
    pub fn register_instance(
        &mut self,
        trait_name: &str,
        instance: InstanceDef,
    ) -> Result<(), InstanceError> {
        if self.trait_def(trait_name).is_none() {
            return Err(InstanceError::UnknownTrait);
        }
        let visible = self.visible_instances(trait_name);
        if let Some(existing) = crate::traits::find_overlap(&visible, &instance.target) {
            return Err(InstanceError::Overlap {
                existing_target: existing.target.clone(),
            });
        }
        self.current().traits.add_instance(trait_name, instance);
        Ok(())
    }

    pub fn implementation_exists(&self, trait_name: &str, ty: &Ty) -> bool {
        let visible = self.visible_instances(trait_name);
        crate::traits::find_matching_instance(&visible, ty).is_some()
    }

    /// The specialized signature of `method` for the instance matching
    /// `target`, falling back to `None` when no instance specializes it.
    pub fn specialized_method(&self, trait_name: &str, target: &Ty, method: &str) -> Option<Ty> {
        let visible = self.visible_instances(trait_name);
        let (instance, _) = crate::traits::find_matching_instance(&visible, target)?;
        instance.methods.get(method).cloned()
    }

    pub fn bind_operator(&mut self, op: impl Into<String>, trait_name: impl Into<String>) {
        self.current().traits.bind_operator(op, trait_name);
    }

    /// The trait an operator dispatches through, innermost binding first.
    pub fn operator_trait(&self, op: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.traits.operator_trait(op))
    }

    /// Merged operator table: outer bindings first, inner ones overlay.
    pub fn all_operator_traits(&self) -> FxHashMap<String, String> {
        let mut out = FxHashMap::default();
        for scope in &self.scopes {
            for (op, trait_name) in scope.traits.operator_bindings() {
                out.insert(op.clone(), trait_name.clone());
            }
        }
        out
    }

    /// Merged instance table: trait name → every visible instance.
    pub fn all_implementations(&self) -> FxHashMap<String, Vec<InstanceDef>> {
        let mut out: FxHashMap<String, Vec<InstanceDef>> = FxHashMap::default();
        for scope in &self.scopes {
            for (trait_name, instances) in scope.traits.instance_traits() {
                out.entry(trait_name.clone())
                    .or_default()
                    .extend(instances.iter().cloned());
            }
        }
        out
    }

    pub fn define_extension(
        &mut self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        ty: Ty,
    ) {
        self.current()
            .extensions
            .entry(type_name.into())
            .or_default()
            .insert(method.into(), ty);
    }

    pub fn extension_method(&self, type_name: &str, method: &str) -> Option<&Ty> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.extensions.get(type_name).and_then(|m| m.get(method)))
    }

    /// Merged extension table: outer first, inner overlays.
    pub fn all_extension_methods(&self) -> FxHashMap<String, FxHashMap<String, Ty>> {
        let mut out: FxHashMap<String, FxHashMap<String, Ty>> = FxHashMap::default();
        for scope in &self.scopes {
            for (type_name, methods) in &scope.extensions {
                let entry = out.entry(type_name.clone()).or_default();
                for (m, ty) in methods {
                    entry.insert(m.clone(), ty.clone());
                }
            }
        }
        out
    }

    // ── Cross-module absorption ─────────────────────────────────────────

    /// Copy another module's visible traits, instances, operator bindings
    /// and extensions into this table's root scope. Instances already
    /// present (same trait, identical target) are skipped so diamond imports
    /// stay idempotent.
    pub fn absorb_traits(&mut self, other: &SymbolTable) {
        let defs: Vec<TraitDef> = other
            .scopes
            .iter()
            .flat_map(|s| s.traits.trait_defs().cloned().collect::<Vec<_>>())
            .collect();
        let impls = other.all_implementations();
        let ops = other.all_operator_traits();
        let exts = other.all_extension_methods();

        let root = &mut self.scopes[0];
        for def in defs {
            if root.traits.trait_def(&def.name).is_none() {
                let sym = Symbol {
                    name: def.name.clone(),
                    ty: Ty::con(def.name.clone()),
                    kind: SymbolKind::Trait,
                    pending: false,
                    constant: false,
                    origin: None,
                    underlying: None,
                };
                root.types.entry(def.name.clone()).or_insert(sym);
                root.traits.define_trait(def);
            }
        }
        for (trait_name, instances) in impls {
            for instance in instances {
                let present = root
                    .traits
                    .instances_of(&trait_name)
                    .iter()
                    .any(|i| i.target == instance.target);
                if !present {
                    root.traits.add_instance(&trait_name, instance);
                }
            }
        }
        for (op, trait_name) in ops {
            if root.traits.operator_trait(&op).is_none() {
                root.traits.bind_operator(op, trait_name);
            }
        }
        for (type_name, methods) in exts {
            let entry = root.extensions.entry(type_name).or_default();
            for (m, ty) in methods {
                entry.entry(m).or_insert(ty);
            }
        }
    }

    /// Look up an exported symbol at module level: values first, then types.
    pub fn root_lookup(&self, name: &str) -> Option<&Symbol> {
        let root = &self.scopes[0];
        root.values.get(name).or_else(|| root.types.get(name))
    }

    /// Every module-level symbol, values then types.
    pub fn root_symbols(&self) -> impl Iterator<Item = &Symbol> {
        let root = &self.scopes[0];
        root.values.values().chain(root.types.values())
    }

    /// Names of constructors belonging to the given ADT at module level.
    pub fn constructors_of(&self, adt: &str) -> Vec<String> {
        let root = &self.scopes[0];
        let mut out: Vec<String> = root
            .variants
            .iter()
            .filter(|(_, owner)| owner.as_str() == adt)
            .map(|(ctor, _)| ctor.clone())
            .collect();
        out.sort();
        out
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TraitMethodSig;

    #[test]
    fn lookup_walks_outward_and_shadows() {
        let mut table = SymbolTable::new();
        table.define("x", Ty::int());
        table.enter_scope();
        assert_eq!(table.find("x").unwrap().ty, Ty::int());
        table.define("x", Ty::string());
        assert_eq!(table.find("x").unwrap().ty, Ty::string());
        table.exit_scope();
        assert_eq!(table.find("x").unwrap().ty, Ty::int());
    }

    #[test]
    fn constants_refuse_update() {
        let mut table = SymbolTable::new();
        table.define_constant("pi", Ty::float());
        assert_eq!(table.update("pi", Ty::int()), Err(UpdateError::Constant));
        assert_eq!(table.update("nope", Ty::int()), Err(UpdateError::Undefined));
    }

    #[test]
    fn pending_symbols_finalize() {
        let mut table = SymbolTable::new();
        table.define_pending("f", Ty::func(vec![Ty::var("t0")], Ty::var("t1")));
        assert!(table.find("f").unwrap().pending);
        table.finalize_pending("f", Ty::func(vec![Ty::int()], Ty::int()));
        let sym = table.find("f").unwrap();
        assert!(!sym.pending);
        assert_eq!(sym.ty, Ty::func(vec![Ty::int()], Ty::int()));
    }

    #[test]
    fn alias_resolution_rewrites_through_compounds() {
        let mut table = SymbolTable::new();
        table.define_type_alias("String", Ty::list(Ty::char()));
        let ty = Ty::func(vec![Ty::con("String")], Ty::Tuple(vec![Ty::con("String")]));
        let resolved = table.resolve_type_alias(&ty);
        assert_eq!(
            resolved,
            Ty::func(
                vec![Ty::list(Ty::char())],
                Ty::Tuple(vec![Ty::list(Ty::char())])
            )
        );
    }

    #[test]
    fn resolve_type_prefers_params_then_types() {
        let mut table = SymbolTable::new();
        table.define_type("Point", Ty::con("Point"), Kind::Star);
        assert_eq!(
            table.resolve_type("Point"),
            Some(ResolvedType::Found(Ty::con("Point")))
        );
        table.enter_scope();
        table.define_type_param("T");
        assert_eq!(
            table.resolve_type("T"),
            Some(ResolvedType::Found(Ty::var("T")))
        );
        assert_eq!(table.resolve_type("Missing"), None);
    }

    #[test]
    fn dotted_type_falls_back_to_bare_constructor() {
        let mut table = SymbolTable::new();
        table.define_module("geo", "geometry");
        match table.resolve_type("geo.Point") {
            Some(ResolvedType::Fallback(ty)) => assert_eq!(ty, Ty::con("Point")),
            other => panic!("expected fallback, got {:?}", other),
        }
        // No such module alias: resolution fails outright.
        assert_eq!(table.resolve_type("nope.Point"), None);
    }

    #[test]
    fn instance_registration_rejects_overlap() {
        let mut table = SymbolTable::new();
        table.define_trait(TraitDef {
            name: "Show".into(),
            type_params: vec!["T".into()],
            supers: vec![],
            kind: None,
            methods: vec![TraitMethodSig {
                name: "show".into(),
                ty: Ty::func(vec![Ty::var("T")], Ty::string()),
                has_default: false,
            }],
        });
        table
            .register_instance(
                "Show",
                InstanceDef {
                    target: Ty::list(Ty::var("a")),
                    methods: FxHashMap::default(),
                },
            )
            .unwrap();
        let err = table
            .register_instance(
                "Show",
                InstanceDef {
                    target: Ty::list(Ty::int()),
                    methods: FxHashMap::default(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, InstanceError::Overlap { .. }));
        // A different constructor is fine.
        table
            .register_instance(
                "Show",
                InstanceDef {
                    target: Ty::option(Ty::var("a")),
                    methods: FxHashMap::default(),
                },
            )
            .unwrap();
    }

    #[test]
    fn unknown_trait_instance_is_refused() {
        let mut table = SymbolTable::new();
        let err = table
            .register_instance(
                "Nope",
                InstanceDef {
                    target: Ty::int(),
                    methods: FxHashMap::default(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, InstanceError::UnknownTrait));
    }

    #[test]
    fn inner_operator_binding_shadows_outer() {
        let mut table = SymbolTable::new();
        table.bind_operator("+", "Numeric");
        table.enter_scope();
        table.bind_operator("+", "VectorAdd");
        assert_eq!(table.operator_trait("+"), Some("VectorAdd"));
        let merged = table.all_operator_traits();
        assert_eq!(merged.get("+").map(String::as_str), Some("VectorAdd"));
        table.exit_scope();
        assert_eq!(table.operator_trait("+"), Some("Numeric"));
    }

    #[test]
    fn extensions_merge_outer_then_inner() {
        let mut table = SymbolTable::new();
        table.define_extension("Int", "double", Ty::func(vec![Ty::int()], Ty::int()));
        table.enter_scope();
        table.define_extension("Int", "double", Ty::func(vec![Ty::int()], Ty::float()));
        let merged = table.all_extension_methods();
        assert_eq!(
            merged["Int"]["double"],
            Ty::func(vec![Ty::int()], Ty::float())
        );
    }

    #[test]
    fn absorb_traits_is_idempotent() {
        let mut source = SymbolTable::new();
        source.define_trait(TraitDef {
            name: "Show".into(),
            type_params: vec!["T".into()],
            supers: vec![],
            kind: None,
            methods: vec![],
        });
        source
            .register_instance(
                "Show",
                InstanceDef {
                    target: Ty::int(),
                    methods: FxHashMap::default(),
                },
            )
            .unwrap();

        let mut dest = SymbolTable::new();
        dest.absorb_traits(&source);
        dest.absorb_traits(&source);
        assert_eq!(dest.visible_instances("Show").len(), 1);
        assert!(dest.implementation_exists("Show", &Ty::int()));
    }

    #[test]
    fn constructors_of_filters_by_adt() {
        let mut table = SymbolTable::new();
        table.define_constructor("Some", Ty::func(vec![Ty::var("T")], Ty::option(Ty::var("T"))), "Option");
        table.define_constructor("None", Ty::option(Ty::var("T")), "Option");
        table.define_constructor("Ok", Ty::func(vec![Ty::var("T")], Ty::result(Ty::var("E"), Ty::var("T"))), "Result");
        assert_eq!(table.constructors_of("Option"), vec!["None", "Some"]);
    }
}
