//! Two-phase module analysis.
//!
//! Phase 1 (headers) registers every top-level signature — types first, so
//! forward references resolve, then traits, then functions, instances and
//! constants — binds imports, finalizes export sets and resolves re-export
//! specs. Phase 2 (bodies) infers and checks every body against the header
//! stubs. Both phases recurse over dependencies and are guarded by the
//! module phase flags, so shared dependencies analyze exactly once.

use rustc_hash::{FxHashMap, FxHashSet};

use funxy_ast::item::{
    ConstDecl, ConstTarget, Decl, FunDecl, FunSig, InstanceDecl, TraitDecl, TypeDecl,
    TypeDeclBody,
};
use funxy_common::{suggest_name, Diagnostic, DiagnosticKind, Span};

use crate::infer::{resolve_type_expr, BodyCtx};
use crate::module::{Module, ModuleId, ModuleStore};
use crate::scope::{InstanceError, Symbol, SymbolKind, SymbolTable};
use crate::traits::{InstanceDef, TraitDef, TraitMethodSig};
use crate::ty::{FuncTy, Kind, Subst, Ty};

/// Drives header and body analysis over a loaded [`ModuleStore`].
pub struct Analyzer<'s> {
    store: &'s mut ModuleStore,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'s> Analyzer<'s> {
    pub fn new(store: &'s mut ModuleStore) -> Self {
        Analyzer {
            store,
            diagnostics: Vec::new(),
        }
    }

    /// Analyze a module and everything it depends on.
    pub fn analyze(&mut self, entry: ModuleId) {
        self.headers(entry);
        self.bodies(entry);
    }

    // ── Phase 1: headers ────────────────────────────────────────────────

    pub fn headers(&mut self, id: ModuleId) {
        {
            let module = self.store.get(id);
            if module.headers_analyzed || module.headers_analyzing {
                return;
            }
        }
        self.store.get_mut(id).headers_analyzing = true;

        // Dependencies complete both phases before this module binds their
        // exports: an exporter's unannotated constants only acquire final
        // types during its body phase, and copies must not carry stale
        // pending stubs. Module cycles are rejected by the loader, so this
        // recursion is well-founded.
        let deps = self.store.get(id).deps.clone();
        for dep in deps {
            self.headers(dep);
            self.bodies(dep);
        }
        let subs = self.store.get(id).submodules.clone();
        for sub in &subs {
            self.headers(*sub);
            self.bodies(*sub);
        }

        let mut module = std::mem::take(self.store.get_mut(id));
        if module.is_group {
            self.group_headers(&mut module);
        } else {
            self.module_headers(&mut module);
        }
        module.headers_analyzing = false;
        module.headers_analyzed = true;
        *self.store.get_mut(id) = module;
    }

    /// A package group's exports are the union of its sub-packages'.
    fn group_headers(&mut self, module: &mut Module) {
        for sub_id in module.submodules.clone() {
            let sub = self.store.get(sub_id);
            let names: Vec<String> = {
                let mut names: Vec<String> = sub.exports.iter().cloned().collect();
                names.sort();
                names
            };
            let copies: Vec<Symbol> = names
                .iter()
                .filter_map(|name| sub.table.root_lookup(name).cloned())
                .collect();
            let sub_name = sub.name.clone();
            module.table.absorb_traits(&self.store.get(sub_id).table);
            for mut sym in copies {
                sym.origin.get_or_insert(sub_name.clone());
                module.exports.insert(sym.name.clone());
                module
                    .export_origins
                    .insert(sym.name.clone(), sym.origin.clone().unwrap_or_default());
                module.table.define_symbol(sym);
            }
        }
    }

    fn module_headers(&mut self, module: &mut Module) {
        self.bind_imports(module);

        let mut local_defs: FxHashSet<String> = FxHashSet::default();
        let mut local_adts: Vec<String> = Vec::new();
        let mut diags = Vec::new();

        // Types first so later signatures see every local type name.
        for file in &module.files {
            for decl in &file.program.decls {
                if let Decl::Type(ty_decl) = decl {
                    predeclare_type(&mut module.table, ty_decl, &mut local_defs, &mut diags, &file.name);
                }
            }
        }
        for file in &module.files {
            for decl in &file.program.decls {
                match decl {
                    Decl::Type(ty_decl) => {
                        register_type(&mut module.table, ty_decl, &mut local_adts, &mut diags, &file.name);
                    }
                    Decl::Trait(trait_decl) => {
                        register_trait(&mut module.table, trait_decl, &mut local_defs, &mut diags, &file.name);
                    }
                    _ => {}
                }
            }
        }
        for file in &module.files {
            for decl in &file.program.decls {
                match decl {
                    Decl::Fun(fun) => {
                        register_fun(&mut module.table, fun, &mut local_defs, &mut diags, &file.name);
                    }
                    Decl::Instance(inst) => {
                        register_instance(&mut module.table, inst, &mut diags, &file.name);
                    }
                    Decl::Const(decl) => {
                        register_const(&mut module.table, decl, &mut local_defs, &mut diags, &file.name);
                    }
                    _ => {}
                }
            }
        }

        if diags.iter().any(|d| d.kind.is_fatal()) {
            module.failed = true;
        }
        self.diagnostics.append(&mut diags);

        // Finalize the export set.
        if module.export_all {
            for name in &local_defs {
                module.exports.insert(name.clone());
                module
                    .export_origins
                    .insert(name.clone(), module.name.clone());
            }
        }
        // Exported ADTs implicitly export their constructors.
        for adt in &local_adts {
            if module.exports.contains(adt) {
                for ctor in module.table.constructors_of(adt) {
                    module.exports.insert(ctor.clone());
                    module
                        .export_origins
                        .insert(ctor, module.name.clone());
                }
            }
        }

        self.resolve_reexports(module);
    }

    /// Bind every import: module alias, qualified copies of the dependency's
    /// exports, selective/wildcard unqualified copies, and trait absorption.
    fn bind_imports(&mut self, module: &mut Module) {
        // Collect the work first; `module.files` stays borrowed otherwise.
        struct ImportBinding {
            dep: ModuleId,
            alias: String,
            symbols: Vec<String>,
            exclude: Vec<String>,
            wildcard: bool,
            file: String,
            span: Span,
        }
        let mut bindings = Vec::new();
        for file in &module.files {
            for import in &file.program.imports {
                let Some(&dep) = module.path_targets.get(&import.path) else {
                    continue;
                };
                let alias = import
                    .alias
                    .clone()
                    .unwrap_or_else(|| self.store.get(dep).default_alias());
                bindings.push(ImportBinding {
                    dep,
                    alias,
                    symbols: import.symbols.clone(),
                    exclude: import.exclude.clone(),
                    wildcard: import.wildcard,
                    file: file.name.clone(),
                    span: import.span,
                });
            }
        }

        for binding in bindings {
            let dep = self.store.get(binding.dep);
            let dep_name = dep.name.clone();
            let mut export_names: Vec<String> = dep.exports.iter().cloned().collect();
            export_names.sort();

            module
                .alias_targets
                .insert(binding.alias.clone(), binding.dep);
            module.table.define_module(&binding.alias, &dep_name);
            module.table.absorb_traits(&self.store.get(binding.dep).table);

            let dep = self.store.get(binding.dep);
            // Qualified copies make `alias.symbol` and `alias.Type` plain
            // table lookups.
            for name in &export_names {
                if let Some(sym) = dep.table.root_lookup(name) {
                    let mut copy = sym.clone();
                    copy.origin.get_or_insert(dep_name.clone());
                    copy.name = format!("{}.{}", binding.alias, name);
                    module.table.define_symbol(copy);
                }
            }

            let mut bring = |module: &mut Module, name: &str| {
                let dep = self.store.get(binding.dep);
                if !dep.exports.contains(name) {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UndefinedSymbol {
                            name: name.to_string(),
                            suggestion: suggest_name(
                                name,
                                export_names.iter().map(String::as_str),
                            ),
                        },
                        binding.file.clone(),
                        binding.span,
                    ));
                    return;
                }
                if let Some(sym) = dep.table.root_lookup(name) {
                    let mut copy = sym.clone();
                    copy.origin.get_or_insert(dep_name.clone());
                    module.table.define_symbol(copy);
                }
            };

            for name in &binding.symbols {
                bring(module, name);
            }
            if binding.wildcard {
                for name in &export_names {
                    if !binding.exclude.contains(name) {
                        bring(module, name);
                    }
                }
            }
        }
    }

    /// Resolve captured re-export specs: copy the named symbols from their
    /// origin modules, preserving provenance, and extend the export set.
    fn resolve_reexports(&mut self, module: &mut Module) {
        for spec in module.reexports.clone() {
            let Some(&dep_id) = module.alias_targets.get(&spec.module_alias) else {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UndefinedSymbol {
                        name: spec.module_alias.clone(),
                        suggestion: None,
                    },
                    module.name.clone(),
                    spec.span,
                ));
                continue;
            };
            let dep = self.store.get(dep_id);
            let dep_name = dep.name.clone();
            let names: Vec<String> = if spec.all {
                let mut names: Vec<String> = dep.exports.iter().cloned().collect();
                names.sort();
                names
            } else {
                spec.names.clone()
            };

            for name in names {
                let dep = self.store.get(dep_id);
                let exported = dep.exports.contains(&name);
                let sym = dep.table.root_lookup(&name).cloned();
                match sym {
                    Some(sym) if exported => {
                        let origin = sym.origin.clone().unwrap_or_else(|| dep_name.clone());
                        if let Some(existing) = module.export_origins.get(&name) {
                            if *existing != origin {
                                self.diagnostics.push(Diagnostic::new(
                                    DiagnosticKind::ExportConflict {
                                        name: name.clone(),
                                        first_origin: existing.clone(),
                                        second_origin: origin.clone(),
                                    },
                                    module.name.clone(),
                                    spec.span,
                                ));
                                continue;
                            }
                        }
                        let mut copy = sym;
                        copy.origin = Some(origin.clone());
                        module.table.define_symbol(copy);
                        module.exports.insert(name.clone());
                        module.export_origins.insert(name, origin);
                    }
                    _ => {
                        let dep = self.store.get(dep_id);
                        let exports: Vec<String> = dep.exports.iter().cloned().collect();
                        self.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::UndefinedSymbol {
                                name: name.clone(),
                                suggestion: suggest_name(
                                    &name,
                                    exports.iter().map(String::as_str),
                                ),
                            },
                            module.name.clone(),
                            spec.span,
                        ));
                    }
                }
            }
        }
    }

    // ── Phase 2: bodies ─────────────────────────────────────────────────

    pub fn bodies(&mut self, id: ModuleId) {
        {
            let module = self.store.get(id);
            if module.bodies_analyzed || module.bodies_analyzing || !module.headers_analyzed {
                return;
            }
        }
        self.store.get_mut(id).bodies_analyzing = true;

        let deps = self.store.get(id).deps.clone();
        for dep in deps {
            self.bodies(dep);
        }
        let subs = self.store.get(id).submodules.clone();
        for sub in subs {
            self.bodies(sub);
        }

        let mut module = std::mem::take(self.store.get_mut(id));
        if !module.failed && !module.is_group {
            let mut diags = Vec::new();
            let mut ctx = BodyCtx::new(&mut module.table, &mut diags, String::new());
            for file in &module.files {
                ctx.file = file.name.clone();
                for decl in &file.program.decls {
                    infer_decl(&mut ctx, decl);
                }
            }
            ctx.check_deferred();
            drop(ctx);
            self.diagnostics.append(&mut diags);
        }
        module.bodies_analyzing = false;
        module.bodies_analyzed = true;
        *self.store.get_mut(id) = module;
    }
}

// ── Header registration ────────────────────────────────────────────────

fn duplicate_check(
    name: &str,
    span: Span,
    local_defs: &mut FxHashSet<String>,
    diags: &mut Vec<Diagnostic>,
    file: &str,
) {
    if !local_defs.insert(name.to_string()) {
        diags.push(Diagnostic::new(
            DiagnosticKind::DuplicateDefinition {
                name: name.to_string(),
            },
            file,
            span,
        ));
    }
}

/// First type pass: claim every type name with its kind so later
/// annotations resolve regardless of declaration order.
fn predeclare_type(
    table: &mut SymbolTable,
    decl: &TypeDecl,
    local_defs: &mut FxHashSet<String>,
    diags: &mut Vec<Diagnostic>,
    file: &str,
) {
    duplicate_check(&decl.name, decl.span, local_defs, diags, file);
    table.define_type(
        &decl.name,
        Ty::con(decl.name.clone()),
        Kind::arrow_n(decl.params.len()),
    );
}

/// Second type pass: alias bodies and ADT constructors.
fn register_type(
    table: &mut SymbolTable,
    decl: &TypeDecl,
    local_adts: &mut Vec<String>,
    diags: &mut Vec<Diagnostic>,
    file: &str,
) {
    table.enter_scope();
    for param in &decl.params {
        table.define_type_param(param);
    }
    match &decl.body {
        TypeDeclBody::Alias(underlying) => {
            let resolved = resolve_type_expr(table, underlying, file, diags);
            table.exit_scope();
            table.define_type_alias(&decl.name, resolved);
            if !decl.params.is_empty() {
                table.define_kind(&decl.name, Kind::arrow_n(decl.params.len()));
            }
        }
        TypeDeclBody::Adt(ctors) => {
            let adt_ty = if decl.params.is_empty() {
                Ty::con(decl.name.clone())
            } else {
                Ty::App(
                    Box::new(Ty::con(decl.name.clone())),
                    decl.params.iter().map(Ty::var).collect(),
                )
            };
            let ctor_sigs: Vec<(String, Ty)> = ctors
                .iter()
                .map(|ctor| {
                    let fields: Vec<Ty> = ctor
                        .fields
                        .iter()
                        .map(|f| resolve_type_expr(table, f, file, diags))
                        .collect();
                    let ty = if fields.is_empty() {
                        adt_ty.clone()
                    } else {
                        Ty::func(fields, adt_ty.clone())
                    };
                    (ctor.name.clone(), ty)
                })
                .collect();
            table.exit_scope();
            for (name, ty) in ctor_sigs {
                table.define_constructor(name, ty, &decl.name);
            }
            local_adts.push(decl.name.clone());
        }
    }
}

/// Resolve a function signature to a [`FuncTy`], minting deterministic stub
/// variables for missing annotations so phase 2 unifies against the same
/// names the headers published.
fn resolve_signature(
    table: &mut SymbolTable,
    sig: &FunSig,
    owner: &str,
    diags: &mut Vec<Diagnostic>,
    file: &str,
) -> FuncTy {
    table.enter_scope();
    for tp in &sig.type_params {
        table.define_type_param(tp);
    }
    let params: Vec<Ty> = sig
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| match &p.ty {
            Some(te) => resolve_type_expr(table, te, file, diags),
            None => Ty::var(format!("?{}#{}", owner, i)),
        })
        .collect();
    let ret = match &sig.ret {
        Some(te) => resolve_type_expr(table, te, file, diags),
        None => Ty::var(format!("?{}#ret", owner)),
    };
    table.exit_scope();
    FuncTy {
        params,
        ret: Box::new(ret),
        variadic: sig.variadic,
        default_count: sig.params.iter().filter(|p| p.default.is_some()).count(),
    }
}

fn register_fun(
    table: &mut SymbolTable,
    decl: &FunDecl,
    local_defs: &mut FxHashSet<String>,
    diags: &mut Vec<Diagnostic>,
    file: &str,
) {
    duplicate_check(&decl.sig.name, decl.span, local_defs, diags, file);
    let sig = resolve_signature(table, &decl.sig, &decl.sig.name, diags, file);
    table.define_pending(&decl.sig.name, Ty::Func(sig));
    if !decl.sig.constraints.is_empty() {
        table.set_fn_constraints(
            &decl.sig.name,
            decl.sig
                .constraints
                .iter()
                .map(|c| (c.param.clone(), c.trait_name.clone()))
                .collect(),
        );
    }
}

fn register_trait(
    table: &mut SymbolTable,
    decl: &TraitDecl,
    local_defs: &mut FxHashSet<String>,
    diags: &mut Vec<Diagnostic>,
    file: &str,
) {
    duplicate_check(&decl.name, decl.span, local_defs, diags, file);
    table.enter_scope();
    for tp in &decl.type_params {
        table.define_type_param(tp);
    }
    let methods: Vec<TraitMethodSig> = decl
        .methods
        .iter()
        .map(|m| {
            let sig = resolve_signature(table, &m.sig, &m.sig.name, diags, file);
            TraitMethodSig {
                name: m.sig.name.clone(),
                ty: Ty::Func(sig),
                has_default: m.default_body.is_some(),
            }
        })
        .collect();
    table.exit_scope();

    // A parameter applied as a type head makes the trait higher-kinded.
    let higher_kinded = methods
        .iter()
        .any(|m| uses_param_as_head(&m.ty, &decl.type_params));
    let def = TraitDef {
        name: decl.name.clone(),
        type_params: decl.type_params.clone(),
        supers: decl.supers.clone(),
        kind: higher_kinded.then(|| Kind::arrow_n(1)),
        methods: methods.clone(),
    };
    table.define_trait(def);

    // Trait methods are plain polymorphic values too, constrained on the
    // trait's parameters.
    let constraints: Vec<(String, String)> = decl
        .type_params
        .iter()
        .map(|tp| (tp.clone(), decl.name.clone()))
        .collect();
    for method in methods {
        // A method named after a user-definable operator binds it to this
        // trait for the current scope chain.
        if crate::traits::USER_OPERATORS.contains(&method.name.as_str()) {
            table.bind_operator(&method.name, &decl.name);
        }
        table.define(&method.name, method.ty.clone());
        table.set_fn_constraints(&method.name, constraints.clone());
    }
}

fn uses_param_as_head(ty: &Ty, params: &[String]) -> bool {
    match ty {
        Ty::App(head, args) => {
            matches!(head.as_ref(), Ty::Var(v) if params.contains(v))
                || uses_param_as_head(head, params)
                || args.iter().any(|a| uses_param_as_head(a, params))
        }
        Ty::Func(func) => {
            func.params.iter().any(|p| uses_param_as_head(p, params))
                || uses_param_as_head(&func.ret, params)
        }
        Ty::Tuple(elems) => elems.iter().any(|e| uses_param_as_head(e, params)),
        Ty::Record { fields, .. } => fields.values().any(|t| uses_param_as_head(t, params)),
        Ty::Union(members) => members.iter().any(|m| uses_param_as_head(m, params)),
        Ty::Type(inner) => uses_param_as_head(inner, params),
        Ty::Var(_) | Ty::Con(_) => false,
    }
}

fn register_instance(
    table: &mut SymbolTable,
    decl: &InstanceDecl,
    diags: &mut Vec<Diagnostic>,
    file: &str,
) {
    let Some(trait_def) = table.trait_def(&decl.trait_name).cloned() else {
        diags.push(Diagnostic::new(
            DiagnosticKind::UndefinedSymbol {
                name: decl.trait_name.clone(),
                suggestion: None,
            },
            file,
            decl.span,
        ));
        return;
    };

    table.enter_scope();
    for tp in &decl.type_params {
        table.define_type_param(tp);
    }
    let target = resolve_type_expr(table, &decl.target, file, diags);

    // Specialized signatures: an annotated method stands on its own; an
    // unannotated one inherits the generic signature with the trait
    // parameter bound to the target.
    let trait_param_subst = trait_def
        .type_params
        .first()
        .map(|tp| Subst::singleton(tp.clone(), target.clone()))
        .unwrap_or_default();
    let mut methods: FxHashMap<String, Ty> = FxHashMap::default();
    for method in &decl.methods {
        let fully_annotated = method.sig.params.iter().all(|p| p.ty.is_some())
            && method.sig.ret.is_some();
        let ty = if fully_annotated {
            Ty::Func(resolve_signature(table, &method.sig, &method.sig.name, diags, file))
        } else {
            match trait_def.method(&method.sig.name) {
                Some(generic) => generic.ty.apply(&trait_param_subst),
                None => Ty::Func(resolve_signature(
                    table,
                    &method.sig,
                    &method.sig.name,
                    diags,
                    file,
                )),
            }
        };
        methods.insert(method.sig.name.clone(), ty);
    }
    table.exit_scope();

    for required in trait_def.required_methods() {
        if !methods.contains_key(required) {
            diags.push(Diagnostic::new(
                DiagnosticKind::MissingTraitMethod {
                    trait_name: decl.trait_name.clone(),
                    method: required.to_string(),
                    target: target.to_string(),
                },
                file,
                decl.span,
            ));
        }
    }

    match table.register_instance(&decl.trait_name, InstanceDef { target: target.clone(), methods }) {
        Ok(()) => {}
        Err(InstanceError::Overlap { existing_target }) => {
            diags.push(Diagnostic::new(
                DiagnosticKind::OverlappingInstances {
                    trait_name: decl.trait_name.clone(),
                    first: existing_target.to_string(),
                    second: target.to_string(),
                },
                file,
                decl.span,
            ));
        }
        Err(InstanceError::UnknownTrait) => unreachable!("trait existence checked above"),
    }
}

fn register_const(
    table: &mut SymbolTable,
    decl: &ConstDecl,
    local_defs: &mut FxHashSet<String>,
    diags: &mut Vec<Diagnostic>,
    file: &str,
) {
    fn stub(table: &mut SymbolTable, name: &str, ty: Ty) {
        table.define_symbol(Symbol {
            name: name.to_string(),
            ty,
            kind: SymbolKind::Value,
            pending: true,
            constant: true,
            origin: None,
            underlying: None,
        });
    }
    match &decl.target {
        ConstTarget::Name(name) => {
            duplicate_check(name, decl.span, local_defs, diags, file);
            let ty = match &decl.ty {
                Some(te) => resolve_type_expr(table, te, file, diags),
                None => Ty::var(format!("?{}#c", name)),
            };
            stub(table, name, ty);
        }
        ConstTarget::Pattern(pat) => {
            let mut names = Vec::new();
            pat.bound_names(&mut names);
            for name in names {
                duplicate_check(&name, decl.span, local_defs, diags, file);
                stub(table, &name, Ty::var(format!("?{}#c", name)));
            }
        }
    }
}

// ── Body inference dispatch ────────────────────────────────────────────

fn infer_decl(ctx: &mut BodyCtx<'_>, decl: &Decl) {
    match decl {
        Decl::Fun(fun) => {
            let stub = match ctx.table.find(&fun.sig.name) {
                Some(sym) => sym.ty.clone(),
                None => return,
            };
            let Ty::Func(sig) = stub else { return };
            let solved = ctx.infer_fun_body(fun, &sig);
            ctx.table.finalize_pending(&fun.sig.name, solved);
        }
        Decl::Const(decl) => {
            let value_ty = ctx.infer_expr(&decl.value);
            match &decl.target {
                ConstTarget::Name(name) => {
                    let stub = ctx
                        .table
                        .find(name)
                        .map(|sym| sym.ty.clone())
                        .unwrap_or_else(|| value_ty.clone());
                    ctx.unify_at(&stub, &value_ty, false, decl.span);
                    let solved = ctx.resolved(&stub);
                    ctx.table.finalize_pending(name, solved);
                }
                ConstTarget::Pattern(pat) => {
                    ctx.check_pattern(pat, &value_ty);
                    // Pattern-bound top-level names are constants.
                    let mut names = Vec::new();
                    pat.bound_names(&mut names);
                    for name in names {
                        let ty = ctx.table.find(&name).map(|sym| sym.ty.clone());
                        if let Some(ty) = ty {
                            ctx.table.define_constant(&name, ty);
                        }
                    }
                }
            }
        }
        Decl::Instance(inst) => infer_instance_bodies(ctx, inst),
        Decl::Trait(decl) => infer_default_bodies(ctx, decl),
        Decl::Type(_) => {}
        Decl::Expr(expr) => {
            let _ = ctx.infer_expr(expr);
        }
    }
}

fn infer_instance_bodies(ctx: &mut BodyCtx<'_>, inst: &InstanceDecl) {
    ctx.table.enter_scope();
    for tp in &inst.type_params {
        ctx.table.define_type_param(tp);
    }
    let target = {
        let te = inst.target.clone();
        let mut scratch = Vec::new();
        let ty = resolve_type_expr(ctx.table, &te, &ctx.file, &mut scratch);
        ctx.diags.extend(scratch);
        ty
    };
    for method in &inst.methods {
        let sig = ctx
            .table
            .specialized_method(&inst.trait_name, &target, &method.sig.name);
        let Some(Ty::Func(func)) = sig else { continue };
        let _ = ctx.infer_fun_body(method, &func);
    }
    ctx.table.exit_scope();
}

fn infer_default_bodies(ctx: &mut BodyCtx<'_>, decl: &TraitDecl) {
    for method in &decl.methods {
        let Some(body) = &method.default_body else {
            continue;
        };
        let sig = ctx
            .table
            .trait_def(&decl.name)
            .and_then(|d| d.method(&method.sig.name).map(|m| m.ty.clone()));
        let Some(Ty::Func(func)) = sig else { continue };
        let synthetic = FunDecl {
            sig: method.sig.clone(),
            body: body.clone(),
            span: method.span,
        };
        let _ = ctx.infer_fun_body(&synthetic, &func);
    }
}
