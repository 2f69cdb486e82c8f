//! Expression and pattern inference.
//!
//! [`BodyCtx`] is the per-module inference state for the analyzer's body
//! phase: it owns the accumulating substitution, the fresh-variable counter
//! and the deferred trait obligations. Analyzer-generated variables are
//! named with a leading `?` so instantiation can tell declaration type
//! parameters (freshened per use) apart from unification variables (shared
//! across the module, which is what makes pending-stub recursion work).

use funxy_ast::expr::{Expr, ForKind, InterpSegment, Lit, MatchArm};
use funxy_ast::item::{Block, ConstTarget, Decl, FunDecl, Param, Stmt};
use funxy_ast::pat::{Pattern, StrSegment};
use funxy_ast::types::TypeExpr;
use funxy_common::{suggest_name, Diagnostic, DiagnosticKind, Span};

use crate::scope::{ResolvedType, SymbolKind, SymbolTable, UpdateError};
use crate::traits::NON_OVERRIDABLE;
use crate::ty::{FuncTy, Subst, Ty};
use crate::unify::unify;

/// A trait obligation that could not be checked yet because the operand was
/// still a free variable.
#[derive(Debug, Clone)]
pub struct Deferred {
    pub trait_name: String,
    pub ty: Ty,
    pub operator: Option<String>,
    pub span: Span,
}

// ── Type expression resolution ─────────────────────────────────────────

/// Resolve a surface type expression against the symbol table. Undefined
/// names and kind mismatches are reported but resolution continues with a
/// bare constructor so one bad annotation doesn't cascade.
pub fn resolve_type_expr(
    table: &SymbolTable,
    te: &TypeExpr,
    file: &str,
    diags: &mut Vec<Diagnostic>,
) -> Ty {
    match te {
        TypeExpr::Named { name, args, span } => {
            let resolved_args: Vec<Ty> = args
                .iter()
                .map(|a| resolve_type_expr(table, a, file, diags))
                .collect();
            let base = match table.resolve_type(name) {
                Some(ResolvedType::Found(ty)) => ty,
                Some(ResolvedType::Fallback(ty)) => {
                    diags.push(Diagnostic::new(
                        DiagnosticKind::Warning {
                            message: format!(
                                "type `{}` resolved through a placeholder; treating it as `{}`",
                                name, ty
                            ),
                        },
                        file,
                        *span,
                    ));
                    ty
                }
                None => {
                    let names = table.all_names();
                    diags.push(Diagnostic::new(
                        DiagnosticKind::UndefinedSymbol {
                            name: name.clone(),
                            suggestion: suggest_name(name, names.iter().map(String::as_str)),
                        },
                        file,
                        *span,
                    ));
                    Ty::con(name.clone())
                }
            };
            // Kind check actual applications when the constructor's kind is
            // known. Bare references to higher-kinded constructors
            // (`instance Functor Result`) are legitimate, and type
            // parameters used as heads stay unchecked.
            if let Some(kind) = table.kind_of(name) {
                if !resolved_args.is_empty() && kind.arity() != resolved_args.len() {
                    diags.push(Diagnostic::new(
                        DiagnosticKind::KindMismatch {
                            ty: name.clone(),
                            expected: kind.to_string(),
                            found: crate::ty::Kind::arrow_n(resolved_args.len()).to_string(),
                        },
                        file,
                        *span,
                    ));
                }
            }
            if resolved_args.is_empty() {
                base
            } else {
                Ty::App(Box::new(base), resolved_args)
            }
        }
        TypeExpr::Tuple { elems, .. } => Ty::Tuple(
            elems
                .iter()
                .map(|e| resolve_type_expr(table, e, file, diags))
                .collect(),
        ),
        TypeExpr::Record { fields, open, .. } => Ty::Record {
            fields: fields
                .iter()
                .map(|(n, t)| (n.clone(), resolve_type_expr(table, t, file, diags)))
                .collect(),
            open: *open,
        },
        TypeExpr::Func {
            params,
            ret,
            variadic,
            ..
        } => Ty::Func(FuncTy {
            params: params
                .iter()
                .map(|p| resolve_type_expr(table, p, file, diags))
                .collect(),
            ret: Box::new(resolve_type_expr(table, ret, file, diags)),
            variadic: *variadic,
            default_count: 0,
        }),
        TypeExpr::Union { members, .. } => Ty::union(
            members
                .iter()
                .map(|m| resolve_type_expr(table, m, file, diags))
                .collect(),
        ),
        TypeExpr::Optional { inner, .. } => {
            Ty::optional(resolve_type_expr(table, inner, file, diags))
        }
    }
}

// ── Body inference context ─────────────────────────────────────────────

/// Per-module inference state for the body phase. One context spans every
/// body in the module so pending-stub variables solve consistently across
/// mutually recursive bindings.
pub struct BodyCtx<'a> {
    pub table: &'a mut SymbolTable,
    pub diags: &'a mut Vec<Diagnostic>,
    pub file: String,
    pub subst: Subst,
    pub fresh: u32,
    pub deferred: Vec<Deferred>,
    /// Break-value types for each enclosing loop.
    breaks: Vec<Vec<Ty>>,
    /// Declared/inferred return types of enclosing functions.
    ret_stack: Vec<Ty>,
}

impl<'a> BodyCtx<'a> {
    pub fn new(table: &'a mut SymbolTable, diags: &'a mut Vec<Diagnostic>, file: String) -> Self {
        BodyCtx {
            table,
            diags,
            file,
            subst: Subst::new(),
            fresh: 0,
            deferred: Vec::new(),
            breaks: Vec::new(),
            ret_stack: Vec::new(),
        }
    }

    pub fn fresh_var(&mut self) -> Ty {
        let ty = Ty::var(format!("?{}", self.fresh));
        self.fresh += 1;
        ty
    }

    /// Freshen the declaration-level type parameters of a symbol's type.
    /// Analyzer variables (leading `?`) are left alone: they are shared
    /// unification state, not quantified parameters.
    pub fn instantiate(&mut self, ty: &Ty) -> Ty {
        let mut mapping = Subst::new();
        for var in ty.free_vars() {
            if !var.starts_with('?') {
                let fresh = self.fresh_var();
                mapping.insert(var, fresh);
            }
        }
        ty.apply(&mapping)
    }

    /// Like [`instantiate`](Self::instantiate) but reports which fresh
    /// variable each declared parameter became, for constraint checking.
    pub fn instantiate_mapped(&mut self, ty: &Ty) -> (Ty, Vec<(String, String)>) {
        let mut mapping = Subst::new();
        let mut names = Vec::new();
        for var in ty.free_vars() {
            if !var.starts_with('?') {
                let fresh = self.fresh_var();
                if let Ty::Var(fresh_name) = &fresh {
                    names.push((var.clone(), fresh_name.clone()));
                }
                mapping.insert(var, fresh);
            }
        }
        (ty.apply(&mapping), names)
    }

    /// The current best view of a type under the accumulated substitution.
    pub fn resolved(&self, ty: &Ty) -> Ty {
        ty.apply(&self.subst)
    }

    /// Unify under the accumulated substitution; failures become
    /// diagnostics and inference carries on.
    pub fn unify_at(&mut self, expected: &Ty, actual: &Ty, allow_extra: bool, span: Span) {
        let e = expected.apply(&self.subst);
        let a = actual.apply(&self.subst);
        match unify(&e, &a, allow_extra) {
            Ok(s) => self.subst = self.subst.compose(&s),
            Err(err) => self
                .diags
                .push(err.into_diagnostic(self.file.clone(), span)),
        }
    }

    fn undefined(&mut self, name: &str, span: Span) {
        let names = self.table.all_names();
        self.diags.push(Diagnostic::new(
            DiagnosticKind::UndefinedSymbol {
                name: name.to_string(),
                suggestion: suggest_name(name, names.iter().map(String::as_str)),
            },
            self.file.clone(),
            span,
        ));
    }

    fn resolve_ty_expr(&mut self, te: &TypeExpr) -> Ty {
        resolve_type_expr(self.table, te, &self.file, self.diags)
    }

    // ── Trait obligations ───────────────────────────────────────────────

    /// Check that `ty` has an instance of `trait_name` (and of its
    /// super-traits, transitively). Free variables defer the obligation.
    pub fn require_instance(
        &mut self,
        trait_name: &str,
        ty: &Ty,
        operator: Option<&str>,
        span: Span,
    ) {
        let resolved = self.resolved(ty);
        if matches!(resolved, Ty::Var(_)) {
            self.deferred.push(Deferred {
                trait_name: trait_name.to_string(),
                ty: resolved,
                operator: operator.map(str::to_string),
                span,
            });
            return;
        }
        if !self.table.implementation_exists(trait_name, &resolved) {
            self.diags.push(Diagnostic::new(
                DiagnosticKind::MissingInstance {
                    trait_name: trait_name.to_string(),
                    ty: resolved.to_string(),
                    operator: operator.map(str::to_string),
                },
                self.file.clone(),
                span,
            ));
            return;
        }
        // Super-trait obligations are the analyzer's to discharge.
        let supers: Vec<String> = self
            .table
            .trait_def(trait_name)
            .map(|d| d.supers.clone())
            .unwrap_or_default();
        for sup in supers {
            self.require_instance(&sup, &resolved, operator, span);
        }
    }

    /// Re-validate obligations that were deferred on free variables, once
    /// the module's substitution is final.
    pub fn check_deferred(&mut self) {
        let deferred = std::mem::take(&mut self.deferred);
        for ob in deferred {
            let resolved = self.resolved(&ob.ty);
            if matches!(resolved, Ty::Var(_)) {
                // Never instantiated to anything concrete; nothing to check.
                continue;
            }
            if !self.table.implementation_exists(&ob.trait_name, &resolved) {
                self.diags.push(Diagnostic::new(
                    DiagnosticKind::MissingInstance {
                        trait_name: ob.trait_name.clone(),
                        ty: resolved.to_string(),
                        operator: ob.operator.clone(),
                    },
                    self.file.clone(),
                    ob.span,
                ));
            }
        }
    }

    // ── Functions ───────────────────────────────────────────────────────

    /// Bind a parameter list in the current scope, returning the parameter
    /// types in order. Variadic last parameters bind as `List<T>` inside
    /// the body while the signature carries the element type.
    pub fn bind_params(&mut self, params: &[Param], variadic: bool, sig: &[Ty]) {
        for (i, param) in params.iter().enumerate() {
            let ty = sig.get(i).cloned().unwrap_or_else(|| self.fresh_var());
            if let Some(default) = &param.default {
                let default_ty = self.infer_expr(default);
                self.unify_at(&ty, &default_ty, false, param.span);
            }
            let bound = if variadic && i == params.len() - 1 {
                Ty::list(ty)
            } else {
                ty
            };
            self.table.define(&param.name, bound);
        }
    }

    /// Infer a function body against its signature stub and return the
    /// solved signature (the stub with the module substitution applied).
    ///
    /// The stub's declaration-level type parameters are instantiated to
    /// fresh variables first: parameter names like `T` repeat across the
    /// whole module, and binding them directly would leak one body's
    /// solution into every other. Stub variables (`?f#0`) are left shared —
    /// that sharing is what makes mutual recursion against pending symbols
    /// work. Type parameters named in body annotations resolve to the same
    /// fresh variables through the scope's type map.
    pub fn infer_fun_body(&mut self, decl: &FunDecl, sig: &FuncTy) -> Ty {
        let (inst, mapping) = self.instantiate_mapped(&Ty::Func(sig.clone()));
        let Ty::Func(inst_sig) = inst else {
            unreachable!("instantiation preserves the function shape")
        };
        self.table.enter_scope();
        for (orig, fresh) in &mapping {
            self.table
                .define_type(orig, Ty::var(fresh.clone()), crate::ty::Kind::Star);
        }
        for tp in &decl.sig.type_params {
            if !mapping.iter().any(|(orig, _)| orig == tp) {
                self.table.define_type_param(tp);
            }
        }
        self.bind_params(&decl.sig.params, inst_sig.variadic, &inst_sig.params);
        self.ret_stack.push((*inst_sig.ret).clone());
        let body_ty = self.infer_block(&decl.body);
        self.unify_at(&inst_sig.ret, &body_ty, true, decl.span);
        self.ret_stack.pop();
        self.table.exit_scope();
        self.resolved(&Ty::Func(sig.clone()))
    }

    // ── Blocks and statements ───────────────────────────────────────────

    pub fn infer_block(&mut self, block: &Block) -> Ty {
        self.table.enter_scope();
        let mut last = Ty::nil();
        for stmt in &block.stmts {
            last = self.infer_stmt(stmt);
        }
        self.table.exit_scope();
        last
    }

    fn infer_stmt(&mut self, stmt: &Stmt) -> Ty {
        match stmt {
            Stmt::Expr(expr) => self.infer_expr(expr),
            Stmt::Decl(Decl::Const(decl)) => {
                let value_ty = self.infer_expr(&decl.value);
                let declared = decl.ty.as_ref().map(|te| self.resolve_ty_expr(te));
                if let Some(declared) = &declared {
                    self.unify_at(declared, &value_ty, false, decl.span);
                }
                let bound = declared.unwrap_or(value_ty);
                match &decl.target {
                    ConstTarget::Name(name) => {
                        let solved = self.resolved(&bound);
                        self.table.define_constant(name, solved);
                    }
                    ConstTarget::Pattern(pat) => self.check_pattern(pat, &bound),
                }
                Ty::nil()
            }
            Stmt::Decl(Decl::Fun(decl)) => {
                // Local function: build its signature, bind it, then check
                // the body against it.
                let sig = self.local_fun_sig(decl);
                self.table
                    .define(&decl.sig.name, Ty::Func(sig.clone()));
                let solved = self.infer_fun_body(decl, &sig);
                self.table.finalize_pending(&decl.sig.name, solved);
                Ty::nil()
            }
            Stmt::Decl(Decl::Expr(expr)) => self.infer_expr(expr),
            Stmt::Decl(other) => {
                self.diags.push(Diagnostic::new(
                    DiagnosticKind::Warning {
                        message: "this declaration is only meaningful at the top level"
                            .to_string(),
                    },
                    self.file.clone(),
                    other.span(),
                ));
                Ty::nil()
            }
        }
    }

    fn local_fun_sig(&mut self, decl: &FunDecl) -> FuncTy {
        self.table.enter_scope();
        for tp in &decl.sig.type_params {
            self.table.define_type_param(tp);
        }
        let params: Vec<Ty> = decl
            .sig
            .params
            .iter()
            .map(|p| match &p.ty {
                Some(te) => self.resolve_ty_expr(te),
                None => self.fresh_var(),
            })
            .collect();
        let ret = match &decl.sig.ret {
            Some(te) => self.resolve_ty_expr(te),
            None => self.fresh_var(),
        };
        self.table.exit_scope();
        FuncTy {
            params,
            ret: Box::new(ret),
            variadic: decl.sig.variadic,
            default_count: decl.sig.params.iter().filter(|p| p.default.is_some()).count(),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    pub fn infer_expr(&mut self, expr: &Expr) -> Ty {
        match expr {
            Expr::Ident { name, span } => {
                let found = self.table.find(name).map(|sym| sym.ty.clone());
                match found {
                    Some(ty) => self.instantiate(&ty),
                    None => {
                        // An identifier that names a type is a first-class
                        // type value, as in `read(s, Int)`.
                        if let Some(resolved) = self.table.resolve_type(name) {
                            return Ty::Type(Box::new(resolved.ty()));
                        }
                        self.undefined(name, *span);
                        self.fresh_var()
                    }
                }
            }
            Expr::Lit { lit, .. } => self.infer_lit(lit),
            Expr::Tuple { elems, .. } => {
                let tys = elems.iter().map(|e| self.infer_expr(e)).collect();
                Ty::Tuple(tys)
            }
            Expr::List { elems, .. } => {
                let elem_ty = self.fresh_var();
                for e in elems {
                    if let Expr::Spread { operand, span } = e {
                        let spread_ty = self.infer_expr(operand);
                        self.unify_at(&Ty::list(elem_ty.clone()), &spread_ty, false, *span);
                    } else {
                        let ty = self.infer_expr(e);
                        self.unify_at(&elem_ty, &ty, false, e.span());
                    }
                }
                Ty::list(self.resolved(&elem_ty))
            }
            Expr::Record {
                fields,
                spread,
                span,
            } => self.infer_record(fields, spread.as_deref(), *span),
            Expr::Map { entries, .. } => {
                let key_ty = self.fresh_var();
                let val_ty = self.fresh_var();
                for (k, v) in entries {
                    let kt = self.infer_expr(k);
                    self.unify_at(&key_ty, &kt, false, k.span());
                    let vt = self.infer_expr(v);
                    self.unify_at(&val_ty, &vt, false, v.span());
                }
                Ty::map(self.resolved(&key_ty), self.resolved(&val_ty))
            }
            Expr::Index {
                target,
                index,
                span,
            } => self.infer_index(target, index, *span),
            Expr::Member {
                target,
                name,
                optional,
                span,
            } => self.infer_member(target, name, *optional, *span),
            Expr::Prefix { op, operand, span } => self.infer_prefix(op, operand, *span),
            Expr::Infix { op, lhs, rhs, span } => self.infer_infix(op, lhs, rhs, *span),
            Expr::Postfix { op, operand, span } => self.infer_postfix(op, operand, *span),
            Expr::Assign {
                target,
                value,
                span,
            } => self.infer_assign(target, value, *span),
            Expr::PatternAssign {
                pattern,
                value,
                ..
            } => {
                let value_ty = self.infer_expr(value);
                self.check_pattern(pattern, &value_ty);
                value_ty
            }
            Expr::Call { callee, args, span } => self.infer_call(callee, args, *span),
            Expr::Spread { operand, .. } => self.infer_expr(operand),
            Expr::TypeApp {
                target,
                args,
                span,
            } => self.infer_type_app(target, args, *span),
            Expr::Annotated { expr, ty, span } => {
                let declared = self.resolve_ty_expr(ty);
                let declared = self.table.resolve_type_alias(&declared);
                let inferred = self.infer_expr(expr);
                self.unify_at(&declared, &inferred, false, *span);
                self.resolved(&declared)
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
                span,
            } => {
                let cond_ty = self.infer_expr(cond);
                self.unify_at(&Ty::bool(), &cond_ty, false, cond.span());
                let then_ty = self.infer_block(then_branch);
                match else_branch {
                    Some(else_expr) => {
                        let else_ty = self.infer_expr(else_expr);
                        self.unify_at(&then_ty, &else_ty, false, *span);
                        self.resolved(&then_ty)
                    }
                    // Without an else the if may produce nothing.
                    None => Ty::optional(self.resolved(&then_ty)),
                }
            }
            Expr::Match {
                scrutinee, arms, ..
            } => self.infer_match(scrutinee, arms),
            Expr::For { kind, body, .. } => self.infer_for(kind, body),
            Expr::Break { value, span } => {
                let ty = match value {
                    Some(v) => self.infer_expr(v),
                    None => Ty::nil(),
                };
                match self.breaks.last_mut() {
                    Some(frame) => frame.push(ty),
                    None => self.diags.push(Diagnostic::new(
                        DiagnosticKind::Syntax {
                            message: "`break` outside of a loop".to_string(),
                        },
                        self.file.clone(),
                        *span,
                    )),
                }
                Ty::nil()
            }
            Expr::Continue { span } => {
                if self.breaks.is_empty() {
                    self.diags.push(Diagnostic::new(
                        DiagnosticKind::Syntax {
                            message: "`continue` outside of a loop".to_string(),
                        },
                        self.file.clone(),
                        *span,
                    ));
                }
                Ty::nil()
            }
            Expr::FnLit {
                params,
                variadic,
                ret,
                body,
                ..
            } => self.infer_fn_lit(params, *variadic, ret.as_ref(), body),
            Expr::Block(block) => self.infer_block(block),
        }
    }

    fn infer_lit(&mut self, lit: &Lit) -> Ty {
        match lit {
            Lit::Int(_) => Ty::int(),
            Lit::BigInt(_) => Ty::con("BigInt"),
            Lit::Rational(_) => Ty::con("Rational"),
            Lit::Float(_) => Ty::float(),
            Lit::Char(_) => Ty::char(),
            Lit::Str(_) => Ty::string(),
            Lit::Interp(segments) => {
                for seg in segments {
                    if let InterpSegment::Expr(e) = seg {
                        // Interpolated pieces may be any showable value.
                        let _ = self.infer_expr(e);
                    }
                }
                Ty::string()
            }
            Lit::Bytes(_) => Ty::con("Bytes"),
            Lit::Bits(_) => Ty::con("Bits"),
            Lit::Bool(_) => Ty::bool(),
            Lit::Nil => Ty::nil(),
        }
    }

    fn infer_record(
        &mut self,
        fields: &[(String, Expr)],
        spread: Option<&Expr>,
        span: Span,
    ) -> Ty {
        let mut out: std::collections::BTreeMap<String, Ty> = Default::default();
        if let Some(base) = spread {
            let base_ty = self.infer_expr(base);
            let base_ty = self.resolved(&base_ty);
            match self.table.resolve_type_alias(&base_ty) {
                Ty::Record { fields, .. } => {
                    out.extend(fields);
                }
                other => {
                    // Spreading a non-record is a mismatch against an open
                    // record of the literal fields.
                    self.unify_at(
                        &Ty::Record {
                            fields: Default::default(),
                            open: true,
                        },
                        &other,
                        false,
                        span,
                    );
                }
            }
        }
        for (name, value) in fields {
            let ty = self.infer_expr(value);
            out.insert(name.clone(), self.resolved(&ty));
        }
        Ty::Record {
            fields: out,
            open: false,
        }
    }

    fn infer_index(&mut self, target: &Expr, index: &Expr, span: Span) -> Ty {
        let target_ty = self.infer_expr(target);
        let index_ty = self.infer_expr(index);
        let resolved = self.table.resolve_type_alias(&self.resolved(&target_ty));
        match &resolved {
            Ty::App(head, args) => match head.as_ref() {
                Ty::Con(con) if con.name == "List" => {
                    self.unify_at(&Ty::int(), &index_ty, false, index.span());
                    args[0].clone()
                }
                Ty::Con(con) if con.name == "Map" => {
                    self.unify_at(&args[0], &index_ty, false, index.span());
                    Ty::optional(args[1].clone())
                }
                _ => {
                    self.unify_at(&Ty::int(), &index_ty, false, index.span());
                    self.fresh_var()
                }
            },
            Ty::Tuple(elems) => {
                if let Expr::Lit {
                    lit: Lit::Int(i), ..
                } = index
                {
                    let idx = *i as usize;
                    if idx < elems.len() {
                        return elems[idx].clone();
                    }
                }
                self.unify_at(&Ty::int(), &index_ty, false, index.span());
                self.fresh_var()
            }
            Ty::Con(con) if con.name == "Bytes" => {
                self.unify_at(&Ty::int(), &index_ty, false, index.span());
                Ty::int()
            }
            _ => {
                // Unknown target: constrain it to be a list of something.
                let elem = self.fresh_var();
                self.unify_at(&Ty::list(elem.clone()), &resolved, false, span);
                self.unify_at(&Ty::int(), &index_ty, false, index.span());
                self.resolved(&elem)
            }
        }
    }

    fn infer_member(&mut self, target: &Expr, name: &str, optional: bool, span: Span) -> Ty {
        // Module-qualified access: `alias.symbol`.
        if let Expr::Ident {
            name: alias,
            span: alias_span,
        } = target
        {
            if matches!(
                self.table.find(alias),
                Some(sym) if sym.kind == SymbolKind::Module
            ) {
                let qualified = format!("{}.{}", alias, name);
                let found = self.table.find(&qualified).map(|sym| sym.ty.clone());
                return match found {
                    Some(ty) => self.instantiate(&ty),
                    None => {
                        self.undefined(&qualified, *alias_span);
                        self.fresh_var()
                    }
                };
            }
        }

        let target_ty = self.infer_expr(target);
        let mut resolved = self.resolved(&target_ty);

        // `?.` strips Nil from the receiver and wraps the result back.
        let mut rewrap = false;
        if optional {
            if let Ty::Union(members) = &resolved {
                let non_nil: Vec<Ty> = members
                    .iter()
                    .filter(|m| **m != Ty::nil())
                    .cloned()
                    .collect();
                if non_nil.len() < members.len() {
                    rewrap = true;
                    resolved = Ty::union(non_nil);
                }
            }
        }

        let member_ty = self.member_on(&resolved, name, span);
        if rewrap {
            Ty::optional(member_ty)
        } else {
            member_ty
        }
    }

    fn member_on(&mut self, receiver: &Ty, name: &str, span: Span) -> Ty {
        let structural = self.table.resolve_type_alias(receiver);

        // 1. Record fields.
        if let Ty::Record { fields, .. } = &structural {
            if let Some(ty) = fields.get(name) {
                return ty.clone();
            }
        }
        // An unresolved receiver gets constrained to an open record with
        // this field.
        if matches!(structural, Ty::Var(_)) {
            let field_ty = self.fresh_var();
            let want = Ty::Record {
                fields: [(name.to_string(), field_ty.clone())].into_iter().collect(),
                open: true,
            };
            self.unify_at(&want, &structural, false, span);
            return self.resolved(&field_ty);
        }

        // 2. Extension methods, receiver becomes the first argument.
        if let Some(head) = type_head_name(receiver) {
            if let Some(ext) = self.table.extension_method(&head, name).cloned() {
                let inst = self.instantiate(&ext);
                return self.apply_receiver(&inst, receiver, span);
            }
        }

        // 3. Trait methods with a matching instance.
        let candidates: Vec<(String, Ty)> = {
            let mut out = Vec::new();
            for (trait_name, _) in self.table.all_implementations() {
                if let Some(def) = self.table.trait_def(&trait_name) {
                    if let Some(method) = def.method(name) {
                        out.push((trait_name.clone(), method.ty.clone()));
                    }
                }
            }
            out
        };
        for (trait_name, method_ty) in candidates {
            if self.table.implementation_exists(&trait_name, receiver) {
                let sig = self
                    .table
                    .specialized_method(&trait_name, receiver, name)
                    .unwrap_or(method_ty);
                let inst = self.instantiate(&sig);
                return self.apply_receiver(&inst, receiver, span);
            }
        }

        self.undefined(name, span);
        self.fresh_var()
    }

    /// Bind a function type's first parameter to a receiver, yielding the
    /// partially applied function.
    fn apply_receiver(&mut self, func_ty: &Ty, receiver: &Ty, span: Span) -> Ty {
        match func_ty {
            Ty::Func(func) if !func.params.is_empty() => {
                self.unify_at(&func.params[0], receiver, false, span);
                let rest = FuncTy {
                    params: func.params[1..].to_vec(),
                    ret: func.ret.clone(),
                    variadic: func.variadic,
                    default_count: func.default_count.min(func.params.len() - 1),
                };
                self.resolved(&Ty::Func(rest))
            }
            other => other.clone(),
        }
    }

    fn infer_prefix(&mut self, op: &str, operand: &Expr, span: Span) -> Ty {
        let operand_ty = self.infer_expr(operand);
        match op {
            "!" => {
                self.unify_at(&Ty::bool(), &operand_ty, false, span);
                Ty::bool()
            }
            "-" | "+" => {
                self.require_instance("Numeric", &operand_ty, Some(op), span);
                self.resolved(&operand_ty)
            }
            "~" => {
                self.require_instance("Bitwise", &operand_ty, Some(op), span);
                self.resolved(&operand_ty)
            }
            _ => {
                self.undefined(op, span);
                self.fresh_var()
            }
        }
    }

    fn infer_postfix(&mut self, op: &str, operand: &Expr, span: Span) -> Ty {
        let operand_ty = self.infer_expr(operand);
        match op {
            // `x?` unwraps an optional, for use inside optional-returning
            // functions.
            "?" => {
                let inner = self.fresh_var();
                self.unify_at(&Ty::optional(inner.clone()), &operand_ty, false, span);
                self.resolved(&inner)
            }
            _ => {
                self.undefined(op, span);
                self.fresh_var()
            }
        }
    }

    fn infer_infix(&mut self, op: &str, lhs: &Expr, rhs: &Expr, span: Span) -> Ty {
        // Fixed-meaning operators first.
        match op {
            "&&" | "||" => {
                let l = self.infer_expr(lhs);
                self.unify_at(&Ty::bool(), &l, false, lhs.span());
                let r = self.infer_expr(rhs);
                self.unify_at(&Ty::bool(), &r, false, rhs.span());
                return Ty::bool();
            }
            "::" => {
                let head = self.infer_expr(lhs);
                let tail = self.infer_expr(rhs);
                self.unify_at(&Ty::list(head.clone()), &tail, false, span);
                return self.resolved(&tail);
            }
            "|>" => {
                let value = self.infer_expr(lhs);
                let func = self.infer_expr(rhs);
                let out = self.fresh_var();
                self.unify_at(&Ty::func(vec![value], out.clone()), &func, false, span);
                return self.resolved(&out);
            }
            ",," => {
                // Composition: (a -> b) ,, (b -> c) reads left to right.
                let f = self.infer_expr(lhs);
                let g = self.infer_expr(rhs);
                let a = self.fresh_var();
                let b = self.fresh_var();
                let c = self.fresh_var();
                self.unify_at(&Ty::func(vec![a.clone()], b.clone()), &f, false, lhs.span());
                self.unify_at(&Ty::func(vec![b], c.clone()), &g, false, rhs.span());
                return self.resolved(&Ty::func(vec![a], c));
            }
            "$" => {
                let func = self.infer_expr(lhs);
                let arg = self.infer_expr(rhs);
                let out = self.fresh_var();
                self.unify_at(&Ty::func(vec![arg], out.clone()), &func, false, span);
                return self.resolved(&out);
            }
            _ => {}
        }

        let lhs_ty = self.infer_expr(lhs);
        let rhs_ty = self.infer_expr(rhs);

        let trait_name = match self.table.operator_trait(op) {
            Some(t) => t.to_string(),
            None => {
                if NON_OVERRIDABLE.contains(&op) {
                    // Fixed operator with no special handling above.
                    self.unify_at(&lhs_ty, &rhs_ty, false, span);
                    return self.resolved(&lhs_ty);
                }
                self.undefined(op, span);
                return self.fresh_var();
            }
        };

        // Dispatch through the trait's method signature for this operator.
        let method_ty = self
            .table
            .trait_def(&trait_name)
            .and_then(|def| def.method(op).map(|m| m.ty.clone()));
        let result = match method_ty {
            Some(sig) => {
                let inst = self.instantiate(&sig);
                match inst {
                    Ty::Func(func) if func.params.len() == 2 => {
                        self.unify_at(&func.params[0], &lhs_ty, false, lhs.span());
                        self.unify_at(&func.params[1], &rhs_ty, false, rhs.span());
                        self.resolved(&func.ret)
                    }
                    other => other,
                }
            }
            None => {
                self.unify_at(&lhs_ty, &rhs_ty, false, span);
                self.resolved(&lhs_ty)
            }
        };

        self.require_instance(&trait_name, &lhs_ty, Some(op), span);
        result
    }

    fn infer_assign(&mut self, target: &Expr, value: &Expr, span: Span) -> Ty {
        let value_ty = self.infer_expr(value);
        match target {
            Expr::Ident { name, span } => {
                let declared = self.table.find(name).map(|sym| sym.ty.clone());
                match declared {
                    Some(declared) => {
                        self.unify_at(&declared, &value_ty, false, *span);
                        let solved = self.resolved(&declared);
                        if let Err(UpdateError::Constant) = self.table.update(name, solved) {
                            self.diags.push(Diagnostic::new(
                                DiagnosticKind::ConstantReassignment { name: name.clone() },
                                self.file.clone(),
                                *span,
                            ));
                        }
                    }
                    None => {
                        // First assignment introduces the binding.
                        let solved = self.resolved(&value_ty);
                        self.table.define(name, solved);
                    }
                }
            }
            Expr::Member { .. } | Expr::Index { .. } => {
                let target_ty = self.infer_expr(target);
                self.unify_at(&target_ty, &value_ty, false, span);
            }
            other => {
                self.diags.push(Diagnostic::new(
                    DiagnosticKind::Syntax {
                        message: "invalid assignment target".to_string(),
                    },
                    self.file.clone(),
                    other.span(),
                ));
            }
        }
        self.resolved(&value_ty)
    }

    fn infer_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Ty {
        let callee_ty = self.infer_expr(callee);
        let constraints: Vec<(String, String)> = match callee {
            Expr::Ident { name, .. } => self
                .table
                .fn_constraints(name)
                .map(|c| c.to_vec())
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        // Instantiation happened inside infer_expr for Ident callees, so the
        // constraint parameter names must be re-derived from the signature.
        // Re-instantiate with a mapping when constraints exist.
        let (callee_ty, param_map) = if constraints.is_empty() {
            (callee_ty, Vec::new())
        } else if let Expr::Ident { name, .. } = callee {
            let found = self.table.find(name).map(|sym| sym.ty.clone());
            match found {
                Some(ty) => self.instantiate_mapped(&ty),
                None => (callee_ty, Vec::new()),
            }
        } else {
            (callee_ty, Vec::new())
        };

        let resolved_callee = self.resolved(&callee_ty);
        let result = match resolved_callee {
            Ty::Func(func) => self.check_call_args(&func, args, span),
            Ty::Var(_) => {
                let arg_tys: Vec<Ty> = args.iter().map(|a| self.infer_expr(a)).collect();
                let out = self.fresh_var();
                self.unify_at(
                    &Ty::func(arg_tys, out.clone()),
                    &resolved_callee,
                    false,
                    span,
                );
                self.resolved(&out)
            }
            other => {
                self.diags.push(Diagnostic::new(
                    DiagnosticKind::UnificationFailure {
                        expected: "a function".to_string(),
                        actual: other.to_string(),
                        context: Some("call target is not callable".to_string()),
                    },
                    self.file.clone(),
                    span,
                ));
                for a in args {
                    let _ = self.infer_expr(a);
                }
                self.fresh_var()
            }
        };

        // Discharge declared constraints, including super-traits.
        for (param_name, trait_name) in constraints {
            if let Some((_, fresh_name)) = param_map.iter().find(|(p, _)| *p == param_name) {
                let bound = self.resolved(&Ty::var(fresh_name.clone()));
                self.require_instance(&trait_name, &bound, None, span);
            }
        }

        result
    }

    /// Unify call arguments against a known function signature, honoring
    /// trailing defaults and variadics. Records pass with width subtyping.
    fn check_call_args(&mut self, func: &FuncTy, args: &[Expr], span: Span) -> Ty {
        let max = func.params.len();
        let required = max - func.default_count.min(max);

        if func.variadic {
            // The variadic tail accepts zero or more arguments.
            let fixed = max.saturating_sub(1);
            if args.len() < required.min(fixed) {
                self.arity_error(required.min(fixed), args.len(), span);
            }
            for (i, arg) in args.iter().enumerate() {
                let expected = if i < fixed {
                    func.params[i].clone()
                } else {
                    func.params[max - 1].clone()
                };
                if let Expr::Spread { operand, span } = arg {
                    let spread_ty = self.infer_expr(operand);
                    self.unify_at(&Ty::list(expected), &spread_ty, true, *span);
                } else {
                    let ty = self.infer_expr(arg);
                    self.unify_at(&expected, &ty, true, arg.span());
                }
            }
        } else {
            if args.len() < required || args.len() > max {
                self.arity_error(required, args.len(), span);
            }
            for (i, arg) in args.iter().enumerate() {
                let ty = self.infer_expr(arg);
                if let Some(expected) = func.params.get(i) {
                    self.unify_at(expected, &ty, true, arg.span());
                }
            }
        }
        self.resolved(&func.ret)
    }

    fn arity_error(&mut self, expected: usize, found: usize, span: Span) {
        self.diags.push(Diagnostic::new(
            DiagnosticKind::UnificationFailure {
                expected: format!("{} arguments", expected),
                actual: format!("{} arguments", found),
                context: Some("call arity".to_string()),
            },
            self.file.clone(),
            span,
        ));
    }

    fn infer_type_app(&mut self, target: &Expr, args: &[TypeExpr], span: Span) -> Ty {
        // Explicit instantiation: replace the symbol's declared parameters
        // with the given types, in declaration order.
        if let Expr::Ident { name, .. } = target {
            let found = self.table.find(name).map(|sym| sym.ty.clone());
            if let Some(ty) = found {
                let params: Vec<String> = ty
                    .free_vars()
                    .into_iter()
                    .filter(|v| !v.starts_with('?'))
                    .collect();
                let mut mapping = Subst::new();
                for (param, te) in params.iter().zip(args.iter()) {
                    let resolved = self.resolve_ty_expr(te);
                    mapping.insert(param.clone(), resolved);
                }
                if args.len() > params.len() {
                    self.diags.push(Diagnostic::new(
                        DiagnosticKind::KindMismatch {
                            ty: name.clone(),
                            expected: crate::ty::Kind::arrow_n(params.len()).to_string(),
                            found: crate::ty::Kind::arrow_n(args.len()).to_string(),
                        },
                        self.file.clone(),
                        span,
                    ));
                }
                // Any remaining parameters instantiate fresh.
                return self.instantiate(&ty.apply(&mapping));
            }
        }
        let _ = self.infer_expr(target);
        self.fresh_var()
    }

    fn infer_match(&mut self, scrutinee: &Expr, arms: &[MatchArm]) -> Ty {
        let scrutinee_ty = self.infer_expr(scrutinee);
        let result = self.fresh_var();
        for arm in arms {
            self.table.enter_scope();
            self.check_pattern(&arm.pattern, &scrutinee_ty);
            if let Some(guard) = &arm.guard {
                let guard_ty = self.infer_expr(guard);
                self.unify_at(&Ty::bool(), &guard_ty, false, guard.span());
            }
            let body_ty = self.infer_expr(&arm.body);
            self.unify_at(&result, &body_ty, false, arm.span);
            self.table.exit_scope();
        }
        self.resolved(&result)
    }

    fn infer_for(&mut self, kind: &ForKind, body: &Block) -> Ty {
        self.table.enter_scope();
        match kind {
            ForKind::While(cond) => {
                let cond_ty = self.infer_expr(cond);
                self.unify_at(&Ty::bool(), &cond_ty, false, cond.span());
            }
            ForKind::In { pattern, iterable } => {
                let iter_ty = self.infer_expr(iterable);
                let elem = self.fresh_var();
                self.unify_at(&Ty::list(elem.clone()), &iter_ty, false, iterable.span());
                let elem = self.resolved(&elem);
                self.check_pattern(pattern, &elem);
            }
        }
        self.breaks.push(Vec::new());
        let _ = self.infer_block(body);
        let breaks = self.breaks.pop().unwrap_or_default();
        self.table.exit_scope();

        // The loop's value is whatever `break` produced, or Nil when the
        // loop runs to completion.
        let mut members: Vec<Ty> = breaks.iter().map(|t| self.resolved(t)).collect();
        members.push(Ty::nil());
        Ty::union(members)
    }

    fn infer_fn_lit(
        &mut self,
        params: &[Param],
        variadic: bool,
        ret: Option<&TypeExpr>,
        body: &Expr,
    ) -> Ty {
        self.table.enter_scope();
        let param_tys: Vec<Ty> = params
            .iter()
            .map(|p| match &p.ty {
                Some(te) => self.resolve_ty_expr(te),
                None => self.fresh_var(),
            })
            .collect();
        self.bind_params(params, variadic, &param_tys);
        let ret_ty = match ret {
            Some(te) => self.resolve_ty_expr(te),
            None => self.fresh_var(),
        };
        let body_ty = self.infer_expr(body);
        self.unify_at(&ret_ty, &body_ty, true, body.span());
        self.table.exit_scope();
        self.resolved(&Ty::Func(FuncTy {
            params: param_tys,
            ret: Box::new(ret_ty),
            variadic,
            default_count: params.iter().filter(|p| p.default.is_some()).count(),
        }))
    }

    // ── Patterns ────────────────────────────────────────────────────────

    /// Check a pattern against a scrutinee type, defining its bindings in
    /// the current scope.
    pub fn check_pattern(&mut self, pattern: &Pattern, scrutinee: &Ty) {
        match pattern {
            Pattern::Wildcard { .. } => {}
            Pattern::Literal { lit, span } => {
                let lit_ty = self.infer_lit(lit);
                self.unify_at(&lit_ty, scrutinee, false, *span);
            }
            Pattern::Ident { name, .. } => {
                let ty = self.resolved(scrutinee);
                self.table.define(name, ty);
            }
            Pattern::Ctor { name, args, span } => {
                let found = self
                    .table
                    .find(name)
                    .filter(|sym| sym.kind == SymbolKind::Constructor)
                    .map(|sym| sym.ty.clone());
                let ctor_ty = match found {
                    Some(ty) => self.instantiate(&ty),
                    None => {
                        self.undefined(name, *span);
                        return;
                    }
                };
                match ctor_ty {
                    Ty::Func(func) => {
                        self.unify_at(&func.ret, scrutinee, false, *span);
                        if func.params.len() != args.len() {
                            self.arity_error(func.params.len(), args.len(), *span);
                        }
                        for (field_ty, sub) in func.params.iter().zip(args.iter()) {
                            let field_ty = self.resolved(field_ty);
                            self.check_pattern(sub, &field_ty);
                        }
                    }
                    nullary => {
                        self.unify_at(&nullary, scrutinee, false, *span);
                        if !args.is_empty() {
                            self.arity_error(0, args.len(), *span);
                        }
                    }
                }
            }
            Pattern::Tuple { elems, span } => {
                let elem_tys: Vec<Ty> = elems.iter().map(|_| self.fresh_var()).collect();
                self.unify_at(&Ty::Tuple(elem_tys.clone()), scrutinee, false, *span);
                for (ty, sub) in elem_tys.iter().zip(elems.iter()) {
                    let ty = self.resolved(ty);
                    self.check_pattern(sub, &ty);
                }
            }
            Pattern::List { elems, rest, span } => {
                let elem_ty = self.fresh_var();
                self.unify_at(&Ty::list(elem_ty.clone()), scrutinee, false, *span);
                let elem_ty = self.resolved(&elem_ty);
                for sub in elems {
                    self.check_pattern(sub, &elem_ty);
                }
                if let Some(Some(rest_name)) = rest {
                    self.table.define(rest_name, Ty::list(elem_ty));
                }
            }
            Pattern::Record { fields, rest, span } => {
                let field_tys: Vec<(String, Ty)> = fields
                    .iter()
                    .map(|(n, _)| (n.clone(), self.fresh_var()))
                    .collect();
                let want = Ty::Record {
                    fields: field_tys.iter().cloned().collect(),
                    // A record pattern with `...` tolerates unmentioned
                    // fields.
                    open: *rest,
                };
                self.unify_at(&want, scrutinee, *rest, *span);
                for ((_, ty), (_, sub)) in field_tys.iter().zip(fields.iter()) {
                    let ty = self.resolved(ty);
                    self.check_pattern(sub, &ty);
                }
            }
            Pattern::Spread { name, .. } => {
                if let Some(name) = name {
                    let ty = self.resolved(scrutinee);
                    self.table.define(name, ty);
                }
            }
            Pattern::Type { ty, binding, span } => {
                let declared = self.resolve_ty_expr(ty);
                // A type pattern narrows, so the declared type only needs to
                // be a member of the scrutinee when that is a union.
                let scrutinee_resolved = self.resolved(scrutinee);
                if !matches!(scrutinee_resolved, Ty::Union(_)) {
                    self.unify_at(&declared, &scrutinee_resolved, false, *span);
                }
                if let Some(name) = binding {
                    self.table.define(name, declared);
                }
            }
            Pattern::StringCaps { segments, span } => {
                self.unify_at(&Ty::string(), scrutinee, false, *span);
                for seg in segments {
                    if let StrSegment::Capture(name) = seg {
                        self.table.define(name, Ty::string());
                    }
                }
            }
        }
    }
}

/// The head constructor name of a type, for extension-method lookup.
fn type_head_name(ty: &Ty) -> Option<String> {
    match ty {
        Ty::Con(con) => Some(con.name.clone()),
        Ty::App(head, _) => type_head_name(head),
        _ => None,
    }
}
