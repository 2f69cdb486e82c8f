//! Unification of type terms.
//!
//! [`unify`] is pure: it never mutates its inputs and returns the
//! substitution that makes the two terms equal, or a [`UnifyError`].
//! `allow_extra` enables width subtyping for records (the actual side may
//! carry additional fields). Two deliberate asymmetries, kept from the
//! source semantics:
//!
//! - a union on one side of a non-union unifies when *some* member unifies
//!   (first success wins);
//! - function parameters unify invariantly while the return type propagates
//!   the caller's `allow_extra`. Records are mutable through assignment, so
//!   depth-covariance on parameters would be unsound.

use funxy_common::{Diagnostic, DiagnosticKind, Span};

use crate::ty::{Subst, Ty};

/// Why a unification failed, beyond the two offending terms.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// Occurs check: the variable appears inside the term it would bind to.
    InfiniteType { var: String },
    /// Sequences of different length (params, tuple elements, union members).
    ArityMismatch { expected: usize, found: usize },
    /// A field the expected record requires is absent from the actual.
    MissingField { name: String },
    /// One side is variadic, the other is not.
    VariadicMismatch,
    /// No member of the union unified.
    NoUnionMember,
}

/// A failed unification: the terms, an optional field-context, and an
/// optional reason refining the mismatch.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifyError {
    pub expected: Ty,
    pub actual: Ty,
    pub field: Option<String>,
    pub reason: Option<Reason>,
}

impl UnifyError {
    fn mismatch(expected: &Ty, actual: &Ty) -> Self {
        UnifyError {
            expected: expected.clone(),
            actual: actual.clone(),
            field: None,
            reason: None,
        }
    }

    fn with_reason(expected: &Ty, actual: &Ty, reason: Reason) -> Self {
        UnifyError {
            expected: expected.clone(),
            actual: actual.clone(),
            field: None,
            reason: Some(reason),
        }
    }

    /// Attach a record field context to an error that has none yet; the
    /// innermost field wins.
    fn in_field(mut self, name: &str) -> Self {
        if self.field.is_none() {
            self.field = Some(name.to_string());
        }
        self
    }

    /// Render this failure as a diagnostic at the given location.
    pub fn into_diagnostic(self, file: impl Into<String>, span: Span) -> Diagnostic {
        let kind = match &self.reason {
            Some(Reason::InfiniteType { var }) => DiagnosticKind::InfiniteType {
                var: var.clone(),
                ty: self.actual.to_string(),
            },
            _ => DiagnosticKind::UnificationFailure {
                expected: self.expected.to_string(),
                actual: self.actual.to_string(),
                context: self.context(),
            },
        };
        Diagnostic::new(kind, file, span)
    }

    fn context(&self) -> Option<String> {
        match (&self.field, &self.reason) {
            (Some(field), _) => Some(format!("in field `{}`", field)),
            (None, Some(Reason::ArityMismatch { expected, found })) => {
                Some(format!("expected {} elements, found {}", expected, found))
            }
            (None, Some(Reason::MissingField { name })) => {
                Some(format!("missing field `{}`", name))
            }
            (None, Some(Reason::VariadicMismatch)) => {
                Some("variadic and fixed-arity functions differ".to_string())
            }
            (None, Some(Reason::NoUnionMember)) => {
                Some("no union member matches".to_string())
            }
            _ => None,
        }
    }
}

/// Unify `expected` against `actual`, producing the substitution under which
/// they are equal.
pub fn unify(expected: &Ty, actual: &Ty, allow_extra: bool) -> Result<Subst, UnifyError> {
    // Structural equality short-circuits everything else.
    if expected == actual {
        return Ok(Subst::new());
    }

    // A union on the actual side unifies when any member does. Checked
    // before variable binding so `TVar ~ union` binds to the first member
    // only when the union survives no better match.
    if let Ty::Union(members) = actual {
        if !matches!(expected, Ty::Union(_)) {
            return unify_against_members(expected, members, actual, allow_extra, true);
        }
    }

    match (expected, actual) {
        // Variable binding, either side.
        (Ty::Var(v), _) => bind(v, actual),
        (_, Ty::Var(v)) => bind(v, expected),

        // Higher-kinded head binding: F<A1…Am> against C<B1…Bn>, m <= n.
        (Ty::App(ehead, eargs), Ty::App(ahead, aargs))
            if matches!(ehead.as_ref(), Ty::Var(_)) && !matches!(ahead.as_ref(), Ty::Var(_)) =>
        {
            unify_hkt(ehead, eargs, ahead, aargs, expected, actual, allow_extra)
        }
        (Ty::App(ehead, eargs), Ty::App(ahead, aargs))
            if matches!(ahead.as_ref(), Ty::Var(_)) && !matches!(ehead.as_ref(), Ty::Var(_)) =>
        {
            unify_hkt(ahead, aargs, ehead, eargs, expected, actual, allow_extra)
        }

        // Plain application: constructors, then arguments left to right.
        (Ty::App(ehead, eargs), Ty::App(ahead, aargs)) => {
            if eargs.len() != aargs.len() {
                return Err(UnifyError::with_reason(
                    expected,
                    actual,
                    Reason::ArityMismatch {
                        expected: eargs.len(),
                        found: aargs.len(),
                    },
                ));
            }
            let mut subst = unify(ehead, ahead, false)?;
            for (e, a) in eargs.iter().zip(aargs.iter()) {
                let s = unify(&e.apply(&subst), &a.apply(&subst), false)?;
                subst = subst.compose(&s);
            }
            Ok(subst)
        }

        // Constructors: equal names already hit the equality fast path, so
        // here we unwrap aliases and retry.
        (Ty::Con(ec), Ty::Con(ac)) => {
            match (&ec.underlying, &ac.underlying) {
                (None, None) => Err(UnifyError::mismatch(expected, actual)),
                (under_e, under_a) => {
                    let e = under_e.as_deref().unwrap_or(expected);
                    let a = under_a.as_deref().unwrap_or(actual);
                    unify(e, a, allow_extra)
                }
            }
        }

        // An alias constructor against a structural term: unwrap one layer
        // and retry, preserving sides.
        (Ty::Con(ec), _) if ec.underlying.is_some() => {
            unify(ec.underlying.as_deref().expect("checked"), actual, allow_extra)
        }
        (_, Ty::Con(ac)) if ac.underlying.is_some() => {
            unify(expected, ac.underlying.as_deref().expect("checked"), allow_extra)
        }

        // Records: width subtyping when allowed or the expected row is open;
        // field types are invariant because records are mutable by
        // assignment. Fields iterate in sorted name order.
        (
            Ty::Record {
                fields: efields,
                open: eopen,
            },
            Ty::Record { fields: afields, .. },
        ) => {
            let width = allow_extra || *eopen;
            if !width && efields.len() != afields.len() {
                return Err(UnifyError::with_reason(
                    expected,
                    actual,
                    Reason::ArityMismatch {
                        expected: efields.len(),
                        found: afields.len(),
                    },
                ));
            }
            let mut subst = Subst::new();
            for (name, ety) in efields {
                let aty = afields.get(name).ok_or_else(|| {
                    UnifyError::with_reason(
                        expected,
                        actual,
                        Reason::MissingField { name: name.clone() },
                    )
                })?;
                let s = unify(&ety.apply(&subst), &aty.apply(&subst), false)
                    .map_err(|e| e.in_field(name))?;
                subst = subst.compose(&s);
            }
            Ok(subst)
        }

        // Tuples: equal length, element-wise, propagating allow_extra.
        (Ty::Tuple(eelems), Ty::Tuple(aelems)) => {
            if eelems.len() != aelems.len() {
                return Err(UnifyError::with_reason(
                    expected,
                    actual,
                    Reason::ArityMismatch {
                        expected: eelems.len(),
                        found: aelems.len(),
                    },
                ));
            }
            let mut subst = Subst::new();
            for (e, a) in eelems.iter().zip(aelems.iter()) {
                let s = unify(&e.apply(&subst), &a.apply(&subst), allow_extra)?;
                subst = subst.compose(&s);
            }
            Ok(subst)
        }

        // Union against union: canonical order makes this element-wise.
        (Ty::Union(emembers), Ty::Union(amembers)) => {
            if emembers.len() != amembers.len() {
                return Err(UnifyError::with_reason(
                    expected,
                    actual,
                    Reason::ArityMismatch {
                        expected: emembers.len(),
                        found: amembers.len(),
                    },
                ));
            }
            let mut subst = Subst::new();
            for (e, a) in emembers.iter().zip(amembers.iter()) {
                let s = unify(&e.apply(&subst), &a.apply(&subst), allow_extra)?;
                subst = subst.compose(&s);
            }
            Ok(subst)
        }

        // Union on the expected side against a non-union actual: the actual
        // must unify with some member.
        (Ty::Union(emembers), _) => {
            unify_against_members(actual, emembers, expected, allow_extra, false)
        }

        // Functions: variadic flags and arity must agree; parameters are
        // invariant, the return type is covariant in the caller's context.
        (Ty::Func(efunc), Ty::Func(afunc)) => {
            if efunc.variadic != afunc.variadic {
                return Err(UnifyError::with_reason(
                    expected,
                    actual,
                    Reason::VariadicMismatch,
                ));
            }
            if efunc.params.len() != afunc.params.len() {
                return Err(UnifyError::with_reason(
                    expected,
                    actual,
                    Reason::ArityMismatch {
                        expected: efunc.params.len(),
                        found: afunc.params.len(),
                    },
                ));
            }
            let mut subst = Subst::new();
            for (e, a) in efunc.params.iter().zip(afunc.params.iter()) {
                let s = unify(&e.apply(&subst), &a.apply(&subst), false)?;
                subst = subst.compose(&s);
            }
            let s = unify(
                &efunc.ret.apply(&subst),
                &afunc.ret.apply(&subst),
                allow_extra,
            )?;
            Ok(subst.compose(&s))
        }

        // First-class type values unify when their payloads do.
        (Ty::Type(einner), Ty::Type(ainner)) => unify(einner, ainner, false),

        _ => Err(UnifyError::mismatch(expected, actual)),
    }
}

/// Try `probe` against each member of a union; the first succeeding
/// substitution wins. `union_ty` is the whole union, used for error
/// reporting. `union_is_actual` keeps expected/actual in the right slots of
/// the error.
fn unify_against_members(
    probe: &Ty,
    members: &[Ty],
    union_ty: &Ty,
    allow_extra: bool,
    union_is_actual: bool,
) -> Result<Subst, UnifyError> {
    for member in members {
        if let Ok(subst) = unify(probe, member, allow_extra) {
            return Ok(subst);
        }
    }
    let (expected, actual) = if union_is_actual {
        (probe, union_ty)
    } else {
        (union_ty, probe)
    };
    Err(UnifyError::with_reason(expected, actual, Reason::NoUnionMember))
}

/// Bind a variable to a term, with the occurs check.
fn bind(var: &str, ty: &Ty) -> Result<Subst, UnifyError> {
    if let Ty::Var(other) = ty {
        if other == var {
            return Ok(Subst::new());
        }
    }
    if ty.contains_var(var) {
        return Err(UnifyError::with_reason(
            &Ty::var(var),
            ty,
            Reason::InfiniteType {
                var: var.to_string(),
            },
        ));
    }
    Ok(Subst::singleton(var, ty.clone()))
}

/// Unify `F<A1…Am>` (variable head) against `C<B1…Bn>` with `m <= n`: bind
/// `F` to `C` when the arities match, otherwise to the partial application
/// `C<B1…B_{n-m}>`, then unify the trailing arguments pairwise.
fn unify_hkt(
    var_head: &Ty,
    var_args: &[Ty],
    con_head: &Ty,
    con_args: &[Ty],
    expected: &Ty,
    actual: &Ty,
    _allow_extra: bool,
) -> Result<Subst, UnifyError> {
    let m = var_args.len();
    let n = con_args.len();
    if m > n {
        return Err(UnifyError::with_reason(
            expected,
            actual,
            Reason::ArityMismatch {
                expected: m,
                found: n,
            },
        ));
    }
    let var = match var_head {
        Ty::Var(name) => name,
        _ => unreachable!("caller checked the head is a variable"),
    };
    let head_binding = if m == n {
        con_head.clone()
    } else {
        Ty::App(Box::new(con_head.clone()), con_args[..n - m].to_vec())
    };
    let mut subst = bind(var, &head_binding)?;
    for (e, a) in var_args.iter().zip(con_args[n - m..].iter()) {
        let s = unify(&e.apply(&subst), &a.apply(&subst), false)?;
        subst = subst.compose(&s);
    }
    Ok(subst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::TyCon;

    #[test]
    fn identical_types_empty_subst() {
        let s = unify(&Ty::int(), &Ty::int(), false).unwrap();
        assert!(s.is_empty());
        let rec = Ty::record(vec![("x", Ty::int())], false);
        assert!(unify(&rec, &rec, true).unwrap().is_empty());
    }

    #[test]
    fn var_binds_to_concrete() {
        let s = unify(&Ty::var("a"), &Ty::int(), false).unwrap();
        assert_eq!(s.get("a"), Some(&Ty::int()));
        // Symmetric.
        let s = unify(&Ty::int(), &Ty::var("a"), false).unwrap();
        assert_eq!(s.get("a"), Some(&Ty::int()));
    }

    #[test]
    fn self_binding_is_empty() {
        let s = unify(&Ty::var("a"), &Ty::var("a"), false).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let fun = Ty::func(vec![Ty::var("a")], Ty::int());
        let err = unify(&Ty::var("a"), &fun, false).unwrap_err();
        assert!(matches!(err.reason, Some(Reason::InfiniteType { .. })));
    }

    #[test]
    fn con_mismatch() {
        let err = unify(&Ty::int(), &Ty::bool(), false).unwrap_err();
        assert_eq!(err.expected, Ty::int());
        assert_eq!(err.actual, Ty::bool());
    }

    #[test]
    fn alias_unwraps_to_structural_form() {
        // String ~ List<Char> both ways.
        assert!(unify(&Ty::string(), &Ty::list(Ty::char()), false).is_ok());
        assert!(unify(&Ty::list(Ty::char()), &Ty::string(), false).is_ok());
    }

    #[test]
    fn app_args_unify_under_accumulated_subst() {
        // Map<a, a> ~ Map<Int, Int> works; Map<a, a> ~ Map<Int, Bool> fails.
        let expected = Ty::map(Ty::var("a"), Ty::var("a"));
        let s = unify(&expected, &Ty::map(Ty::int(), Ty::int()), false).unwrap();
        assert_eq!(s.get("a"), Some(&Ty::int()));
        assert!(unify(&expected, &Ty::map(Ty::int(), Ty::bool()), false).is_err());
    }

    #[test]
    fn hkt_binds_full_constructor() {
        // F<a> ~ Option<Int> binds F = Option, a = Int.
        let expected = Ty::App(Box::new(Ty::var("F")), vec![Ty::var("a")]);
        let s = unify(&expected, &Ty::option(Ty::int()), false).unwrap();
        assert_eq!(s.get("F"), Some(&Ty::con("Option")));
        assert_eq!(s.get("a"), Some(&Ty::int()));
    }

    #[test]
    fn hkt_binds_partial_application() {
        // F<a> ~ Result<E, Int> binds F = Result<E>, a = Int.
        let expected = Ty::App(Box::new(Ty::var("F")), vec![Ty::var("a")]);
        let actual = Ty::result(Ty::var("E"), Ty::int());
        let s = unify(&expected, &actual, false).unwrap();
        assert_eq!(
            s.get("F"),
            Some(&Ty::App(Box::new(Ty::con("Result")), vec![Ty::var("E")]))
        );
        assert_eq!(s.get("a"), Some(&Ty::int()));
        // Applying the substitution reconstructs the full application.
        assert_eq!(expected.apply(&s), actual.apply(&s));
    }

    #[test]
    fn hkt_var_head_on_actual_side() {
        let actual = Ty::App(Box::new(Ty::var("F")), vec![Ty::var("a")]);
        let s = unify(&Ty::list(Ty::bool()), &actual, false).unwrap();
        assert_eq!(s.get("F"), Some(&Ty::con("List")));
        assert_eq!(s.get("a"), Some(&Ty::bool()));
    }

    #[test]
    fn record_width_subtyping() {
        let narrow = Ty::record(vec![("x", Ty::int())], false);
        let wide = Ty::record(vec![("x", Ty::int()), ("y", Ty::bool())], false);
        assert!(unify(&narrow, &wide, true).is_ok());
        assert!(unify(&wide, &narrow, true).is_err());
        // Without allow_extra, counts must match.
        assert!(unify(&narrow, &wide, false).is_err());
    }

    #[test]
    fn open_record_admits_extra_fields() {
        let open = Ty::record(vec![("x", Ty::int())], true);
        let wide = Ty::record(vec![("x", Ty::int()), ("y", Ty::bool())], false);
        assert!(unify(&open, &wide, false).is_ok());
    }

    #[test]
    fn record_fields_are_invariant() {
        // Width subtyping never propagates into field depth: a nested record
        // field with extra fields is rejected even when the outer unification
        // runs with allow_extra.
        let expected = Ty::record(
            vec![("p", Ty::record(vec![("x", Ty::int())], false))],
            false,
        );
        let actual = Ty::record(
            vec![(
                "p",
                Ty::record(vec![("x", Ty::int()), ("y", Ty::bool())], false),
            )],
            false,
        );
        assert!(unify(&expected, &actual, true).is_err());
        // The same pair succeeds exactly when the field types unify strictly.
        assert!(unify(&expected, &expected.clone(), true).is_ok());
    }

    #[test]
    fn record_error_carries_field_context() {
        let expected = Ty::record(vec![("x", Ty::int())], false);
        let actual = Ty::record(vec![("x", Ty::bool())], false);
        let err = unify(&expected, &actual, false).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("x"));
    }

    #[test]
    fn tuple_lengths_must_match() {
        let two = Ty::Tuple(vec![Ty::int(), Ty::bool()]);
        let three = Ty::Tuple(vec![Ty::int(), Ty::bool(), Ty::int()]);
        assert!(unify(&two, &three, false).is_err());
        assert!(unify(&two, &two.clone(), false).is_ok());
    }

    #[test]
    fn union_member_matching_both_sides() {
        let int_or_nil = Ty::optional(Ty::int());
        // Non-union expected against a union actual.
        assert!(unify(&Ty::int(), &int_or_nil, false).is_ok());
        // Union expected against a non-union actual.
        assert!(unify(&int_or_nil, &Ty::int(), false).is_ok());
        // No member matches.
        assert!(unify(&Ty::bool(), &int_or_nil, false).is_err());
        assert!(unify(&int_or_nil, &Ty::bool(), false).is_err());
    }

    #[test]
    fn union_against_union_elementwise() {
        let a = Ty::union(vec![Ty::int(), Ty::bool()]);
        let b = Ty::union(vec![Ty::bool(), Ty::int()]);
        // Canonical ordering makes member order irrelevant.
        assert!(unify(&a, &b, false).is_ok());
        let wider = Ty::union(vec![Ty::int(), Ty::bool(), Ty::nil()]);
        assert!(unify(&a, &wider, false).is_err());
    }

    #[test]
    fn func_params_invariant_return_covariant() {
        let expected = Ty::func(
            vec![Ty::record(vec![("x", Ty::int())], false)],
            Ty::record(vec![("x", Ty::int())], false),
        );
        let wider_ret = Ty::func(
            vec![Ty::record(vec![("x", Ty::int())], false)],
            Ty::record(vec![("x", Ty::int()), ("y", Ty::bool())], false),
        );
        // allow_extra reaches the return type…
        assert!(unify(&expected, &wider_ret, true).is_ok());
        assert!(unify(&expected, &wider_ret, false).is_err());
        // …but never the parameters.
        let wider_param = Ty::func(
            vec![Ty::record(
                vec![("x", Ty::int()), ("y", Ty::bool())],
                false,
            )],
            Ty::record(vec![("x", Ty::int())], false),
        );
        assert!(unify(&expected, &wider_param, true).is_err());
    }

    #[test]
    fn variadic_flags_must_agree() {
        let fixed = Ty::func(vec![Ty::int()], Ty::int());
        let variadic = Ty::variadic_func(vec![Ty::int()], Ty::int());
        let err = unify(&fixed, &variadic, false).unwrap_err();
        assert_eq!(err.reason, Some(Reason::VariadicMismatch));
    }

    #[test]
    fn successful_unification_equalizes_terms() {
        // Property: unify(t1, t2) = Ok(s) implies t1.apply(s) == t2.apply(s).
        let t1 = Ty::func(vec![Ty::var("a"), Ty::list(Ty::var("b"))], Ty::var("a"));
        let t2 = Ty::func(
            vec![Ty::int(), Ty::list(Ty::bool())],
            Ty::var("c"),
        );
        let s = unify(&t1, &t2, false).unwrap();
        assert_eq!(t1.apply(&s), t2.apply(&s));
    }

    #[test]
    fn type_values_unify_by_payload() {
        let t1 = Ty::Type(Box::new(Ty::int()));
        let t2 = Ty::Type(Box::new(Ty::int()));
        assert!(unify(&t1, &t2, false).is_ok());
        let t3 = Ty::Type(Box::new(Ty::bool()));
        assert!(unify(&t1, &t3, false).is_err());
    }

    #[test]
    fn alias_identity_survives_nominal_comparison() {
        // Two distinct alias constructors with the same underlying type
        // unify through their expansions.
        let meters = Ty::Con(TyCon::alias("Meters", Ty::float()));
        let seconds = Ty::Con(TyCon::alias("Seconds", Ty::float()));
        assert!(unify(&meters, &seconds, false).is_ok());
        assert!(unify(&meters, &Ty::float(), false).is_ok());
    }
}
