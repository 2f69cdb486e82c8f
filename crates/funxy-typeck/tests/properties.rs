//! Universally quantified properties of substitutions and unification,
//! checked over a small inventory of representative types.

use funxy_typeck::ty::{Subst, Ty};
use funxy_typeck::unify::unify;

/// A spread of representative closed and open terms.
fn sample_types() -> Vec<Ty> {
    vec![
        Ty::int(),
        Ty::bool(),
        Ty::string(),
        Ty::var("a"),
        Ty::var("b"),
        Ty::list(Ty::var("a")),
        Ty::list(Ty::int()),
        Ty::option(Ty::var("b")),
        Ty::map(Ty::string(), Ty::var("a")),
        Ty::func(vec![Ty::var("a")], Ty::var("a")),
        Ty::func(vec![Ty::int(), Ty::var("b")], Ty::bool()),
        Ty::Tuple(vec![Ty::int(), Ty::var("a")]),
        Ty::record(vec![("x", Ty::int()), ("y", Ty::var("a"))], false),
        Ty::union(vec![Ty::int(), Ty::nil()]),
        Ty::union(vec![Ty::var("a"), Ty::nil()]),
    ]
}

fn sample_substs() -> Vec<Subst> {
    let mut s1 = Subst::new();
    s1.insert("a", Ty::int());
    let mut s2 = Subst::new();
    s2.insert("b", Ty::list(Ty::var("c")));
    let mut s3 = Subst::new();
    s3.insert("a", Ty::var("b"));
    s3.insert("b", Ty::bool());
    vec![Subst::new(), s1, s2, s3]
}

// 1. free_vars(t.apply(s)) ⊆ (free_vars(t) \ keys(s)) ∪ ⋃ free_vars(s[v]).
#[test]
fn substitution_bounds_free_variables() {
    for ty in sample_types() {
        for subst in sample_substs() {
            let applied = ty.apply(&subst);
            let before = ty.free_vars();
            let mut allowed: Vec<String> = before
                .iter()
                .filter(|v| subst.get(v).is_none())
                .cloned()
                .collect();
            for (_, replacement) in subst.iter() {
                allowed.extend(replacement.free_vars());
            }
            for var in applied.free_vars() {
                assert!(
                    allowed.contains(&var),
                    "`{var}` escaped: {ty} under {subst:?}"
                );
            }
        }
    }
}

// 2. A successful unification equalizes the two terms.
#[test]
fn unification_produces_an_equalizer() {
    let samples = sample_types();
    for t1 in &samples {
        for t2 in &samples {
            if let Ok(s) = unify(t1, t2, false) {
                // Union member-matching and alias unwrapping are
                // intentionally one-sided; the equalizer law holds for the
                // structural core.
                let skip = matches!(t1, Ty::Union(_)) != matches!(t2, Ty::Union(_))
                    || t1.unwrap_underlying().is_some()
                    || t2.unwrap_underlying().is_some();
                if skip {
                    continue;
                }
                assert_eq!(
                    t1.apply(&s),
                    t2.apply(&s),
                    "unify({t1}, {t2}) did not equalize"
                );
            }
        }
    }
}

// 3. Unifying a term with itself yields the empty substitution.
#[test]
fn self_unification_is_empty() {
    for ty in sample_types() {
        for allow_extra in [false, true] {
            let s = unify(&ty, &ty, allow_extra)
                .unwrap_or_else(|e| panic!("unify({ty}, {ty}) failed: {e:?}"));
            assert!(s.is_empty(), "unify({ty}, {ty}) bound variables");
        }
    }
}

// 4. A variable binds to any term not containing it.
#[test]
fn variables_bind_to_foreign_terms() {
    for ty in sample_types() {
        if ty.contains_var("zz") {
            continue;
        }
        // A union on the actual side member-matches before variable
        // binding (the case ladder checks it first), so the plain binding
        // law applies to non-union terms.
        if matches!(ty, Ty::Union(_)) {
            continue;
        }
        let s = unify(&Ty::var("zz"), &ty, false).expect("binding must succeed");
        if ty == Ty::var("zz") {
            continue;
        }
        assert_eq!(s.get("zz"), Some(&ty));
    }
}

// 5. The occurs check rejects self-containing bindings.
#[test]
fn occurs_check_rejects_self_reference() {
    let containing = vec![
        Ty::list(Ty::var("v")),
        Ty::func(vec![Ty::var("v")], Ty::int()),
        Ty::Tuple(vec![Ty::int(), Ty::var("v")]),
        Ty::record(vec![("x", Ty::var("v"))], false),
    ];
    for ty in containing {
        assert!(
            unify(&Ty::var("v"), &ty, false).is_err(),
            "v ~ {ty} must fail the occurs check"
        );
    }
}

// 6. Composition applies left-to-right.
#[test]
fn composition_is_sequential_application()  {
    for ty in sample_types() {
        for s1 in sample_substs() {
            for s2 in sample_substs() {
                let composed = s1.compose(&s2);
                assert_eq!(
                    ty.apply(&composed),
                    ty.apply(&s1).apply(&s2),
                    "compose mismatch on {ty}"
                );
            }
        }
    }
}

// 7. Record fields unify invariantly: the width flag never reaches depth.
#[test]
fn record_fields_unify_invariantly() {
    let pairs = vec![
        (Ty::int(), Ty::int()),
        (Ty::int(), Ty::bool()),
        (Ty::list(Ty::var("a")), Ty::list(Ty::int())),
        (
            Ty::record(vec![("x", Ty::int())], false),
            Ty::record(vec![("x", Ty::int()), ("y", Ty::bool())], false),
        ),
    ];
    for (field_a, field_b) in pairs {
        let outer_a = Ty::record(vec![("f", field_a.clone())], false);
        let outer_b = Ty::record(vec![("f", field_b.clone())], false);
        assert_eq!(
            unify(&outer_a, &outer_b, true).is_ok(),
            unify(&field_a, &field_b, false).is_ok(),
            "field invariance broke for {field_a} / {field_b}"
        );
    }
}

// 8. Width subtyping admits extra actual fields, never extra expected ones.
#[test]
fn width_subtyping_is_one_directional() {
    let narrow = Ty::record(vec![("x", Ty::int())], false);
    let wide = Ty::record(vec![("x", Ty::int()), ("y", Ty::bool())], false);
    assert!(unify(&narrow, &wide, true).is_ok());
    assert!(unify(&wide, &narrow, true).is_err());
}

// 9. A union against a non-union unifies through member matching on either
// side; a non-member fails both ways.
#[test]
fn union_member_matching() {
    let int_or_nil = Ty::union(vec![Ty::int(), Ty::nil()]);
    assert!(unify(&Ty::int(), &int_or_nil, false).is_ok());
    assert!(unify(&int_or_nil, &Ty::int(), false).is_ok());
    assert!(unify(&Ty::bool(), &int_or_nil, false).is_err());
    assert!(unify(&int_or_nil, &Ty::bool(), false).is_err());
}
