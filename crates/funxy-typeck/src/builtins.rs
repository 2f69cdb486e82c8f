//! Built-in type, trait and operator registration.
//!
//! [`install`] seeds a module root scope with everything every funxy module
//! sees without importing anything: primitive types, `String` as an alias of
//! `List<Char>`, the core ADTs (`Option`, `Result`, `Ordering`), the core
//! traits with their operator bindings, and the `show`/`read` intrinsics.

use rustc_hash::FxHashMap;

use crate::scope::SymbolTable;
use crate::traits::{builtin_operator_traits, InstanceDef, TraitDef, TraitMethodSig};
use crate::ty::{Kind, Ty};

/// Seed a fresh module root scope.
pub fn install(table: &mut SymbolTable) {
    register_primitive_types(table);
    register_core_adts(table);
    register_core_traits(table);
    register_intrinsics(table);
}

fn register_primitive_types(table: &mut SymbolTable) {
    for name in [
        "Int", "Float", "Bool", "Char", "Nil", "BigInt", "Rational", "Bytes", "Bits",
    ] {
        table.define_type(name, Ty::con(name), Kind::Star);
    }

    // Parameterized collection constructors.
    table.define_type("List", Ty::con("List"), Kind::arrow_n(1));
    table.define_type("Set", Ty::con("Set"), Kind::arrow_n(1));
    table.define_type("Map", Ty::con("Map"), Kind::arrow_n(2));

    // String is a transparent alias of List<Char>; the nominal form is kept
    // for trait lookup and error rendering.
    table.define_type_alias("String", Ty::list(Ty::char()));
}

fn register_core_adts(table: &mut SymbolTable) {
    // Option<T> = Some(T) | None
    table.define_type("Option", Ty::con("Option"), Kind::arrow_n(1));
    table.define_constructor(
        "Some",
        Ty::func(vec![Ty::var("T")], Ty::option(Ty::var("T"))),
        "Option",
    );
    table.define_constructor("None", Ty::option(Ty::var("T")), "Option");

    // Result<E, T> = Ok(T) | Err(E)
    table.define_type("Result", Ty::con("Result"), Kind::arrow_n(2));
    table.define_constructor(
        "Ok",
        Ty::func(
            vec![Ty::var("T")],
            Ty::result(Ty::var("E"), Ty::var("T")),
        ),
        "Result",
    );
    table.define_constructor(
        "Err",
        Ty::func(
            vec![Ty::var("E")],
            Ty::result(Ty::var("E"), Ty::var("T")),
        ),
        "Result",
    );

    // Ordering = LT | EQ | GT
    table.define_type("Ordering", Ty::con("Ordering"), Kind::Star);
    for ctor in ["LT", "EQ", "GT"] {
        table.define_constructor(ctor, Ty::con("Ordering"), "Ordering");
    }
}

/// A `(T, T) -> T` binary method over the trait parameter.
fn closed_binop(name: &str) -> TraitMethodSig {
    TraitMethodSig {
        name: name.into(),
        ty: Ty::func(vec![Ty::var("T"), Ty::var("T")], Ty::var("T")),
        has_default: false,
    }
}

/// A `(T, T) -> Bool` comparison method over the trait parameter.
fn comparison(name: &str, has_default: bool) -> TraitMethodSig {
    TraitMethodSig {
        name: name.into(),
        ty: Ty::func(vec![Ty::var("T"), Ty::var("T")], Ty::bool()),
        has_default,
    }
}

fn register_core_traits(table: &mut SymbolTable) {
    // Numeric: +, -, *, /, % over Int, Float, BigInt, Rational.
    table.define_trait(TraitDef {
        name: "Numeric".into(),
        type_params: vec!["T".into()],
        supers: vec![],
        kind: None,
        methods: ["+", "-", "*", "/", "%"]
            .into_iter()
            .map(closed_binop)
            .collect(),
    });
    for ty in [Ty::int(), Ty::float(), Ty::con("BigInt"), Ty::con("Rational")] {
        register_simple_instance(table, "Numeric", ty);
    }

    // Equal: == required, != defaults to its negation.
    table.define_trait(TraitDef {
        name: "Equal".into(),
        type_params: vec!["T".into()],
        supers: vec![],
        kind: None,
        methods: vec![comparison("==", false), comparison("!=", true)],
    });
    for ty in [
        Ty::int(),
        Ty::float(),
        Ty::bool(),
        Ty::char(),
        Ty::nil(),
        Ty::con("BigInt"),
        Ty::con("Rational"),
        Ty::con("Bytes"),
        Ty::list(Ty::var("a")),
        Ty::option(Ty::var("a")),
        Ty::con("Ordering"),
    ] {
        register_simple_instance(table, "Equal", ty);
    }

    // Order requires Equal; comparisons return Bool.
    table.define_trait(TraitDef {
        name: "Order".into(),
        type_params: vec!["T".into()],
        supers: vec!["Equal".into()],
        kind: None,
        methods: vec![
            comparison("<", false),
            comparison("<=", true),
            comparison(">", true),
            comparison(">=", true),
        ],
    });
    for ty in [
        Ty::int(),
        Ty::float(),
        Ty::char(),
        Ty::con("BigInt"),
        Ty::con("Rational"),
        Ty::list(Ty::var("a")),
    ] {
        register_simple_instance(table, "Order", ty);
    }

    // Concat: ++ over sequences. The List instance covers String through
    // its underlying form.
    table.define_trait(TraitDef {
        name: "Concat".into(),
        type_params: vec!["T".into()],
        supers: vec![],
        kind: None,
        methods: vec![closed_binop("++")],
    });
    register_simple_instance(table, "Concat", Ty::list(Ty::var("a")));
    register_simple_instance(table, "Concat", Ty::con("Bytes"));
    register_simple_instance(table, "Concat", Ty::con("Bits"));

    // Semigroup: <> — an associative merge.
    table.define_trait(TraitDef {
        name: "Semigroup".into(),
        type_params: vec!["T".into()],
        supers: vec![],
        kind: None,
        methods: vec![closed_binop("<>")],
    });
    register_simple_instance(table, "Semigroup", Ty::list(Ty::var("a")));
    register_simple_instance(table, "Semigroup", Ty::map(Ty::var("k"), Ty::var("v")));

    // Functor / Applicative / Monad over a * -> * parameter. Instances use
    // bare constructor targets so partial applications match.
    table.define_trait(TraitDef {
        name: "Functor".into(),
        type_params: vec!["F".into()],
        supers: vec![],
        kind: Some(Kind::arrow_n(1)),
        methods: vec![TraitMethodSig {
            name: "fmap".into(),
            ty: Ty::func(
                vec![
                    Ty::func(vec![Ty::var("a")], Ty::var("b")),
                    Ty::App(Box::new(Ty::var("F")), vec![Ty::var("a")]),
                ],
                Ty::App(Box::new(Ty::var("F")), vec![Ty::var("b")]),
            ),
            has_default: false,
        }],
    });
    table.define_trait(TraitDef {
        name: "Applicative".into(),
        type_params: vec!["F".into()],
        supers: vec!["Functor".into()],
        kind: Some(Kind::arrow_n(1)),
        methods: vec![TraitMethodSig {
            name: "<*>".into(),
            ty: Ty::func(
                vec![
                    Ty::App(
                        Box::new(Ty::var("F")),
                        vec![Ty::func(vec![Ty::var("a")], Ty::var("b"))],
                    ),
                    Ty::App(Box::new(Ty::var("F")), vec![Ty::var("a")]),
                ],
                Ty::App(Box::new(Ty::var("F")), vec![Ty::var("b")]),
            ),
            has_default: false,
        }],
    });
    table.define_trait(TraitDef {
        name: "Monad".into(),
        type_params: vec!["F".into()],
        supers: vec!["Applicative".into()],
        kind: Some(Kind::arrow_n(1)),
        methods: vec![TraitMethodSig {
            name: ">>=".into(),
            ty: Ty::func(
                vec![
                    Ty::App(Box::new(Ty::var("F")), vec![Ty::var("a")]),
                    Ty::func(
                        vec![Ty::var("a")],
                        Ty::App(Box::new(Ty::var("F")), vec![Ty::var("b")]),
                    ),
                ],
                Ty::App(Box::new(Ty::var("F")), vec![Ty::var("b")]),
            ),
            has_default: false,
        }],
    });
    for trait_name in ["Functor", "Applicative", "Monad"] {
        for target in ["Option", "Result", "List"] {
            register_simple_instance(table, trait_name, Ty::con(target));
        }
    }

    // Optional: ?? and ?. over T | Nil.
    table.define_trait(TraitDef {
        name: "Optional".into(),
        type_params: vec!["T".into()],
        supers: vec![],
        kind: None,
        methods: vec![TraitMethodSig {
            name: "??".into(),
            ty: Ty::func(
                vec![Ty::optional(Ty::var("T")), Ty::var("T")],
                Ty::var("T"),
            ),
            has_default: false,
        }],
    });
    register_simple_instance(table, "Optional", Ty::optional(Ty::var("a")));

    // Bitwise: & | ^ << >> over Int and Bits.
    table.define_trait(TraitDef {
        name: "Bitwise".into(),
        type_params: vec!["T".into()],
        supers: vec![],
        kind: None,
        methods: ["&", "|", "^", "<<", ">>"]
            .into_iter()
            .map(closed_binop)
            .collect(),
    });
    register_simple_instance(table, "Bitwise", Ty::int());
    register_simple_instance(table, "Bitwise", Ty::con("Bits"));

    // Show: rendering to String; every primitive has it, containers are
    // generic.
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
    for ty in [
        Ty::int(),
        Ty::float(),
        Ty::bool(),
        Ty::char(),
        Ty::nil(),
        Ty::con("BigInt"),
        Ty::con("Rational"),
        Ty::list(Ty::var("a")),
        Ty::map(Ty::var("k"), Ty::var("v")),
        Ty::option(Ty::var("a")),
    ] {
        register_simple_instance(table, "Show", ty);
    }

    // Operator bindings come last so every trait they name exists.
    for (op, trait_name) in builtin_operator_traits() {
        table.bind_operator(*op, *trait_name);
    }

    // Trait methods double as plain polymorphic values (`fmap(f, xs)`),
    // constrained on the trait parameter.
    for trait_name in [
        "Numeric",
        "Equal",
        "Order",
        "Concat",
        "Semigroup",
        "Functor",
        "Applicative",
        "Monad",
        "Optional",
        "Bitwise",
        "Show",
    ] {
        let def = table.trait_def(trait_name).cloned().expect("registered above");
        let constraints: Vec<(String, String)> = def
            .type_params
            .iter()
            .map(|tp| (tp.clone(), def.name.clone()))
            .collect();
        for method in &def.methods {
            table.define(&method.name, method.ty.clone());
            table.set_fn_constraints(&method.name, constraints.clone());
        }
    }
}

fn register_simple_instance(table: &mut SymbolTable, trait_name: &str, target: Ty) {
    let methods = match table.trait_def(trait_name) {
        Some(def) => def
            .methods
            .iter()
            .map(|m| (m.name.clone(), m.ty.clone()))
            .collect(),
        None => FxHashMap::default(),
    };
    table
        .register_instance(trait_name, InstanceDef { target, methods })
        .expect("builtin instances are non-overlapping");
}

fn register_intrinsics(table: &mut SymbolTable) {
    // show : (T) -> String — dispatches through the Show trait.
    table.define("show", Ty::func(vec![Ty::var("T")], Ty::string()));
    // read : (String, Type<T>) -> T — parse a value of a first-class type.
    table.define(
        "read",
        Ty::func(
            vec![Ty::string(), Ty::Type(Box::new(Ty::var("T")))],
            Ty::var("T"),
        ),
    );
}
