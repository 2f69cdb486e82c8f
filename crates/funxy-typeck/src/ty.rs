//! Type representation for the funxy type system.
//!
//! Defines the core [`Ty`] term, named type constructors ([`TyCon`]), kinds,
//! and substitutions. Unions are kept in a canonical sorted, deduplicated
//! form; `T?` is represented as `T | Nil`. Record fields live in a `BTreeMap`
//! so every traversal sees them in sorted name order.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;

/// A named type constructor: `Int`, `Bool`, `List`, user-declared names.
///
/// For alias nominals the constructor carries an `underlying` back-pointer
/// (`String` carries `List<Char>`). The back-pointer is used by field access
/// and structural unification only; it is intentionally excluded from
/// equality, ordering and hashing so that `String` stays `String` for trait
/// lookup and type identity.
#[derive(Clone, Debug)]
pub struct TyCon {
    pub name: String,
    /// One layer of alias expansion, if this constructor names an alias.
    pub underlying: Option<Box<Ty>>,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon {
            name: name.into(),
            underlying: None,
        }
    }

    pub fn alias(name: impl Into<String>, underlying: Ty) -> Self {
        TyCon {
            name: name.into(),
            underlying: Some(Box::new(underlying)),
        }
    }
}

impl PartialEq for TyCon {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name // underlying intentionally excluded
    }
}

impl Eq for TyCon {}

impl PartialOrd for TyCon {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TyCon {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl std::hash::Hash for TyCon {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state); // underlying intentionally excluded
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A function type. `default_count` is the number of trailing parameters
/// that carry default values at the declaration site; call-site arity checks
/// use it, unification does not.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncTy {
    pub params: Vec<Ty>,
    pub ret: Box<Ty>,
    pub variadic: bool,
    pub default_count: usize,
}

/// A funxy type term.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ty {
    /// A type variable, free or bound by a declaration's type parameters.
    Var(String),
    /// A nominal type constructor.
    Con(TyCon),
    /// Type-level application: `List<Int>`, `Result<E, T>`.
    App(Box<Ty>, Vec<Ty>),
    /// A function type.
    Func(FuncTy),
    /// A fixed-arity tuple.
    Tuple(Vec<Ty>),
    /// A row-typed record; open records admit width-extra fields when they
    /// sit on the expected side.
    Record {
        fields: BTreeMap<String, Ty>,
        open: bool,
    },
    /// A normalized (sorted, deduplicated) union. Always has >= 2 members;
    /// [`Ty::union`] collapses smaller cases.
    Union(Vec<Ty>),
    /// A first-class type value, as passed to `read(s, Int)`.
    Type(Box<Ty>),
}

impl Ty {
    pub fn var(name: impl Into<String>) -> Ty {
        Ty::Var(name.into())
    }

    pub fn con(name: impl Into<String>) -> Ty {
        Ty::Con(TyCon::new(name))
    }

    pub fn int() -> Ty {
        Ty::con("Int")
    }

    pub fn float() -> Ty {
        Ty::con("Float")
    }

    pub fn bool() -> Ty {
        Ty::con("Bool")
    }

    pub fn char() -> Ty {
        Ty::con("Char")
    }

    pub fn nil() -> Ty {
        Ty::con("Nil")
    }

    pub fn unit() -> Ty {
        Ty::Tuple(Vec::new())
    }

    /// `String` is a nominal alias of `List<Char>`.
    pub fn string() -> Ty {
        Ty::Con(TyCon::alias("String", Ty::list(Ty::char())))
    }

    pub fn list(elem: Ty) -> Ty {
        Ty::App(Box::new(Ty::con("List")), vec![elem])
    }

    pub fn map(key: Ty, value: Ty) -> Ty {
        Ty::App(Box::new(Ty::con("Map")), vec![key, value])
    }

    pub fn option(inner: Ty) -> Ty {
        Ty::App(Box::new(Ty::con("Option")), vec![inner])
    }

    pub fn result(err: Ty, ok: Ty) -> Ty {
        Ty::App(Box::new(Ty::con("Result")), vec![err, ok])
    }

    pub fn func(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Func(FuncTy {
            params,
            ret: Box::new(ret),
            variadic: false,
            default_count: 0,
        })
    }

    pub fn variadic_func(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Func(FuncTy {
            params,
            ret: Box::new(ret),
            variadic: true,
            default_count: 0,
        })
    }

    pub fn record(fields: Vec<(&str, Ty)>, open: bool) -> Ty {
        Ty::Record {
            fields: fields
                .into_iter()
                .map(|(name, ty)| (name.to_string(), ty))
                .collect(),
            open,
        }
    }

    /// Build a canonical union: flattens nested unions, sorts, deduplicates,
    /// and collapses singletons back to the member itself.
    pub fn union(members: Vec<Ty>) -> Ty {
        let mut flat = Vec::new();
        for m in members {
            match m {
                Ty::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();
        match flat.len() {
            0 => Ty::nil(),
            1 => flat.into_iter().next().expect("len checked"),
            _ => Ty::Union(flat),
        }
    }

    /// `T?` — the union of `T` and `Nil`.
    pub fn optional(inner: Ty) -> Ty {
        Ty::union(vec![inner, Ty::nil()])
    }

    /// Remove one layer of alias expansion, if any.
    pub fn unwrap_underlying(&self) -> Option<&Ty> {
        match self {
            Ty::Con(con) => con.underlying.as_deref(),
            _ => None,
        }
    }

    /// The free type variables reachable from this term, in order of first
    /// appearance, deduplicated.
    pub fn free_vars(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_free_vars(&mut out);
        out
    }

    fn collect_free_vars(&self, out: &mut Vec<String>) {
        match self {
            Ty::Var(name) => {
                if !out.iter().any(|v| v == name) {
                    out.push(name.clone());
                }
            }
            Ty::Con(_) => {}
            Ty::App(ctor, args) => {
                ctor.collect_free_vars(out);
                for a in args {
                    a.collect_free_vars(out);
                }
            }
            Ty::Func(func) => {
                for p in &func.params {
                    p.collect_free_vars(out);
                }
                func.ret.collect_free_vars(out);
            }
            Ty::Tuple(elems) => {
                for e in elems {
                    e.collect_free_vars(out);
                }
            }
            Ty::Record { fields, .. } => {
                for ty in fields.values() {
                    ty.collect_free_vars(out);
                }
            }
            Ty::Union(members) => {
                for m in members {
                    m.collect_free_vars(out);
                }
            }
            Ty::Type(inner) => inner.collect_free_vars(out),
        }
    }

    /// Whether the named variable occurs anywhere in this term.
    pub fn contains_var(&self, name: &str) -> bool {
        match self {
            Ty::Var(v) => v == name,
            Ty::Con(_) => false,
            Ty::App(ctor, args) => {
                ctor.contains_var(name) || args.iter().any(|a| a.contains_var(name))
            }
            Ty::Func(func) => {
                func.params.iter().any(|p| p.contains_var(name)) || func.ret.contains_var(name)
            }
            Ty::Tuple(elems) => elems.iter().any(|e| e.contains_var(name)),
            Ty::Record { fields, .. } => fields.values().any(|t| t.contains_var(name)),
            Ty::Union(members) => members.iter().any(|m| m.contains_var(name)),
            Ty::Type(inner) => inner.contains_var(name),
        }
    }

    /// Substitute bound variables, producing a new term. Unions re-normalize
    /// because substitution can collapse members onto each other.
    pub fn apply(&self, subst: &Subst) -> Ty {
        if subst.is_empty() {
            return self.clone();
        }
        match self {
            Ty::Var(name) => match subst.get(name) {
                Some(ty) => ty.clone(),
                None => self.clone(),
            },
            Ty::Con(_) => self.clone(),
            Ty::App(ctor, args) => {
                let ctor = ctor.apply(subst);
                let args: Vec<Ty> = args.iter().map(|a| a.apply(subst)).collect();
                // Binding an HKT head to a partial application flattens:
                // (Result<E>)<Int> is Result<E, Int>.
                match ctor {
                    Ty::App(inner_ctor, mut inner_args) => {
                        inner_args.extend(args);
                        Ty::App(inner_ctor, inner_args)
                    }
                    other => Ty::App(Box::new(other), args),
                }
            }
            Ty::Func(func) => Ty::Func(FuncTy {
                params: func.params.iter().map(|p| p.apply(subst)).collect(),
                ret: Box::new(func.ret.apply(subst)),
                variadic: func.variadic,
                default_count: func.default_count,
            }),
            Ty::Tuple(elems) => Ty::Tuple(elems.iter().map(|e| e.apply(subst)).collect()),
            Ty::Record { fields, open } => Ty::Record {
                fields: fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.apply(subst)))
                    .collect(),
                open: *open,
            },
            Ty::Union(members) => Ty::union(members.iter().map(|m| m.apply(subst)).collect()),
            Ty::Type(inner) => Ty::Type(Box::new(inner.apply(subst))),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(name) => write!(f, "{}", name),
            Ty::Con(con) => write!(f, "{}", con),
            Ty::App(ctor, args) => {
                write!(f, "{}", ctor)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", a)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Ty::Func(func) => {
                write!(f, "(")?;
                for (i, p) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if func.variadic && i == func.params.len() - 1 {
                        write!(f, "...")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", func.ret)
            }
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            Ty::Record { fields, open } => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                if *open {
                    if !fields.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "..")?;
                }
                write!(f, "}}")
            }
            Ty::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", m)?;
                }
                Ok(())
            }
            Ty::Type(inner) => write!(f, "Type<{}>", inner),
        }
    }
}

// ── Kinds ──────────────────────────────────────────────────────────────

/// The kind of a type constructor: `*`, or an arrow of kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Star,
    Arrow(Box<Kind>, Box<Kind>),
}

impl Kind {
    /// The kind of a constructor taking `n` `*` arguments: `* -> … -> *`.
    pub fn arrow_n(n: usize) -> Kind {
        let mut kind = Kind::Star;
        for _ in 0..n {
            kind = Kind::Arrow(Box::new(Kind::Star), Box::new(kind));
        }
        kind
    }

    /// How many arguments this kind accepts along its spine.
    pub fn arity(&self) -> usize {
        match self {
            Kind::Star => 0,
            Kind::Arrow(_, rest) => 1 + rest.arity(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Star => write!(f, "*"),
            Kind::Arrow(left, right) => {
                match left.as_ref() {
                    Kind::Star => write!(f, "*")?,
                    arrow => write!(f, "({})", arrow)?,
                }
                write!(f, " -> {}", right)
            }
        }
    }
}

// ── Substitutions ──────────────────────────────────────────────────────

/// A finite mapping from type-variable names to types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subst(FxHashMap<String, Ty>);

impl Subst {
    pub fn new() -> Self {
        Subst::default()
    }

    pub fn singleton(var: impl Into<String>, ty: Ty) -> Self {
        let mut map = FxHashMap::default();
        map.insert(var.into(), ty);
        Subst(map)
    }

    pub fn get(&self, var: &str) -> Option<&Ty> {
        self.0.get(var)
    }

    pub fn insert(&mut self, var: impl Into<String>, ty: Ty) {
        self.0.insert(var.into(), ty);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Ty)> {
        self.0.iter()
    }

    /// `other ∘ self`: applying the result equals applying `self` first,
    /// then `other`. Entries of `self` are updated under `other`; entries of
    /// `other` for fresh variables are kept as-is.
    pub fn compose(&self, other: &Subst) -> Subst {
        let mut map = FxHashMap::default();
        for (var, ty) in &self.0 {
            map.insert(var.clone(), ty.apply(other));
        }
        for (var, ty) in &other.0 {
            map.entry(var.clone()).or_insert_with(|| ty.clone());
        }
        Subst(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_sorted_and_deduplicated() {
        let u1 = Ty::union(vec![Ty::string(), Ty::int(), Ty::int()]);
        let u2 = Ty::union(vec![Ty::int(), Ty::string()]);
        assert_eq!(u1, u2);
        match u1 {
            Ty::Union(members) => assert_eq!(members.len(), 2),
            other => panic!("expected Union, got {:?}", other),
        }
    }

    #[test]
    fn union_flattens_and_collapses() {
        let nested = Ty::union(vec![Ty::int(), Ty::union(vec![Ty::nil(), Ty::int()])]);
        match &nested {
            Ty::Union(members) => assert_eq!(members.len(), 2),
            other => panic!("expected Union, got {:?}", other),
        }
        assert_eq!(Ty::union(vec![Ty::int(), Ty::int()]), Ty::int());
    }

    #[test]
    fn optional_is_union_with_nil() {
        assert_eq!(
            Ty::optional(Ty::int()),
            Ty::union(vec![Ty::int(), Ty::nil()])
        );
    }

    #[test]
    fn tycon_identity_ignores_underlying() {
        let plain = TyCon::new("String");
        let alias = TyCon::alias("String", Ty::list(Ty::char()));
        assert_eq!(plain, alias);
    }

    #[test]
    fn free_vars_in_first_appearance_order() {
        let ty = Ty::func(
            vec![Ty::var("b"), Ty::list(Ty::var("a"))],
            Ty::var("b"),
        );
        assert_eq!(ty.free_vars(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn apply_reaches_every_position() {
        let subst = Subst::singleton("a", Ty::int());
        let ty = Ty::Record {
            fields: [
                ("xs".to_string(), Ty::list(Ty::var("a"))),
                ("f".to_string(), Ty::func(vec![Ty::var("a")], Ty::var("a"))),
            ]
            .into_iter()
            .collect(),
            open: false,
        };
        let applied = ty.apply(&subst);
        assert!(applied.free_vars().is_empty());
    }

    #[test]
    fn apply_renormalizes_unions() {
        let subst = Subst::singleton("a", Ty::int());
        let ty = Ty::Union(vec![Ty::int(), Ty::var("a")]);
        assert_eq!(ty.apply(&subst), Ty::int());
    }

    #[test]
    fn apply_flattens_partial_hkt_heads() {
        // F<Int> with F bound to Result<E> reads Result<E, Int>.
        let subst = Subst::singleton(
            "F",
            Ty::App(Box::new(Ty::con("Result")), vec![Ty::var("E")]),
        );
        let ty = Ty::App(Box::new(Ty::var("F")), vec![Ty::int()]);
        assert_eq!(
            ty.apply(&subst),
            Ty::App(Box::new(Ty::con("Result")), vec![Ty::var("E"), Ty::int()])
        );
    }

    #[test]
    fn compose_applies_left_then_right() {
        let s1 = Subst::singleton("a", Ty::list(Ty::var("b")));
        let s2 = Subst::singleton("b", Ty::int());
        let composed = s1.compose(&s2);
        let ty = Ty::var("a");
        assert_eq!(ty.apply(&composed), ty.apply(&s1).apply(&s2));
        assert_eq!(ty.apply(&composed), Ty::list(Ty::int()));
    }

    #[test]
    fn kind_display_and_arity() {
        assert_eq!(Kind::Star.to_string(), "*");
        assert_eq!(Kind::arrow_n(2).to_string(), "* -> * -> *");
        assert_eq!(Kind::arrow_n(2).arity(), 2);
    }

    #[test]
    fn display_surface_syntax() {
        assert_eq!(Ty::list(Ty::int()).to_string(), "List<Int>");
        assert_eq!(
            Ty::func(vec![Ty::int(), Ty::bool()], Ty::string()).to_string(),
            "(Int, Bool) -> String"
        );
        assert_eq!(
            Ty::record(vec![("y", Ty::bool()), ("x", Ty::int())], false).to_string(),
            "{x: Int, y: Bool}"
        );
        assert_eq!(Ty::optional(Ty::int()).to_string(), "Int | Nil");
        assert_eq!(
            Ty::variadic_func(vec![Ty::list(Ty::int())], Ty::int()).to_string(),
            "(...List<Int>) -> Int"
        );
    }
}
