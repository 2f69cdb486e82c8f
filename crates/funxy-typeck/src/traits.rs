//! Trait definitions, instance registration and operator binding.
//!
//! A [`TraitRegistry`] lives in every scope of the symbol table; lookups
//! merge the outer chain so instances and operator bindings introduced by
//! imported modules stay visible in nested scopes. Overlap detection renames
//! the free variables of both targets apart and asks the unifier whether
//! they can meet.

use rustc_hash::FxHashMap;

use crate::ty::{Kind, Subst, Ty};
use crate::unify::unify;

/// A method signature inside a trait declaration.
#[derive(Clone, Debug)]
pub struct TraitMethodSig {
    pub name: String,
    /// The general (polymorphic) signature, over the trait's type parameters.
    pub ty: Ty,
    /// Methods with a default body may be omitted by instances.
    pub has_default: bool,
}

/// A trait declaration.
#[derive(Clone, Debug)]
pub struct TraitDef {
    pub name: String,
    pub type_params: Vec<String>,
    pub supers: Vec<String>,
    /// `None` means every parameter is kind `*`; higher-kinded traits carry
    /// the parameter kind (`* -> *` for Functor and friends).
    pub kind: Option<Kind>,
    pub methods: Vec<TraitMethodSig>,
}

impl TraitDef {
    pub fn method(&self, name: &str) -> Option<&TraitMethodSig> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn all_methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|m| m.name.as_str())
    }

    /// Methods every instance must provide: all methods minus defaults.
    pub fn required_methods(&self) -> Vec<&str> {
        self.methods
            .iter()
            .filter(|m| !m.has_default)
            .map(|m| m.name.as_str())
            .collect()
    }
}

/// One registered instance of a trait.
#[derive(Clone, Debug)]
pub struct InstanceDef {
    /// The target type; its free variables are the instance's parameters.
    pub target: Ty,
    /// Specialized method signatures, keyed by method name.
    pub methods: FxHashMap<String, Ty>,
}

/// Per-scope registry of traits, instances and operator bindings.
#[derive(Clone, Debug, Default)]
pub struct TraitRegistry {
    traits: FxHashMap<String, TraitDef>,
    instances: FxHashMap<String, Vec<InstanceDef>>,
    operators: FxHashMap<String, String>,
}

impl TraitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_trait(&mut self, def: TraitDef) {
        self.traits.insert(def.name.clone(), def);
    }

    pub fn trait_def(&self, name: &str) -> Option<&TraitDef> {
        self.traits.get(name)
    }

    pub fn trait_defs(&self) -> impl Iterator<Item = &TraitDef> {
        self.traits.values()
    }

    /// Register an instance without an overlap check; callers that need one
    /// run [`find_overlap`] against every *visible* instance first, because
    /// visibility spans the scope chain which this registry cannot see.
    pub fn add_instance(&mut self, trait_name: &str, instance: InstanceDef) {
        self.instances
            .entry(trait_name.to_string())
            .or_default()
            .push(instance);
    }

    pub fn instances_of(&self, trait_name: &str) -> &[InstanceDef] {
        self.instances
            .get(trait_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn instance_traits(&self) -> impl Iterator<Item = (&String, &Vec<InstanceDef>)> {
        self.instances.iter()
    }

    pub fn bind_operator(&mut self, op: impl Into<String>, trait_name: impl Into<String>) {
        self.operators.insert(op.into(), trait_name.into());
    }

    pub fn operator_trait(&self, op: &str) -> Option<&str> {
        self.operators.get(op).map(String::as_str)
    }

    pub fn operator_bindings(&self) -> impl Iterator<Item = (&String, &String)> {
        self.operators.iter()
    }
}

/// Whether two instance targets can describe the same type: rename their
/// variables apart, then try unification in either direction.
pub fn targets_overlap(a: &Ty, b: &Ty) -> bool {
    let a = rename_vars(a, "'l");
    let b = rename_vars(b, "'r");
    unify(&a, &b, false).is_ok()
}

/// Find a registered instance matching `query` among `instances`.
///
/// The target's variables are renamed apart before unification. A bare
/// constructor target (`instance Functor Result`) matches any application
/// headed by the same constructor; this is the higher-kinded shortcut.
pub fn find_matching_instance<'a>(
    instances: &'a [InstanceDef],
    query: &Ty,
) -> Option<(&'a InstanceDef, Subst)> {
    for instance in instances {
        if let Some(subst) = target_match(&instance.target, query) {
            return Some((instance, subst));
        }
    }
    None
}

/// Match one instance target against a query type. Returns the substitution
/// over the *renamed* target variables when it matches.
fn target_match(target: &Ty, query: &Ty) -> Option<Subst> {
    // Higher-kinded shortcut: bare constructor vs any application of it.
    if let (Ty::Con(con), Ty::App(head, _)) = (target, query) {
        if matches!(head.as_ref(), Ty::Con(query_con) if query_con.name == con.name) {
            return Some(Subst::new());
        }
    }
    let freshened = rename_vars(target, "'i");
    unify(&freshened, query, false).ok()
}

/// Append a suffix to every variable name, keeping distinct variables
/// distinct.
fn rename_vars(ty: &Ty, suffix: &str) -> Ty {
    let mut subst = Subst::new();
    for var in ty.free_vars() {
        subst.insert(var.clone(), Ty::var(format!("{}{}", var, suffix)));
    }
    ty.apply(&subst)
}

/// Search `existing` for a target overlapping `candidate`; returns the first
/// offender.
pub fn find_overlap<'a>(existing: &'a [InstanceDef], candidate: &Ty) -> Option<&'a InstanceDef> {
    existing
        .iter()
        .find(|inst| targets_overlap(&inst.target, candidate))
}

// ── Operator tables ────────────────────────────────────────────────────

/// Operators whose meaning is fixed by the language and never dispatches
/// through a trait.
pub const NON_OVERRIDABLE: [&str; 8] = ["&&", "||", "!", "::", "|>", ",,", "?", "$"];

/// The user-definable operators; their trait bindings come from user
/// declarations rather than this table.
pub const USER_OPERATORS: [&str; 6] = [">>>", "<:>", "<|", "=>", "~>", "<~"];

/// Built-in operator-to-trait bindings, installed into every module root.
pub fn builtin_operator_traits() -> &'static [(&'static str, &'static str)] {
    &[
        ("+", "Numeric"),
        ("-", "Numeric"),
        ("*", "Numeric"),
        ("/", "Numeric"),
        ("%", "Numeric"),
        ("==", "Equal"),
        ("!=", "Equal"),
        ("<", "Order"),
        (">", "Order"),
        ("<=", "Order"),
        (">=", "Order"),
        ("++", "Concat"),
        ("<>", "Semigroup"),
        ("<*>", "Applicative"),
        (">>=", "Monad"),
        ("??", "Optional"),
        ("?.", "Optional"),
        ("&", "Bitwise"),
        ("|", "Bitwise"),
        ("^", "Bitwise"),
        ("<<", "Bitwise"),
        (">>", "Bitwise"),
    ]
}

/// Binding strength, higher binds tighter. Unary and call/index/member sit
/// above every infix operator (10 and 11); user operators sit at the
/// equality level.
pub fn precedence(op: &str) -> u8 {
    match op {
        "|>" => 0,
        "||" | ">>=" | "??" => 1,
        "&&" => 2,
        "|" | "^" => 3,
        "&" => 4,
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "<*>" => 5,
        "<<" | ">>" => 6,
        "+" | "-" | "++" | "<>" | "::" => 7,
        "*" | "/" | "%" => 8,
        "**" | "$" | ",," => 9,
        _ if USER_OPERATORS.contains(&op) => 5,
        _ => 5,
    }
}

/// Right-associative operators.
pub fn is_right_assoc(op: &str) -> bool {
    matches!(op, "**" | "$" | "::" | ",," | "<>" | "=>" | "<|" | "<:>")
}
