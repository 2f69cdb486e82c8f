//! Programs, package and import declarations, and top-level declarations.

use funxy_common::Span;

use crate::expr::Expr;
use crate::pat::Pattern;
use crate::types::TypeExpr;

/// A parsed source file: the `package` header, imports, then declarations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
}

/// `package name (x, y, alias(*), alias2(A, b))`.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDecl {
    pub name: String,
    pub exports: ExportSpec,
    pub span: Span,
}

/// The export list of a package declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportSpec {
    /// `(*)` — every top-level symbol in every file of the package.
    All,
    /// An explicit list of local symbols and re-exports.
    Names(Vec<ExportItem>),
}

/// One entry in an explicit export list.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportItem {
    /// A locally defined symbol.
    Symbol(String),
    /// Symbols re-exported from an imported module.
    ReExport(ReExportSpec),
}

/// `alias(*)` or `alias(Sym1, Sym2)` inside an export list. Captured verbatim
/// by the loader; resolved during header analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ReExportSpec {
    pub module_alias: String,
    pub all: bool,
    pub names: Vec<String>,
    pub span: Span,
}

/// `import "path" [as alias] [(sym, …)] [!(sym, …)] [(*)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String,
    pub alias: Option<String>,
    /// Selective symbol list; empty means none requested.
    pub symbols: Vec<String>,
    /// Exclusion list used together with a wildcard.
    pub exclude: Vec<String>,
    /// `(*)` — bring every export into scope unqualified.
    pub wildcard: bool,
    pub span: Span,
}

/// A top-level declaration (or script statement).
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Fun(FunDecl),
    Trait(TraitDecl),
    Instance(InstanceDecl),
    Type(TypeDecl),
    Const(ConstDecl),
    Expr(Expr),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Fun(d) => d.span,
            Decl::Trait(d) => d.span,
            Decl::Instance(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Const(d) => d.span,
            Decl::Expr(e) => e.span(),
        }
    }
}

/// A function parameter, with optional annotation and default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub default: Option<Expr>,
    pub span: Span,
}

/// A `T: Trait` constraint on a type parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub param: String,
    pub trait_name: String,
    pub span: Span,
}

/// A function signature, shared by declarations and trait methods.
#[derive(Debug, Clone, PartialEq)]
pub struct FunSig {
    pub name: String,
    pub type_params: Vec<String>,
    pub constraints: Vec<Constraint>,
    pub params: Vec<Param>,
    pub variadic: bool,
    pub ret: Option<TypeExpr>,
    pub span: Span,
}

/// `fun name<T>(params) -> Ret { body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub sig: FunSig,
    pub body: Block,
    pub span: Span,
}

/// A method inside a trait declaration; `default_body` marks defaults that
/// instances may omit.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitMethod {
    pub sig: FunSig,
    pub default_body: Option<Block>,
    pub span: Span,
}

/// `trait Name<T> : Super1, Super2 { methods }`.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub supers: Vec<String>,
    pub methods: Vec<TraitMethod>,
    pub span: Span,
}

/// `instance Trait<Target> { methods }`; `type_params` hold extra variables
/// for partially applied (HKT) targets.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDecl {
    pub trait_name: String,
    pub target: TypeExpr,
    pub type_params: Vec<String>,
    pub methods: Vec<FunDecl>,
    pub span: Span,
}

/// The right-hand side of a type declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDeclBody {
    /// `type Name = Underlying`.
    Alias(TypeExpr),
    /// `type Name = Ctor1(A) | Ctor2 | …`.
    Adt(Vec<CtorDecl>),
}

/// One data constructor of an ADT.
#[derive(Debug, Clone, PartialEq)]
pub struct CtorDecl {
    pub name: String,
    pub fields: Vec<TypeExpr>,
    pub span: Span,
}

/// `type Name<params> = …`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: TypeDeclBody,
    pub span: Span,
}

impl TypeDecl {
    /// Whether this declaration is a transparent alias.
    pub fn is_alias(&self) -> bool {
        matches!(self.body, TypeDeclBody::Alias(_))
    }
}

/// The left-hand side of a constant binding.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstTarget {
    Name(String),
    Pattern(Pattern),
}

/// `x :- expr`, `x: T :- expr`, or a pattern binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub target: ConstTarget,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    pub span: Span,
}

/// A brace-delimited sequence of statements; the value of the block is the
/// value of its last expression statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// One statement in a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Decl(Decl),
    Expr(Expr),
}
