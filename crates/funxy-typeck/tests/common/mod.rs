//! Shared helpers for the integration tests: AST builders and a
//! line-oriented stub parser good enough to drive the loader.
#![allow(dead_code)]

use funxy_ast::expr::{Expr, Lit};
use funxy_ast::item::{
    Block, ConstDecl, ConstTarget, Decl, ExportItem, ExportSpec, FunDecl, FunSig, ImportDecl,
    PackageDecl, Param, Program, ReExportSpec, Stmt,
};
use funxy_ast::types::TypeExpr;
use funxy_ast::FileParser;
use funxy_common::{Diagnostic, Span};

pub fn sp() -> Span {
    Span::DUMMY
}

pub fn ident(name: &str) -> Expr {
    Expr::Ident {
        name: name.to_string(),
        span: sp(),
    }
}

pub fn int(value: i64) -> Expr {
    Expr::Lit {
        lit: Lit::Int(value),
        span: sp(),
    }
}

pub fn string(value: &str) -> Expr {
    Expr::Lit {
        lit: Lit::Str(value.to_string()),
        span: sp(),
    }
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
        span: sp(),
    }
}

pub fn infix(op: &str, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Infix {
        op: op.to_string(),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span: sp(),
    }
}

pub fn fn_lit(params: &[&str], body: Expr) -> Expr {
    Expr::FnLit {
        params: params.iter().map(|p| param(p, None)).collect(),
        variadic: false,
        ret: None,
        body: Box::new(body),
        span: sp(),
    }
}

pub fn named(name: &str) -> TypeExpr {
    TypeExpr::named(name, sp())
}

pub fn applied(name: &str, args: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::Named {
        name: name.to_string(),
        args,
        span: sp(),
    }
}

pub fn param(name: &str, ty: Option<TypeExpr>) -> Param {
    Param {
        name: name.to_string(),
        ty,
        default: None,
        span: sp(),
    }
}

pub fn body_of(expr: Expr) -> Block {
    Block {
        stmts: vec![Stmt::Expr(expr)],
        span: sp(),
    }
}

/// `fun name<tps>(params) -> ret { body }`.
pub fn fun(
    name: &str,
    type_params: &[&str],
    params: Vec<Param>,
    ret: Option<TypeExpr>,
    body: Expr,
) -> Decl {
    Decl::Fun(FunDecl {
        sig: FunSig {
            name: name.to_string(),
            type_params: type_params.iter().map(|s| s.to_string()).collect(),
            constraints: Vec::new(),
            params,
            variadic: false,
            ret,
            span: sp(),
        },
        body: body_of(body),
        span: sp(),
    })
}

/// `name :- value`.
pub fn constant(name: &str, value: Expr) -> Decl {
    Decl::Const(ConstDecl {
        target: ConstTarget::Name(name.to_string()),
        ty: None,
        value,
        span: sp(),
    })
}

pub fn program(decls: Vec<Decl>) -> Program {
    Program {
        package: None,
        imports: Vec::new(),
        decls,
    }
}

// ── Stub parser for loader-driven tests ────────────────────────────────
//
// Understands a line-oriented subset:
//   package NAME (item, item, ...)     items: *, name, alias(*), alias(a b)
//   import "path" [as alias] [(*)] [(a, b)]
//   const NAME = INT | const NAME = IDENT
// Everything else is ignored.

pub struct StubParser;

impl FileParser for StubParser {
    fn parse(&self, _file: &str, source: &str) -> Result<Program, Diagnostic> {
        let mut prog = Program::default();
        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("package ") {
                prog.package = Some(parse_package(rest));
            } else if let Some(rest) = line.strip_prefix("import ") {
                prog.imports.push(parse_import(rest));
            } else if let Some(rest) = line.strip_prefix("const ") {
                if let Some((name, value)) = rest.split_once('=') {
                    let name = name.trim().to_string();
                    let value = value.trim();
                    let expr = match value.parse::<i64>() {
                        Ok(n) => int(n),
                        Err(_) => ident(value),
                    };
                    prog.decls.push(Decl::Const(ConstDecl {
                        target: ConstTarget::Name(name),
                        ty: None,
                        value: expr,
                        span: sp(),
                    }));
                }
            }
        }
        Ok(prog)
    }
}

fn parse_package(rest: &str) -> PackageDecl {
    let (name, exports) = match rest.split_once('(') {
        Some((name, list)) => {
            let list = list.trim().strip_suffix(')').unwrap_or(list);
            (name.trim().to_string(), parse_export_list(list))
        }
        None => (rest.trim().to_string(), ExportSpec::Names(Vec::new())),
    };
    PackageDecl {
        name,
        exports,
        span: sp(),
    }
}

fn parse_export_list(list: &str) -> ExportSpec {
    let list = list.trim();
    if list == "*" {
        return ExportSpec::All;
    }
    let mut items = Vec::new();
    for item in split_top_level(list) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if let Some((alias, inner)) = item.split_once('(') {
            let inner = inner.trim_end_matches(')').trim();
            let (all, names) = if inner == "*" {
                (true, Vec::new())
            } else {
                (
                    false,
                    inner
                        .split([',', ' '])
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            };
            items.push(ExportItem::ReExport(ReExportSpec {
                module_alias: alias.trim().to_string(),
                all,
                names,
                span: sp(),
            }));
        } else {
            items.push(ExportItem::Symbol(item.to_string()));
        }
    }
    ExportSpec::Names(items)
}

/// Split on commas that are not inside parentheses.
fn split_top_level(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn parse_import(rest: &str) -> ImportDecl {
    let rest = rest.trim();
    let (path, tail) = match rest.strip_prefix('"').and_then(|r| r.split_once('"')) {
        Some((path, tail)) => (path.to_string(), tail.trim()),
        None => (rest.to_string(), ""),
    };
    let mut alias = None;
    let mut wildcard = false;
    let mut symbols = Vec::new();
    let mut tail = tail;
    if let Some(after) = tail.strip_prefix("as ") {
        let (a, rest) = match after.split_once(' ') {
            Some((a, rest)) => (a, rest.trim()),
            None => (after, ""),
        };
        alias = Some(a.trim().to_string());
        tail = rest;
    }
    let tail = tail.trim();
    if let Some(inner) = tail.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        let inner = inner.trim();
        if inner == "*" {
            wildcard = true;
        } else {
            symbols = inner
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
    ImportDecl {
        path,
        alias,
        symbols,
        exclude: Vec::new(),
        wildcard,
        span: sp(),
    }
}
