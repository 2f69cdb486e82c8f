//! The virtual package catalogue.
//!
//! Built-in packages (`lib/list`, `lib/io`, …) are declared here rather than
//! loaded from disk. The catalogue is a process-wide registry populated once
//! on first use; entries are immutable afterwards. The meta package `lib`
//! aggregates every `lib/*` export, so importing `lib` is wildcard-equivalent
//! over the whole standard surface — which is why function names must be
//! unique across all `lib/*` packages (tested below).

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::traits::TraitDef;
use crate::ty::{Kind, Ty};

/// A built-in package: pre-typed exports, immutable after initialization.
#[derive(Debug, Clone, Default)]
pub struct VirtualPackage {
    pub name: String,
    /// Exported functions and constants.
    pub values: Vec<(String, Ty)>,
    /// Exported type constructors with their kinds.
    pub types: Vec<(String, Ty, Kind)>,
    /// Exported data constructors: name, signature, owning ADT.
    pub constructors: Vec<(String, Ty, String)>,
    /// Traits exported by this package (rare; the core traits live in the
    /// builtins).
    pub traits: Vec<TraitDef>,
    /// Operator bindings this package introduces.
    pub operators: Vec<(String, String)>,
}

impl VirtualPackage {
    fn new(name: &str) -> Self {
        VirtualPackage {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn val(mut self, name: &str, ty: Ty) -> Self {
        self.values.push((name.to_string(), ty));
        self
    }

    fn ty(mut self, name: &str, kind: Kind) -> Self {
        self.types.push((name.to_string(), Ty::con(name), kind));
        self
    }

    /// Every exported name, for export-set construction.
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .map(|(n, _)| n.as_str())
            .chain(self.types.iter().map(|(n, _, _)| n.as_str()))
            .chain(self.constructors.iter().map(|(n, _, _)| n.as_str()))
    }
}

static CATALOGUE: OnceLock<FxHashMap<String, VirtualPackage>> = OnceLock::new();

/// The process-wide catalogue, built on first access.
pub fn catalogue() -> &'static FxHashMap<String, VirtualPackage> {
    CATALOGUE.get_or_init(build)
}

/// Look up a virtual package by its import path (`lib/list`, or the meta
/// package `lib`).
pub fn lookup(path: &str) -> Option<&'static VirtualPackage> {
    catalogue().get(path)
}

/// Whether an import path names a virtual package.
pub fn is_virtual_path(path: &str) -> bool {
    catalogue().contains_key(path)
}

fn build() -> FxHashMap<String, VirtualPackage> {
    let packages = vec![
        lib_list(),
        lib_map(),
        lib_bytes(),
        lib_bits(),
        lib_string(),
        lib_time(),
        lib_io(),
        lib_sys(),
        lib_tuple(),
        lib_math(),
        lib_bignum(),
        lib_char(),
        lib_json(),
        lib_crypto(),
        lib_regex(),
        lib_http(),
        lib_test(),
        lib_rand(),
        lib_date(),
        lib_ws(),
        lib_sql(),
        lib_url(),
        lib_path(),
        lib_uuid(),
        lib_log(),
        lib_task(),
        lib_csv(),
        lib_flag(),
    ];

    // The meta package aggregates every lib/* export under one roof.
    let mut meta = VirtualPackage::new("lib");
    for pkg in &packages {
        meta.values.extend(pkg.values.iter().cloned());
        meta.types.extend(pkg.types.iter().cloned());
        meta.constructors.extend(pkg.constructors.iter().cloned());
        meta.traits.extend(pkg.traits.iter().cloned());
        meta.operators.extend(pkg.operators.iter().cloned());
    }

    let mut map = FxHashMap::default();
    for pkg in packages {
        map.insert(pkg.name.clone(), pkg);
    }
    map.insert(meta.name.clone(), meta);
    map
}

fn a() -> Ty {
    Ty::var("a")
}

fn b() -> Ty {
    Ty::var("b")
}

fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
    Ty::func(params, ret)
}

fn lib_list() -> VirtualPackage {
    VirtualPackage::new("lib/list")
        .val("map", fun(vec![fun(vec![a()], b()), Ty::list(a())], Ty::list(b())))
        .val("filter", fun(vec![fun(vec![a()], Ty::bool()), Ty::list(a())], Ty::list(a())))
        .val("foldl", fun(vec![fun(vec![b(), a()], b()), b(), Ty::list(a())], b()))
        .val("foldr", fun(vec![fun(vec![a(), b()], b()), b(), Ty::list(a())], b()))
        .val("len", fun(vec![Ty::list(a())], Ty::int()))
        .val("head", fun(vec![Ty::list(a())], Ty::optional(a())))
        .val("tail", fun(vec![Ty::list(a())], Ty::list(a())))
        .val("nth", fun(vec![Ty::list(a()), Ty::int()], Ty::optional(a())))
        .val("reverse", fun(vec![Ty::list(a())], Ty::list(a())))
        .val("sort", fun(vec![Ty::list(a())], Ty::list(a())))
        .val(
            "sort_by",
            fun(
                vec![fun(vec![a(), a()], Ty::con("Ordering")), Ty::list(a())],
                Ty::list(a()),
            ),
        )
        .val(
            "zip",
            fun(
                vec![Ty::list(a()), Ty::list(b())],
                Ty::list(Ty::Tuple(vec![a(), b()])),
            ),
        )
        .val("range", fun(vec![Ty::int(), Ty::int()], Ty::list(Ty::int())))
        .val("append", fun(vec![Ty::list(a()), a()], Ty::list(a())))
        .val("flatten", fun(vec![Ty::list(Ty::list(a()))], Ty::list(a())))
        .val("any", fun(vec![fun(vec![a()], Ty::bool()), Ty::list(a())], Ty::bool()))
        .val("all", fun(vec![fun(vec![a()], Ty::bool()), Ty::list(a())], Ty::bool()))
        .val("take", fun(vec![Ty::int(), Ty::list(a())], Ty::list(a())))
        .val("drop", fun(vec![Ty::int(), Ty::list(a())], Ty::list(a())))
        .val("contains", fun(vec![Ty::list(a()), a()], Ty::bool()))
}

fn lib_map() -> VirtualPackage {
    let k = || Ty::var("k");
    let v = || Ty::var("v");
    VirtualPackage::new("lib/map")
        .val("map_new", fun(vec![], Ty::map(k(), v())))
        .val("map_get", fun(vec![Ty::map(k(), v()), k()], Ty::optional(v())))
        .val("map_put", fun(vec![Ty::map(k(), v()), k(), v()], Ty::map(k(), v())))
        .val("map_del", fun(vec![Ty::map(k(), v()), k()], Ty::map(k(), v())))
        .val("map_has", fun(vec![Ty::map(k(), v()), k()], Ty::bool()))
        .val("map_size", fun(vec![Ty::map(k(), v())], Ty::int()))
        .val("map_keys", fun(vec![Ty::map(k(), v())], Ty::list(k())))
        .val("map_values", fun(vec![Ty::map(k(), v())], Ty::list(v())))
        .val(
            "map_merge",
            fun(vec![Ty::map(k(), v()), Ty::map(k(), v())], Ty::map(k(), v())),
        )
}

fn lib_bytes() -> VirtualPackage {
    let bytes = || Ty::con("Bytes");
    VirtualPackage::new("lib/bytes")
        .val("bytes_len", fun(vec![bytes()], Ty::int()))
        .val("bytes_slice", fun(vec![bytes(), Ty::int(), Ty::int()], bytes()))
        .val("bytes_at", fun(vec![bytes(), Ty::int()], Ty::optional(Ty::int())))
        .val("to_hex", fun(vec![bytes()], Ty::string()))
        .val("from_hex", fun(vec![Ty::string()], Ty::optional(bytes())))
        .val("bytes_to_list", fun(vec![bytes()], Ty::list(Ty::int())))
        .val("list_to_bytes", fun(vec![Ty::list(Ty::int())], bytes()))
        .val("utf8_encode", fun(vec![Ty::string()], bytes()))
        .val("utf8_decode", fun(vec![bytes()], Ty::optional(Ty::string())))
}

fn lib_bits() -> VirtualPackage {
    let bits = || Ty::con("Bits");
    VirtualPackage::new("lib/bits")
        .val("bits_len", fun(vec![bits()], Ty::int()))
        .val("popcount", fun(vec![bits()], Ty::int()))
        .val("bit_get", fun(vec![bits(), Ty::int()], Ty::bool()))
        .val("bit_set", fun(vec![bits(), Ty::int(), Ty::bool()], bits()))
        .val("to_bits", fun(vec![Ty::int()], bits()))
        .val("from_bits", fun(vec![bits()], Ty::int()))
}

fn lib_string() -> VirtualPackage {
    VirtualPackage::new("lib/string")
        .val("upper", fun(vec![Ty::string()], Ty::string()))
        .val("lower", fun(vec![Ty::string()], Ty::string()))
        .val("trim", fun(vec![Ty::string()], Ty::string()))
        .val("split", fun(vec![Ty::string(), Ty::string()], Ty::list(Ty::string())))
        .val("join", fun(vec![Ty::list(Ty::string()), Ty::string()], Ty::string()))
        .val(
            "replace",
            fun(vec![Ty::string(), Ty::string(), Ty::string()], Ty::string()),
        )
        .val("starts_with", fun(vec![Ty::string(), Ty::string()], Ty::bool()))
        .val("ends_with", fun(vec![Ty::string(), Ty::string()], Ty::bool()))
        .val(
            "index_of",
            fun(vec![Ty::string(), Ty::string()], Ty::optional(Ty::int())),
        )
        .val("substr", fun(vec![Ty::string(), Ty::int(), Ty::int()], Ty::string()))
        .val("chars", fun(vec![Ty::string()], Ty::list(Ty::char())))
        .val("repeat", fun(vec![Ty::string(), Ty::int()], Ty::string()))
        .val("pad_left", fun(vec![Ty::string(), Ty::int(), Ty::char()], Ty::string()))
        .val("pad_right", fun(vec![Ty::string(), Ty::int(), Ty::char()], Ty::string()))
}

fn lib_time() -> VirtualPackage {
    VirtualPackage::new("lib/time")
        .val("now", fun(vec![], Ty::int()))
        .val("monotonic", fun(vec![], Ty::int()))
        .val("sleep", fun(vec![Ty::int()], Ty::nil()))
        .val("elapsed", fun(vec![Ty::int()], Ty::int()))
}

fn lib_io() -> VirtualPackage {
    let io_result = |ok: Ty| Ty::result(Ty::string(), ok);
    VirtualPackage::new("lib/io")
        .val("print", fun(vec![a()], Ty::nil()))
        .val("println", fun(vec![a()], Ty::nil()))
        .val("readline", fun(vec![], Ty::optional(Ty::string())))
        .val("read_file", fun(vec![Ty::string()], io_result(Ty::string())))
        .val(
            "write_file",
            fun(vec![Ty::string(), Ty::string()], io_result(Ty::nil())),
        )
        .val(
            "append_file",
            fun(vec![Ty::string(), Ty::string()], io_result(Ty::nil())),
        )
        .val("file_exists", fun(vec![Ty::string()], Ty::bool()))
        .val("delete_file", fun(vec![Ty::string()], io_result(Ty::nil())))
        .val("list_dir", fun(vec![Ty::string()], io_result(Ty::list(Ty::string()))))
}

fn lib_sys() -> VirtualPackage {
    VirtualPackage::new("lib/sys")
        .val("args", fun(vec![], Ty::list(Ty::string())))
        .val("getenv", fun(vec![Ty::string()], Ty::optional(Ty::string())))
        .val("setenv", fun(vec![Ty::string(), Ty::string()], Ty::nil()))
        .val("exit", fun(vec![Ty::int()], Ty::nil()))
        .val("platform", fun(vec![], Ty::string()))
        .val("cwd", fun(vec![], Ty::string()))
        .val(
            "run_cmd",
            fun(
                vec![Ty::string(), Ty::list(Ty::string())],
                Ty::result(Ty::string(), Ty::string()),
            ),
        )
}

fn lib_tuple() -> VirtualPackage {
    VirtualPackage::new("lib/tuple")
        .val("fst", fun(vec![Ty::Tuple(vec![a(), b()])], a()))
        .val("snd", fun(vec![Ty::Tuple(vec![a(), b()])], b()))
        .val(
            "swap",
            fun(vec![Ty::Tuple(vec![a(), b()])], Ty::Tuple(vec![b(), a()])),
        )
}

fn lib_math() -> VirtualPackage {
    let unary = || fun(vec![Ty::float()], Ty::float());
    VirtualPackage::new("lib/math")
        .val("abs", fun(vec![a()], a()))
        .val("sqrt", unary())
        .val("pow", fun(vec![Ty::float(), Ty::float()], Ty::float()))
        .val("sin", unary())
        .val("cos", unary())
        .val("tan", unary())
        .val("log", unary())
        .val("exp", unary())
        .val("floor", fun(vec![Ty::float()], Ty::int()))
        .val("ceil", fun(vec![Ty::float()], Ty::int()))
        .val("round", fun(vec![Ty::float()], Ty::int()))
        .val("min", fun(vec![a(), a()], a()))
        .val("max", fun(vec![a(), a()], a()))
        .val("clamp", fun(vec![a(), a(), a()], a()))
        .val("pi", Ty::float())
}

fn lib_bignum() -> VirtualPackage {
    let big = || Ty::con("BigInt");
    let rational = || Ty::con("Rational");
    VirtualPackage::new("lib/bignum")
        .val("big", fun(vec![Ty::int()], big()))
        .val("big_parse", fun(vec![Ty::string()], Ty::optional(big())))
        .val("big_to_int", fun(vec![big()], Ty::optional(Ty::int())))
        .val("big_pow", fun(vec![big(), Ty::int()], big()))
        .val("rational", fun(vec![Ty::int(), Ty::int()], rational()))
        .val("numerator", fun(vec![rational()], big()))
        .val("denominator", fun(vec![rational()], big()))
}

fn lib_char() -> VirtualPackage {
    let pred = || fun(vec![Ty::char()], Ty::bool());
    VirtualPackage::new("lib/char")
        .val("ord", fun(vec![Ty::char()], Ty::int()))
        .val("chr", fun(vec![Ty::int()], Ty::char()))
        .val("is_digit", pred())
        .val("is_alpha", pred())
        .val("is_space", pred())
        .val("is_upper", pred())
        .val("is_lower", pred())
        .val("char_upper", fun(vec![Ty::char()], Ty::char()))
        .val("char_lower", fun(vec![Ty::char()], Ty::char()))
}

fn lib_json() -> VirtualPackage {
    let json = || Ty::con("Json");
    VirtualPackage::new("lib/json")
        .ty("Json", Kind::Star)
        .val("json_parse", fun(vec![Ty::string()], Ty::result(Ty::string(), json())))
        .val("json_render", fun(vec![json()], Ty::string()))
        .val("json_get", fun(vec![json(), Ty::string()], Ty::optional(json())))
        .val("json_list", fun(vec![json()], Ty::optional(Ty::list(json()))))
        .val("json_str", fun(vec![json()], Ty::optional(Ty::string())))
        .val("json_num", fun(vec![json()], Ty::optional(Ty::float())))
        .val("json_bool", fun(vec![json()], Ty::optional(Ty::bool())))
}

fn lib_crypto() -> VirtualPackage {
    let bytes = || Ty::con("Bytes");
    VirtualPackage::new("lib/crypto")
        .val("sha256", fun(vec![bytes()], bytes()))
        .val("sha1", fun(vec![bytes()], bytes()))
        .val("md5", fun(vec![bytes()], bytes()))
        .val("hmac_sha256", fun(vec![bytes(), bytes()], bytes()))
        .val("random_bytes", fun(vec![Ty::int()], bytes()))
        .val("b64_encode", fun(vec![bytes()], Ty::string()))
        .val("b64_decode", fun(vec![Ty::string()], Ty::optional(bytes())))
}

fn lib_regex() -> VirtualPackage {
    let regex = || Ty::con("Regex");
    VirtualPackage::new("lib/regex")
        .ty("Regex", Kind::Star)
        .val(
            "re_compile",
            fun(vec![Ty::string()], Ty::result(Ty::string(), regex())),
        )
        .val("re_match", fun(vec![regex(), Ty::string()], Ty::bool()))
        .val("re_find", fun(vec![regex(), Ty::string()], Ty::optional(Ty::string())))
        .val("re_find_all", fun(vec![regex(), Ty::string()], Ty::list(Ty::string())))
        .val(
            "re_replace",
            fun(vec![regex(), Ty::string(), Ty::string()], Ty::string()),
        )
        .val("re_split", fun(vec![regex(), Ty::string()], Ty::list(Ty::string())))
}

fn lib_http() -> VirtualPackage {
    let request = || Ty::con("Request");
    let response = || Ty::con("Response");
    let bytes = || Ty::con("Bytes");
    VirtualPackage::new("lib/http")
        .ty("Request", Kind::Star)
        .ty("Response", Kind::Star)
        .val(
            "http_get",
            fun(vec![Ty::string()], Ty::result(Ty::string(), response())),
        )
        .val(
            "http_post",
            fun(vec![Ty::string(), bytes()], Ty::result(Ty::string(), response())),
        )
        .val("response_status", fun(vec![response()], Ty::int()))
        .val("response_body", fun(vec![response()], bytes()))
        .val(
            "response_header",
            fun(vec![response(), Ty::string()], Ty::optional(Ty::string())),
        )
        .val("request_path", fun(vec![request()], Ty::string()))
        .val("request_method", fun(vec![request()], Ty::string()))
        .val("request_body", fun(vec![request()], bytes()))
        .val(
            "http_serve",
            fun(vec![Ty::int(), fun(vec![request()], response())], Ty::nil()),
        )
}

fn lib_test() -> VirtualPackage {
    VirtualPackage::new("lib/test")
        .val("assert", fun(vec![Ty::bool()], Ty::nil()))
        .val("assert_eq", fun(vec![a(), a()], Ty::nil()))
        .val("assert_ne", fun(vec![a(), a()], Ty::nil()))
        .val("fail", fun(vec![Ty::string()], Ty::nil()))
        .val("test_case", fun(vec![Ty::string(), fun(vec![], Ty::nil())], Ty::nil()))
}

fn lib_rand() -> VirtualPackage {
    VirtualPackage::new("lib/rand")
        .val("rand", fun(vec![], Ty::float()))
        .val("rand_int", fun(vec![Ty::int(), Ty::int()], Ty::int()))
        .val("rand_seed", fun(vec![Ty::int()], Ty::nil()))
        .val("shuffle", fun(vec![Ty::list(a())], Ty::list(a())))
        .val("choice", fun(vec![Ty::list(a())], Ty::optional(a())))
}

fn lib_date() -> VirtualPackage {
    let date = || Ty::con("Date");
    VirtualPackage::new("lib/date")
        .ty("Date", Kind::Star)
        .val("date_now", fun(vec![], date()))
        .val(
            "date_parse",
            fun(vec![Ty::string(), Ty::string()], Ty::optional(date())),
        )
        .val("date_format", fun(vec![date(), Ty::string()], Ty::string()))
        .val("date_add", fun(vec![date(), Ty::int()], date()))
        .val("date_diff", fun(vec![date(), date()], Ty::int()))
        .val("date_year", fun(vec![date()], Ty::int()))
        .val("date_month", fun(vec![date()], Ty::int()))
        .val("date_day", fun(vec![date()], Ty::int()))
}

fn lib_ws() -> VirtualPackage {
    let socket = || Ty::con("Socket");
    let bytes = || Ty::con("Bytes");
    VirtualPackage::new("lib/ws")
        .ty("Socket", Kind::Star)
        .val(
            "ws_connect",
            fun(vec![Ty::string()], Ty::result(Ty::string(), socket())),
        )
        .val(
            "ws_send",
            fun(vec![socket(), bytes()], Ty::result(Ty::string(), Ty::nil())),
        )
        .val(
            "ws_recv",
            fun(vec![socket()], Ty::result(Ty::string(), bytes())),
        )
        .val("ws_close", fun(vec![socket()], Ty::nil()))
}

fn lib_sql() -> VirtualPackage {
    let conn = || Ty::con("Connection");
    let row = || Ty::con("Row");
    VirtualPackage::new("lib/sql")
        .ty("Connection", Kind::Star)
        .ty("Row", Kind::Star)
        .val(
            "sql_open",
            fun(vec![Ty::string()], Ty::result(Ty::string(), conn())),
        )
        .val(
            "sql_exec",
            fun(
                vec![conn(), Ty::string(), Ty::list(Ty::string())],
                Ty::result(Ty::string(), Ty::int()),
            ),
        )
        .val(
            "sql_query",
            fun(
                vec![conn(), Ty::string(), Ty::list(Ty::string())],
                Ty::result(Ty::string(), Ty::list(row())),
            ),
        )
        .val("sql_close", fun(vec![conn()], Ty::nil()))
        .val("row_get", fun(vec![row(), Ty::string()], Ty::optional(Ty::string())))
}

fn lib_url() -> VirtualPackage {
    let url = || Ty::con("Url");
    VirtualPackage::new("lib/url")
        .ty("Url", Kind::Star)
        .val("url_parse", fun(vec![Ty::string()], Ty::optional(url())))
        .val("url_encode", fun(vec![Ty::string()], Ty::string()))
        .val("url_decode", fun(vec![Ty::string()], Ty::string()))
        .val("url_scheme", fun(vec![url()], Ty::string()))
        .val("url_host", fun(vec![url()], Ty::string()))
        .val("url_path", fun(vec![url()], Ty::string()))
        .val("url_query", fun(vec![url(), Ty::string()], Ty::optional(Ty::string())))
}

fn lib_path() -> VirtualPackage {
    VirtualPackage::new("lib/path")
        .val("path_join", fun(vec![Ty::string(), Ty::string()], Ty::string()))
        .val("basename", fun(vec![Ty::string()], Ty::string()))
        .val("dirname", fun(vec![Ty::string()], Ty::string()))
        .val("extname", fun(vec![Ty::string()], Ty::string()))
        .val("is_abs", fun(vec![Ty::string()], Ty::bool()))
        .val("normalize", fun(vec![Ty::string()], Ty::string()))
}

fn lib_uuid() -> VirtualPackage {
    VirtualPackage::new("lib/uuid")
        .val("uuid4", fun(vec![], Ty::string()))
        .val("uuid_valid", fun(vec![Ty::string()], Ty::bool()))
}

fn lib_log() -> VirtualPackage {
    let sink = || fun(vec![Ty::string()], Ty::nil());
    VirtualPackage::new("lib/log")
        .val("log_debug", sink())
        .val("log_info", sink())
        .val("log_warn", sink())
        .val("log_error", sink())
        .val("log_level", fun(vec![Ty::string()], Ty::nil()))
}

fn lib_task() -> VirtualPackage {
    let task = |inner: Ty| Ty::App(Box::new(Ty::con("Task")), vec![inner]);
    VirtualPackage::new("lib/task")
        .ty("Task", Kind::arrow_n(1))
        .val("task_run", fun(vec![fun(vec![], a())], task(a())))
        .val("task_await", fun(vec![task(a())], a()))
        .val("task_cancel", fun(vec![task(a())], Ty::nil()))
        .val(
            "parallel_map",
            fun(vec![fun(vec![a()], b()), Ty::list(a())], Ty::list(b())),
        )
}

fn lib_csv() -> VirtualPackage {
    let rows = || Ty::list(Ty::list(Ty::string()));
    VirtualPackage::new("lib/csv")
        .val("csv_parse", fun(vec![Ty::string()], Ty::result(Ty::string(), rows())))
        .val("csv_render", fun(vec![rows()], Ty::string()))
}

fn lib_flag() -> VirtualPackage {
    VirtualPackage::new("lib/flag")
        .val(
            "flag_str",
            fun(vec![Ty::string(), Ty::string(), Ty::string()], Ty::string()),
        )
        .val("flag_int", fun(vec![Ty::string(), Ty::int(), Ty::string()], Ty::int()))
        .val(
            "flag_bool",
            fun(vec![Ty::string(), Ty::bool(), Ty::string()], Ty::bool()),
        )
        .val("flag_parse", fun(vec![], Ty::list(Ty::string())))
        .val("flag_usage", fun(vec![], Ty::string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap as Map;

    #[test]
    fn every_fixed_path_is_present() {
        let paths = [
            "lib/list", "lib/map", "lib/bytes", "lib/bits", "lib/string", "lib/time",
            "lib/io", "lib/sys", "lib/tuple", "lib/math", "lib/bignum", "lib/char",
            "lib/json", "lib/crypto", "lib/regex", "lib/http", "lib/test", "lib/rand",
            "lib/date", "lib/ws", "lib/sql", "lib/url", "lib/path", "lib/uuid",
            "lib/log", "lib/task", "lib/csv", "lib/flag", "lib",
        ];
        for path in paths {
            assert!(lookup(path).is_some(), "missing virtual package {path}");
        }
    }

    #[test]
    fn function_names_are_unique_across_packages() {
        // Wildcard imports of the meta package must be collision-free.
        let mut owners: Map<&str, &str> = Map::default();
        for (path, pkg) in catalogue() {
            if path == "lib" {
                continue;
            }
            for (name, _) in &pkg.values {
                if let Some(first) = owners.insert(name.as_str(), path.as_str()) {
                    panic!("`{name}` defined in both `{first}` and `{path}`");
                }
            }
        }
    }

    #[test]
    fn meta_package_aggregates_everything() {
        let meta = lookup("lib").unwrap();
        let total: usize = catalogue()
            .iter()
            .filter(|(path, _)| path.as_str() != "lib")
            .map(|(_, pkg)| pkg.values.len())
            .sum();
        assert_eq!(meta.values.len(), total);
        // Spot checks across a few packages.
        let has = |name: &str| meta.values.iter().any(|(n, _)| n == name);
        assert!(has("map"));
        assert!(has("json_parse"));
        assert!(has("uuid4"));
    }

    #[test]
    fn exported_types_carry_kinds() {
        let task = lookup("lib/task").unwrap();
        let (_, _, kind) = task
            .types
            .iter()
            .find(|(n, _, _)| n == "Task")
            .expect("Task type");
        assert_eq!(kind.arity(), 1);
    }

    #[test]
    fn is_virtual_path_rejects_disk_paths() {
        assert!(is_virtual_path("lib"));
        assert!(is_virtual_path("lib/list"));
        assert!(!is_virtual_path("lib/nope"));
        assert!(!is_virtual_path("./vendor/lib"));
    }
}
