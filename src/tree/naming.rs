//! Random identifiers for synthetic packages, files, types and members

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

const PACKAGE_ROOTS: &[&str] = &["org", "com", "net", "io", "edu"];

const PACKAGE_WORDS: &[&str] = &[
    "core", "util", "model", "service", "data", "io", "net", "ui", "common", "engine", "store",
    "report", "parse", "event", "cache", "sync", "auth", "query", "config", "graph",
];

const NOUNS: &[&str] = &[
    "Account", "Buffer", "Cache", "Channel", "Client", "Context", "Document", "Entry", "Event",
    "Factory", "Handler", "Index", "Ledger", "Manager", "Node", "Order", "Parser", "Queue",
    "Record", "Registry", "Session", "Stream", "Table", "Token", "Vector", "Widget",
];

const VERBS: &[&str] = &[
    "build", "check", "compute", "create", "find", "flush", "get", "handle", "load", "merge",
    "parse", "read", "remove", "render", "reset", "resolve", "send", "set", "update", "write",
];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, words: &[&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or("x")
}

/// Generate `count` distinct dotted package names
pub fn namespace_list<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut packages = Vec::with_capacity(count);
    let mut attempts = 0;

    while packages.len() < count {
        attempts += 1;
        let depth = rng.gen_range(1..=3);
        let mut parts = vec![pick(rng, PACKAGE_ROOTS).to_string(), "synth".to_string()];
        for _ in 0..depth {
            parts.push(pick(rng, PACKAGE_WORDS).to_string());
        }
        if attempts > 4 * count {
            // small word lists can repeat; a numbered segment keeps names unique
            parts.push(format!("p{}", packages.len()));
        }
        let name = parts.join(".");
        if seen.insert(name.clone()) {
            packages.push(name);
        }
    }

    packages
}

/// CamelCase file stem, e.g. `SessionCache`
pub fn file_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let words = rng.gen_range(1..=3);
    (0..words).map(|_| pick(rng, NOUNS)).collect()
}

/// CamelCase type name
pub fn type_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}{}", pick(rng, NOUNS), pick(rng, NOUNS))
}

/// lowerCamel method name, e.g. `flushBuffer`
pub fn method_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}{}", pick(rng, VERBS), pick(rng, NOUNS))
}

/// lowerCamel field name, e.g. `ledger`
pub fn field_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let noun = pick(rng, NOUNS);
    let mut chars = noun.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First of `base`, `base2`, `base3`, ... that `taken` rejects
pub fn disambiguate(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
