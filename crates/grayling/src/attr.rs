//! String attribute storage and typed coercion.
//!
//! Graphs carry their configuration as named string values. Everything the
//! initializer reads goes through one of the typed accessors here: raw
//! string, double with default and minimum, boolean token, ordered
//! token-table lookup, or composite dimension. Per-attribute special cases
//! live with the callers, not here.

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrScope {
    Graph,
    Node,
    Edge,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeStore {
    entries: IndexMap<String, String>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn set_if_absent(&mut self, name: &str, value: &str) {
        if !self.entries.contains_key(name) {
            self.entries.insert(name.to_string(), value.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Like [`AttributeStore::get`], but treats an empty value as absent.
    pub fn get_nonempty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Numeric attribute with a default and a lower bound. An unparseable or
    /// missing value yields the default; a parseable value below the minimum
    /// is clamped up to it.
    pub fn get_double(&self, name: &str, default: f64, min: f64) -> f64 {
        match self.get(name).and_then(double_prefix) {
            Some(v) if v >= min => v,
            Some(_) => min,
            None => default,
        }
    }

    /// Integer attribute with a default and a lower bound.
    pub fn get_int(&self, name: &str, default: i64, min: i64) -> i64 {
        match self.get(name).and_then(int_prefix) {
            Some(v) if v >= min => v,
            Some(_) => min,
            None => default,
        }
    }

    /// Boolean attribute; missing or unrecognized values yield `default`.
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        parse_bool(self.get(name)).unwrap_or(default)
    }

    /// Dimension attribute: `"N"` (both axes) or `"W,H"`, in inches, with an
    /// optional trailing `!` marker. Non-positive values are rejected, which
    /// leaves the dimension at its unset default.
    pub fn get_dimension(&self, name: &str) -> Option<Dimension> {
        self.get(name).and_then(parse_dimension)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A parsed dimension in inches, prior to unit conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub x: f64,
    pub y: f64,
    /// Trailing `!`: the value is a hard limit, not an advisory hint.
    pub hard_limit: bool,
}

/// Leading decimal number, `strtod`-style: the longest prefix that forms a
/// number, with its byte length.
fn number_prefix(s: &str) -> Option<(f64, usize)> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if end == int_start || (end == int_start + 1 && bytes[int_start] == b'.') {
        return None;
    }
    // optional exponent, only if it has digits of its own
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    s[..end].parse().ok().map(|v| (v, end))
}

/// Parses a leading decimal number, ignoring trailing text
/// (`"0.5 equally"` → `0.5`).
pub fn double_prefix(s: &str) -> Option<f64> {
    number_prefix(s.trim_start()).map(|(v, _)| v)
}

/// Parses a leading integer, ignoring trailing text (`atoi` semantics).
pub fn int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse().ok()
}

/// Boolean token: `true`/`yes` and `false`/`no` (ASCII case-insensitive),
/// else a numeric value where non-zero means true.
pub fn parse_bool(value: Option<&str>) -> Option<bool> {
    let v = value?.trim();
    if v.is_empty() {
        return None;
    }
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") {
        return Some(true);
    }
    if v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no") {
        return Some(false);
    }
    int_prefix(v).map(|n| n != 0)
}

/// Ordered token-table lookup, first match wins.
pub fn map_token<T: Copy>(value: Option<&str>, table: &[(&str, T)], default: T) -> T {
    let Some(v) = value else {
        return default;
    };
    table
        .iter()
        .find(|(name, _)| *name == v)
        .map(|(_, code)| *code)
        .unwrap_or(default)
}

/// Case-insensitive variant of [`map_token`].
pub fn map_token_ci<T: Copy>(value: Option<&str>, table: &[(&str, T)], default: T) -> T {
    let Some(v) = value else {
        return default;
    };
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(v))
        .map(|(_, code)| *code)
        .unwrap_or(default)
}

fn parse_dimension(s: &str) -> Option<Dimension> {
    let s = s.trim_start();
    let x = double_prefix(s)?;
    let rest = after_number(s);
    if let Some(ys) = rest.strip_prefix(',') {
        if let Some(y) = double_prefix(ys) {
            if x <= 0.0 || y <= 0.0 {
                return None;
            }
            let tail = after_number(ys.trim_start());
            return Some(Dimension {
                x,
                y,
                hard_limit: tail.starts_with('!'),
            });
        }
    }
    if x <= 0.0 {
        return None;
    }
    // A lone number (possibly with trailing text) applies to both axes.
    Some(Dimension {
        x,
        y: x,
        hard_limit: rest.starts_with('!'),
    })
}

/// The text remaining after the leading number of `s`.
fn after_number(s: &str) -> &str {
    let s = s.trim_start();
    match number_prefix(s) {
        Some((_, len)) => &s[len..],
        None => s,
    }
}

/// Global attribute defaults staged from `-G`/`-N`/`-E` flags.
///
/// Keyed by `(scope, name)`; the first declaration of a pair is fixed and
/// later declarations of the same pair are ignored.
#[derive(Debug, Clone, Default)]
pub struct GlobalDefaults {
    entries: IndexMap<(AttrScope, String), String>,
}

impl GlobalDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `name=value`; a bare `name` means boolean true.
    pub fn declare(&mut self, scope: AttrScope, decl: &str) {
        let (name, value) = match decl.split_once('=') {
            Some((name, value)) => (name, value),
            None => (decl, "true"),
        };
        self.entries
            .entry((scope, name.to_string()))
            .or_insert_with(|| value.to_string());
    }

    pub fn get(&self, scope: AttrScope, name: &str) -> Option<&str> {
        self.entries
            .get(&(scope, name.to_string()))
            .map(String::as_str)
    }

    pub fn iter_scope(&self, scope: AttrScope) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(move |((s, _), _)| *s == scope)
            .map(|((_, name), value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
