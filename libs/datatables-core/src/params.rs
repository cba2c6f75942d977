//! Lenient accessors over the untyped request payload.
//!
//! DataTables posts everything as strings (`"start": "20"`, `"regex": "false"`)
//! and indexes columns/order entries with object keys (`"0"`, `"1"`, ...).
//! Query-string decoders may hand over arrays or real numbers instead, so every
//! accessor here accepts either shape and treats anything it cannot read as
//! absent.

use std::borrow::Cow;

use serde_json::Value;

/// Look up `key` in a JSON object; `None` for non-objects.
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object().and_then(|o| o.get(key))
}

/// Scalar as text. Strings are borrowed, numbers and booleans are rendered.
pub fn text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Integer with leading-digits semantics: `"11"`, `" 11 "`, `"11px"` and `11`
/// all read as 11; `"abc"` and `""` read as absent.
pub fn int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

/// `true` only for the boolean `true` or the string `"true"`.
pub fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

/// Entries of an index-keyed collection in ascending index order.
///
/// Objects contribute entries whose keys parse as non-negative integers,
/// arrays contribute every element at its position.
pub fn indexed(value: &Value) -> Vec<(usize, &Value)> {
    let mut out: Vec<(usize, &Value)> = match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| k.trim().parse::<usize>().ok().map(|i| (i, v)))
            .collect(),
        Value::Array(items) => items.iter().enumerate().collect(),
        _ => Vec::new(),
    };
    out.sort_by_key(|(i, _)| *i);
    out
}

/// Empty or whitespace-only text.
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_reads_strings_and_numbers() {
        assert_eq!(int(&json!("11")), Some(11));
        assert_eq!(int(&json!(" 7 ")), Some(7));
        assert_eq!(int(&json!("20rows")), Some(20));
        assert_eq!(int(&json!("-1")), Some(-1));
        assert_eq!(int(&json!(42)), Some(42));
        assert_eq!(int(&json!("abc")), None);
        assert_eq!(int(&json!("")), None);
        assert_eq!(int(&json!(null)), None);
    }

    #[test]
    fn flag_is_strict() {
        assert!(flag(&json!("true")));
        assert!(flag(&json!(true)));
        assert!(!flag(&json!("TRUE")));
        assert!(!flag(&json!("1")));
        assert!(!flag(&json!(null)));
    }

    #[test]
    fn indexed_sorts_numeric_keys() {
        let v = json!({"10": "c", "2": "b", "0": "a", "x": "skip"});
        let got: Vec<_> = indexed(&v)
            .into_iter()
            .map(|(i, v)| (i, v.as_str().unwrap()))
            .collect();
        assert_eq!(got, vec![(0, "a"), (2, "b"), (10, "c")]);
    }

    #[test]
    fn indexed_accepts_arrays() {
        let v = json!(["a", "b"]);
        assert_eq!(indexed(&v).len(), 2);
        assert_eq!(indexed(&v)[1].0, 1);
    }

    #[test]
    fn text_renders_scalars() {
        assert_eq!(text(&json!("x")).as_deref(), Some("x"));
        assert_eq!(text(&json!(3)).as_deref(), Some("3"));
        assert_eq!(text(&json!(false)).as_deref(), Some("false"));
        assert!(text(&json!({})).is_none());
    }
}
