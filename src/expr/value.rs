//! Value comparison and pattern matching
//!
//! Shared rules for comparing row values: numbers compare numerically,
//! strings compare as instants when both sides parse as dates or datetimes
//! and lexically otherwise, mismatched types do not compare at all.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Attempts to parse a string as an instant.
///
/// Accepts RFC 3339 datetimes, bare `YYYY-MM-DDTHH:MM:SS` datetimes and
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Partial comparison used by predicates.
///
/// Returns `None` when either side is null or the types are incomparable;
/// a comparison a predicate cannot decide is simply false.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64()?;
            let b = b.as_f64()?;
            a.partial_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => {
            if let (Some(a), Some(b)) = (parse_instant(a), parse_instant(b)) {
                Some(a.cmp(&b))
            } else {
                Some(a.cmp(b))
            }
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total comparison used for ordering result rows.
///
/// Missing and null sort first, then bool < number < string; dates compare
/// as instants. Arrays and objects tie.
pub fn sort_compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn type_order(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let rank = type_order(a).cmp(&type_order(b));
            if rank != Ordering::Equal {
                return rank;
            }
            compare_values(a, b).unwrap_or(Ordering::Equal)
        }
    }
}

/// SQL LIKE matching: `%` matches any run, `_` matches one character.
pub fn like_match(value: &str, pattern: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();
    like_match_at(&value, &pattern)
}

fn like_match_at(value: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some(('%', rest)) => {
            if rest.is_empty() {
                return true;
            }
            for start in 0..=value.len() {
                if like_match_at(&value[start..], rest) {
                    return true;
                }
            }
            false
        }
        Some(('_', rest)) => match value.split_first() {
            Some((_, value_rest)) => like_match_at(value_rest, rest),
            None => false,
        },
        Some((c, rest)) => match value.split_first() {
            Some((v, value_rest)) if v == c => like_match_at(value_rest, rest),
            _ => false,
        },
    }
}

/// Regular-expression matching for the `rlike` operator.
///
/// An invalid pattern matches nothing.
pub fn rlike_match(value: &str, pattern: &str) -> bool {
    match regex::Regex::new(pattern) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_comparison() {
        assert_eq!(compare_values(&json!(1), &json!(2)), Some(Ordering::Less));
        assert_eq!(
            compare_values(&json!(2.5), &json!(2)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_null_never_compares() {
        assert_eq!(compare_values(&json!(null), &json!(1)), None);
        assert_eq!(compare_values(&json!("a"), &json!(null)), None);
    }

    #[test]
    fn test_mismatched_types_never_compare() {
        assert_eq!(compare_values(&json!("123"), &json!(123)), None);
    }

    #[test]
    fn test_date_strings_compare_as_instants() {
        // Lexically "2020-01-09" < "2020-01-10" too, but offsets must not confuse
        let a = json!("2020-01-09T23:00:00+05:00");
        let b = json!("2020-01-09T20:00:00+00:00");
        assert_eq!(compare_values(&a, &b), Some(Ordering::Less));
    }

    #[test]
    fn test_bare_date_parses() {
        assert!(parse_instant("2020-01-10").is_some());
        assert!(parse_instant("not a date").is_none());
    }

    #[test]
    fn test_sort_compare_type_ranks() {
        assert_eq!(
            sort_compare(Some(&json!(true)), Some(&json!(0))),
            Ordering::Less
        );
        assert_eq!(sort_compare(None, Some(&json!(null))), Ordering::Less);
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like_match("Johnson", "%son"));
        assert!(like_match("Wilson", "%son"));
        assert!(!like_match("Smith", "%son"));
        assert!(like_match("abc", "a_c"));
        assert!(like_match("john smith", "%john%smith%"));
        assert!(!like_match("smith john", "%john%smith%"));
    }

    #[test]
    fn test_rlike_alternation() {
        assert!(rlike_match("hello world", "(hello|goodbye)"));
        assert!(!rlike_match("nothing here", "(hello|goodbye)"));
        assert!(!rlike_match("anything", "(unclosed"));
    }
}
