//! Environment assignment string handling
//!
//! systemd exposes its activation environment as an array of `NAME=value`
//! strings. Values may themselves contain `=`, so splitting happens on the
//! first `=` only.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Split a single `NAME=value` assignment on the first `=`.
///
/// An entry without `=` is reported as an error rather than skipped, so the
/// caller decides what to do with it.
pub fn parse_assignment(entry: &str) -> Result<(&str, &str)> {
    entry
        .split_once('=')
        .ok_or_else(|| Error::MalformedAssignment(entry.to_string()))
}

/// Parse a sequence of `NAME=value` strings into a map.
///
/// Later entries overwrite earlier ones with the same name, matching how
/// systemd itself applies its environment list.
pub fn parse_environment<I, S>(entries: I) -> Result<HashMap<String, String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut env = HashMap::new();
    for entry in entries {
        let (name, value) = parse_assignment(entry.as_ref())?;
        env.insert(name.to_string(), value.to_string());
    }
    Ok(env)
}

/// Format name/value pairs as `NAME=value` strings, preserving input order.
pub fn format_assignments<I, K, V>(vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    vars.into_iter()
        .map(|(name, value)| format!("{}={}", name.as_ref(), value.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(parse_assignment("A=1").unwrap(), ("A", "1"));
        assert_eq!(parse_assignment("B=two=three").unwrap(), ("B", "two=three"));
        assert_eq!(parse_assignment("EMPTY=").unwrap(), ("EMPTY", ""));
    }

    #[test]
    fn assignment_without_equals_is_an_error() {
        let err = parse_assignment("NOEQUALS").unwrap_err();
        assert!(matches!(err, Error::MalformedAssignment(ref s) if s == "NOEQUALS"));
    }

    #[test]
    fn environment_roundtrip() {
        let env = parse_environment(["A=1", "B=two=three"]).unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env["A"], "1");
        assert_eq!(env["B"], "two=three");
    }

    #[test]
    fn environment_last_duplicate_wins() {
        let env = parse_environment(["A=1", "A=2"]).unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env["A"], "2");
    }

    #[test]
    fn environment_propagates_malformed_entries() {
        assert!(parse_environment(["A=1", "BROKEN"]).is_err());
    }

    #[test]
    fn assignments_preserve_input_order() {
        let assignments = format_assignments([("X", "y"), ("Z", "1 2")]);
        assert_eq!(assignments, vec!["X=y".to_string(), "Z=1 2".to_string()]);
    }
}
