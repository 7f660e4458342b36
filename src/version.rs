//! Version ordering.
//!
//! Versions are split on `.` and `-`; each part is further split into digit
//! and non-digit runs. Digit runs compare numerically, other runs
//! case-insensitively, and a version that is a prefix of another sorts
//! first (`1.0` < `1.0.1` < `1.0.10`).

use std::cmp::Ordering;

use serde::Serialize;

#[derive(Clone, Copy, Debug)]
enum Token<'a> {
    Number(&'a str),
    Text(&'a str),
}

fn tokens(version: &str) -> impl Iterator<Item = Token<'_>> {
    version
        .split(['.', '-'])
        .filter(|part| !part.is_empty())
        .flat_map(runs)
}

fn runs(part: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = part.as_bytes();
    for i in 1..=bytes.len() {
        let boundary =
            i == bytes.len() || bytes[i].is_ascii_digit() != bytes[start].is_ascii_digit();
        if boundary {
            let run = &part[start..i];
            if bytes[start].is_ascii_digit() {
                out.push(Token::Number(run));
            } else {
                out.push(Token::Text(run));
            }
            start = i;
        }
    }
    out
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_tokens(a: Token<'_>, b: Token<'_>) -> Ordering {
    match (a, b) {
        (Token::Number(a), Token::Number(b)) => compare_numbers(a, b),
        // Qualifiers sort before releases: 1.0.beta < 1.0.1
        (Token::Text(_), Token::Number(_)) => Ordering::Less,
        (Token::Number(_), Token::Text(_)) => Ordering::Greater,
        (Token::Text(a), Token::Text(b)) => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
    }
}

/// Compare two version strings. Versions that differ only in leading zeros
/// or separator style compare equal.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = tokens(a);
    let mut right = tokens(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = compare_tokens(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// A version string ordered by [`compare_versions`], falling back to plain
/// string order so distinct strings never compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionKey(pub String);

impl VersionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VersionKey {
    fn from(version: &str) -> Self {
        VersionKey(version.to_string())
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for VersionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_parts_compare_numerically() {
        assert_eq!(compare_versions("1.2", "1.10"), Ordering::Less);
        assert_eq!(compare_versions("2.0.0", "1.99.99"), Ordering::Greater);
        assert_eq!(compare_versions("1.01", "1.1"), Ordering::Equal);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn test_qualifier_before_release() {
        assert_eq!(compare_versions("1.0.beta", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0-RC1", "1.0-rc2"), Ordering::Less);
        assert_eq!(compare_versions("1.0a", "1.0b"), Ordering::Less);
    }

    #[test]
    fn test_version_key_total_order() {
        let mut versions: Vec<VersionKey> = ["1.10", "1.2", "1.01", "1.1", "0.9"]
            .into_iter()
            .map(VersionKey::from)
            .collect();
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(VersionKey::as_str).collect();
        assert_eq!(sorted, vec!["0.9", "1.01", "1.1", "1.2", "1.10"]);
        assert_ne!(VersionKey::from("1.01"), VersionKey::from("1.1"));
    }
}
