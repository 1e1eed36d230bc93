//! npm-style version range parsing and checking.
//!
//! Module descriptors and pin manifests use the npm range grammar, which is
//! close to but not the same as Cargo's: a bare version is an exact match,
//! comparators are separated by spaces, `||` separates alternatives and
//! `a - b` is an inclusive hyphen range. Each alternative is translated into
//! a [`semver::VersionReq`].
//!
//! # Examples
//!
//! ```
//! use modkit_deps::range::NpmRange;
//!
//! let range = NpmRange::parse("^4.0.0").unwrap();
//! assert!(range.satisfies("4.17.21"));
//! assert!(!range.satisfies("5.0.0"));
//!
//! let range = NpmRange::parse(">=1.2.0 <2 || 3.x").unwrap();
//! assert!(range.satisfies("1.9.9"));
//! assert!(range.satisfies("3.4.0"));
//! assert!(!range.satisfies("2.1.0"));
//! ```

use semver::{Version, VersionReq};

use crate::error::{Error, Result};

/// One `||`-separated alternative.
#[derive(Debug, Clone)]
enum Alternative {
    /// `*`, `x`, `latest` or an empty range.
    Any,
    Req(VersionReq),
}

impl Alternative {
    fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => version.pre.is_empty(),
            Self::Req(req) => req.matches(version),
        }
    }
}

/// A parsed npm version range.
#[derive(Debug, Clone)]
pub struct NpmRange {
    alternatives: Vec<Alternative>,
    /// The original range string for display.
    raw: String,
}

impl NpmRange {
    /// Parse an npm range.
    ///
    /// Dist-tags other than `latest`, git URLs and file paths are rejected
    /// with [`Error::InvalidRange`].
    pub fn parse(range: &str) -> Result<Self> {
        let raw = range.to_string();
        let mut alternatives = Vec::new();

        for part in range.split("||") {
            alternatives.push(parse_alternative(part.trim()).map_err(|reason| {
                Error::InvalidRange {
                    range: raw.clone(),
                    reason,
                }
            })?);
        }

        Ok(Self { alternatives, raw })
    }

    /// Check a version string; unparseable versions never match.
    pub fn satisfies(&self, version: &str) -> bool {
        match parse_version(version) {
            Ok(v) => self.satisfies_version(&v),
            Err(_) => false,
        }
    }

    pub fn satisfies_version(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(version))
    }

    /// Return the original range string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for NpmRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Whether an installed version satisfies a range string.
///
/// Ranges that cannot be parsed are treated as unsatisfied, so the planner
/// hands them to the package manager instead of guessing.
pub fn range_accepts(range: &str, version: &str) -> bool {
    NpmRange::parse(range)
        .map(|r| r.satisfies(version))
        .unwrap_or(false)
}

/// Check a module's host compatibility range against the running host.
///
/// Versions are compared with missing or trailing `.0` segments normalized,
/// so a host at `1.2` satisfies `>=1.2.0` and vice versa.
pub fn host_compatible(range: &str, host_version: &str) -> Result<bool> {
    let range = NpmRange::parse(range)?;
    let version = parse_version(host_version)?;
    Ok(range.satisfies_version(&version))
}

/// Parse a concrete version leniently.
///
/// - `"v1.2.3"` -> `1.2.3`
/// - `"1.2"` -> `1.2.0`
/// - `"1"` -> `1.0.0`
pub fn parse_version(s: &str) -> Result<Version> {
    let s = s.trim();
    let s = s.strip_prefix('v').unwrap_or(s);

    if let Ok(v) = Version::parse(s) {
        return Ok(v);
    }

    let (core, rest) = match s.find(['-', '+']) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    };
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => s.to_string(),
    };
    Version::parse(&padded).map_err(|e| Error::InvalidVersion {
        version: s.to_string(),
        reason: e.to_string(),
    })
}

fn parse_alternative(part: &str) -> std::result::Result<Alternative, String> {
    if is_any(part) {
        return Ok(Alternative::Any);
    }

    let comparators = if let Some((low, high)) = part.split_once(" - ") {
        hyphen_comparators(low.trim(), high.trim())?
    } else {
        let mut comparators = Vec::new();
        for token in merge_operator_tokens(part) {
            if let Some(c) = translate_comparator(&token)? {
                comparators.push(c);
            }
        }
        comparators
    };

    if comparators.is_empty() {
        return Ok(Alternative::Any);
    }

    VersionReq::parse(&comparators.join(", "))
        .map(Alternative::Req)
        .map_err(|e| e.to_string())
}

fn is_any(part: &str) -> bool {
    matches!(part, "" | "*" | "x" | "X" | "latest")
}

/// npm allows `>= 1.2.3`; glue a lone operator to the token after it.
fn merge_operator_tokens(part: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<&str> = None;
    for token in part.split_whitespace() {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            pending = Some(token);
            continue;
        }
        match pending.take() {
            Some(op) => tokens.push(format!("{op}{token}")),
            None => tokens.push(token.to_string()),
        }
    }
    tokens
}

/// Translate one npm comparator into semver syntax.
///
/// Returns `None` for comparators that accept everything (`>=*`, `1.x`
/// without bounds collapse into partial versions instead).
fn translate_comparator(token: &str) -> std::result::Result<Option<String>, String> {
    let op_len = token
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '~' | '^'))
        .ok_or_else(|| format!("comparator '{token}' has no version"))?;
    let (op, version) = token.split_at(op_len);
    let version = version.strip_prefix('v').unwrap_or(version);

    if !version.starts_with(|c: char| c.is_ascii_digit() || matches!(c, 'x' | 'X' | '*')) {
        return Err(format!("'{token}' is not a version comparator"));
    }

    let partial = strip_wildcards(version);
    if partial.is_empty() {
        return Ok(None);
    }

    let op = match op {
        "" | "=" => "=",
        "~>" => "~",
        ">" | ">=" | "<" | "<=" | "~" | "^" => op,
        other => return Err(format!("unsupported operator '{other}'")),
    };
    Ok(Some(format!("{op}{partial}")))
}

/// `1.2.x` -> `1.2`, `1.*` -> `1`, `*` -> ``.
fn strip_wildcards(version: &str) -> String {
    let mut kept = Vec::new();
    for segment in version.split('.') {
        if matches!(segment, "x" | "X" | "*") {
            break;
        }
        kept.push(segment);
    }
    kept.join(".")
}

fn hyphen_comparators(low: &str, high: &str) -> std::result::Result<Vec<String>, String> {
    let low = strip_wildcards(low.strip_prefix('v').unwrap_or(low));
    let high = strip_wildcards(high.strip_prefix('v').unwrap_or(high));
    let mut out = Vec::new();
    if !low.is_empty() {
        out.push(format!(">={low}"));
    }
    if !high.is_empty() {
        // A partial upper bound includes the whole partial range: `- 2.3` is `<2.4.0`.
        let parts: Vec<&str> = high.split('.').collect();
        let bound = match parts.as_slice() {
            [major] => {
                let major: u64 = major.parse().map_err(|_| format!("bad bound '{high}'"))?;
                let next = major
                    .checked_add(1)
                    .ok_or_else(|| format!("bound '{high}' is too large"))?;
                format!("<{next}.0.0")
            }
            [major, minor] => {
                let minor: u64 = minor.parse().map_err(|_| format!("bad bound '{high}'"))?;
                let next = minor
                    .checked_add(1)
                    .ok_or_else(|| format!("bound '{high}' is too large"))?;
                format!("<{major}.{next}.0")
            }
            _ => format!("<={high}"),
        };
        out.push(bound);
    }
    Ok(out)
}
