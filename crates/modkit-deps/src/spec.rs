//! `name@range` package specs.
//!
//! Module descriptors list their dependencies as npm-style strings such as
//! `lodash@^4.17.0` or `@babel/core@7.x`. The package name is everything
//! before the last `@` that is not the leading `@` of a scoped name. A bare
//! name means "any version" and normalizes to `name@*`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scope::Scope;

/// Range used when a dependency is declared without one.
pub const ANY_RANGE: &str = "*";

/// A parsed `name@range` dependency entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageSpec {
    name: String,
    range: String,
}

impl PackageSpec {
    /// Parse a dependency string.
    ///
    /// ```
    /// use modkit_deps::PackageSpec;
    ///
    /// let spec = PackageSpec::parse("@nuxt/image@^1.0.0").unwrap();
    /// assert_eq!(spec.name(), "@nuxt/image");
    /// assert_eq!(spec.range(), "^1.0.0");
    ///
    /// let bare = PackageSpec::parse("moment").unwrap();
    /// assert_eq!(bare.to_string(), "moment@*");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidSpec {
                spec: raw.to_string(),
                reason: "empty dependency entry".to_string(),
            });
        }

        let (name, range) = match trimmed.rfind('@') {
            Some(idx) if idx > 0 => (&trimmed[..idx], trimmed[idx + 1..].trim()),
            _ => (trimmed, ""),
        };
        let name = name.trim();

        if name.is_empty() || name == "@" {
            return Err(Error::InvalidSpec {
                spec: raw.to_string(),
                reason: "missing package name".to_string(),
            });
        }
        if name.starts_with('@') && !name.contains('/') {
            return Err(Error::InvalidSpec {
                spec: raw.to_string(),
                reason: "scoped package name must look like @scope/name".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            range: if range.is_empty() {
                ANY_RANGE.to_string()
            } else {
                range.to_string()
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> &str {
        &self.range
    }
}

impl std::fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.range)
    }
}

/// Package name portion of a `name@range` string, scoped names preserved.
pub fn package_name(raw: &str) -> Result<String> {
    PackageSpec::parse(raw).map(|spec| spec.name)
}

/// Normalize a dependency list: parse each entry, skip blanks and drop
/// duplicates while keeping first-seen order.
pub fn normalize<S: AsRef<str>>(entries: &[S]) -> Result<Vec<PackageSpec>> {
    let mut specs: Vec<PackageSpec> = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.as_ref().trim().is_empty() {
            continue;
        }
        let spec = PackageSpec::parse(entry.as_ref())?;
        if !specs.contains(&spec) {
            specs.push(spec);
        }
    }
    Ok(specs)
}

/// The `packageDependencies` block of a module descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependencies {
    #[serde(default)]
    pub api: Vec<String>,
    #[serde(default)]
    pub theme: Vec<String>,
}

impl PackageDependencies {
    pub fn get(&self, scope: Scope) -> &[String] {
        match scope {
            Scope::Api => &self.api,
            Scope::Theme => &self.theme,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api.is_empty() && self.theme.is_empty()
    }

    /// Scopes with at least one declared dependency.
    pub fn declared_scopes(&self) -> Vec<Scope> {
        Scope::ALL
            .into_iter()
            .filter(|scope| self.get(*scope).iter().any(|s| !s.trim().is_empty()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("lodash@^4.17.0", "lodash", "^4.17.0")]
    #[case("@babel/core@7.x", "@babel/core", "7.x")]
    #[case("@scope/pkg", "@scope/pkg", "*")]
    #[case("moment", "moment", "*")]
    #[case("  axios@ 1.6.0 ", "axios", "1.6.0")]
    #[case("left-pad@", "left-pad", "*")]
    #[case("react@>=16.8.0 <19", "react", ">=16.8.0 <19")]
    fn parse_cases(#[case] raw: &str, #[case] name: &str, #[case] range: &str) {
        let spec = PackageSpec::parse(raw).unwrap();
        assert_eq!(spec.name(), name);
        assert_eq!(spec.range(), range);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("@")]
    #[case("@^1.0.0")]
    #[case("@scope@1.0.0")]
    fn parse_rejects(#[case] raw: &str) {
        assert!(matches!(PackageSpec::parse(raw), Err(Error::InvalidSpec { .. })));
    }

    #[test]
    fn display_reconstructs_scoped_name() {
        let spec = PackageSpec::parse("@nuxt/image@1.2.3").unwrap();
        assert_eq!(spec.to_string(), "@nuxt/image@1.2.3");
    }

    #[test]
    fn normalize_dedupes_and_keeps_order() {
        let specs = normalize(&["b@1", "a", "", "b@1", "a@*", "b@2"]).unwrap();
        let rendered: Vec<String> = specs.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["b@1", "a@*", "b@2"]);
    }

    #[test]
    fn declared_scopes_ignores_blank_lists() {
        let deps = PackageDependencies {
            api: vec!["lodash@^4".into()],
            theme: vec!["  ".into()],
        };
        assert_eq!(deps.declared_scopes(), vec![Scope::Api]);
    }
}
