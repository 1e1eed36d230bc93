//! Requirement sets: per package name, the distinct `name@range` values
//! requested by every relevant requester.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::spec::PackageSpec;

/// Ordered, duplicate-free list of `name@range` strings for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestedRanges(Vec<String>);

impl RequestedRanges {
    /// Add a value; returns `false` if it was already present.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.0.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Requirement set for one scope, keyed by package name.
///
/// A key may map to an empty set: during deactivation that means nobody
/// besides the module being deactivated needs the package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementSet {
    packages: BTreeMap<String, RequestedRanges>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a key exists without requesting anything.
    pub fn track(&mut self, name: &str) {
        self.packages.entry(name.to_string()).or_default();
    }

    /// Add a requester's spec under its package name.
    pub fn request(&mut self, spec: &PackageSpec) {
        self.packages
            .entry(spec.name().to_string())
            .or_default()
            .insert(spec.to_string());
    }

    /// Add `spec` only if its package is already tracked.
    ///
    /// Used for host and theme pins: they matter only for packages the
    /// module under consideration touches.
    pub fn request_if_tracked(&mut self, spec: &PackageSpec) -> bool {
        match self.packages.get_mut(spec.name()) {
            Some(ranges) => ranges.insert(spec.to_string()),
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&RequestedRanges> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RequestedRanges)> {
        self.packages.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Whether any package is requested with more than one distinct value.
    pub fn has_conflicts(&self) -> bool {
        self.packages.values().any(|r| r.len() > 1)
    }
}
