//! Dependency scopes and the per-scope container used across the planner.

use serde::{Deserialize, Serialize};

/// Which project a package dependency belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The host backend project root.
    Api,
    /// The currently active front-end theme.
    Theme,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Api, Scope::Theme];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Theme => "theme",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per [`Scope`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerScope<T> {
    pub api: T,
    pub theme: T,
}

impl<T> PerScope<T> {
    pub fn new(api: T, theme: T) -> Self {
        Self { api, theme }
    }

    pub fn get(&self, scope: Scope) -> &T {
        match scope {
            Scope::Api => &self.api,
            Scope::Theme => &self.theme,
        }
    }

    pub fn get_mut(&mut self, scope: Scope) -> &mut T {
        match scope {
            Scope::Api => &mut self.api,
            Scope::Theme => &mut self.theme,
        }
    }

    /// Iterate `(scope, value)` in `api`, `theme` order.
    pub fn iter(&self) -> impl Iterator<Item = (Scope, &T)> {
        Scope::ALL.into_iter().map(move |scope| (scope, self.get(scope)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Scope, &T) -> U) -> PerScope<U> {
        PerScope {
            api: f(Scope::Api, &self.api),
            theme: f(Scope::Theme, &self.theme),
        }
    }
}
