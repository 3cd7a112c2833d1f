//! Package specifier parsing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters that end a package name and start its version constraint
const CONSTRAINT_OPERATORS: &[char] = &['=', '<', '>', '~'];

/// A declared package: bare name plus the verbatim constraint that followed it
///
/// `constraint` keeps its operator (`"=1.2.3"`, `">2.4.6"`, `"~1.0"`) and is
/// empty when the specifier named a package without any version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub constraint: String,
}

impl PackageSpec {
    /// Split a specifier such as `"bar>2.4.6"` into name and constraint
    ///
    /// Any string is accepted; validating the constraint is left to the
    /// resolver.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.find(CONSTRAINT_OPERATORS) {
            Some(pos) => Self {
                name: s[..pos].to_string(),
                constraint: s[pos..].to_string(),
            },
            None => Self {
                name: s.to_string(),
                constraint: String::new(),
            },
        }
    }

    /// Specifier pinned to one exact version
    #[must_use]
    pub fn pinned(name: impl Into<String>, version: &str) -> Self {
        Self {
            name: name.into(),
            constraint: format!("={version}"),
        }
    }

    /// Exact version when the constraint is an `=` pin
    #[must_use]
    pub fn pinned_version(&self) -> Option<&str> {
        self.constraint
            .strip_prefix('=')
            .filter(|v| !v.is_empty() && !v.starts_with('='))
    }

    /// Whether the specifier carries no version constraint at all
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.constraint.is_empty()
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.constraint)
    }
}
