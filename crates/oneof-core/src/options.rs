//! # Load Options
//!
//! Per-call knobs forwarded unchanged from a dispatcher to its delegate:
//! which required fields may be missing ([`Partial`]) and what to do with
//! fields the delegate does not declare ([`UnknownPolicy`]).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Handling of input fields not declared by a schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Record an "Unknown field." error against each undeclared field.
    #[default]
    Raise,
    /// Drop undeclared fields silently.
    Exclude,
    /// Pass undeclared fields through to the loaded data.
    Include,
}

impl UnknownPolicy {
    /// Lowercase name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raise => "raise",
            Self::Exclude => "exclude",
            Self::Include => "include",
        }
    }
}

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnknownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raise" => Ok(Self::Raise),
            "exclude" => Ok(Self::Exclude),
            "include" => Ok(Self::Include),
            other => Err(format!(
                "unknown field policy '{other}' (expected raise, exclude, or include)"
            )),
        }
    }
}

/// Which required fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Partial {
    /// Every required field must be present.
    #[default]
    Disabled,
    /// No required field is enforced.
    All,
    /// Only the named fields may be absent.
    Fields(BTreeSet<String>),
}

impl Partial {
    /// Partial loading for the given field names.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fields(names.into_iter().map(Into::into).collect())
    }

    /// Returns true if a missing `field` should not be reported.
    pub fn allows_missing(&self, field: &str) -> bool {
        match self {
            Self::Disabled => false,
            Self::All => true,
            Self::Fields(names) => names.contains(field),
        }
    }
}

impl From<bool> for Partial {
    fn from(partial: bool) -> Self {
        if partial {
            Self::All
        } else {
            Self::Disabled
        }
    }
}

/// Options for a single load call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Required-field relaxation.
    pub partial: Partial,
    /// Unknown-field policy; `None` defers to the schema's configured default.
    pub unknown: Option<UnknownPolicy>,
}

impl LoadOptions {
    /// Strict defaults: nothing partial, schema-default unknown policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the partial policy.
    pub fn partial(mut self, partial: impl Into<Partial>) -> Self {
        self.partial = partial.into();
        self
    }

    /// Set the unknown-field policy.
    pub fn unknown(mut self, unknown: UnknownPolicy) -> Self {
        self.unknown = Some(unknown);
        self
    }

    /// The unknown-field policy to apply, falling back to `default`.
    pub fn unknown_or(&self, default: UnknownPolicy) -> UnknownPolicy {
        self.unknown.unwrap_or(default)
    }
}
