use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for permission checks.
///
/// Roles are intentionally opaque strings at this layer; mapping roles to
/// allowed actions is done by policy configuration, never hardcoded into
/// domain logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Built-in roles of the default permission policy.
    pub fn admin() -> Self {
        Self(Cow::Borrowed("admin"))
    }

    pub fn manager() -> Self {
        Self(Cow::Borrowed("manager"))
    }

    pub fn purchaser() -> Self {
        Self(Cow::Borrowed("purchaser"))
    }

    pub fn warehouse() -> Self {
        Self(Cow::Borrowed("warehouse"))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}
