use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier of the form `{module}_{scope}` (e.g. `users_read`).
///
/// Opaque at this layer: no hierarchy, no wildcards, compared by equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The permission a request against `module` with `scope` requires.
    ///
    /// Module names are expected to be free of `_`.
    pub fn required(module: &str, scope: Scope) -> Self {
        Self(Cow::Owned(format!("{module}_{}", scope.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Operation class fixed per HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Read,
    Write,
    Update,
    Delete,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Read => "read",
            Scope::Write => "write",
            Scope::Update => "update",
            Scope::Delete => "delete",
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_joins_module_and_scope() {
        assert_eq!(Permission::required("users", Scope::Read).as_str(), "users_read");
        assert_eq!(Permission::required("posts", Scope::Delete).as_str(), "posts_delete");
    }

    #[test]
    fn permissions_are_case_sensitive() {
        assert_ne!(Permission::new("Posts_read"), Permission::new("posts_read"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Permission::new("roles_write")).unwrap();
        assert_eq!(json, "\"roles_write\"");
    }
}
