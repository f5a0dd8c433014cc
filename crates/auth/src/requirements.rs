//! Permission requirement table: HTTP method → scope, plus the set of
//! permission strings each method has required so far.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Permission, Scope};

/// The HTTP methods that carry a permission requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Scope a request with this method requires.
    pub fn scope(self) -> Scope {
        match self {
            Method::Get => Scope::Read,
            Method::Post => Scope::Write,
            Method::Put => Scope::Update,
            Method::Delete => Scope::Delete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported method '{0}'")]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct RequirementEntry {
    seen: RwLock<HashSet<Permission>>,
}

impl RequirementEntry {
    fn insert(&self, permission: &Permission) -> bool {
        {
            let seen = self.seen.read().unwrap_or_else(PoisonError::into_inner);
            if seen.contains(permission) {
                return false;
            }
        }
        // Re-checked under the write lock; concurrent inserts of the same
        // string collapse into one.
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(permission.clone())
    }

    fn first_in(&self, granted: &HashSet<Permission>) -> Option<Permission> {
        let seen = self.seen.read().unwrap_or_else(PoisonError::into_inner);
        let mut hits: Vec<&Permission> = seen.iter().filter(|p| granted.contains(*p)).collect();
        hits.sort();
        hits.first().map(|p| (*p).clone())
    }

    fn snapshot(&self) -> Vec<Permission> {
        let seen = self.seen.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<Permission> = seen.iter().cloned().collect();
        all.sort();
        all
    }
}

/// Per-method requirement cache, owned by the permission resolver.
///
/// Empty at construction and populated lazily by authorization checks. Grows
/// with the number of distinct `{method, module}` pairs exercised; never
/// evicts.
#[derive(Debug, Default)]
pub struct RequirementTable {
    get: RequirementEntry,
    post: RequirementEntry,
    put: RequirementEntry,
    delete: RequirementEntry,
}

impl RequirementTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, method: Method) -> &RequirementEntry {
        match method {
            Method::Get => &self.get,
            Method::Post => &self.post,
            Method::Put => &self.put,
            Method::Delete => &self.delete,
        }
    }

    pub fn scope(&self, method: Method) -> Scope {
        method.scope()
    }

    /// Record `permission` as required by `method`. Returns `true` if it was
    /// not registered before.
    pub fn register(&self, method: Method, permission: &Permission) -> bool {
        self.entry(method).insert(permission)
    }

    /// Every permission string registered against `method`, sorted.
    pub fn registered(&self, method: Method) -> Vec<Permission> {
        self.entry(method).snapshot()
    }

    /// The smallest registered permission for `method` that `granted` holds.
    pub fn first_registered_in(
        &self,
        method: Method,
        granted: &HashSet<Permission>,
    ) -> Option<Permission> {
        self.entry(method).first_in(granted)
    }
}
