//! `warden-auth`: authentication and RBAC authorization boundary.
//!
//! This crate is decoupled from HTTP and storage: transports hand it header
//! values, methods and paths; storage is reached through the traits in
//! [`store`].

pub mod account;
pub mod assign;
pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod identity;
pub mod password;
pub mod permissions;
pub mod requirements;
pub mod roles;
pub mod store;
pub mod token;

pub use account::{AccountService, LoginOutcome};
pub use assign::{RoleAssignmentResolver, requested_role_names};
pub use authenticate::{IdentityResolver, extract_bearer};
pub use authorize::{
    Decision, EffectivePermissions, MatchingMode, PermissionResolver, PermissionSource,
    effective_permissions, module_from_path,
};
pub use claims::{Claims, TokenValidationError, validate_claims};
pub use error::{AuthError, AuthResult, StoreError};
pub use identity::{Identity, IdentityUpdate, NewIdentity, PasswordDigest, ResolvedIdentity};
pub use password::CredentialVerifier;
pub use permissions::{Permission, Scope};
pub use requirements::{Method, RequirementTable};
pub use roles::{DEFAULT_ROLE, Role, RoleName};
pub use store::{CredentialStore, IdentityFilter, RoleFilter, RoleStore};
pub use token::{DEFAULT_TOKEN_TTL_SECS, TokenService};
