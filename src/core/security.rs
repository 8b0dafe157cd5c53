//! Export security gate
//!
//! A binary allow/deny decision per export definition. How callers are
//! authenticated is outside this module: a [`PrincipalSource`] only reports
//! who the current caller is, if anyone.

use crate::domain::{ExportDefinition, ExportError, Result};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

/// Role that admits any authenticated caller when listed on a definition
pub const DEFAULT_WILDCARD_ROLE: &str = "*";

tokio::task_local! {
    static CURRENT_PRINCIPAL: Principal;
}

/// Authenticated caller and its roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, R>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }
}

/// Reports the caller of the export currently running
pub trait PrincipalSource: Send + Sync {
    /// `None` when the caller is not authenticated
    fn current(&self) -> Option<Principal>;
}

/// Same principal for every call (CLI runs, tests)
#[derive(Debug, Clone, Default)]
pub struct FixedPrincipal(Option<Principal>);

impl FixedPrincipal {
    pub fn new(principal: Principal) -> Self {
        Self(Some(principal))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl PrincipalSource for FixedPrincipal {
    fn current(&self) -> Option<Principal> {
        self.0.clone()
    }
}

/// Principal bound to the current Tokio task with [`with_principal`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskPrincipal;

impl PrincipalSource for TaskPrincipal {
    fn current(&self) -> Option<Principal> {
        CURRENT_PRINCIPAL.try_with(Principal::clone).ok()
    }
}

/// Run `fut` with `principal` as the caller seen by [`TaskPrincipal`]
pub async fn with_principal<F: Future>(principal: Principal, fut: F) -> F::Output {
    CURRENT_PRINCIPAL.scope(principal, fut).await
}

/// Allow/deny gate consulted before an export runs
pub trait ExportSecurity: Send + Sync {
    /// `Ok(())` to allow, [`ExportError::AccessDenied`] to deny
    fn check_allowed(&self, definition: &ExportDefinition) -> Result<()>;
}

/// Allows every export
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAllSecurity;

impl ExportSecurity for PermitAllSecurity {
    fn check_allowed(&self, _definition: &ExportDefinition) -> Result<()> {
        Ok(())
    }
}

/// Role check against the current principal
///
/// An empty role set on the definition allows everyone, authenticated or
/// not. Otherwise the caller must be authenticated and either the wildcard
/// role is listed or the caller holds at least one listed role.
#[derive(Clone)]
pub struct RoleBasedSecurity {
    principals: Arc<dyn PrincipalSource>,
    wildcard_role: String,
}

impl RoleBasedSecurity {
    pub fn new(principals: Arc<dyn PrincipalSource>) -> Self {
        Self::with_wildcard(principals, DEFAULT_WILDCARD_ROLE)
    }

    pub fn with_wildcard(
        principals: Arc<dyn PrincipalSource>,
        wildcard_role: impl Into<String>,
    ) -> Self {
        Self {
            principals,
            wildcard_role: wildcard_role.into(),
        }
    }
}

impl ExportSecurity for RoleBasedSecurity {
    fn check_allowed(&self, definition: &ExportDefinition) -> Result<()> {
        let allowed = definition.allowed_roles();
        if allowed.is_empty() {
            return Ok(());
        }

        let denied = || ExportError::AccessDenied {
            export_key: definition.key().to_string(),
        };

        let Some(principal) = self.principals.current() else {
            tracing::debug!(export_key = %definition.key(), "Unauthenticated caller denied");
            return Err(denied());
        };

        if allowed.contains(&self.wildcard_role)
            || !principal.roles().is_disjoint(allowed)
        {
            return Ok(());
        }

        tracing::debug!(
            export_key = %definition.key(),
            principal = principal.name(),
            "Caller holds none of the export's roles"
        );
        Err(denied())
    }
}
