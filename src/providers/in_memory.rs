//! In-memory association provider.
//!
//! Thread-safe provider backed by a tokio `RwLock`, designed for testing
//! and development. Supports per-operation failure injection and call
//! counting so tests can assert that guarded paths really skip the
//! network.

use crate::context::RequestContext;
use crate::model::{DeploymentUnit, TenantPage, TenantRecord};
use crate::provider::AssociationProvider;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors produced by the in-memory provider.
#[derive(Debug, Clone, Error)]
pub enum InMemoryProviderError {
    /// A failure injected by a test via `fail_next_*`.
    #[error("Injected failure for operation '{operation}'")]
    Injected { operation: String },

    /// Set-default was asked for a domain with no association.
    #[error("Tenant not found: '{domain}'")]
    TenantNotFound { domain: String },
}

#[derive(Debug, Default)]
struct Inner {
    tenants: Vec<TenantRecord>,
    deployment_units: Vec<DeploymentUnit>,
    fail_next_list: bool,
    fail_next_set_default: bool,
    fail_next_deployment_units: bool,
    list_calls: usize,
    set_default_calls: usize,
    deployment_unit_calls: usize,
}

/// Thread-safe in-memory implementation of [`AssociationProvider`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssociationProvider {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryAssociationProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider pre-seeded with associations.
    pub async fn with_tenants(tenants: Vec<TenantRecord>) -> Self {
        let provider = Self::new();
        provider.inner.write().await.tenants = tenants;
        provider
    }

    /// Append an association.
    pub async fn seed(&self, tenant: TenantRecord) {
        self.inner.write().await.tenants.push(tenant);
    }

    /// Replace the deployment unit listing.
    pub async fn set_deployment_units(&self, units: Vec<DeploymentUnit>) {
        self.inner.write().await.deployment_units = units;
    }

    /// Make the next listing call fail.
    pub async fn fail_next_list(&self) {
        self.inner.write().await.fail_next_list = true;
    }

    /// Make the next set-default call fail.
    pub async fn fail_next_set_default(&self) {
        self.inner.write().await.fail_next_set_default = true;
    }

    /// Make the next deployment unit listing call fail.
    pub async fn fail_next_deployment_units(&self) {
        self.inner.write().await.fail_next_deployment_units = true;
    }

    /// Number of listing calls served (including injected failures).
    pub async fn list_calls(&self) -> usize {
        self.inner.read().await.list_calls
    }

    /// Number of set-default calls served (including injected failures).
    pub async fn set_default_calls(&self) -> usize {
        self.inner.read().await.set_default_calls
    }

    /// Number of deployment unit listing calls served.
    pub async fn deployment_unit_calls(&self) -> usize {
        self.inner.read().await.deployment_unit_calls
    }

    /// Current default tenant domain, if any record holds the flag.
    pub async fn default_domain(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .tenants
            .iter()
            .find(|tenant| tenant.is_default)
            .map(|tenant| tenant.domain.clone())
    }

    /// Clear all data and counters (useful for testing).
    pub async fn clear(&self) {
        *self.inner.write().await = Inner::default();
    }
}

impl AssociationProvider for InMemoryAssociationProvider {
    type Error = InMemoryProviderError;

    async fn list_associated_tenants(
        &self,
        _cursor: Option<&str>,
        limit: usize,
        offset: usize,
        context: &RequestContext,
    ) -> Result<TenantPage, Self::Error> {
        let mut inner = self.inner.write().await;
        inner.list_calls += 1;

        if std::mem::take(&mut inner.fail_next_list) {
            log::debug!(
                "request {}: injected list failure at offset {}",
                context.request_id,
                offset
            );
            return Err(InMemoryProviderError::Injected {
                operation: "list_associated_tenants".to_string(),
            });
        }

        let total_results = inner.tenants.len();
        let associated_tenants = inner
            .tenants
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(TenantPage {
            associated_tenants,
            total_results,
        })
    }

    async fn set_default_tenant(
        &self,
        domain: &str,
        context: &RequestContext,
    ) -> Result<(), Self::Error> {
        let mut inner = self.inner.write().await;
        inner.set_default_calls += 1;

        if std::mem::take(&mut inner.fail_next_set_default) {
            log::debug!(
                "request {}: injected set-default failure for '{}'",
                context.request_id,
                domain
            );
            return Err(InMemoryProviderError::Injected {
                operation: "set_default_tenant".to_string(),
            });
        }

        if !inner.tenants.iter().any(|tenant| tenant.domain == domain) {
            return Err(InMemoryProviderError::TenantNotFound {
                domain: domain.to_string(),
            });
        }

        for tenant in &mut inner.tenants {
            tenant.is_default = tenant.domain == domain;
        }
        Ok(())
    }

    async fn list_deployment_units(
        &self,
        _context: &RequestContext,
    ) -> Result<Vec<DeploymentUnit>, Self::Error> {
        let mut inner = self.inner.write().await;
        inner.deployment_unit_calls += 1;

        if std::mem::take(&mut inner.fail_next_deployment_units) {
            return Err(InMemoryProviderError::Injected {
                operation: "list_deployment_units".to_string(),
            });
        }

        Ok(inner.deployment_units.clone())
    }
}
