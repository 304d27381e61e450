//! Shared fixtures and test doubles for the integration suite.

#![allow(dead_code)]

use std::sync::Arc;
use tenant_associations::providers::{InMemoryAssociationProvider, InMemoryProviderError};
use tenant_associations::{AssociationProvider, DeploymentUnit, RequestContext, SessionContext, TenantPage, TenantRecord};
use tokio::sync::Semaphore;

/// Route `log` output to the test harness. Safe to call from every test;
/// only the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a plain association record.
pub fn tenant(domain: &str, id: &str) -> TenantRecord {
    TenantRecord::new(domain, id)
}

/// Build `n` records `tenant-0..tenant-n`, optionally flagging one default.
pub fn seeded_tenants(n: usize, default_index: Option<usize>) -> Vec<TenantRecord> {
    (0..n)
        .map(|i| {
            let mut record = tenant(&format!("tenant-{i}"), &format!("id-{i}"));
            record.is_default = default_index == Some(i);
            record
        })
        .collect()
}

/// A regular session acting in `tenant-0`.
pub fn session() -> SessionContext {
    SessionContext::new("tenant-0", "jo").with_email("jo@example.com")
}

/// Provider wrapper that parks selected calls on semaphores so tests can
/// interleave operations deterministically.
///
/// List calls at or past `gate_list_from_offset` wait for a permit from
/// [`GatedProvider::release_list`]; set-default calls wait for
/// [`GatedProvider::release_set_default`]. Gated semaphores start with no
/// permits.
pub struct GatedProvider {
    pub inner: InMemoryAssociationProvider,
    list_gate: Arc<Semaphore>,
    set_default_gate: Arc<Semaphore>,
    gate_list_from_offset: usize,
    gate_set_default: bool,
}

impl GatedProvider {
    /// Gate list calls whose offset is at least `gate_list_from_offset`.
    pub fn gating_list_from(inner: InMemoryAssociationProvider, offset: usize) -> Self {
        Self {
            inner,
            list_gate: Arc::new(Semaphore::new(0)),
            set_default_gate: Arc::new(Semaphore::new(0)),
            gate_list_from_offset: offset,
            gate_set_default: false,
        }
    }

    /// Gate set-default calls only.
    pub fn gating_set_default(inner: InMemoryAssociationProvider) -> Self {
        Self {
            inner,
            list_gate: Arc::new(Semaphore::new(0)),
            set_default_gate: Arc::new(Semaphore::new(0)),
            gate_list_from_offset: usize::MAX,
            gate_set_default: true,
        }
    }

    /// Let one gated list call proceed.
    pub fn release_list(&self) {
        self.list_gate.add_permits(1);
    }

    /// Let one gated set-default call proceed.
    pub fn release_set_default(&self) {
        self.set_default_gate.add_permits(1);
    }
}

impl AssociationProvider for GatedProvider {
    type Error = InMemoryProviderError;

    async fn list_associated_tenants(
        &self,
        cursor: Option<&str>,
        limit: usize,
        offset: usize,
        context: &RequestContext,
    ) -> Result<TenantPage, Self::Error> {
        if offset >= self.gate_list_from_offset {
            let permit = self.list_gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        self.inner
            .list_associated_tenants(cursor, limit, offset, context)
            .await
    }

    async fn set_default_tenant(
        &self,
        domain: &str,
        context: &RequestContext,
    ) -> Result<(), Self::Error> {
        if self.gate_set_default {
            let permit = self.set_default_gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        self.inner.set_default_tenant(domain, context).await
    }

    async fn list_deployment_units(
        &self,
        context: &RequestContext,
    ) -> Result<Vec<DeploymentUnit>, Self::Error> {
        self.inner.list_deployment_units(context).await
    }
}
