//! Provider trait for the backend association API.
//!
//! This is the seam between the store and the REST layer. The design is
//! async-first with an associated error type so transport errors surface
//! with full fidelity while the store converts them to alerts at its
//! boundary.

use crate::context::RequestContext;
use crate::model::{DeploymentUnit, TenantPage};
use std::future::Future;

/// Backend operations the association store depends on.
///
/// Implementations wrap the console's REST client. The in-memory
/// implementation in [`crate::providers`] backs the test suite.
pub trait AssociationProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// List the tenants associated with the session's user.
    ///
    /// `cursor` is an opaque continuation token; the current backend pages
    /// by `limit`/`offset` and ignores it, but it is part of the wire
    /// contract.
    fn list_associated_tenants(
        &self,
        cursor: Option<&str>,
        limit: usize,
        offset: usize,
        context: &RequestContext,
    ) -> impl Future<Output = Result<TenantPage, Self::Error>> + Send;

    /// Mark the tenant with the given domain as the user's default.
    fn set_default_tenant(
        &self,
        domain: &str,
        context: &RequestContext,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// List the deployment units tenants can be homed in.
    ///
    /// Only called in region-aware deployments; the default implementation
    /// reports none.
    fn list_deployment_units(
        &self,
        context: &RequestContext,
    ) -> impl Future<Output = Result<Vec<DeploymentUnit>, Self::Error>> + Send {
        let _ = context;
        async { Ok(Vec::new()) }
    }
}
