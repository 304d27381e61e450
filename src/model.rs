//! Core data model for tenant associations.
//!
//! These types mirror the backend's association payloads (camelCase wire
//! names) and the aggregate state the store exposes to callers. Records are
//! immutable once fetched except for the `default` flag, which flips during
//! a set-default operation.

use serde::{Deserialize, Serialize};

/// A single tenant a user is associated with.
///
/// `domain` is the primary key within a user's association set. `id` is the
/// backend identifier and may be empty for a synthesized current-tenant
/// placeholder that has not been resolved against the backend yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    /// Unique tenant domain within the user's association set.
    pub domain: String,
    /// Opaque backend identifier. Empty for placeholder records.
    #[serde(default)]
    pub id: String,
    /// Whether this tenant is the user's default landing tenant.
    #[serde(rename = "default", default)]
    pub is_default: bool,
    /// How the user is linked to the tenant (e.g. membership vs. invite).
    #[serde(default)]
    pub association_type: String,
    /// Deployment unit name, present only in multi-region deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_unit_name: Option<String>,
    /// Console hostname for region-aware tenant switching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_hostname: Option<String>,
}

impl TenantRecord {
    /// Create a record with the given domain and backend id.
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            id: id.into(),
            is_default: false,
            association_type: String::new(),
            deployment_unit_name: None,
            console_hostname: None,
        }
    }

    /// Synthesize a placeholder for a current tenant that was not found in
    /// the loaded pages. Placeholders carry an empty `id` and never claim
    /// the default flag.
    pub fn placeholder(domain: impl Into<String>) -> Self {
        Self::new(domain, "")
    }

    /// Whether this record is an unresolved placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }
}

/// One page of an association listing as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPage {
    /// Records in backend order for this page.
    pub associated_tenants: Vec<TenantRecord>,
    /// Total number of associations across all pages.
    pub total_results: usize,
}

/// A deployment unit (region) a tenant can be homed in.
///
/// Only meaningful when central deployment and region selection are both
/// enabled; used for display disambiguation and switch-target resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentUnit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_hostname: Option<String>,
}

/// The aggregate association state for one session.
///
/// `associated_tenants` is the authoritative, paginated list in arrival
/// order. `current_tenant` always exists; it is a placeholder when the
/// session's tenant was not present in the loaded pages. `default_tenant`
/// is `None` until a record with the default flag has been loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSet {
    pub associated_tenants: Vec<TenantRecord>,
    pub current_tenant: TenantRecord,
    pub default_tenant: Option<TenantRecord>,
    /// Display identity of the session owner. Presentation only.
    pub username: String,
}

impl AssociationSet {
    /// Whether the session's current tenant is also the default tenant.
    ///
    /// Drives the disabled state of a "make default" control: there is
    /// nothing to do when the current tenant already holds the flag.
    pub fn is_current_default(&self) -> bool {
        self.default_tenant
            .as_ref()
            .is_some_and(|default| default.domain == self.current_tenant.domain)
    }

    /// Look up an associated tenant by domain.
    pub fn find(&self, domain: &str) -> Option<&TenantRecord> {
        self.associated_tenants
            .iter()
            .find(|record| record.domain == domain)
    }
}

/// Pagination position for incremental association loading.
///
/// `offset` advances by `limit` on each successful load-more call and is
/// reset to zero whenever the set is (re)initialized. `has_more` stays true
/// while the backend may still hold unloaded records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl PaginationCursor {
    /// Create a cursor at the start of the listing.
    pub fn new(limit: usize) -> Self {
        Self {
            offset: 0,
            limit,
            has_more: true,
        }
    }

    /// Rewind to the first page, assuming more data until proven otherwise.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.has_more = true;
    }

    /// Offset the next load-more call should fetch at.
    pub fn next_offset(&self) -> usize {
        self.offset + self.limit
    }

    /// Record a completed load-more call that returned `fetched` records.
    pub fn advance(&mut self, fetched: usize) {
        self.offset += self.limit;
        self.has_more = fetched == self.limit;
    }
}

/// Resolved destination for a tenant switch.
///
/// The console hostname is populated only in region-aware deployments;
/// otherwise the switch stays on the current console host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTarget {
    pub domain: String,
    pub console_hostname: Option<String>,
}
