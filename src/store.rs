//! The association store.
//!
//! Owns the authoritative, paginated list of tenant associations for one
//! session, plus the derived current/default tenant pointers. All mutations
//! funnel through [`AssociationStore::initialize`],
//! [`AssociationStore::load_next_page`], and
//! [`AssociationStore::mark_default`].
//!
//! Two races the store guards against:
//!
//! * stale responses: every initialize bumps a generation counter and
//!   responses carrying an older generation are discarded;
//! * overlapping load-more calls: a request-in-flight flag serializes
//!   pagination, the losing call is a silent no-op.

use crate::context::{RequestContext, SessionContext};
use crate::error::{AssociationError, AssociationResult};
use crate::model::{AssociationSet, DeploymentUnit, PaginationCursor, TenantRecord};
use crate::notify::{Alert, NotificationSink};
use crate::provider::AssociationProvider;
use crate::reconcile::reconcile;
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Default page size for association listings.
pub const DEFAULT_PAGE_SIZE: usize = 15;

const FETCH_FAILED_DESCRIPTION: &str =
    "Could not retrieve the tenants associated with your account.";
const FETCH_FAILED_MESSAGE: &str = "Tenant retrieval failed";
const DEPLOYMENT_UNITS_FAILED_DESCRIPTION: &str =
    "Could not retrieve the list of deployment units.";
const DEPLOYMENT_UNITS_FAILED_MESSAGE: &str = "Deployment unit retrieval failed";

/// Deployment-level configuration for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Page size for association listings.
    pub page_size: usize,
    /// Whether this console runs as part of a central deployment.
    pub central_deployment_enabled: bool,
    /// Whether tenants can be homed in selectable regions.
    pub region_selection_enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            central_deployment_enabled: false,
            region_selection_enabled: false,
        }
    }
}

impl StoreConfig {
    /// Whether deployment units participate in display and switching.
    pub fn region_aware(&self) -> bool {
        self.central_deployment_enabled && self.region_selection_enabled
    }
}

/// Lifecycle phase of the store.
///
/// `Uninitialized → Loading → Ready | Error`, with `Error → Loading` on
/// retry. `LoadingMore` is the nested sub-state of `Ready` entered while a
/// load-more call is in flight; the association list stays readable
/// throughout it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Uninitialized,
    Loading,
    Ready,
    LoadingMore,
    Error,
}

impl StorePhase {
    /// Whether an association set is available to read.
    pub fn is_ready(&self) -> bool {
        matches!(self, StorePhase::Ready | StorePhase::LoadingMore)
    }
}

#[derive(Debug)]
struct StoreState {
    phase: StorePhase,
    association: Option<AssociationSet>,
    cursor: PaginationCursor,
    deployment_units: Vec<DeploymentUnit>,
}

/// Builder for [`AssociationStore`].
pub struct AssociationStoreBuilder<P, S> {
    provider: Arc<P>,
    sink: Arc<S>,
    config: StoreConfig,
}

impl<P, S> AssociationStoreBuilder<P, S>
where
    P: AssociationProvider,
    S: NotificationSink,
{
    pub fn new(provider: Arc<P>, sink: Arc<S>) -> Self {
        Self {
            provider,
            sink,
            config: StoreConfig::default(),
        }
    }

    /// Override the association page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Enable or disable central deployment mode.
    pub fn with_central_deployment(mut self, enabled: bool) -> Self {
        self.config.central_deployment_enabled = enabled;
        self
    }

    /// Enable or disable region selection.
    pub fn with_region_selection(mut self, enabled: bool) -> Self {
        self.config.region_selection_enabled = enabled;
        self
    }

    pub fn build(self) -> AssociationStore<P, S> {
        let cursor = PaginationCursor::new(self.config.page_size);
        AssociationStore {
            provider: self.provider,
            sink: self.sink,
            config: self.config,
            state: RwLock::new(StoreState {
                phase: StorePhase::Uninitialized,
                association: None,
                cursor,
                deployment_units: Vec::new(),
            }),
            generation: AtomicU64::new(0),
            load_in_flight: AtomicBool::new(false),
        }
    }
}

/// Authoritative association state for one session.
pub struct AssociationStore<P, S> {
    provider: Arc<P>,
    sink: Arc<S>,
    config: StoreConfig,
    state: RwLock<StoreState>,
    generation: AtomicU64,
    load_in_flight: AtomicBool,
}

/// Clears the load-in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<P, S> AssociationStore<P, S>
where
    P: AssociationProvider,
    S: NotificationSink,
{
    /// Create a store with the default configuration.
    pub fn new(provider: Arc<P>, sink: Arc<S>) -> Self {
        AssociationStoreBuilder::new(provider, sink).build()
    }

    /// Start building a store with custom configuration.
    pub fn builder(provider: Arc<P>, sink: Arc<S>) -> AssociationStoreBuilder<P, S> {
        AssociationStoreBuilder::new(provider, sink)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load the first page of associations for `session`.
    ///
    /// No-op for privileged sessions and deployments without the
    /// association feature. On failure the set is left empty (not
    /// partially populated), one error alert is published, and the same
    /// call can be retried.
    pub async fn initialize(&self, session: &SessionContext) -> AssociationResult<()> {
        if !session.loads_associations() {
            debug!(
                "skipping association loading for '{}' (privileged or feature disabled)",
                session.username
            );
            return Ok(());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.phase = StorePhase::Loading;
            state.cursor.reset();
        }

        let context = RequestContext::with_generated_id();
        debug!(
            "request {}: loading associations for tenant '{}'",
            context.request_id, session.tenant_domain
        );

        match self
            .provider
            .list_associated_tenants(None, self.config.page_size, 0, &context)
            .await
        {
            Ok(page) => {
                if self.is_stale(generation) {
                    debug!(
                        "request {}: discarding stale initialize response",
                        context.request_id
                    );
                    return Ok(());
                }

                let total_results = page.total_results;
                let records = dedupe_by_domain(page.associated_tenants);
                let default_tenant = find_default(&records);
                let current_tenant = records
                    .iter()
                    .find(|record| record.domain == session.tenant_domain)
                    .cloned()
                    .unwrap_or_else(|| TenantRecord::placeholder(&session.tenant_domain));

                let mut state = self.state.write().await;
                state.cursor.has_more = total_results > records.len();
                info!(
                    "request {}: loaded {} of {} associations",
                    context.request_id,
                    records.len(),
                    total_results
                );
                state.association = Some(AssociationSet {
                    associated_tenants: records,
                    current_tenant,
                    default_tenant,
                    username: session.display_identity().to_string(),
                });
                state.phase = StorePhase::Ready;
                Ok(())
            }
            Err(error) => {
                if self.is_stale(generation) {
                    return Ok(());
                }

                let mut state = self.state.write().await;
                state.association = Some(AssociationSet {
                    associated_tenants: Vec::new(),
                    current_tenant: TenantRecord::placeholder(&session.tenant_domain),
                    default_tenant: None,
                    username: session.display_identity().to_string(),
                });
                state.phase = StorePhase::Error;
                drop(state);

                warn!(
                    "request {}: association fetch failed: {}",
                    context.request_id, error
                );
                self.sink
                    .publish(Alert::error(FETCH_FAILED_DESCRIPTION, FETCH_FAILED_MESSAGE));
                Err(AssociationError::fetch_failed(error))
            }
        }
    }

    /// Fetch the next page and append it to the association list.
    ///
    /// Returns `Ok(Some(n))` with the number of appended records, or
    /// `Ok(None)` when the call was skipped: the listing is exhausted, the
    /// store is not ready, another load is already in flight, or the
    /// response went stale. Skipped calls never reach the provider.
    pub async fn load_next_page(&self) -> AssociationResult<Option<usize>> {
        {
            let state = self.state.read().await;
            if state.phase != StorePhase::Ready || !state.cursor.has_more {
                return Ok(None);
            }
        }

        if self
            .load_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(None);
        }
        let _guard = InFlightGuard(&self.load_in_flight);

        let (generation, offset) = {
            let mut state = self.state.write().await;
            // Re-check under the write lock; an initialize may have won the
            // race since the fast-path read.
            if state.phase != StorePhase::Ready || !state.cursor.has_more {
                return Ok(None);
            }
            state.phase = StorePhase::LoadingMore;
            // Captured under the lock: any initialize that later makes this
            // call stale must start after the phase was set here, so it
            // rewrites the phase itself and a stale discard cannot leave
            // the store wedged in LoadingMore.
            (
                self.generation.load(Ordering::SeqCst),
                state.cursor.next_offset(),
            )
        };

        let context = RequestContext::with_generated_id();
        debug!(
            "request {}: loading more associations at offset {}",
            context.request_id, offset
        );

        match self
            .provider
            .list_associated_tenants(None, self.config.page_size, offset, &context)
            .await
        {
            Ok(page) => {
                if self.is_stale(generation) {
                    debug!(
                        "request {}: discarding stale page at offset {}",
                        context.request_id, offset
                    );
                    return Ok(None);
                }

                let mut state = self.state.write().await;
                let fetched = page.associated_tenants.len();
                let mut appended = 0;

                if let Some(association) = state.association.as_mut() {
                    for record in page.associated_tenants {
                        if association
                            .associated_tenants
                            .iter()
                            .any(|existing| existing.domain == record.domain)
                        {
                            debug!("dropping duplicate association '{}'", record.domain);
                            continue;
                        }
                        association.associated_tenants.push(record);
                        appended += 1;
                    }

                    // Back-fill pointers the first page did not resolve.
                    if association.default_tenant.is_none() {
                        association.default_tenant = find_default(&association.associated_tenants);
                    }
                    if association.current_tenant.is_placeholder() {
                        let domain = association.current_tenant.domain.clone();
                        if let Some(found) = association
                            .associated_tenants
                            .iter()
                            .find(|record| record.domain == domain)
                            .cloned()
                        {
                            association.current_tenant = found;
                        }
                    }
                }

                state.cursor.advance(fetched);
                state.phase = StorePhase::Ready;
                debug!(
                    "request {}: appended {} associations, has_more={}",
                    context.request_id, appended, state.cursor.has_more
                );
                Ok(Some(appended))
            }
            Err(error) => {
                if self.is_stale(generation) {
                    return Ok(None);
                }

                // The list is not rolled back; only the phase resets.
                let mut state = self.state.write().await;
                state.phase = StorePhase::Ready;
                drop(state);

                warn!(
                    "request {}: load-more failed at offset {}: {}",
                    context.request_id, offset, error
                );
                self.sink
                    .publish(Alert::error(FETCH_FAILED_DESCRIPTION, FETCH_FAILED_MESSAGE));
                Err(AssociationError::fetch_failed(error))
            }
        }
    }

    /// Re-point the default tenant after the backend confirmed an update.
    ///
    /// Flips the `default` flag off the previous holder and onto `tenant`,
    /// keeping the at-most-one invariant locally. Called by the mutator;
    /// never speculatively before confirmation.
    pub async fn mark_default(&self, tenant: &TenantRecord) {
        let mut state = self.state.write().await;
        if let Some(association) = state.association.as_mut() {
            for record in &mut association.associated_tenants {
                record.is_default = record.domain == tenant.domain;
            }
            association.current_tenant.is_default =
                association.current_tenant.domain == tenant.domain;

            let mut promoted = tenant.clone();
            promoted.is_default = true;
            association.default_tenant = Some(promoted);
        }
    }

    /// Fetch and cache the deployment unit listing.
    ///
    /// No-op returning an empty list unless the deployment is region
    /// aware.
    pub async fn load_deployment_units(&self) -> AssociationResult<Vec<DeploymentUnit>> {
        if !self.config.region_aware() {
            return Ok(Vec::new());
        }

        let context = RequestContext::with_generated_id();
        match self.provider.list_deployment_units(&context).await {
            Ok(units) => {
                self.state.write().await.deployment_units = units.clone();
                debug!(
                    "request {}: loaded {} deployment units",
                    context.request_id,
                    units.len()
                );
                Ok(units)
            }
            Err(error) => {
                warn!(
                    "request {}: deployment unit fetch failed: {}",
                    context.request_id, error
                );
                self.sink.publish(Alert::error(
                    DEPLOYMENT_UNITS_FAILED_DESCRIPTION,
                    DEPLOYMENT_UNITS_FAILED_MESSAGE,
                ));
                Err(AssociationError::deployment_units_failed(error))
            }
        }
    }

    /// Snapshot of the association set, if one has been loaded.
    pub async fn association(&self) -> Option<AssociationSet> {
        self.state.read().await.association.clone()
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> StorePhase {
        self.state.read().await.phase
    }

    /// Whether the initial load is in flight.
    pub async fn is_loading(&self) -> bool {
        self.phase().await == StorePhase::Loading
    }

    /// Whether a load-more call is in flight.
    pub async fn is_loading_more(&self) -> bool {
        self.phase().await == StorePhase::LoadingMore
    }

    /// Whether the backend may still hold unloaded associations.
    pub async fn has_more(&self) -> bool {
        self.state.read().await.cursor.has_more
    }

    /// Pagination cursor snapshot.
    pub async fn cursor(&self) -> PaginationCursor {
        self.state.read().await.cursor.clone()
    }

    /// Cached deployment units from the last successful load.
    pub async fn deployment_units(&self) -> Vec<DeploymentUnit> {
        self.state.read().await.deployment_units.clone()
    }

    /// Switch-target list for the current state and a search term.
    ///
    /// Convenience over [`crate::reconcile::reconcile`]; an uninitialized
    /// store yields an empty list.
    pub async fn switch_targets(&self, search_term: &str) -> Vec<TenantRecord> {
        let state = self.state.read().await;
        match &state.association {
            Some(association) => reconcile(association, search_term),
            None => Vec::new(),
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

/// Keep the first record per domain, preserving order.
fn dedupe_by_domain(records: Vec<TenantRecord>) -> Vec<TenantRecord> {
    let mut result: Vec<TenantRecord> = Vec::with_capacity(records.len());
    for record in records {
        if result.iter().any(|existing| existing.domain == record.domain) {
            debug!("dropping duplicate association '{}'", record.domain);
            continue;
        }
        result.push(record);
    }
    result
}

/// First record carrying the default flag. The backend does not enforce
/// uniqueness of the flag; additional holders are tolerated and logged.
fn find_default(records: &[TenantRecord]) -> Option<TenantRecord> {
    let mut defaults = records.iter().filter(|record| record.is_default);
    let first = defaults.next().cloned();
    if defaults.next().is_some() {
        warn!("multiple associations carry the default flag, keeping the first");
    }
    first
}
