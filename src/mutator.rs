//! Default-tenant mutation.
//!
//! Performs the remote set-default call and reconciles local state on
//! completion. The update is pessimistic: the store's default pointer only
//! moves after the backend confirms. An atomic in-progress guard rejects
//! overlapping invocations inside the mutator rather than relying on the
//! caller to disable its controls.

use crate::context::RequestContext;
use crate::error::{AssociationError, AssociationResult};
use crate::model::TenantRecord;
use crate::notify::{Alert, NotificationSink};
use crate::provider::AssociationProvider;
use crate::store::AssociationStore;
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const UPDATE_FAILED_DESCRIPTION: &str = "Could not update your default organization.";
const UPDATE_FAILED_MESSAGE: &str = "Default organization update failed";
const UPDATE_SUCCEEDED_MESSAGE: &str = "Default organization updated";

/// Progress state of the mutator: `Idle → InProgress → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutatorPhase {
    Idle,
    InProgress,
}

/// Performs set-default operations against the backend.
pub struct DefaultTenantMutator<P, S> {
    provider: Arc<P>,
    sink: Arc<S>,
    in_progress: AtomicBool,
}

/// Returns the mutator to `Idle` on every exit path.
struct ProgressGuard<'a>(&'a AtomicBool);

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<P, S> DefaultTenantMutator<P, S>
where
    P: AssociationProvider,
    S: NotificationSink,
{
    pub fn new(provider: Arc<P>, sink: Arc<S>) -> Self {
        Self {
            provider,
            sink,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> MutatorPhase {
        if self.in_progress.load(Ordering::SeqCst) {
            MutatorPhase::InProgress
        } else {
            MutatorPhase::Idle
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase() == MutatorPhase::InProgress
    }

    /// Make `tenant` the session user's default tenant.
    ///
    /// On success the store's default pointer moves to `tenant` and a
    /// success alert naming the domain is published. On failure the store
    /// is untouched and a generic error alert is published. A call while
    /// another is in flight is rejected with
    /// [`AssociationError::UpdateInProgress`] without reaching the
    /// backend.
    pub async fn set_default(
        &self,
        store: &AssociationStore<P, S>,
        tenant: &TenantRecord,
    ) -> AssociationResult<()> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(
                "rejecting set-default for '{}': update already in progress",
                tenant.domain
            );
            return Err(AssociationError::UpdateInProgress);
        }
        let _guard = ProgressGuard(&self.in_progress);

        let context = RequestContext::with_generated_id();
        debug!(
            "request {}: setting '{}' as the default tenant",
            context.request_id, tenant.domain
        );

        match self
            .provider
            .set_default_tenant(&tenant.domain, &context)
            .await
        {
            Ok(()) => {
                store.mark_default(tenant).await;
                info!(
                    "request {}: '{}' is now the default tenant",
                    context.request_id, tenant.domain
                );
                self.sink.publish(Alert::success(
                    format!(
                        "The organization {} has been marked as your default organization.",
                        tenant.domain
                    ),
                    UPDATE_SUCCEEDED_MESSAGE,
                ));
                Ok(())
            }
            Err(error) => {
                warn!(
                    "request {}: set-default for '{}' failed: {}",
                    context.request_id, tenant.domain, error
                );
                self.sink.publish(Alert::error(
                    UPDATE_FAILED_DESCRIPTION,
                    UPDATE_FAILED_MESSAGE,
                ));
                Err(AssociationError::default_update_failed(
                    &tenant.domain,
                    error,
                ))
            }
        }
    }
}
