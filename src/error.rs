//! Error types for association operations.
//!
//! All remote failures are converted to user-facing alerts at the component
//! boundary before being returned; callers may ignore the `Err` value and
//! rely on the unchanged store state plus the notification sink.

/// Error type for association store and mutator operations.
#[derive(Debug, thiserror::Error)]
pub enum AssociationError {
    /// An association listing call failed. Recoverable: retry the same
    /// operation; the store keeps (or empties, for initialize) its state.
    #[error("Failed to fetch associated tenants: {source}")]
    AssociationFetchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote set-default call failed. The local default pointer is
    /// left untouched.
    #[error("Failed to set '{domain}' as the default tenant: {source}")]
    DefaultTenantUpdateFailed {
        domain: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The deployment unit listing call failed.
    #[error("Failed to fetch deployment units: {source}")]
    DeploymentUnitFetchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A set-default operation is already in flight. Caller-side
    /// condition; no alert is emitted for this.
    #[error("A default tenant update is already in progress")]
    UpdateInProgress,
}

impl AssociationError {
    /// Wrap a provider error from an association listing call.
    pub fn fetch_failed<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::AssociationFetchFailed {
            source: Box::new(source),
        }
    }

    /// Wrap a provider error from a set-default call.
    pub fn default_update_failed<E>(domain: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DefaultTenantUpdateFailed {
            domain: domain.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a provider error from a deployment unit listing call.
    pub fn deployment_units_failed<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DeploymentUnitFetchFailed {
            source: Box::new(source),
        }
    }
}

/// Result alias for association operations.
pub type AssociationResult<T> = Result<T, AssociationError>;
