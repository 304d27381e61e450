//! Tenant association management for identity consoles.
//!
//! Models the state behind a tenant switcher: the paginated list of
//! tenants a user is associated with, the current and default tenant
//! pointers, the pure reconciliation that derives the switch-target list,
//! and the pessimistic set-default operation.
//!
//! # Core Components
//!
//! - [`AssociationStore`] - Authoritative, paginated association state
//! - [`reconcile::reconcile`] - Pure derivation of the switch-target list
//! - [`DefaultTenantMutator`] - Remote set-default with local reconciliation
//! - [`AssociationProvider`] - Trait for implementing the backend API
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenant_associations::{
//!     AssociationStore, DefaultTenantMutator, SessionContext,
//!     notify::LogSink, providers::InMemoryAssociationProvider,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(InMemoryAssociationProvider::new());
//! let sink = Arc::new(LogSink);
//! let store = AssociationStore::new(provider.clone(), sink.clone());
//!
//! let session = SessionContext::new("acme", "jo").with_email("jo@example.com");
//! store.initialize(&session).await?;
//!
//! let targets = store.switch_targets("").await;
//! println!("{} switchable tenants", targets.len());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod model;
pub mod mutator;
pub mod notify;
pub mod provider;
pub mod providers;
pub mod reconcile;
pub mod store;

// Re-export commonly used types for convenience
pub use context::{RequestContext, SessionContext};
pub use error::{AssociationError, AssociationResult};
pub use model::{
    AssociationSet, DeploymentUnit, PaginationCursor, SwitchTarget, TenantPage, TenantRecord,
};
pub use mutator::{DefaultTenantMutator, MutatorPhase};
pub use notify::{Alert, AlertLevel, NotificationSink};
pub use provider::AssociationProvider;
pub use reconcile::{display_label, reconcile, switch_target};
pub use store::{AssociationStore, AssociationStoreBuilder, StoreConfig, StorePhase};
