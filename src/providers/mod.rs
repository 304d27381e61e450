//! Provider implementations.
//!
//! Currently only the in-memory provider used for testing and development.
//! Production deployments implement [`crate::AssociationProvider`] over
//! their own HTTP client.

pub mod in_memory;

pub use in_memory::{InMemoryAssociationProvider, InMemoryProviderError};
