//! Integration tests for the association store lifecycle: initialize,
//! paginated loading, failure recovery, and the races the store guards
//! against.

mod common;

use common::{GatedProvider, seeded_tenants, session, tenant};
use std::sync::Arc;
use tenant_associations::notify::RecordingSink;
use tenant_associations::providers::InMemoryAssociationProvider;
use tenant_associations::{
    AlertLevel, AssociationError, AssociationStore, DeploymentUnit, SessionContext, StorePhase,
};

#[tokio::test]
async fn initialize_populates_set_and_locates_pointers() {
    common::init_logging();
    let provider =
        Arc::new(InMemoryAssociationProvider::with_tenants(seeded_tenants(3, Some(1))).await);
    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::new(provider, sink);

    store.initialize(&session()).await.unwrap();

    assert_eq!(store.phase().await, StorePhase::Ready);
    let set = store.association().await.unwrap();
    assert_eq!(set.associated_tenants.len(), 3);
    assert_eq!(set.current_tenant.domain, "tenant-0");
    assert!(!set.current_tenant.is_placeholder());
    assert_eq!(set.default_tenant.as_ref().unwrap().domain, "tenant-1");
    assert_eq!(set.username, "jo@example.com");
    assert!(!store.has_more().await);
}

#[tokio::test]
async fn initialize_synthesizes_placeholder_for_unlisted_current_tenant() {
    common::init_logging();
    let provider =
        Arc::new(InMemoryAssociationProvider::with_tenants(seeded_tenants(2, None)).await);
    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::new(provider, sink);

    let session = SessionContext::new("elsewhere", "jo");
    store.initialize(&session).await.unwrap();

    let set = store.association().await.unwrap();
    assert_eq!(set.current_tenant.domain, "elsewhere");
    assert!(set.current_tenant.is_placeholder());
    assert!(set.default_tenant.is_none());
    // The placeholder is not in the list, so reconciliation removes nothing.
    assert_eq!(store.switch_targets("").await.len(), 2);
}

#[tokio::test]
async fn initialize_failure_leaves_empty_set_and_one_alert_then_retry_recovers() {
    common::init_logging();
    let provider =
        Arc::new(InMemoryAssociationProvider::with_tenants(seeded_tenants(3, Some(0))).await);
    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::new(provider.clone(), sink.clone());

    provider.fail_next_list().await;
    let error = store.initialize(&session()).await.unwrap_err();
    assert!(matches!(error, AssociationError::AssociationFetchFailed { .. }));

    assert_eq!(store.phase().await, StorePhase::Error);
    let set = store.association().await.unwrap();
    assert!(set.associated_tenants.is_empty());
    assert_eq!(sink.count_at(AlertLevel::Error), 1);
    assert_eq!(sink.count_at(AlertLevel::Success), 0);

    // Retry fully repopulates.
    store.initialize(&session()).await.unwrap();
    assert_eq!(store.phase().await, StorePhase::Ready);
    assert_eq!(store.association().await.unwrap().associated_tenants.len(), 3);
    assert_eq!(sink.count_at(AlertLevel::Error), 1);
}

#[tokio::test]
async fn load_next_page_appends_and_tracks_exhaustion() {
    common::init_logging();
    // 20 tenants, page size 15: first page full, second page short.
    let provider =
        Arc::new(InMemoryAssociationProvider::with_tenants(seeded_tenants(20, Some(0))).await);
    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::new(provider.clone(), sink);

    store.initialize(&session()).await.unwrap();
    assert_eq!(store.association().await.unwrap().associated_tenants.len(), 15);
    assert!(store.has_more().await);

    let appended = store.load_next_page().await.unwrap();
    assert_eq!(appended, Some(5));
    assert_eq!(store.association().await.unwrap().associated_tenants.len(), 20);
    // Short page: the listing is exhausted.
    assert!(!store.has_more().await);
    assert_eq!(store.cursor().await.offset, 15);
}

#[tokio::test]
async fn exhausted_store_skips_the_network_and_keeps_state_unchanged() {
    common::init_logging();
    let provider =
        Arc::new(InMemoryAssociationProvider::with_tenants(seeded_tenants(3, Some(0))).await);
    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::new(provider.clone(), sink);

    store.initialize(&session()).await.unwrap();
    assert!(!store.has_more().await);
    let calls_before = provider.list_calls().await;
    let set_before = store.association().await;
    let cursor_before = store.cursor().await;

    assert_eq!(store.load_next_page().await.unwrap(), None);

    assert_eq!(provider.list_calls().await, calls_before);
    assert_eq!(store.association().await, set_before);
    assert_eq!(store.cursor().await, cursor_before);
}

#[tokio::test]
async fn load_next_page_failure_keeps_the_list_and_allows_retry() {
    common::init_logging();
    let provider =
        Arc::new(InMemoryAssociationProvider::with_tenants(seeded_tenants(20, Some(0))).await);
    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::new(provider.clone(), sink.clone());

    store.initialize(&session()).await.unwrap();
    provider.fail_next_list().await;

    let error = store.load_next_page().await.unwrap_err();
    assert!(matches!(error, AssociationError::AssociationFetchFailed { .. }));
    assert_eq!(store.phase().await, StorePhase::Ready);
    assert_eq!(store.association().await.unwrap().associated_tenants.len(), 15);
    assert_eq!(sink.count_at(AlertLevel::Error), 1);
    // The cursor did not advance; retrying fetches the same page.
    assert_eq!(store.cursor().await.offset, 0);

    assert_eq!(store.load_next_page().await.unwrap(), Some(5));
    assert_eq!(store.association().await.unwrap().associated_tenants.len(), 20);
}

#[tokio::test]
async fn overlapping_pages_are_deduplicated_by_domain() {
    common::init_logging();
    let provider = Arc::new(InMemoryAssociationProvider::new());
    for record in seeded_tenants(15, Some(0)) {
        provider.seed(record).await;
    }
    // The backend shifted during paging: the second page repeats a record.
    provider.seed(tenant("tenant-14", "id-14-again")).await;
    provider.seed(tenant("tenant-15", "id-15")).await;

    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::new(provider, sink);

    store.initialize(&session()).await.unwrap();
    let appended = store.load_next_page().await.unwrap();
    assert_eq!(appended, Some(1));

    let set = store.association().await.unwrap();
    assert_eq!(set.associated_tenants.len(), 16);
    // First occurrence won.
    assert_eq!(set.find("tenant-14").unwrap().id, "id-14");
}

#[tokio::test]
async fn later_pages_back_fill_default_and_current_pointers() {
    common::init_logging();
    // Default and current both live on the second page.
    let mut records = seeded_tenants(20, Some(17));
    records[16].domain = "home".to_string();
    let provider = Arc::new(InMemoryAssociationProvider::with_tenants(records).await);
    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::new(provider, sink);

    let session = SessionContext::new("home", "jo");
    store.initialize(&session).await.unwrap();

    let set = store.association().await.unwrap();
    assert!(set.current_tenant.is_placeholder());
    assert!(set.default_tenant.is_none());

    store.load_next_page().await.unwrap();
    let set = store.association().await.unwrap();
    assert!(!set.current_tenant.is_placeholder());
    assert_eq!(set.current_tenant.domain, "home");
    assert_eq!(set.default_tenant.as_ref().unwrap().domain, "tenant-17");
}

#[tokio::test]
async fn concurrent_load_next_page_is_serialized() {
    common::init_logging();
    let inner = InMemoryAssociationProvider::with_tenants(seeded_tenants(20, Some(0))).await;
    let provider = Arc::new(GatedProvider::gating_list_from(inner, 15));
    let sink = Arc::new(RecordingSink::new());
    let store = Arc::new(AssociationStore::new(provider.clone(), sink));

    store.initialize(&session()).await.unwrap();

    let first = {
        let store = store.clone();
        tokio::spawn(async move { store.load_next_page().await })
    };
    while !store.is_loading_more().await {
        tokio::task::yield_now().await;
    }

    // The second call must not fire a request while the first is parked.
    assert_eq!(store.load_next_page().await.unwrap(), None);

    provider.release_list();
    assert_eq!(first.await.unwrap().unwrap(), Some(5));
    // One initialize call plus exactly one load-more call.
    assert_eq!(provider.inner.list_calls().await, 2);
}

#[tokio::test]
async fn stale_page_response_is_discarded_after_reinitialize() {
    common::init_logging();
    let inner = InMemoryAssociationProvider::with_tenants(seeded_tenants(20, Some(0))).await;
    let provider = Arc::new(GatedProvider::gating_list_from(inner, 15));
    let sink = Arc::new(RecordingSink::new());
    let store = Arc::new(AssociationStore::new(provider.clone(), sink));

    store.initialize(&session()).await.unwrap();

    let parked = {
        let store = store.clone();
        tokio::spawn(async move { store.load_next_page().await })
    };
    while !store.is_loading_more().await {
        tokio::task::yield_now().await;
    }

    // A refresh supersedes the in-flight page.
    store.initialize(&session()).await.unwrap();
    provider.release_list();

    assert_eq!(parked.await.unwrap().unwrap(), None);
    let set = store.association().await.unwrap();
    assert_eq!(set.associated_tenants.len(), 15);
    assert_eq!(store.cursor().await.offset, 0);
    assert!(store.has_more().await);

    // The discard must not wedge the store: it is back in Ready and can
    // still paginate.
    assert_eq!(store.phase().await, StorePhase::Ready);
    provider.release_list();
    assert_eq!(store.load_next_page().await.unwrap(), Some(5));
    assert_eq!(store.association().await.unwrap().associated_tenants.len(), 20);
}

#[tokio::test]
async fn deployment_units_load_only_in_region_aware_mode() {
    common::init_logging();
    let provider = Arc::new(InMemoryAssociationProvider::new());
    provider
        .set_deployment_units(vec![DeploymentUnit {
            name: "US".to_string(),
            display_name: Some("United States".to_string()),
            console_hostname: Some("console.us.example.com".to_string()),
        }])
        .await;
    let sink = Arc::new(RecordingSink::new());

    let plain = AssociationStore::new(provider.clone(), sink.clone());
    assert!(plain.load_deployment_units().await.unwrap().is_empty());
    assert_eq!(provider.deployment_unit_calls().await, 0);

    let regional = AssociationStore::builder(provider.clone(), sink.clone())
        .with_central_deployment(true)
        .with_region_selection(true)
        .build();
    let units = regional.load_deployment_units().await.unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(regional.deployment_units().await, units);

    provider.fail_next_deployment_units().await;
    let error = regional.load_deployment_units().await.unwrap_err();
    assert!(matches!(error, AssociationError::DeploymentUnitFetchFailed { .. }));
    assert_eq!(sink.count_at(AlertLevel::Error), 1);
}

#[tokio::test]
async fn custom_page_size_flows_through_pagination() {
    common::init_logging();
    let provider =
        Arc::new(InMemoryAssociationProvider::with_tenants(seeded_tenants(7, Some(0))).await);
    let sink = Arc::new(RecordingSink::new());
    let store = AssociationStore::builder(provider, sink)
        .with_page_size(5)
        .build();

    store.initialize(&session()).await.unwrap();
    assert_eq!(store.association().await.unwrap().associated_tenants.len(), 5);
    assert!(store.has_more().await);

    assert_eq!(store.load_next_page().await.unwrap(), Some(2));
    assert!(!store.has_more().await);
}
