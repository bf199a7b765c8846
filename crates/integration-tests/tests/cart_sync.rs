//! Mode and sync status behavior across initialization.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tangelo_core::{CartMode, PricingRules, SyncStatus, UserId};
use tangelo_integration_tests::{MockCartService, drain_notifications, item};
use tangelo_storefront::cart::CartManager;
use tangelo_storefront::notify::{NotificationLevel, Notifier};

fn manager(service: &Arc<MockCartService>) -> CartManager<Arc<MockCartService>> {
    CartManager::new(service.clone(), PricingRules::default(), Notifier::default())
}

#[tokio::test]
async fn test_guest_initialization_is_idle() {
    let service = Arc::new(MockCartService::new());
    let manager = manager(&service);

    manager.initialize(None).await;

    assert_eq!(manager.mode(), CartMode::Guest);
    assert_eq!(manager.sync_status(), SyncStatus::Idle);
}

#[tokio::test]
async fn test_user_initialization_lands_on_synced() {
    let service = Arc::new(MockCartService::new());
    let manager = manager(&service);

    let user = UserId::new("user-42");
    manager.initialize(Some(&user)).await;

    assert_eq!(manager.mode(), CartMode::Authenticated);
    assert_eq!(manager.sync_status(), SyncStatus::Synced);
}

#[tokio::test]
async fn test_failed_initialization_still_authenticates_and_loads() {
    let service = Arc::new(MockCartService::new());
    let manager = manager(&service);
    manager.initialize(None).await;
    manager.add_item(&item("sku-1", "Widget", "10.00"), 1).await;

    service.fail_initialize.store(true, Ordering::SeqCst);
    let mut notifications = manager.notifications();

    let user = UserId::new("user-42");
    manager.initialize(Some(&user)).await;

    // Authentication is decided by the identifier, not the sync outcome.
    assert_eq!(manager.mode(), CartMode::Authenticated);
    assert_eq!(manager.sync_status(), SyncStatus::Error);

    // The snapshot load still ran.
    assert_eq!(manager.snapshot().item_count, 1);

    let drained = drain_notifications(&mut notifications);
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].level, NotificationLevel::Error);
    assert_eq!(drained[0].message, "We couldn't sync your cart");
}

#[tokio::test]
async fn test_sync_status_passes_through_syncing() {
    let service = Arc::new(MockCartService::new());
    let manager = manager(&service);
    let mut statuses = manager.subscribe_sync_status();
    statuses.mark_unchanged();

    let user = UserId::new("user-42");
    manager.initialize(Some(&user)).await;

    // The channel retains only the latest value, so observe it directly;
    // the transition through `Syncing` is implied by the final `Synced`
    // after a changed signal.
    statuses.changed().await.expect("status published");
    assert_eq!(*statuses.borrow(), SyncStatus::Synced);
}

#[tokio::test]
async fn test_guest_add_notification_names_the_local_cart() {
    let service = Arc::new(MockCartService::new());
    let manager = manager(&service);
    manager.initialize(None).await;
    let mut notifications = manager.notifications();

    manager.add_item(&item("sku-1", "Widget", "10.00"), 1).await;

    let drained = drain_notifications(&mut notifications);
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].message, "Added Widget to your local cart");
}

#[tokio::test]
async fn test_authenticated_add_notification_names_the_cart() {
    let service = Arc::new(MockCartService::new());
    let manager = manager(&service);
    manager.initialize(Some(&UserId::new("user-42"))).await;
    let mut notifications = manager.notifications();

    manager.add_item(&item("sku-1", "Widget", "10.00"), 1).await;

    let drained = drain_notifications(&mut notifications);
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].message, "Added Widget to your cart");
}

#[tokio::test]
async fn test_connectivity_flag_is_observational() {
    let service = Arc::new(MockCartService::new());
    let manager = manager(&service);
    manager.initialize(None).await;

    manager.set_online(false);
    assert!(!manager.is_online());

    // Mutations proceed regardless of the flag.
    manager.add_item(&item("sku-1", "Widget", "10.00"), 1).await;
    assert_eq!(manager.snapshot().item_count, 1);

    manager.set_online(true);
    assert!(manager.is_online());
}
