//! Catalog tests
//!
//! Tests for:
//! - Price recomputation on every write
//! - Storefront listing, ordering and per-bottle price
//! - Degraded and propagated reads when the store is down

use std::sync::Arc;

use rust_decimal::Decimal;

use shared::models::{CaseInput, WineCategory};
use winelots_backend::config::ReadFailurePolicy;
use winelots_backend::error::AppError;
use winelots_backend::external::LogMailer;
use winelots_backend::repository::InMemoryStore;
use winelots_backend::{AppState, Config};

// ============================================================================
// Test Helpers
// ============================================================================

fn state_with(store: InMemoryStore, policy: ReadFailurePolicy) -> AppState {
    let mut config = Config::default();
    config.store.read_failure = policy;
    AppState::in_memory(store, Arc::new(LogMailer), config)
}

fn input(value: serde_json::Value) -> CaseInput {
    serde_json::from_value(value).unwrap()
}

fn bourgogne() -> CaseInput {
    input(serde_json::json!({
        "name": "Bourgogne",
        "slug": "bourgogne",
        "region": "Bourgogne",
        "category": "red",
        "displayOrder": 2,
        "price": 1,
        "items": [
            { "name": "Bourgogne Pinot Noir", "estate": "Domaine Rion", "price": "16,90€", "quantity": 2 },
            { "name": "Hautes-Côtes", "estate": " ", "price": 24.5, "quantity": "2" },
            { "name": "Aligoté", "price": "12" }
        ]
    }))
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_create_computes_price_from_items() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let created = state.catalog_service().create_case(bourgogne()).await.unwrap();

    // (16.90 + 24.50 + 12.00) × 2 = 106.80, the submitted price is ignored
    assert_eq!(created.case.price, Decimal::from(107));
    assert_eq!(created.case.min_participants, 3);
    assert!(created.case.active);
    assert_eq!(created.case.category, WineCategory::Red);

    let items = &created.items;
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].unit_price, Decimal::new(1690, 2));
    assert_eq!(items[1].estate, None);
    assert_eq!(items[2].quantity, 2);
    assert_eq!(
        items.iter().map(|i| i.display_order).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[tokio::test]
async fn test_update_replaces_items_and_reprices() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let catalog = state.catalog_service();
    let created = catalog.create_case(bourgogne()).await.unwrap();

    let updated = catalog
        .update_case(
            created.case.id,
            input(serde_json::json!({
                "name": "Bourgogne",
                "slug": "bourgogne",
                "category": "red",
                "minParticipants": 0,
                "items": [{ "name": "Mercurey", "price": "20,10", "quantity": 6 }]
            })),
        )
        .await
        .unwrap();

    assert_eq!(updated.case.price, Decimal::from(121));
    assert_eq!(updated.case.min_participants, 3);
    assert_eq!(updated.items.len(), 1);
}

#[tokio::test]
async fn test_item_prices_stored_as_cents() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let created = state
        .catalog_service()
        .create_case(input(serde_json::json!({
            "name": "Loire",
            "slug": "loire",
            "category": "white",
            "items": [
                { "name": "Vouvray", "price": "10,004", "quantity": 1 },
                { "name": "Chinon", "price": "10,005€", "quantity": 1 }
            ]
        })))
        .await
        .unwrap();

    assert_eq!(created.items[0].unit_price, Decimal::new(1000, 2));
    assert_eq!(created.items[1].unit_price, Decimal::new(1001, 2));
    // 10.00 + 10.01, priced from the stored cents
    assert_eq!(created.case.price, Decimal::from(21));
}

#[tokio::test]
async fn test_unstorable_case_price_rejected() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let catalog = state.catalog_service();

    let err = catalog
        .create_case(input(serde_json::json!({
            "name": "Folie",
            "slug": "folie",
            "category": "red",
            "items": [{ "name": "Magnum", "price": "99999999999", "quantity": 2147483647 }]
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "items"));
    assert!(catalog.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_negative_threshold_rejected() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let mut case = bourgogne();
    case.min_participants = Some(-2);

    let err = state.catalog_service().create_case(case).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "minParticipants"));
}

#[tokio::test]
async fn test_invalid_slug_rejected() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let mut case = bourgogne();
    case.slug = "Bourgogne Rouge".to_string();

    let err = state.catalog_service().create_case(case).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "slug"));
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let catalog = state.catalog_service();
    catalog.create_case(bourgogne()).await.unwrap();

    let err = catalog.create_case(bourgogne()).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateEntry(_)));
}

#[tokio::test]
async fn test_missing_case_not_found() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let catalog = state.catalog_service();

    let err = catalog
        .update_case(uuid::Uuid::new_v4(), bourgogne())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = catalog.delete_case(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_storefront_lists_active_cases_in_order() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let catalog = state.catalog_service();
    catalog.create_case(bourgogne()).await.unwrap();
    catalog
        .create_case(input(serde_json::json!({
            "name": "Champagne",
            "slug": "champagne",
            "category": "champagne",
            "displayOrder": 1,
            "items": [{ "name": "Brut", "price": "37,50", "quantity": 2 }]
        })))
        .await
        .unwrap();
    catalog
        .create_case(input(serde_json::json!({
            "name": "Retired",
            "slug": "retired",
            "category": "white",
            "active": false,
            "items": []
        })))
        .await
        .unwrap();

    let listed = catalog.list_catalog().await.unwrap();
    let slugs: Vec<&str> = listed.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, vec!["champagne", "bourgogne"]);
    assert_eq!(listed[0].price, Decimal::from(75));
    assert_eq!(listed[0].price_per_bottle, "12.50€");

    assert_eq!(catalog.list_all().await.unwrap().len(), 3);

    // Repeated reads are stable
    assert_eq!(catalog.list_catalog().await.unwrap(), listed);
}

#[tokio::test]
async fn test_counts_for_active_cases() {
    let state = state_with(InMemoryStore::new(), ReadFailurePolicy::Degrade);
    let catalog = state.catalog_service();
    catalog.create_case(bourgogne()).await.unwrap();

    let counts = catalog.lot_counts(&state.lot_service()).await.unwrap();
    let bourgogne = counts.get("bourgogne").unwrap();
    assert_eq!(bourgogne.current, 0);
    assert_eq!(bourgogne.complete_lots, 0);
    assert_eq!(bourgogne.min_participants, 3);
}

#[tokio::test]
async fn test_degraded_reads_serve_empty() {
    let store = InMemoryStore::new();
    let state = state_with(store.clone(), ReadFailurePolicy::Degrade);
    state.catalog_service().create_case(bourgogne()).await.unwrap();
    store.set_offline(true);

    let catalog = state.catalog_service();
    assert!(catalog.list_catalog().await.unwrap().is_empty());
    assert!(catalog.lot_counts(&state.lot_service()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_propagated_reads_fail() {
    let store = InMemoryStore::new();
    let state = state_with(store.clone(), ReadFailurePolicy::Propagate);
    store.set_offline(true);

    let err = state.catalog_service().list_catalog().await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));
}

#[tokio::test]
async fn test_writes_always_propagate() {
    let store = InMemoryStore::new();
    let state = state_with(store.clone(), ReadFailurePolicy::Degrade);
    store.set_offline(true);

    let err = state.catalog_service().create_case(bourgogne()).await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));
}
