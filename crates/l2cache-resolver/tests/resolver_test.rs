//! Integration tests for LevelTwoCacheResolver over the in-memory backend.

mod common;

use common::{orders, Order, OrderCriteria, RacingBackend, TestCache};
use l2cache_core::{EntityTypeId, L2Error, Page, PageRequest};
use l2cache_resolver::{keys, CacheBackend, FieldMap, NamespaceVersioner};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_set_then_get_returns_value() {
    let cache = TestCache::new().await;
    let order = Order::new(7, "OPEN");

    cache.resolver.set(&orders(), "7", &order).await.unwrap();

    let found: Option<Order> = cache.resolver.get(&orders(), "7").await.unwrap();
    assert_eq!(found, Some(order));
}

#[tokio::test]
async fn test_get_missing_is_none() {
    let cache = TestCache::new().await;
    let found: Option<Order> = cache.resolver.get(&orders(), "404").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_remove_then_get_is_none() {
    let cache = TestCache::new().await;
    cache
        .resolver
        .set(&orders(), "7", &Order::new(7, "OPEN"))
        .await
        .unwrap();

    cache.resolver.remove(&orders(), "7").await.unwrap();

    let found: Option<Order> = cache.resolver.get(&orders(), "7").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_remove_missing_key_succeeds() {
    let cache = TestCache::new().await;
    cache.resolver.remove(&orders(), "never-set").await.unwrap();
}

#[tokio::test]
async fn test_map_list_round_trip() {
    let cache = TestCache::new().await;
    let rows: Vec<FieldMap> = vec![
        json!({"id": 1, "status": "OPEN"}).as_object().unwrap().clone(),
        json!({"id": 2, "status": "PAID"}).as_object().unwrap().clone(),
    ];

    cache
        .resolver
        .set_map_list(&orders(), "report:daily", &rows)
        .await
        .unwrap();

    let found = cache
        .resolver
        .get_map_list(&orders(), "report:daily")
        .await
        .unwrap();
    assert_eq!(found, Some(rows));
    assert!(cache
        .resolver
        .get_map_list(&orders(), "report:weekly")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_result_key_list_miss_is_empty() {
    let cache = TestCache::new().await;
    let keys = cache
        .resolver
        .get_result_key_list(&orders(), &OrderCriteria::status("OPEN"))
        .await
        .unwrap();
    assert!(keys.is_empty());
}

#[tokio::test]
async fn test_paginated_miss_is_none() {
    let cache = TestCache::new().await;
    let page: Option<Page<String>> = cache
        .resolver
        .get_result_key_list_paginated(&orders(), &OrderCriteria::status("OPEN"))
        .await
        .unwrap();
    assert!(page.is_none());
}

#[tokio::test]
async fn test_result_key_list_round_trip() {
    let cache = TestCache::new().await;
    let condition = OrderCriteria::status("OPEN");
    let keys = vec!["3".to_string(), "1".to_string(), "2".to_string()];

    cache
        .resolver
        .set_result_key_list(&orders(), &condition, &keys)
        .await
        .unwrap();

    let found = cache
        .resolver
        .get_result_key_list(&orders(), &OrderCriteria::status("OPEN"))
        .await
        .unwrap();
    assert_eq!(found, keys);

    let other = cache
        .resolver
        .get_result_key_list(&orders(), &OrderCriteria::status("PAID"))
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_paginated_round_trip() {
    let cache = TestCache::new().await;
    let condition = OrderCriteria::status("OPEN");
    let page = Page::new(
        vec!["1".to_string(), "2".to_string()],
        PageRequest::new(0, 2),
        5,
    );

    cache
        .resolver
        .set_result_key_list_paginated(&orders(), &condition, &page)
        .await
        .unwrap();

    let found: Option<Page<String>> = cache
        .resolver
        .get_result_key_list_paginated(&orders(), &condition)
        .await
        .unwrap();
    let found = found.unwrap();
    assert_eq!(found, page);
    assert_eq!(found.info.total_pages, 3);
}

#[tokio::test]
async fn test_paginated_with_typed_rows() {
    let cache = TestCache::new().await;
    let condition = json!({"status": "OPEN", "page": 1});
    let page = Page::new(vec![Order::new(3, "OPEN")], PageRequest::new(1, 1), 2);

    cache
        .resolver
        .set_result_key_list_paginated(&orders(), &condition, &page)
        .await
        .unwrap();

    let found: Option<Page<Order>> = cache
        .resolver
        .get_result_key_list_paginated(&orders(), &condition)
        .await
        .unwrap();
    assert_eq!(found, Some(page));
}

#[tokio::test]
async fn test_mark_for_refresh_isolates_query_results() {
    let cache = TestCache::new().await;
    let condition = OrderCriteria::status("OPEN");
    let keys = vec!["1".to_string(), "2".to_string()];

    cache
        .resolver
        .set_result_key_list(&orders(), &condition, &keys)
        .await
        .unwrap();
    let version = cache
        .resolver
        .versioner()
        .current_version(&orders())
        .await
        .unwrap();
    let old_key = keys::hashed_key_with_version(&orders(), &version, &condition).unwrap();

    let new_version = cache.resolver.mark_for_refresh(&orders()).await.unwrap();
    assert_ne!(new_version, version);

    let found = cache
        .resolver
        .get_result_key_list(&orders(), &condition)
        .await
        .unwrap();
    assert!(found.is_empty());

    // The orphaned entry still exists until its TTL runs out.
    assert!(cache.backend.contains(&old_key));
    cache.backend.advance(Duration::from_secs(11));
    assert!(!cache.backend.contains(&old_key));
}

#[tokio::test]
async fn test_mark_for_refresh_leaves_simple_keys_and_other_types() {
    let cache = TestCache::new().await;
    let customers = EntityTypeId::from("shop.Customer");
    let condition = json!({"vip": true});

    cache
        .resolver
        .set(&orders(), "7", &Order::new(7, "OPEN"))
        .await
        .unwrap();
    cache
        .resolver
        .set_result_key_list(&customers, &condition, &["c1".to_string()])
        .await
        .unwrap();

    cache.resolver.mark_for_refresh(&orders()).await.unwrap();

    let order: Option<Order> = cache.resolver.get(&orders(), "7").await.unwrap();
    assert!(order.is_some());
    let customer_keys = cache
        .resolver
        .get_result_key_list(&customers, &condition)
        .await
        .unwrap();
    assert_eq!(customer_keys, vec!["c1".to_string()]);
}

#[tokio::test]
async fn test_list_skips_missing_keys_in_order() {
    let cache = TestCache::new().await;
    let first = Order::new(1, "OPEN");
    let third = Order::new(3, "PAID");
    cache.resolver.set(&orders(), "k1", &first).await.unwrap();
    cache.resolver.set(&orders(), "k3", &third).await.unwrap();

    let keys = vec!["k1".to_string(), "k2".to_string(), "k3".to_string()];
    let found: Vec<Order> = cache.resolver.list(&orders(), &keys).await.unwrap();
    assert_eq!(found, vec![first, third]);
}

#[tokio::test]
async fn test_list_skips_malformed_entries() {
    let cache = TestCache::new().await;
    cache
        .resolver
        .set(&orders(), "good", &Order::new(1, "OPEN"))
        .await
        .unwrap();
    cache
        .backend
        .set(keys::simple_key(&orders(), "bad").as_bytes(), b"not json", None)
        .await
        .unwrap();

    let keys = vec!["bad".to_string(), "good".to_string()];
    let found: Vec<Order> = cache.resolver.list(&orders(), &keys).await.unwrap();
    assert_eq!(found, vec![Order::new(1, "OPEN")]);
}

#[tokio::test]
async fn test_direct_and_query_ttls_differ_by_factor() {
    let cache = TestCache::with_ttl(10).await;
    let condition = OrderCriteria::status("OPEN");

    cache
        .resolver
        .set(&orders(), "7", &Order::new(7, "OPEN"))
        .await
        .unwrap();
    cache
        .resolver
        .set_result_key_list(&orders(), &condition, &["7".to_string()])
        .await
        .unwrap();

    let version = cache
        .resolver
        .versioner()
        .current_version(&orders())
        .await
        .unwrap();
    let hashed = keys::hashed_key_with_version(&orders(), &version, &condition).unwrap();

    let direct_ttl = cache.backend.ttl_of("{shop.Order}.7").unwrap().unwrap();
    let query_ttl = cache.backend.ttl_of(&hashed).unwrap().unwrap();
    assert_eq!(direct_ttl, 1200);
    assert_eq!(query_ttl, 10);
    assert_eq!(direct_ttl, query_ttl * 120);
}

#[tokio::test]
async fn test_paginated_explicit_ttl() {
    let cache = TestCache::with_ttl(10).await;
    let condition = OrderCriteria::status("OPEN");
    let page: Page<String> = Page::empty(PageRequest::default());

    cache
        .resolver
        .set_result_key_list_paginated_with_ttl(&orders(), &condition, &page, 300)
        .await
        .unwrap();

    let version = cache
        .resolver
        .versioner()
        .current_version(&orders())
        .await
        .unwrap();
    let hashed = keys::hashed_key_with_version(&orders(), &version, &condition).unwrap();
    assert_eq!(cache.backend.ttl_of(&hashed), Some(Some(300)));
}

#[tokio::test]
async fn test_huge_ttls_are_stored_without_expiry_overflow() {
    let cache = TestCache::with_ttl(u64::MAX / 100).await;
    let condition = OrderCriteria::status("OPEN");
    let page: Page<String> = Page::empty(PageRequest::default());

    cache
        .resolver
        .set(&orders(), "7", &Order::new(7, "OPEN"))
        .await
        .unwrap();
    cache
        .resolver
        .set_result_key_list_paginated_with_ttl(&orders(), &condition, &page, u64::MAX)
        .await
        .unwrap();

    // ttl * 120 saturates instead of wrapping.
    assert_eq!(cache.backend.ttl_of("{shop.Order}.7"), Some(Some(u64::MAX)));
    let found: Option<Order> = cache.resolver.get(&orders(), "7").await.unwrap();
    assert_eq!(found, Some(Order::new(7, "OPEN")));

    let found: Option<Page<String>> = cache
        .resolver
        .get_result_key_list_paginated(&orders(), &condition)
        .await
        .unwrap();
    assert_eq!(found, Some(page));
}

#[tokio::test]
async fn test_ttl_follows_config_update() {
    let cache = TestCache::with_ttl(10).await;

    let mut config = cache.config.get().await;
    config.cache.ttl_seconds = 20;
    cache.config.update(config).await.unwrap();

    cache
        .resolver
        .set(&orders(), "7", &Order::new(7, "OPEN"))
        .await
        .unwrap();
    assert_eq!(cache.backend.ttl_of("{shop.Order}.7"), Some(Some(2400)));
}

#[tokio::test]
async fn test_remove_all_deletes_only_that_type() {
    let cache = TestCache::new().await;
    let lines = EntityTypeId::from("shop.OrderLine");

    for id in 1..=3 {
        cache
            .resolver
            .set(&orders(), &id.to_string(), &Order::new(id, "OPEN"))
            .await
            .unwrap();
    }
    cache.resolver.set(&lines, "1", &"line").await.unwrap();

    let removed = cache.resolver.remove_all(&orders()).await.unwrap();
    assert_eq!(removed, 3);

    let keys: Vec<String> = (1..=3).map(|id| id.to_string()).collect();
    let left: Vec<Order> = cache.resolver.list(&orders(), &keys).await.unwrap();
    assert!(left.is_empty());

    let line: Option<String> = cache.resolver.get(&lines, "1").await.unwrap();
    assert_eq!(line.as_deref(), Some("line"));
}

#[tokio::test]
async fn test_remove_all_refused_delete_is_write_error() {
    let cache = TestCache::new().await;
    cache
        .resolver
        .set(&orders(), "1", &Order::new(1, "OPEN"))
        .await
        .unwrap();

    cache.backend.refuse_deletes(true);
    let err = cache.resolver.remove_all(&orders()).await.unwrap_err();
    assert!(matches!(err, L2Error::CacheWrite(_)));
    assert!(cache.backend.contains("{shop.Order}.1"));
}

#[tokio::test]
async fn test_remove_all_rejects_backslash_type() {
    let cache = TestCache::new().await;
    let odd = EntityTypeId::from(r"shop\Order");
    cache.resolver.set(&odd, "1", &"x").await.unwrap();

    let err = cache.resolver.remove_all(&odd).await.unwrap_err();
    assert!(matches!(err, L2Error::InvalidPattern(_)));
    assert!(cache.backend.contains(r"{shop\Order}.1"));
}

#[tokio::test]
async fn test_refused_writes_surface_as_errors() {
    let cache = TestCache::new().await;
    // Initialise the namespace before refusing writes.
    cache
        .resolver
        .versioner()
        .current_version(&orders())
        .await
        .unwrap();
    cache.backend.refuse_writes(true);

    let err = cache
        .resolver
        .set(&orders(), "7", &Order::new(7, "OPEN"))
        .await
        .unwrap_err();
    assert!(matches!(err, L2Error::CacheWrite(_)));

    let err = cache
        .resolver
        .set_result_key_list(&orders(), &OrderCriteria::status("OPEN"), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, L2Error::CacheWrite(_)));

    let err = cache.resolver.mark_for_refresh(&orders()).await.unwrap_err();
    assert!(matches!(err, L2Error::CacheWrite(_)));
}

#[tokio::test]
async fn test_unencodable_condition_is_persistence_error() {
    let cache = TestCache::new().await;
    // JSON object keys must be strings.
    let condition: HashMap<(u32, u32), &str> = HashMap::from([((1, 2), "OPEN")]);

    let err = cache
        .resolver
        .set_result_key_list(&orders(), &condition, &["7".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, L2Error::Persistence(_)));
    assert!(err.is_write_failure());

    // Only the namespace version was written.
    assert_eq!(cache.backend.len(), 1);
}

#[tokio::test]
async fn test_unencodable_page_row_is_persistence_error() {
    let cache = TestCache::new().await;
    let row: HashMap<(u32, u32), String> = HashMap::from([((0, 0), "cell".to_string())]);
    let page = Page::new(vec![row], PageRequest::new(0, 1), 1);

    let err = cache
        .resolver
        .set_result_key_list_paginated(&orders(), &OrderCriteria::status("OPEN"), &page)
        .await
        .unwrap_err();
    assert!(matches!(err, L2Error::Persistence(_)));
    assert!(cache.backend.is_empty());
}

#[tokio::test]
async fn test_get_malformed_payload_is_read_error() {
    let cache = TestCache::new().await;
    cache
        .backend
        .set(b"{shop.Order}.7", b"\"not an order\"", None)
        .await
        .unwrap();

    let err = cache
        .resolver
        .get::<Order>(&orders(), "7")
        .await
        .unwrap_err();
    assert!(matches!(err, L2Error::CacheRead(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_agrees_on_version() {
    const CALLERS: usize = 8;
    let backend = Arc::new(RacingBackend::new(CALLERS));
    let versioner = NamespaceVersioner::new(backend.clone(), ".N_S");

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let versioner = versioner.clone();
            tokio::spawn(async move { versioner.current_version(&orders()).await.unwrap() })
        })
        .collect();

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap());
    }

    assert_eq!(backend.wins(), 1);
    let stored = backend.get(b"shop.Order.N_S").await.unwrap().unwrap();
    let stored = String::from_utf8(stored).unwrap();
    assert!(versions.iter().all(|version| *version == stored));
}
