//! Transactional map adapter against the map it writes through.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tidegrid::prelude::*;

const MAP_NAME: &str = "TransactionalMapAdapterTest";

fn setup() -> (Arc<DistributedMap<i32, String>>, TransactionalMapAdapter<i32, String>) {
    let grid = GridInstance::new(ClusterConfig::new("tx-adapter")).unwrap();
    let map = grid.get_map::<i32, String>(MAP_NAME).unwrap();
    let adapter = TransactionalMapAdapter::new(map.clone());
    (map, adapter)
}

fn assert_unavailable<T>(result: AdapterResult<T>, method: AdapterMethod) {
    match result {
        Err(AdapterError::MethodNotAvailable(m)) => assert_eq!(m, method),
        Err(e) => panic!("expected MethodNotAvailable({}), got {}", method, e),
        Ok(_) => panic!("expected MethodNotAvailable({}), got Ok", method),
    }
}

#[tokio::test]
async fn test_get() {
    let (map, adapter) = setup();
    map.put(42, "foobar".into()).await.unwrap();

    assert_eq!(adapter.get(&42).await.unwrap(), Some("foobar".into()));
}

#[tokio::test]
async fn test_get_async_unavailable() {
    let (_, adapter) = setup();
    assert_unavailable(adapter.get_async(42), AdapterMethod::GetAsync);
}

#[tokio::test]
async fn test_set() {
    let (map, adapter) = setup();
    adapter.set(23, "test".into()).await.unwrap();

    assert_eq!(map.get(&23).await.unwrap(), Some("test".into()));
}

#[tokio::test]
async fn test_set_async_unavailable() {
    let (_, adapter) = setup();
    assert_unavailable(adapter.set_async(23, "test".into()), AdapterMethod::SetAsync);
}

#[tokio::test]
async fn test_put() {
    let (map, adapter) = setup();
    map.put(42, "oldValue".into()).await.unwrap();

    let old_value = adapter.put(42, "newValue".into()).await.unwrap();

    assert_eq!(old_value, Some("oldValue".into()));
    assert_eq!(map.get(&42).await.unwrap(), Some("newValue".into()));
}

#[tokio::test]
async fn test_put_async_leaves_map_unchanged() {
    let (map, adapter) = setup();
    map.put(42, "oldValue".into()).await.unwrap();

    assert_unavailable(
        adapter.put_async(42, "newValue".into()),
        AdapterMethod::PutAsync,
    );
    tokio::task::yield_now().await;
    assert_eq!(adapter.get(&42).await.unwrap(), Some("oldValue".into()));
}

#[tokio::test]
async fn test_put_if_absent() {
    let (map, adapter) = setup();
    map.put(42, "oldValue".into()).await.unwrap();

    assert!(adapter.put_if_absent(23, "newValue".into()).await.unwrap());
    assert!(!adapter.put_if_absent(42, "newValue".into()).await.unwrap());

    assert_eq!(map.get(&23).await.unwrap(), Some("newValue".into()));
    assert_eq!(map.get(&42).await.unwrap(), Some("oldValue".into()));
}

#[tokio::test]
async fn test_put_if_absent_async_unavailable() {
    let (map, adapter) = setup();
    assert_unavailable(
        adapter.put_if_absent_async(23, "newValue".into()),
        AdapterMethod::PutIfAbsentAsync,
    );
    assert!(!map.contains_key(&23).await.unwrap());
}

#[tokio::test]
async fn test_replace() {
    let (map, adapter) = setup();
    map.put(42, "oldValue".into()).await.unwrap();

    let old_value = adapter.replace(42, "newValue".into()).await.unwrap();

    assert_eq!(old_value, Some("oldValue".into()));
    assert_eq!(map.get(&42).await.unwrap(), Some("newValue".into()));
}

#[tokio::test]
async fn test_replace_with_old_value() {
    let (map, adapter) = setup();
    map.put(42, "oldValue".into()).await.unwrap();

    assert!(!adapter
        .replace_if_same(42, "foobar".into(), "newValue".into())
        .await
        .unwrap());
    assert!(adapter
        .replace_if_same(42, "oldValue".into(), "newValue".into())
        .await
        .unwrap());

    assert_eq!(map.get(&42).await.unwrap(), Some("newValue".into()));
}

#[tokio::test]
async fn test_remove() {
    let (map, adapter) = setup();
    map.put(23, "value-23".into()).await.unwrap();
    assert!(map.contains_key(&23).await.unwrap());

    assert_eq!(adapter.remove(&23).await.unwrap(), Some("value-23".into()));
    assert!(!map.contains_key(&23).await.unwrap());
}

#[tokio::test]
async fn test_remove_with_old_value() {
    let (map, adapter) = setup();
    map.put(23, "value-23".into()).await.unwrap();

    assert!(!adapter
        .remove_if_same(&23, &"foobar".to_string())
        .await
        .unwrap());
    assert!(adapter
        .remove_if_same(&23, &"value-23".to_string())
        .await
        .unwrap());
    assert!(!map.contains_key(&23).await.unwrap());
}

#[tokio::test]
async fn test_remove_async_unavailable() {
    let (map, adapter) = setup();
    map.put(23, "value-23".into()).await.unwrap();

    assert_unavailable(adapter.remove_async(23), AdapterMethod::RemoveAsync);
    assert!(map.contains_key(&23).await.unwrap());
}

#[tokio::test]
async fn test_contains_key() {
    let (map, adapter) = setup();
    map.put(23, "value-23".into()).await.unwrap();

    assert!(adapter.contains_key(&23).await.unwrap());
    assert!(!adapter.contains_key(&42).await.unwrap());
}

#[tokio::test]
async fn test_get_all() {
    let (map, adapter) = setup();
    map.put(23, "value-23".into()).await.unwrap();
    map.put(42, "value-42".into()).await.unwrap();

    let expected = HashMap::from([(23, "value-23".to_string()), (42, "value-42".to_string())]);
    let keys: HashSet<i32> = expected.keys().copied().collect();

    assert_eq!(adapter.get_all(&keys).await.unwrap(), expected);
}

#[tokio::test]
async fn test_put_all() {
    let (map, adapter) = setup();
    let expected = HashMap::from([(23, "value-23".to_string()), (42, "value-42".to_string())]);

    adapter.put_all(expected.clone()).await.unwrap();

    assert_eq!(map.size(), expected.len());
    for key in expected.keys() {
        assert!(map.contains_key(key).await.unwrap());
    }
}

#[tokio::test]
async fn test_remove_all_unavailable() {
    let (map, adapter) = setup();
    map.put(42, "value-42".into()).await.unwrap();

    assert_unavailable(adapter.remove_all().await, AdapterMethod::RemoveAll);
    assert_unavailable(
        adapter.remove_all_keys(&HashSet::from([42])).await,
        AdapterMethod::RemoveAllKeys,
    );
    assert_eq!(map.size(), 1);
}

#[tokio::test]
async fn test_clear() {
    let (map, adapter) = setup();
    map.put(23, "foobar".into()).await.unwrap();

    adapter.clear().await.unwrap();
    assert_eq!(map.size(), 0);

    // Clearing an empty map is a no-op
    adapter.clear().await.unwrap();
    assert_eq!(map.size(), 0);
}

#[tokio::test]
async fn test_local_map_stats_unavailable() {
    let (_, adapter) = setup();
    assert_unavailable(adapter.local_map_stats(), AdapterMethod::LocalMapStats);
}

#[tokio::test]
async fn test_declared_capabilities_match_behaviour() {
    let (_, adapter) = setup();
    for method in AdapterMethod::ALL {
        let expect_unavailable = method.is_async()
            || matches!(
                method,
                AdapterMethod::RemoveAll
                    | AdapterMethod::RemoveAllKeys
                    | AdapterMethod::LocalMapStats
            );
        assert_eq!(adapter.supports(method), !expect_unavailable, "{}", method);
    }
}

#[tokio::test]
async fn test_failed_transaction_is_rolled_back() {
    let map = Arc::new(DistributedMap::<i32, String>::new("bounded"));
    let options = TransactionOptions {
        max_write_buffer: 1,
        ..TransactionOptions::default()
    };
    let adapter = TransactionalMapAdapter::with_options(map.clone(), options);

    let entries = HashMap::from([(1, "a".to_string()), (2, "b".to_string())]);
    let err = adapter.put_all(entries).await.unwrap_err();

    assert!(matches!(
        err,
        AdapterError::Transaction(TransactionError::WriteBufferFull)
    ));
    assert!(map.is_empty());
}
