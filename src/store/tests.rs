use super::*;

#[tokio::test]
async fn test_memory_store_roundtrip() {
    let store = MemoryStore::new();
    assert_eq!(store.get("missing").await.unwrap(), None);

    store.set("k", "v1").await.unwrap();
    store.set("k", "v2").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
    assert!(store.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_memory_store_rejects_writes_over_capacity() {
    let store = MemoryStore::with_capacity(10);
    store.set("ab", "12345").await.unwrap();

    let err = store.set("cd", "123456").await.unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded { capacity: 10, .. }));
    assert_eq!(store.get("cd").await.unwrap(), None);

    // Overwriting an existing key only counts the replacement.
    store.set("ab", "12345678").await.unwrap();
    assert_eq!(store.used_bytes().await, 10);
}

#[tokio::test]
async fn test_file_store_roundtrip_and_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();

    store.set("stale_news_Fury vs Joshua_10", "{\"a\":1}").await.unwrap();
    store.set("sportsDataCache", "{}").await.unwrap();

    assert_eq!(
        store.get("stale_news_Fury vs Joshua_10").await.unwrap().as_deref(),
        Some("{\"a\":1}")
    );

    let mut keys = store.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["sportsDataCache", "stale_news_Fury vs Joshua_10"]);

    store.remove("sportsDataCache").await.unwrap();
    store.remove("sportsDataCache").await.unwrap();
    assert_eq!(store.get("sportsDataCache").await.unwrap(), None);
}

#[tokio::test]
async fn test_file_store_encodes_keys_into_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();

    let key = "stale_ufc_fighter_search_o'malley/../x";
    store.set(key, "1").await.unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["stale_ufc_fighter_search_o%27malley%2F..%2Fx"]);
    assert_eq!(store.keys().await.unwrap(), vec![key]);
    assert_eq!(store.get(key).await.unwrap().as_deref(), Some("1"));
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileStore::open(dir.path()).await.unwrap();
        store.set("apiDailyUsage", "{\"2026-10-19\":{\"football\":3}}").await.unwrap();
    }
    let store = FileStore::open(dir.path()).await.unwrap();
    assert_eq!(
        store.get("apiDailyUsage").await.unwrap().as_deref(),
        Some("{\"2026-10-19\":{\"football\":3}}")
    );
}
