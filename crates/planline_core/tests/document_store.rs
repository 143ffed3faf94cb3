use planline_core::store::{
    AccessPolicy, Direction, DocumentPath, DocumentStore, Query, SetOptions, SqliteDocumentStore,
    StoreErrorCode, WriteData,
};
use planline_core::TabManager;
use serde_json::json;

fn ids(docs: &[planline_core::store::Document]) -> Vec<&str> {
    docs.iter().map(|doc| doc.id.as_str()).collect()
}

#[tokio::test]
async fn query_filters_and_orders_inside_the_engine() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    for (id, owner, order) in [("c", "demo", 2), ("a", "demo", 0), ("x", "other", 1), ("b", "demo", 1)] {
        store
            .set_doc(
                &DocumentPath::new("projects", id),
                WriteData::new().set("ownerId", owner).set("orderIndex", order),
                SetOptions::overwrite(),
            )
            .await
            .unwrap();
    }

    let query = Query::collection("projects")
        .where_eq("ownerId", "demo")
        .order_by("orderIndex", Direction::Ascending);
    assert_eq!(ids(&store.run_query(&query).await.unwrap()), ["a", "b", "c"]);

    let newest_first = Query::collection("projects")
        .where_eq("ownerId", "demo")
        .order_by("orderIndex", Direction::Descending)
        .limit(2);
    assert_eq!(ids(&store.run_query(&newest_first).await.unwrap()), ["c", "b"]);
    assert_eq!(store.count(&query).await.unwrap(), 3);
}

#[tokio::test]
async fn documents_without_the_ordered_field_are_skipped() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    store
        .add_doc("taskLogs", WriteData::new().set("title", "no timestamp"))
        .await
        .unwrap();
    let stamped = store
        .add_doc(
            "taskLogs",
            WriteData::new().set("title", "stamped").server_timestamp("createdAt"),
        )
        .await
        .unwrap();

    let docs = store
        .run_query(&Query::collection("taskLogs").order_by("createdAt", Direction::Descending))
        .await
        .unwrap();
    assert_eq!(ids(&docs), [stamped.id.as_str()]);
}

#[tokio::test]
async fn server_timestamps_strictly_increase() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let mut paths = Vec::new();
    for _ in 0..5 {
        paths.push(
            store
                .add_doc("taskLogs", WriteData::new().server_timestamp("createdAt"))
                .await
                .unwrap(),
        );
    }

    let mut previous = i64::MIN;
    for path in &paths {
        let doc = store.get_doc(path).await.unwrap().unwrap();
        let created = doc.fields["createdAt"].as_i64().unwrap();
        assert!(created > previous);
        previous = created;
    }
}

#[tokio::test]
async fn merge_keeps_unspecified_fields_and_update_requires_existing_doc() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let path = DocumentPath::new("userSettings", "demo");
    store
        .set_doc(
            &path,
            WriteData::new().set("theme", "dark").set("fontScale", 100),
            SetOptions::merge(),
        )
        .await
        .unwrap();
    store
        .set_doc(&path, WriteData::new().set("fontScale", 120), SetOptions::merge())
        .await
        .unwrap();

    let doc = store.get_doc(&path).await.unwrap().unwrap();
    assert_eq!(doc.fields["theme"], json!("dark"));
    assert_eq!(doc.fields["fontScale"], json!(120));

    let err = store
        .update_doc(&DocumentPath::new("projects", "missing"), WriteData::new().set("name", "x"))
        .await
        .unwrap_err();
    assert_eq!(err.code, Some(StoreErrorCode::NotFound));

    store
        .update_doc(&path, WriteData::new().delete("theme"))
        .await
        .unwrap();
    let doc = store.get_doc(&path).await.unwrap().unwrap();
    assert!(!doc.fields.contains_key("theme"));
}

#[tokio::test]
async fn access_policy_and_reachability_produce_coded_errors() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let path = DocumentPath::new("_health", "ping");

    store.set_access_policy(AccessPolicy::ReadOnly);
    assert!(store.get_doc(&path).await.unwrap().is_none());
    let err = store
        .set_doc(&path, WriteData::new().set("ok", true), SetOptions::overwrite())
        .await
        .unwrap_err();
    assert_eq!(err.code, Some(StoreErrorCode::PermissionDenied));

    store.set_access_policy(AccessPolicy::DenyAll);
    let err = store.get_doc(&path).await.unwrap_err();
    assert_eq!(err.code, Some(StoreErrorCode::PermissionDenied));

    store.set_access_policy(AccessPolicy::AllowAll);
    store.set_reachable(false);
    let err = store.get_doc(&path).await.unwrap_err();
    assert_eq!(err.code, Some(StoreErrorCode::Unavailable));
}

#[tokio::test]
async fn reserved_id_field_and_bad_paths_are_rejected() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let err = store
        .add_doc("projects", WriteData::new().set("id", "forged"))
        .await
        .unwrap_err();
    assert_eq!(err.code, Some(StoreErrorCode::InvalidArgument));

    let err = store
        .get_doc(&DocumentPath::new("projects", ""))
        .await
        .unwrap_err();
    assert_eq!(err.code, Some(StoreErrorCode::InvalidArgument));
}

#[tokio::test]
async fn two_handles_share_one_cache_file_in_multiple_tab_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let first = SqliteDocumentStore::open(&path, TabManager::Multiple).unwrap();
    let second = SqliteDocumentStore::open(&path, TabManager::Multiple).unwrap();

    let written = first
        .add_doc("reminders", WriteData::new().set("title", "from tab one"))
        .await
        .unwrap();
    let seen = second.get_doc(&written).await.unwrap().unwrap();
    assert_eq!(seen.fields["title"], json!("from tab one"));
}
