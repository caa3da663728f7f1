//! PostgreSQL store test. Runs only when DATABASE_URL is set; each run uses a fresh
//! tenant schema and drops it afterwards.

use notify_service::domain::query::paginate;
use notify_service::infra::tenant::{TenantId, MODULE_NAME};
use notify_service::storage::postgres;
use notify_service::{DocumentStore, PostgresDocumentStore, QueryTranslator, StoreRegistry, TenantStores};
use serde_json::json;

const TABLE: &str = "notify_data";

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_postgres_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let pool = postgres::connect(&url, 2).await?;
    let tenant = TenantId::parse(&format!("t{}", uuid::Uuid::new_v4().simple()))?;
    let schema = tenant.schema_name(MODULE_NAME);

    let registry = TenantStores::postgres(pool.clone(), MODULE_NAME, vec![TABLE.to_string()]);
    let store = registry.store_for(&tenant).await?;

    store.insert(TABLE, Some("a"), json!({"x": 1, "text": "first note"})).await?;
    store.insert(TABLE, Some("b"), json!({"x": 2, "text": "second note"})).await?;
    let generated = store.insert(TABLE, None, json!({"text": "third"})).await?;
    assert_eq!(
        store.get_by_id(TABLE, &generated).await?.map(|d| d["id"].clone()),
        Some(json!(generated))
    );

    let translator = QueryTranslator::new(TABLE);
    let page = store
        .list(TABLE, &paginate(translator.translate("x=1")?, 10, 0), true)
        .await?;
    assert_eq!(page.documents.len(), 1);
    assert_eq!(page.documents[0]["id"], "a");
    assert_eq!(page.total, Some(1));

    let page = store
        .list(TABLE, &paginate(translator.translate("x>1 or text=third")?, 0, 0), true)
        .await?;
    assert!(page.documents.is_empty());
    assert_eq!(page.total, Some(2));

    let page = store
        .list(
            TABLE,
            &paginate(translator.translate("text=note sortBy x/sort.descending")?, 10, 0),
            false,
        )
        .await?;
    let ids: Vec<_> = page.documents.iter().map(|d| d["id"].clone()).collect();
    assert_eq!(ids, vec![json!("b"), json!("a")]);

    let duplicate = store.insert(TABLE, Some("a"), json!({})).await.unwrap_err();
    assert_eq!(duplicate.code(), Some("23505"));
    assert!(duplicate
        .to_string()
        .contains("duplicate key value violates unique constraint"));

    assert_eq!(store.update(TABLE, json!({"x": 5}), "a").await?, 1);
    assert_eq!(store.update(TABLE, json!({"x": 5}), "zz").await?, 0);
    assert_eq!(store.delete_by_id(TABLE, "a").await?, 1);
    assert_eq!(store.delete_by_id(TABLE, "a").await?, 0);

    let direct = PostgresDocumentStore::new(pool.clone(), schema.clone());
    assert!(direct.get_by_id(TABLE, "b").await?.is_some());

    sqlx::query(&format!("DROP SCHEMA {} CASCADE", schema))
        .execute(&pool)
        .await?;
    Ok(())
}
