use std::collections::HashSet;
use std::sync::Arc;

use sqlshim::drivers::MemoryStore;
use sqlshim::traits::TableStore;
use sqlshim::types::{Record, SqlValue};
use sqlshim::{Database, ShimConfig, ShimError};

fn setup() -> (Arc<MemoryStore>, Database) {
    let memory_store = Arc::new(MemoryStore::new().with_rows(
        "produtos",
        vec![
            Record::new().with("nome", "Tela").with("categoria", "display").with("estoque", 3),
            Record::new().with("nome", "Bateria").with("categoria", "energia").with("estoque", 10),
            Record::new().with("nome", "Cabo").with("categoria", "energia").with("estoque", 0),
        ],
    ));
    let store: Arc<dyn TableStore> = Arc::clone(&memory_store) as Arc<dyn TableStore>;
    (memory_store, Database::with_store(store))
}

#[tokio::test]
async fn test_get_and_all() {
    let (memory_store, db) = setup();

    let produto = db.get("produtos", 2).await.unwrap().unwrap();
    assert_eq!(produto.get("nome"), Some(&SqlValue::from("Bateria")));
    assert_eq!(memory_store.last_request().unwrap().limit, Some(1));

    assert!(db.get("produtos", 42).await.unwrap().is_none());
    assert_eq!(db.all("produtos").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_find_matches_every_condition() {
    let (memory_store, db) = setup();

    let rows = db
        .find(
            "produtos",
            &Record::new().with("categoria", "energia").with("estoque", 0),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("nome"), Some(&SqlValue::from("Cabo")));
    assert_eq!(memory_store.last_request().unwrap().filters.len(), 2);
}

#[tokio::test]
async fn test_insert_update_delete() {
    let (memory_store, db) = setup();

    let inserted = db
        .insert("produtos", Record::new().with("nome", "Capa").with("estoque", 1))
        .await
        .unwrap();
    assert_eq!(inserted.get("id"), Some(&SqlValue::Int(4)));

    let updated = db
        .update("produtos", 4, Record::new().with("estoque", 7))
        .await
        .unwrap();
    assert_eq!(updated.get("estoque"), Some(&SqlValue::Int(7)));
    assert_eq!(updated.get("nome"), Some(&SqlValue::from("Capa")));

    db.delete("produtos", 4).await.unwrap();
    assert_eq!(memory_store.rows("produtos").len(), 3);

    // Deleting again is not an error
    db.delete("produtos", 4).await.unwrap();
}

#[tokio::test]
async fn test_update_missing_row_is_not_found() {
    let (_, db) = setup();

    let err = db
        .update("produtos", 99, Record::new().with("estoque", 1))
        .await
        .unwrap_err();

    match err {
        ShimError::NotFound { table, id } => {
            assert_eq!(table, "produtos");
            assert_eq!(id, "99");
        }
        other => panic!("Expected NotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_count_with_and_without_conditions() {
    let (memory_store, db) = setup();

    assert_eq!(db.count("produtos", None).await.unwrap(), 3);
    let request = memory_store.last_request().unwrap();
    assert!(request.head);
    assert!(request.count.is_some());

    let energia = Record::new().with("categoria", "energia");
    assert_eq!(db.count("produtos", Some(&energia)).await.unwrap(), 2);
}

#[tokio::test]
async fn test_custom_id_column() {
    let memory_store = Arc::new(
        MemoryStore::new()
            .with_id_column("codigo")
            .with_rows("vendas", vec![Record::new().with("total", 10.5)]),
    );
    let store: Arc<dyn TableStore> = Arc::clone(&memory_store) as Arc<dyn TableStore>;
    let db = Database::with_store(store)
        .with_config(ShimConfig {
            id_column: "codigo".to_string(),
            ..ShimConfig::default()
        })
        .unwrap();

    let venda = db.get("vendas", 1).await.unwrap().unwrap();
    assert_eq!(venda.get("total"), Some(&SqlValue::Float(10.5)));

    let result = db
        .run("INSERT INTO vendas (total) VALUES (?)", &[20.into()])
        .await
        .unwrap();
    assert_eq!(result.id, Some(SqlValue::Int(2)));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let (_, db) = setup();

    let err = db
        .with_config(ShimConfig {
            count_alias: "total geral".to_string(),
            ..ShimConfig::default()
        })
        .err()
        .unwrap();
    assert!(matches!(err, ShimError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_concurrent_calls_share_the_store() {
    let (memory_store, db) = setup();

    let mut handles = Vec::new();
    for i in 0..16 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.run(
                "INSERT INTO produtos (nome, estoque) VALUES (?, ?)",
                &[format!("item-{}", i).into(), i.into()],
            )
            .await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.changes, 1);
        ids.insert(result.id.unwrap().as_i64().unwrap());
    }

    assert_eq!(ids.len(), 16);
    assert_eq!(memory_store.rows("produtos").len(), 19);
    assert_eq!(db.count("produtos", None).await.unwrap(), 19);
}
