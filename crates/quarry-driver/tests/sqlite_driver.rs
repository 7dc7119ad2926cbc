//! End-to-end tests of the SQLite driver against an in-memory database.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use quarry_driver::{
    DriverConfig, FieldMatch, OrderSpec, OrderTerm, Record, SqliteDriver, WhereSpec,
};
use quarry_query::SqlValue;
use quarry_schema::{Column, ForeignKey, ForeignKeyAction, Index, IndexType, SqlType, Table};

async fn pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

fn users_table() -> Table {
    let mut table = Table::new("users");
    table
        .add_column(Column::new("id", SqlType::Integer).serial())
        .unwrap();
    table
        .add_column(Column::new("name", SqlType::Varchar(255)).not_null())
        .unwrap();
    table
        .add_column(Column::new("email", SqlType::Varchar(255)))
        .unwrap();
    table
        .add_index(Index::primary(vec![String::from("id")]).unwrap())
        .unwrap();
    table
        .add_index(Index::unique(vec![String::from("email")]).unwrap())
        .unwrap();
    table
}

#[tokio::test]
async fn test_crud_round_trip() {
    let driver = SqliteDriver::new(pool().await);
    driver.create_table(&users_table()).await.unwrap();

    let id = driver
        .insert(
            "users",
            &Record::new().set("name", "Alice").set("email", "a@example.com"),
        )
        .await
        .unwrap();
    assert_eq!(id, 1);

    driver
        .insert("users", &Record::new().set("name", "Bob"))
        .await
        .unwrap();

    let rows = driver
        .select(
            "users",
            &["id", "name", "email"],
            None,
            Some(&OrderSpec::columns(vec![OrderTerm::descending("name")])),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("name"), Some(&SqlValue::Text(String::from("Bob"))));
    assert_eq!(rows[0].get("email"), Some(&SqlValue::Null));

    let updated = driver
        .update(
            "users",
            &Record::new().set("email", "b@example.com"),
            Some(&WhereSpec::fields().field("name", FieldMatch::value("Bob"))),
        )
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let deleted = driver
        .delete(
            "users",
            Some(&WhereSpec::fields().field("email", FieldMatch::value(Option::<String>::None))),
        )
        .await
        .unwrap();
    assert_eq!(deleted, 0);

    let deleted = driver
        .delete(
            "users",
            Some(&WhereSpec::fields().field("id", FieldMatch::value(id))),
        )
        .await
        .unwrap();
    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn test_upsert_updates_on_conflict() {
    let driver = SqliteDriver::new(pool().await);
    driver.create_table(&users_table()).await.unwrap();

    driver
        .upsert(
            "users",
            &Record::new()
                .set("id", 1_i64)
                .set("name", "Alice")
                .set("email", "a@example.com"),
            &["id"],
        )
        .await
        .unwrap();
    driver
        .upsert(
            "users",
            &Record::new()
                .set("id", 1_i64)
                .set("name", "Alicia")
                .set("email", "a@example.com"),
            &["id"],
        )
        .await
        .unwrap();

    let rows = driver.select("users", &["name"], None, None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("name"),
        Some(&SqlValue::Text(String::from("Alicia")))
    );
}

#[tokio::test]
async fn test_truncate_removes_all_rows() {
    let driver = SqliteDriver::new(pool().await);
    driver.create_table(&users_table()).await.unwrap();
    for name in ["Alice", "Bob"] {
        driver
            .insert("users", &Record::new().set("name", name))
            .await
            .unwrap();
    }

    let removed = driver.truncate("users").await.unwrap();
    assert_eq!(removed, 2);
    let rows = driver.select("users", &[], None, None).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_ddl_round_trip_reconstructs_schema() {
    let driver = SqliteDriver::new(pool().await);
    driver.create_table(&users_table()).await.unwrap();

    let mut orders = Table::new("orders");
    orders
        .add_column(Column::new("id", SqlType::Integer).serial())
        .unwrap();
    orders
        .add_column(Column::new("user_id", SqlType::Integer).not_null())
        .unwrap();
    orders
        .add_index(Index::primary(vec![String::from("id")]).unwrap())
        .unwrap();
    orders
        .add_foreign_key(
            ForeignKey::single("user_id", "users", "id")
                .unwrap()
                .on_delete(ForeignKeyAction::Cascade),
        )
        .unwrap();
    driver.create_table(&orders).await.unwrap();

    let loaded = driver.load_table("orders").await.unwrap();
    assert_eq!(loaded.name(), "orders");
    assert_eq!(loaded.columns().len(), 2);
    assert!(loaded.get_column("id").unwrap().is_serial());
    assert!(!loaded.get_column("user_id").unwrap().is_nullable());
    assert_eq!(loaded.primary().unwrap().columns(), ["id"]);

    assert_eq!(loaded.foreign_keys().len(), 1);
    let fk = &loaded.foreign_keys()[0];
    assert_eq!(fk.columns(), ["user_id"]);
    assert_eq!(fk.referred_table(), "users");
    assert_eq!(fk.referred_columns(), ["id"]);
    assert_eq!(fk.delete_action(), ForeignKeyAction::Cascade);
    assert_eq!(fk.update_action(), ForeignKeyAction::Restrict);

    let users = driver.load_table("users").await.unwrap();
    let unique: Vec<_> = users
        .indexes()
        .iter()
        .filter(|i| i.index_type() == IndexType::Unique)
        .collect();
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].columns(), ["email"]);
}

#[tokio::test]
async fn test_load_table_missing() {
    let driver = SqliteDriver::new(pool().await);
    let err = driver.load_table("ghost").await.unwrap_err();
    assert!(matches!(
        err,
        quarry_driver::DriverError::NoSuchTable(name) if name == "ghost"
    ));
}

#[tokio::test]
async fn test_add_and_remove_column() {
    let driver = SqliteDriver::new(pool().await);
    driver.create_table(&users_table()).await.unwrap();

    driver
        .add_column("users", &Column::new("age", SqlType::Integer))
        .await
        .unwrap();
    let columns = driver.get_columns("users").await.unwrap();
    assert!(columns.iter().any(|c| c.name() == "age"));

    driver.remove_column("users", "age").await.unwrap();
    let columns = driver.get_columns("users").await.unwrap();
    assert!(!columns.iter().any(|c| c.name() == "age"));
}

#[tokio::test]
async fn test_create_and_drop_index() {
    let driver = SqliteDriver::new(pool().await);
    driver.create_table(&users_table()).await.unwrap();

    let index = Index::plain(vec![String::from("name")]).unwrap();
    driver.create_index("users", &index).await.unwrap();

    let (indexes, _) = driver.get_constraints("users").await.unwrap();
    assert!(indexes.iter().any(|i| i.name_in("users") == "users_name_key"));

    driver.drop_index("users", "users_name_key").await.unwrap();
    let (indexes, _) = driver.get_constraints("users").await.unwrap();
    assert!(!indexes.iter().any(|i| i.name_in("users") == "users_name_key"));
}

#[tokio::test]
async fn test_table_prefix_round_trip() {
    let driver = SqliteDriver::with_config(
        pool().await,
        DriverConfig::new().table_prefix("app_"),
    );
    driver.create_table(&users_table()).await.unwrap();

    // The physical table carries the prefix.
    let physical: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'app_users'")
            .fetch_optional(driver.pool())
            .await
            .unwrap();
    assert!(physical.is_some());

    // The logical name keeps working through the driver.
    driver
        .insert("users", &Record::new().set("name", "Alice"))
        .await
        .unwrap();
    let loaded = driver.load_table("users").await.unwrap();
    assert_eq!(loaded.name(), "users");
}

#[tokio::test]
async fn test_expression_condition_executes() {
    use quarry_query::Q;

    let driver = SqliteDriver::new(pool().await);
    driver.create_table(&users_table()).await.unwrap();
    for name in ["Alice", "Bob", "Carol"] {
        driver
            .insert("users", &Record::new().set("name", name))
            .await
            .unwrap();
    }

    let condition = Q::or(Q::equals("name", "Alice"), Q::equals("name", "Carol"));
    let rows = driver
        .select(
            "users",
            &["name"],
            Some(&WhereSpec::Expression(condition)),
            Some(&OrderSpec::columns(vec![OrderTerm::ascending("name")])),
        )
        .await
        .unwrap();
    let names: Vec<_> = rows.iter().filter_map(|r| r.get("name")).collect();
    assert_eq!(
        names,
        vec![
            &SqlValue::Text(String::from("Alice")),
            &SqlValue::Text(String::from("Carol")),
        ]
    );
}
