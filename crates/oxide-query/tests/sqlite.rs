//! End-to-end tests against an in-memory SQLite database.
//!
//! These tests verify that:
//! - Mutations written through effects can be read back by the terminals
//! - Filters, joins, unions and subqueries return the expected rows
//! - Transactions and savepoints keep or discard effects as requested

use oxide_query::sqlite::connect_options;
use oxide_query::{
    row, CompiledStatement, Effect, Error, Query, Relation, Session, SqlValue, SqliteSession,
    Table, Transaction,
};
use oxide_query_derive::Table;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

#[allow(dead_code)]
#[derive(Debug, Table)]
#[table(name = "users")]
struct User {
    #[column(primary_key)]
    id: i64,
    name: String,
    age: i64,
    active: bool,
}

#[allow(dead_code)]
#[derive(Debug, Table)]
#[table(name = "posts")]
struct Post {
    #[column(primary_key)]
    id: i64,
    user_id: i64,
    title: String,
    score: i64,
}

async fn create_test_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(":memory:").unwrap())
        .await
        .expect("Failed to create in-memory SQLite pool")
}

async fn setup() -> (SqlitePool, SqliteSession) {
    let pool = create_test_pool().await;
    let session = SqliteSession::acquire(&pool).await.unwrap();
    for ddl in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, \
         age INTEGER, active BOOLEAN NOT NULL DEFAULT 1)",
        "CREATE TABLE posts (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER NOT NULL, \
         title TEXT NOT NULL, score INTEGER NOT NULL DEFAULT 0)",
    ] {
        session
            .execute(&CompiledStatement::raw(ddl))
            .await
            .unwrap();
    }
    (pool, session)
}

async fn seed(session: &SqliteSession) {
    let users = (1..=25)
        .map(|i| {
            row! {
                "name" => format!("user{i:02}"),
                "age" => 15 + i,
                "active" => i % 5 != 0,
            }
        })
        .collect();
    Query::of::<User>()
        .create_many(users, 10)
        .unwrap()
        .commit(session)
        .await
        .unwrap();

    let posts = vec![
        row! { "user_id" => 1, "title" => "Hello", "score" => 10 },
        row! { "user_id" => 1, "title" => "Again", "score" => 5 },
        row! { "user_id" => 2, "title" => "Rust tips", "score" => 7 },
    ];
    Query::of::<Post>()
        .create_many(posts, 1000)
        .unwrap()
        .commit(session)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_returns_stored_row() {
    let (_pool, session) = setup().await;
    let created = Query::of::<User>()
        .create(row! { "name" => "Ada", "age" => 36 })
        .unwrap()
        .commit(&session)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(created["id"], SqlValue::Int(1));
    assert_eq!(created["name"], SqlValue::Text(String::from("Ada")));
    assert_eq!(created["active"], SqlValue::Int(1));

    let found = Query::of::<User>().find_or_fail(&session, 1).await.unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_create_many_returns_rows_in_order() {
    let (_pool, session) = setup().await;
    let rows = vec![row! { "name" => "a" }, row! { "name" => "b", "age" => 3 }];
    let created = Query::of::<User>()
        .create_many(rows, 1)
        .unwrap()
        .commit(&session)
        .await
        .unwrap();

    let names: Vec<_> = created.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(
        names,
        vec![
            SqlValue::Text(String::from("a")),
            SqlValue::Text(String::from("b"))
        ]
    );
    assert_eq!(created[0]["age"], SqlValue::Null);
}

#[tokio::test]
async fn test_filters_and_pagination() {
    let (_pool, session) = setup().await;
    seed(&session).await;

    let total = Query::of::<User>()
        .apply_filters([("users.age__gte", 30)], false)
        .unwrap()
        .count(&session)
        .await
        .unwrap();
    assert_eq!(total, 11);

    let page = Query::of::<User>()
        .order_by([User::id().asc()])
        .paginate(&session, 3, 10)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.items[0]["id"], SqlValue::Int(21));
    assert_eq!(page.pagination.total_pages, 3);
    assert!(!page.pagination.has_more);
    assert_eq!(page.pagination.next_page, None);

    let inactive = Query::of::<User>()
        .apply_filters(
            [
                ("User.active__eq", serde_json::json!(false)),
                ("users.name__in", serde_json::json!(["user05", "user10", "user11"])),
            ],
            false,
        )
        .unwrap()
        .all(&session)
        .await
        .unwrap();
    assert_eq!(inactive.len(), 2);
}

/// Values of `column` in the rows of `relation` matching one filter, by id.
async fn matching(
    session: &SqliteSession,
    relation: Relation,
    column: &str,
    filter: (&str, &str),
) -> Vec<SqlValue> {
    Query::new()
        .table(relation.clone())
        .apply_filters([filter], false)
        .unwrap()
        .order_by([relation.col("id").asc()])
        .all(session)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r[column].clone())
        .collect()
}

fn texts(values: &[&str]) -> Vec<SqlValue> {
    values.iter().map(|v| SqlValue::Text(String::from(*v))).collect()
}

#[tokio::test]
async fn test_pattern_operators_match_rows() {
    let (_pool, session) = setup().await;
    seed(&session).await;
    let names = |filter| matching(&session, User::relation(), "name", filter);
    let titles = |filter| matching(&session, Post::relation(), "title", filter);

    assert_eq!(
        names(("users.name__regexp", "^user0[1-3]$")).await,
        texts(&["user01", "user02", "user03"])
    );
    assert_eq!(
        names(("users.name__startswith", "user2")).await,
        texts(&["user20", "user21", "user22", "user23", "user24", "user25"])
    );
    assert_eq!(
        names(("users.name__endswith", "5")).await,
        texts(&["user05", "user15", "user25"])
    );

    assert_eq!(titles(("posts.title__contains", "Rust")).await, texts(&["Rust tips"]));
    assert!(titles(("posts.title__contains", "RUST")).await.is_empty());
    assert!(titles(("posts.title__contains", "%")).await.is_empty());
    assert_eq!(titles(("posts.title__icontains", "RUST")).await, texts(&["Rust tips"]));
}

#[tokio::test]
async fn test_aggregates_and_distinct() {
    let (_pool, session) = setup().await;
    seed(&session).await;

    let oldest = Query::of::<User>().max(&session, User::age()).await.unwrap();
    assert_eq!(oldest, SqlValue::Int(40));
    let score = Query::of::<Post>()
        .r#where(Post::user_id().eq(1))
        .sum(&session, Post::score())
        .await
        .unwrap();
    assert_eq!(score, SqlValue::Int(15));
    let none = Query::of::<Post>()
        .r#where(Post::user_id().eq(99))
        .avg(&session, Post::score())
        .await
        .unwrap();
    assert_eq!(none, SqlValue::Null);

    let flags = Query::of::<User>()
        .distinct(&session, [User::active()])
        .await
        .unwrap();
    assert_eq!(flags.len(), 2);

    let authors = Query::of::<Post>()
        .order_by([Post::id().asc()])
        .distinct_by(&session, [Post::user_id()])
        .await
        .unwrap();
    let titles: Vec<_> = authors.iter().map(|r| r["title"].clone()).collect();
    assert_eq!(
        titles,
        vec![
            SqlValue::Text(String::from("Hello")),
            SqlValue::Text(String::from("Rust tips"))
        ]
    );
}

#[tokio::test]
async fn test_joins_and_subqueries() {
    let (_pool, session) = setup().await;
    seed(&session).await;

    let authors = Query::of::<User>()
        .join(Post::relation(), Post::user_id().eq_col(User::id()))
        .count(&session)
        .await
        .unwrap();
    assert_eq!(authors, 2);

    let with_posts = Query::of::<User>()
        .where_in_subquery(User::id(), || {
            Query::of::<Post>().select([Post::user_id()])
        })
        .unwrap()
        .all(&session)
        .await
        .unwrap();
    assert_eq!(with_posts.len(), 2);

    let first_or_last = Query::of::<User>()
        .where_in_subquery(User::id(), || {
            Query::of::<User>()
                .r#where(User::id().eq(1))
                .union([Query::of::<User>().r#where(User::id().eq(25))])
        })
        .unwrap()
        .count(&session)
        .await
        .unwrap();
    assert_eq!(first_or_last, 2);

    let without_posts = Query::of::<User>()
        .where_not_exists_subquery(|| {
            Query::of::<Post>().r#where(Post::user_id().eq_col(User::id()))
        })
        .unwrap()
        .count(&session)
        .await
        .unwrap();
    assert_eq!(without_posts, 23);

    let top = Query::new()
        .from_subquery("top_posts", || {
            Query::of::<Post>().r#where(Post::score().gt_eq(7))
        })
        .unwrap()
        .count(&session)
        .await
        .unwrap();
    assert_eq!(top, 2);
}

#[tokio::test]
async fn test_union_count_and_rows() {
    let (_pool, session) = setup().await;
    seed(&session).await;

    let young = Query::of::<User>().r#where(User::age().lt(18));
    let old = Query::of::<User>().r#where(User::age().gt(38));
    let combined = young.union([old]).order_by([User::id().asc()]);

    assert_eq!(combined.clone().count(&session).await.unwrap(), 4);
    let rows = combined.all(&session).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(
        ids,
        vec![
            SqlValue::Int(1),
            SqlValue::Int(2),
            SqlValue::Int(24),
            SqlValue::Int(25)
        ]
    );
}

#[tokio::test]
async fn test_update_and_delete() {
    let (_pool, session) = setup().await;
    seed(&session).await;

    let updated = Query::of::<User>()
        .r#where(User::age().lt(18))
        .update(row! { "active" => false })
        .unwrap()
        .commit(&session)
        .await
        .unwrap();
    assert_eq!(updated.len(), 2);
    assert!(updated.iter().all(|r| r["active"] == SqlValue::Int(0)));

    let deleted = Query::of::<User>()
        .delete_by_id(1)
        .unwrap()
        .commit(&session)
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(Query::of::<User>().find(&session, 1).await.unwrap().is_none());
    assert!(matches!(
        Query::of::<User>().find_or_fail(&session, 1).await,
        Err(Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_transaction_rollback_discards_effects() {
    let (_pool, session) = setup().await;

    let tx = Transaction::begin(&session).await.unwrap();
    tx.apply(
        &Query::of::<User>()
            .create(row! { "name" => "kept" })
            .unwrap(),
    )
    .await
    .unwrap();

    let inner = tx.nested().await.unwrap();
    inner
        .apply(
            &Query::of::<User>()
                .create(row! { "name" => "discarded" })
                .unwrap(),
        )
        .await
        .unwrap();
    inner.rollback().await.unwrap();
    tx.commit().await.unwrap();

    let names: Vec<_> = Query::of::<User>()
        .all(&session)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, vec![SqlValue::Text(String::from("kept"))]);

    let tx = Transaction::begin(&session).await.unwrap();
    tx.apply(&Query::of::<User>().delete_by_id(1).unwrap())
        .await
        .unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(Query::of::<User>().count(&session).await.unwrap(), 1);
}

#[tokio::test]
async fn test_describe_builds_queryable_relation() {
    let (_pool, session) = setup().await;
    seed(&session).await;

    let users = session.describe("users").await.unwrap();
    let row = Query::new()
        .table(users)
        .apply_filters([("users.name__startswith", "user2")], false)
        .unwrap()
        .order_by([User::id().desc()])
        .first(&session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["name"], SqlValue::Text(String::from("user25")));
}
