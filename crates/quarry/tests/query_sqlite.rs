mod common;

use common::{Post, User, database};
use quarry::prelude::*;
use quarry::{JoinType, Lock};

#[tokio::test]
async fn insert_return_then_find() {
    let db = database();

    let inserted = User::query()
        .insert_return(
            &db,
            &[
                fields! { "name" => "alice", "visits" => 0 },
                fields! { "name" => "bob", "visits" => 3 },
            ],
        )
        .await
        .unwrap();
    assert_eq!(inserted.len(), 2);
    assert_eq!(inserted[0].name, "alice");
    assert_eq!(inserted[1].visits, 3);

    let found = User::query().find(&db, inserted[1].id).await.unwrap().unwrap();
    assert_eq!(found.name, "bob");
    assert!(User::query().find(&db, 999).await.unwrap().is_none());
    assert!(User::query().find_or_fail(&db, 999).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn count_exists_update_delete() {
    let db = database();
    let users = Query::table("users");
    users
        .insert(
            &db,
            &[
                fields! { "name" => "a" },
                fields! { "name" => "b" },
                fields! { "name" => "c" },
            ],
        )
        .await
        .unwrap();

    assert_eq!(users.count(&db).await.unwrap(), 3);
    assert!(users.clone().where_eq("name", "b").exists(&db).await.unwrap());
    assert!(!users.clone().where_eq("name", "z").exists(&db).await.unwrap());

    let renamed = users
        .clone()
        .where_in("name", ["a", "b"])
        .update(&db, &Changes::new().set("name", "ab"))
        .await
        .unwrap();
    assert_eq!(renamed, 2);
    assert_eq!(users.clone().where_eq("name", "ab").count(&db).await.unwrap(), 2);

    users.clone().where_eq("name", "c").increment(&db, "visits", 5).await.unwrap();
    users.clone().where_eq("name", "c").decrement(&db, "visits", 2).await.unwrap();
    let visits: i64 = users
        .clone()
        .where_eq("name", "c")
        .first(&db)
        .await
        .unwrap()
        .unwrap()
        .try_get("visits")
        .unwrap();
    assert_eq!(visits, 3);

    assert_eq!(users.clone().where_eq("name", "ab").delete(&db).await.unwrap(), 2);
    assert_eq!(User::query().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn grouped_counts_and_pagination() {
    let db = database();
    Query::table("users")
        .insert(&db, &[fields! { "name" => "a" }, fields! { "name" => "b" }])
        .await
        .unwrap();
    let posts: Vec<Fields> = (0..7)
        .map(|i| fields! { "user_id" => 1 + i % 2, "title" => format!("p{i}") })
        .collect();
    Query::table("posts").insert(&db, &posts).await.unwrap();

    let authors = Query::table("posts").select(["user_id"]).group_by(["user_id"]);
    assert_eq!(authors.count(&db).await.unwrap(), 2);

    let busy = Query::table("posts")
        .select(["user_id", "COUNT(*) AS total"])
        .group_by(["user_id"])
        .having("COUNT(*)", Op::Gt, 3)
        .get(&db)
        .await
        .unwrap();
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].try_get::<i64>("total").unwrap(), 4);

    let page: Vec<Post> = Query::table("posts")
        .order_by("id", Direction::Asc)
        .page(3, 3)
        .fetch_all(&db)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "p6");
}

#[tokio::test]
async fn joins_and_update_from() {
    let db = database();
    Query::table("teams")
        .insert(&db, &[fields! { "name" => "red" }, fields! { "name" => "blue" }])
        .await
        .unwrap();
    Query::table("users")
        .insert(
            &db,
            &[
                fields! { "name" => "a", "team_id" => 1 },
                fields! { "name" => "b", "team_id" => 2 },
                fields! { "name" => "c", "team_id" => None::<i64> },
            ],
        )
        .await
        .unwrap();

    let rows = Query::table("users")
        .select(["users.name", "teams.name AS team"])
        .left_join("teams", "teams.id", Op::Eq, "users.team_id")
        .order_by("users.name", Direction::Asc)
        .get(&db)
        .await
        .unwrap();
    let teams: Vec<Option<String>> = rows.iter().map(|r| r.try_get("team").unwrap()).collect();
    assert_eq!(teams, [Some("red".to_string()), Some("blue".to_string()), None]);

    let bumped = Query::table("users")
        .join_with(JoinType::Inner, "teams", |j| {
            j.on("teams.id", Op::Eq, "users.team_id")
                .on_value("teams.name", Op::Eq, "blue")
        })
        .update(&db, &Changes::new().set("visits", 10))
        .await
        .unwrap();
    assert_eq!(bumped, 1);

    // SQLite drops row locks instead of failing.
    let locked = Query::table("users").lock(Lock::update().no_wait()).get(&db).await.unwrap();
    assert_eq!(locked.len(), 3);
}

#[tokio::test]
async fn decoding_is_strict() {
    let db = database();
    Query::table("users")
        .insert(&db, &[fields! { "name" => "a" }])
        .await
        .unwrap();
    let row = Query::table("users").first(&db).await.unwrap().unwrap();

    assert!(row.try_get::<i64>("name").is_err());
    assert!(row.try_get::<f64>("id").is_err());
    assert!(row.try_get::<i64>("team_id").is_err());
    assert_eq!(row.try_get::<Option<i64>>("team_id").unwrap(), None);
    assert!(matches!(row.get("missing"), Err(OrmError::Decode { .. })));
}

#[tokio::test]
async fn failures_carry_context() {
    let db = database();

    let err = Query::new().get(&db).await.unwrap_err();
    assert!(matches!(err, OrmError::MissingTable));

    let err = Query::table("nope").get(&db).await.unwrap_err();
    assert_eq!(err.sql(), Some("SELECT * FROM nope"));

    let err = Query::table("users").insert(&db, &[]).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
}

#[tokio::test]
async fn serializable_structs_insert_as_fields() {
    #[derive(serde::Serialize)]
    struct NewUser {
        name: String,
        visits: i64,
    }

    let db = database();
    let row = quarry::to_fields(&NewUser {
        name: "dana".to_string(),
        visits: 4,
    })
    .unwrap();
    let users = User::query().insert_return(&db, &[row]).await.unwrap();
    assert_eq!(users[0].visits, 4);
}
