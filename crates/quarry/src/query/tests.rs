use super::*;
use crate::condition::{InValues, WhereKind};
use crate::error::OrmError;
use crate::fields;
use crate::grammar::MySqlGrammar;
use crate::row::Row;
use crate::testing::ScriptedExecutor;

#[test]
fn conditions_record_their_connectors() {
    let query = Query::table("users")
        .where_eq("a", 1)
        .or_where("b", Op::Gt, 2)
        .or_where_null("c");
    let connectors: Vec<Connector> = query.wheres.iter().map(|w| w.connector).collect();
    assert_eq!(connectors, [Connector::And, Connector::Or, Connector::Or]);
    assert_eq!(
        query.wheres[2].kind,
        WhereKind::Value {
            column: "c".to_string(),
            op: Op::Eq,
            value: Binding::Null,
        }
    );
}

#[test]
fn groups_harvest_only_the_closure_conditions() {
    let query = Query::table("users")
        .where_eq("active", true)
        .or_where_group(|q| q.where_eq("role", "admin").or_where("role", Op::Eq, "owner"));
    assert_eq!(query.wheres.len(), 2);
    match &query.wheres[1].kind {
        WhereKind::Nested(children) => {
            assert_eq!(query.wheres[1].connector, Connector::Or);
            assert_eq!(children.len(), 2);
            assert_eq!(children[1].connector, Connector::Or);
        }
        other => panic!("expected a group, got {other:?}"),
    }
}

#[test]
fn group_closure_cannot_leak_other_clauses() {
    let query =
        Query::table("users").where_group(|q| q.where_eq("a", 1).limit(5).order_by_desc("id"));
    assert_eq!(query.limit, None);
    assert!(query.orders.is_empty());
}

#[test]
fn having_group_uses_the_closure_wheres() {
    let query = Query::table("orders")
        .group_by(["user_id"])
        .having_group(|q| q.and_where("SUM(total)", Op::Gt, 100).or_where("COUNT(*)", Op::Gt, 3));
    assert!(query.wheres.is_empty());
    assert!(matches!(&query.havings[0].kind, WhereKind::Nested(c) if c.len() == 2));
}

#[test]
fn subquery_in_is_stored_unrendered() {
    let sub = Query::table("orders").select(["user_id"]);
    let query = Query::table("users").where_in_query("id", sub.clone());
    match &query.wheres[0].kind {
        WhereKind::In {
            values: InValues::Query(inner),
            negated: false,
            ..
        } => assert_eq!(**inner, sub),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn builders_are_values() {
    let base = Query::table("users").where_eq("active", true);
    let admins = base.clone().where_eq("role", "admin");
    assert_eq!(base.wheres.len(), 1);
    assert_eq!(admins.wheres.len(), 2);
    assert_eq!(Query::new().from("users").table.as_deref(), Some("users"));
}

#[test]
fn changes_keep_assignment_order() {
    let changes: Changes = fields! { "b" => 2, "a" => 1 }.into();
    let columns: Vec<&str> = changes.iter().map(|(c, _)| c).collect();
    assert_eq!(columns, ["b", "a"]);
    assert_eq!(changes.len(), 2);
}

#[tokio::test]
async fn first_adds_limit_and_decodes() {
    let db = ScriptedExecutor::new().respond(vec![Row::from_pairs([("id", 9)])]);
    let row = Query::table("users")
        .where_eq("name", "ann")
        .first(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<i64>("id").unwrap(), 9);
    assert_eq!(
        db.statements(),
        ["SELECT * FROM users WHERE name = ? LIMIT 1"]
    );
}

#[tokio::test]
async fn fetch_one_reports_not_found() {
    let db = ScriptedExecutor::new();
    let err = Query::table("users")
        .fetch_one::<Row, _>(&db)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn count_and_exists_read_their_aliases() {
    let db = ScriptedExecutor::new()
        .respond(vec![Row::from_pairs([("count", 12)])])
        .respond(vec![Row::from_pairs([("exists", true)])])
        .respond(vec![Row::from_pairs([("exists", 0)])]);
    let users = Query::table("users").where_eq("active", true);

    assert_eq!(users.count(&db).await.unwrap(), 12);
    assert!(users.exists(&db).await.unwrap());
    assert!(!users.exists(&db).await.unwrap());

    let statements = db.statements();
    assert_eq!(statements[0], "SELECT COUNT(*) AS count FROM users WHERE active = ?");
    assert!(statements[1].starts_with("SELECT EXISTS ("));
}

#[tokio::test]
async fn insert_return_runs_every_dialect_statement() {
    let db = ScriptedExecutor::new()
        .with_grammar(MySqlGrammar)
        .respond(vec![])
        .respond(vec![Row::from_pairs([("id", 1)])])
        .respond(vec![])
        .respond(vec![Row::from_pairs([("id", 2)])]);
    let rows = Query::table("users")
        .insert_return(&db, &[fields! { "name" => "a" }, fields! { "name" => "b" }])
        .await
        .unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.try_get("id").unwrap()).collect();
    assert_eq!(ids, [1, 2]);
    assert_eq!(db.statements().len(), 4);
}

#[tokio::test]
async fn increment_binds_the_step() {
    let db = ScriptedExecutor::new();
    Query::table("posts")
        .where_eq("id", 4)
        .increment(&db, "views", 3)
        .await
        .unwrap();
    let (sql, bindings) = db.calls().remove(0);
    assert_eq!(sql, "UPDATE posts SET views = views + ? WHERE id = ?");
    assert_eq!(bindings, [Binding::Int(3), Binding::Int(4)]);
}

#[tokio::test]
async fn compile_errors_never_reach_the_executor() {
    let db = ScriptedExecutor::new();
    let err = Query::new().get(&db).await.unwrap_err();
    assert!(matches!(err, OrmError::MissingTable));
    let err = Query::table("t").update(&db, &Changes::new()).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn tagged_queries_reach_the_executor() {
    let db = ScriptedExecutor::new().respond(vec![Row::from_pairs([("id", 1)])]);
    let rows = Query::table("users").get_tagged(&db, "users.all").await.unwrap();
    assert_eq!(rows.len(), 1);
}
