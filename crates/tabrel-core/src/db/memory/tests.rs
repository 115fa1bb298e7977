use crate::{
    db::{
        executor::QueryExecutor,
        memory::MemoryExecutor,
        query::{AggregateExpr, CompareOp, Condition, SelectItem, SelectQuery},
    },
    error::ErrorClass,
    row,
    test_support::{Library, titles},
    value::Value,
};

#[test]
fn select_filters_orders_and_windows() {
    let library = Library::new();

    let mut query = SelectQuery::new("books");
    query.where_eq("author_id", 1);
    query.order("pages DESC").expect("order");
    query.set_limit(Some(2), Some(1));

    let rows = library.executor.select(&query).expect("select");

    assert_eq!(titles(&rows), vec!["The Lathe of Heaven", "A Wizard of Earthsea"]);
    assert_eq!(library.executor.statements().len(), 1);
}

#[test]
fn select_projects_listed_columns_without_qualifier() {
    let library = Library::new();

    let mut query = SelectQuery::new("books");
    query.select("books.id, title").expect("select");
    query.where_eq("id", 2);

    let rows = library.executor.select(&query).expect("select");

    assert_eq!(rows, vec![row!("id" => 2, "title" => "Solaris")]);
}

#[test]
fn comparisons_against_null_never_match() {
    let executor = MemoryExecutor::new();
    executor.create_table("t", "id").expect("table");
    executor
        .seed("t", vec![row!("v" => Value::Null), row!("v" => 3)])
        .expect("seed");

    let mut query = SelectQuery::new("t");
    query.push_condition(Condition::compare("v", CompareOp::Ne, 1));
    assert_eq!(executor.select(&query).expect("select").len(), 1);

    let mut nulls = SelectQuery::new("t");
    nulls.where_eq("v", Value::Null);
    assert_eq!(executor.select(&nulls).expect("select").len(), 1);
}

#[test]
fn group_by_emits_aggregate_first() {
    let library = Library::new();

    let mut query = SelectQuery::new("books");
    query.push_select(SelectItem::Aggregate(AggregateExpr::count_all()));
    query.push_select(SelectItem::Column("books.author_id".to_string()));
    query.group("books.author_id");

    let rows = library.executor.select(&query).expect("select");

    assert_eq!(
        rows,
        vec![
            row!("COUNT(*)" => 3, "author_id" => 1),
            row!("COUNT(*)" => 3, "author_id" => 2),
        ]
    );
}

#[test]
fn aggregates_over_empty_input() {
    let library = Library::new();

    let mut query = SelectQuery::new("books");
    query.where_eq("author_id", 3);
    query.select("COUNT(*), SUM(pages), MAX(pages)").expect("select");

    let rows = library.executor.select(&query).expect("select");

    assert_eq!(
        rows,
        vec![row!("COUNT(*)" => 0, "SUM(pages)" => Value::Null, "MAX(pages)" => Value::Null)]
    );
}

#[test]
fn insert_generates_keys_after_the_highest_seen() {
    let library = Library::new();

    let outcome = library
        .executor
        .insert("books", &[row!("author_id" => 3, "title" => "Ficciones")])
        .expect("insert");

    assert_eq!(outcome.affected, 1);
    assert_eq!(outcome.last_id, Some(Value::Int(7)));
}

#[test]
fn duplicate_primary_key_conflicts() {
    let library = Library::new();

    let err = library
        .executor
        .insert("books", &[row!("id" => 1)])
        .expect_err("duplicate id must fail");

    assert_eq!(err.class, ErrorClass::Conflict);
}

#[test]
fn update_and_delete_respect_conditions() {
    let library = Library::new();

    let mut filter = SelectQuery::new("books");
    filter.where_eq("author_id", 2);

    let updated = library
        .executor
        .update(&filter, &row!("pages" => 1))
        .expect("update");
    let deleted = library.executor.delete(&filter).expect("delete");

    assert_eq!(updated, 3);
    assert_eq!(deleted, 3);
    assert_eq!(library.executor.rows("books").expect("rows").len(), 3);
    assert_eq!(
        library.executor.statements(),
        vec![
            "UPDATE books SET pages = ? WHERE author_id = ?".to_string(),
            "DELETE FROM books WHERE author_id = ?".to_string(),
        ]
    );
}

#[test]
fn unknown_table_is_not_found() {
    let executor = MemoryExecutor::new();
    let err = executor
        .primary_key("nope")
        .expect_err("unknown table must fail");

    assert!(err.is_not_found());
}
