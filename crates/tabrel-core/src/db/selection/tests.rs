use crate::{
    db::{
        RelationNode,
        query::{CompareOp, Condition},
    },
    error::ErrorClass,
    row,
    test_support::{Library, titles},
    value::Value,
};
use std::rc::Rc;

#[test]
fn root_node_has_an_empty_ancestor_path() {
    let root = Rc::new(RelationNode::Root {
        table: "authors".to_string(),
    });
    let child = RelationNode::Grouped {
        table: "books".to_string(),
        parent: Rc::clone(&root),
    };

    assert_eq!(root.ancestor_path().as_str(), "");
    assert_eq!(child.ancestor_path().as_str(), "books.");
    assert_eq!(child.table(), "books");
}

#[test]
fn rows_are_fetched_once_until_the_query_changes() {
    let library = Library::new();
    let mut books = library.session.table("books");

    books.rows().expect("rows");
    books.rows().expect("rows again");
    assert_eq!(library.selects(), 1);

    books.where_eq("author_id", 2).order("title").expect("order");
    let rows = books.rows().expect("filtered rows");

    assert_eq!(library.selects(), 2);
    assert_eq!(titles(&rows), vec!["His Master's Voice", "Solaris", "The Cyberiad"]);
}

#[test]
fn get_ignores_limit_and_honors_filters() {
    let library = Library::new();
    let mut books = library.session.table("books");
    books.where_eq("author_id", 1);

    let found = books.get(3).expect("get").expect("book 3 is by author 1");
    let missing = books.get(2).expect("get");

    assert_eq!(found.get("title"), Some(&Value::from("The Dispossessed")));
    assert!(missing.is_none());
}

#[test]
fn count_and_aggregation_use_selection_conditions() {
    let library = Library::new();
    let mut books = library.session.table("books");
    books.where_condition(Condition::compare("pages", CompareOp::Gte, 200));

    assert_eq!(books.count(None).expect("count"), 3);
    assert_eq!(
        books.aggregation("max(pages)").expect("max"),
        Some(Value::Int(387))
    );
}

#[test]
fn malformed_select_is_rejected() {
    let library = Library::new();
    let mut books = library.session.table("books");

    let err = books.select("title, ").err().expect("trailing comma");

    assert_eq!(err.class, ErrorClass::Unsupported);
    assert!(books.query().select_items().is_empty());
}

#[test]
fn writes_apply_to_matching_rows() {
    let library = Library::new();
    let mut books = library.session.table("books");

    let outcome = books
        .insert(row!("author_id" => 3, "title" => "Ficciones", "pages" => 174))
        .expect("insert");
    assert_eq!(outcome.last_id, Some(Value::Int(7)));

    books.where_eq("author_id", 3);
    assert_eq!(books.update(&row!("pages" => 203)).expect("update"), 1);
    assert_eq!(books.delete().expect("delete"), 1);
    assert_eq!(library.executor.rows("books").expect("rows").len(), 6);
}

#[test]
fn update_without_assignments_skips_the_collaborator() {
    let library = Library::new();
    let mut books = library.session.table("books");
    books.where_eq("author_id", 1);
    library.executor.clear_log();

    assert_eq!(books.update(&crate::db::Row::new()).expect("update"), 0);
    assert!(library.executor.statements().is_empty());
}

#[test]
fn related_is_driven_by_loaded_primary_keys() {
    let library = Library::new();
    let mut authors = library.session.table("authors");
    authors.where_condition(Condition::compare("id", CompareOp::Gt, 1));

    let books = authors.related("books", "author_id").expect("related");

    assert_eq!(books.parent_keys(), &[Value::Int(2), Value::Int(3)]);
    assert_eq!(books.table(), "books");
    assert_eq!(books.column(), "author_id");
}
