use crate::{
    db::{
        Manager, ManagerError, Session,
        entity::{EntityRegistry, GenericEntity},
        memory::MemoryExecutor,
    },
    error::{ErrorClass, ErrorDetail, ErrorOrigin},
    row,
    test_support::{Book, Library, titles},
    value::Value,
};
use std::rc::Rc;
use tabrel_config::Settings;

fn books(library: &Library) -> Manager {
    Manager::new(&library.session, "books").expect("books manager")
}

#[test]
fn empty_table_name_is_undefined() {
    let library = Library::new();
    let err = Manager::new(&library.session, " ").err().expect("must fail");

    assert_eq!(err.class, ErrorClass::Config);
    assert_eq!(err.origin, ErrorOrigin::Manager);
    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Manager(ManagerError::UndefinedTable))
    ));
}

#[test]
fn unknown_table_fails_at_construction() {
    let library = Library::new();
    let err = Manager::new(&library.session, "shelves").err().expect("must fail");

    assert!(err.is_not_found());
}

#[test]
fn get_returns_none_for_missing_rows() {
    let library = Library::new();
    let manager = books(&library);

    let found = manager.get(2).expect("get").expect("book 2 exists");
    assert_eq!(found.get("title"), Some(&Value::from("Solaris")));
    assert!(manager.find(99).expect("find").is_none());
}

#[test]
fn get_all_filters_by_equality() {
    let library = Library::new();
    let manager = books(&library);

    let mut selection = manager.get_all([("author_id", 2)]);
    let rows = selection.rows().expect("rows");

    assert_eq!(titles(&rows), vec!["Solaris", "The Cyberiad", "His Master's Voice"]);
    assert_eq!(manager.find_all([("author_id", 3)]).count(None).expect("count"), 0);
}

#[test]
fn create_reads_back_the_generated_row() {
    let library = Library::new();
    let manager = books(&library);

    let created = manager
        .create(row!("author_id" => 3, "title" => "Ficciones"))
        .expect("create");

    assert_eq!(created.primary_value(), Some(&Value::Int(7)));
    assert_eq!(created.get("title"), Some(&Value::from("Ficciones")));
}

#[test]
fn update_without_primary_key_fails_before_writing() {
    let library = Library::new();
    let manager = books(&library);
    library.executor.clear_log();

    let err = manager
        .update(row!("title" => "X"))
        .err()
        .expect("missing key must fail");

    assert!(matches!(
        err.detail,
        Some(ErrorDetail::Manager(ManagerError::MissingPrimaryKey { .. }))
    ));
    assert!(library.executor.statements().is_empty());
}

#[test]
fn update_changes_remaining_fields_and_refreshes() {
    let library = Library::new();
    let manager = books(&library);

    let updated = manager
        .update(row!("id" => 5, "title" => "X"))
        .expect("update")
        .expect("row 5 exists");

    assert_eq!(updated.get("title"), Some(&Value::from("X")));
    assert_eq!(updated.get("pages"), Some(&Value::Int(184)));
}

#[test]
fn update_with_only_the_primary_key_reads_the_row_back() {
    let library = Library::new();
    let manager = books(&library);
    library.executor.clear_log();

    let found = manager
        .update(row!("id" => 1))
        .expect("update")
        .expect("row 1 exists");

    assert_eq!(found.get("pages"), Some(&Value::Int(183)));
    assert_eq!(
        library.executor.statements(),
        vec!["SELECT * FROM books WHERE id = ? LIMIT 1".to_string()]
    );
}

#[test]
fn delete_accepts_keys_and_entities() {
    let library = Library::new();
    let manager = books(&library);

    assert!(manager.delete(&Value::Int(1)).expect("delete by key"));
    assert!(!manager.delete(&Value::Int(1)).expect("already gone"));

    let entity = manager.get(2).expect("get").expect("book 2");
    assert!(manager.delete(entity.as_ref()).expect("delete by entity"));
    assert_eq!(library.executor.rows("books").expect("rows").len(), 4);
}

#[test]
fn deleting_an_unsaved_entity_removes_nothing() {
    let library = Library::new();
    let manager = books(&library);
    let draft = manager
        .new_entity(row!("title" => "Draft"))
        .expect("new entity");
    library.executor.clear_log();

    assert!(!manager.delete(draft.as_ref()).expect("delete"));
    assert!(library.executor.statements().is_empty());
    assert_eq!(library.executor.rows("books").expect("rows").len(), 6);
}

#[test]
fn delete_rejects_entities_of_other_tables() {
    let library = Library::new();
    let manager = books(&library);
    let authors = Manager::new(&library.session, "authors").expect("authors manager");

    let author = authors.get(1).expect("get").expect("author 1");
    let err = manager
        .delete(author.as_ref())
        .expect_err("foreign entity must fail");

    assert_eq!(err.class, ErrorClass::InvariantViolation);
}

#[test]
fn new_entity_uses_the_configured_kind_without_writing() {
    let executor = Rc::new(MemoryExecutor::new());
    executor.create_table("books", "id").expect("books table");
    let session = Session::builder(executor.clone())
        .settings(Settings::new().with_table("books", "book"))
        .registry(EntityRegistry::new().with::<Book>("book").expect("register"))
        .build();
    let manager = Manager::new(&session, "books").expect("manager");

    let entity = manager
        .new_entity(row!("title" => "Draft"))
        .expect("new entity");

    assert_eq!(entity.downcast_ref::<Book>().map(Book::title), Some("Draft"));
    assert!(executor.statements().is_empty());
}

#[test]
fn instantiate_prefers_the_selection_kind() {
    let library = Library::new();
    let manager = books(&library);
    let mut selection = manager.table();

    let generic = manager
        .instantiate(row!("id" => 1), &selection)
        .expect("generic");
    assert!(generic.is::<GenericEntity>());

    selection.set_row_kind("missing");
    let err = manager
        .instantiate(row!("id" => 1), &selection)
        .expect_err("unregistered selection kind");
    assert_eq!(err.class, ErrorClass::Config);
}
