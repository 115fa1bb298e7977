use std::{any::Any, rc::Rc};
use tabrel::{
    ErrorKind,
    core::{db::memory::MemoryExecutor, obs},
    prelude::*,
    row,
};

fn library() -> (Rc<MemoryExecutor>, Session) {
    let executor = Rc::new(MemoryExecutor::new());
    executor.create_table("authors", "id").expect("authors");
    executor.create_table("books", "id").expect("books");
    executor
        .seed(
            "authors",
            vec![row!("id" => 1, "name" => "Le Guin"), row!("id" => 2, "name" => "Lem")],
        )
        .expect("seed authors");
    executor
        .seed(
            "books",
            vec![
                row!("author_id" => 1, "title" => "A Wizard of Earthsea"),
                row!("author_id" => 2, "title" => "Solaris"),
                row!("author_id" => 1, "title" => "The Dispossessed"),
                row!("author_id" => 2, "title" => "The Cyberiad"),
                row!("author_id" => 2, "title" => "Fiasco"),
            ],
        )
        .expect("seed books");

    let session = Session::new(executor.clone());

    (executor, session)
}

#[test]
fn authors_and_books_cost_one_batched_query() {
    let (executor, session) = library();
    let authors = Manager::new(&session, "authors").expect("authors manager");

    let mut selection = authors.table();
    let mut books = selection.related("books", "author_id").expect("related");
    let before = executor.select_count();

    let mut returned = 0;
    for author in [1, 2] {
        books.set_active(author);
        returned += books.fetch().expect("group").len();
    }

    assert_eq!(executor.select_count() - before, 1);
    assert_eq!(returned, executor.rows("books").expect("books").len());
}

#[test]
fn repeated_access_is_served_from_cache() {
    let (executor, session) = library();
    let mut authors = session.table("authors");
    let books = authors.related("books", "author_id").expect("related");

    let first = books.for_group(2).rows().expect("first");
    let before = executor.select_count();
    let second = books.for_group(2).rows().expect("second");

    assert_eq!(first, second);
    assert_eq!(executor.select_count(), before);
}

#[test]
fn per_group_limit_holds_with_many_groups() {
    let (_, session) = library();
    let mut authors = session.table("authors");
    let mut books = authors.related("books", "author_id").expect("related");
    books.order("title").expect("order").limit(2, None);

    for author in [1, 2] {
        let rows = books.for_group(author).rows().expect("rows");
        assert!(rows.len() <= 2, "author {author} got {} rows", rows.len());
    }

    let lem = books.for_group(2).rows().expect("rows");
    let titles = lem
        .iter()
        .filter_map(|row| row.get("title").and_then(Value::as_text))
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Fiasco", "Solaris"]);
}

#[test]
fn count_of_a_group_without_rows_is_zero() {
    let (executor, session) = library();
    executor.seed("authors", vec![row!("id" => 9)]).expect("seed");

    let mut authors = session.table("authors");
    let books = authors.related("books", "author_id").expect("related");

    assert_eq!(books.for_group(9).count(None).expect("count"), 0);
    assert_eq!(
        books
            .for_group(9)
            .aggregation("COUNT(*)")
            .expect("aggregation"),
        Some(Value::Int(0))
    );
}

#[test]
fn update_without_primary_key_writes_nothing() {
    let (executor, session) = library();
    let books = Manager::new(&session, "books").expect("books manager");
    executor.clear_log();

    let err: tabrel::Error = books
        .update(row!("title" => "X"))
        .err()
        .expect("must fail")
        .into();

    assert_eq!(err.kind, ErrorKind::Invalid);
    assert!(executor.statements().is_empty());
}

#[test]
fn manager_crud_round() {
    let (_, session) = library();
    let books = Manager::new(&session, "books").expect("books manager");

    let created = books
        .create(row!("author_id" => 1, "title" => "Always Coming Home"))
        .expect("create");
    let id = created.primary_value().cloned().expect("generated id");

    let updated = books
        .update(row!("id" => id.clone(), "title" => "Always Coming Home (1985)"))
        .expect("update")
        .expect("row exists");
    assert_eq!(
        updated.get("title").and_then(Value::as_text),
        Some("Always Coming Home (1985)")
    );

    assert!(books.delete(&id).expect("delete"));
    assert!(books.get(id).expect("get").is_none());
}

#[derive(Debug)]
struct Author {
    row: EntityRow,
}

impl Entity for Author {
    fn from_row(row: EntityRow) -> Self {
        Self { row }
    }

    fn entity_row(&self) -> &EntityRow {
        &self.row
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn settings_select_the_entity_kind() {
    let executor = Rc::new(MemoryExecutor::new());
    executor.create_table("authors", "id").expect("authors");
    executor
        .seed("authors", vec![row!("id" => 1, "name" => "Le Guin")])
        .expect("seed");

    let settings = Settings::from_toml_str(
        r#"
        [tables]
        authors = "author"
        "#,
    )
    .expect("settings");
    let session = Session::builder(executor)
        .settings(settings)
        .registry(EntityRegistry::new().with::<Author>("author").expect("register"))
        .build();

    let authors = Manager::new(&session, "authors").expect("manager");
    let author = authors.get(1).expect("get").expect("author 1");

    assert!(author.is::<Author>());
}

#[test]
fn metrics_report_counts_cache_traffic() {
    obs::metrics_reset_all();
    let (_, session) = library();
    let mut authors = session.table("authors");
    let books = authors.related("books", "author_id").expect("related");

    books.for_group(1).rows().expect("miss");
    books.for_group(2).rows().expect("hit");

    let report = obs::metrics_report();
    let counters = report.table("books").expect("books counters");
    assert_eq!(counters.referencing_misses, 1);
    assert_eq!(counters.referencing_hits, 1);
    assert_eq!(report.ops.rows_partitioned, 5);
}
