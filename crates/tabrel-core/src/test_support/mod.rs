//! Shared fixtures for core tests.

use crate::{
    db::{
        Row, Session,
        entity::{Entity, EntityRow},
        memory::MemoryExecutor,
    },
    row,
    value::Value,
};
use std::{any::Any, rc::Rc};

///
/// Library
///
/// `authors` (ids 1, 2, 3) and `books` keyed by `id` with an `author_id`
/// grouping column. Author 3 has no books.
///

pub(crate) struct Library {
    pub(crate) executor: Rc<MemoryExecutor>,
    pub(crate) session: Session,
}

impl Library {
    pub(crate) fn new() -> Self {
        let executor = Rc::new(MemoryExecutor::new());
        executor
            .create_table("authors", "id")
            .expect("authors table");
        executor.create_table("books", "id").expect("books table");

        executor
            .seed(
                "authors",
                vec![
                    row!("id" => 1, "name" => "Le Guin"),
                    row!("id" => 2, "name" => "Lem"),
                    row!("id" => 3, "name" => "Borges"),
                ],
            )
            .expect("seed authors");
        executor
            .seed(
                "books",
                vec![
                    book(1, 1, "A Wizard of Earthsea", 183),
                    book(2, 2, "Solaris", 204),
                    book(3, 1, "The Dispossessed", 387),
                    book(4, 2, "The Cyberiad", 295),
                    book(5, 1, "The Lathe of Heaven", 184),
                    book(6, 2, "His Master's Voice", 199),
                ],
            )
            .expect("seed books");

        let session = Session::new(executor.clone());

        Self { executor, session }
    }

    pub(crate) fn selects(&self) -> usize {
        self.executor.select_count()
    }
}

pub(crate) fn book(id: i64, author: i64, title: &str, pages: i64) -> Row {
    row!("id" => id, "author_id" => author, "title" => title, "pages" => pages)
}

/// Titles of a row list, in order.
pub(crate) fn titles(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            row.get("title")
                .and_then(Value::as_text)
                .expect("title")
                .to_string()
        })
        .collect()
}

///
/// Book
///
/// Custom entity kind used to check kind resolution.
///

#[derive(Debug)]
pub(crate) struct Book {
    inner: EntityRow,
}

impl Book {
    pub(crate) fn title(&self) -> &str {
        self.inner
            .get("title")
            .and_then(Value::as_text)
            .unwrap_or_default()
    }
}

impl Entity for Book {
    fn from_row(row: EntityRow) -> Self {
        Self { inner: row }
    }

    fn entity_row(&self) -> &EntityRow {
        &self.inner
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
