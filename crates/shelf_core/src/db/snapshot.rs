//! Whole-catalog snapshot persistence.
//!
//! # Responsibility
//! - Write the full in-memory catalog to SQLite in one transaction.
//! - Read it back in id order together with each table's id counter.
//!
//! # Invariants
//! - `save` replaces every snapshot row or none of them.
//! - Loaded `next_id` is always greater than every loaded id.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use crate::model::{Author, Book, Genre, RecordId, TableKind};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Instant;

/// Rows of one table plus the id its next insert will receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot<E> {
    pub rows: Vec<E>,
    pub next_id: RecordId,
}

impl<E> Default for TableSnapshot<E> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

/// Full catalog state as persisted by `commit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub authors: TableSnapshot<Author>,
    pub genres: TableSnapshot<Genre>,
    pub books: TableSnapshot<Book>,
}

impl CatalogSnapshot {
    pub fn row_count(&self) -> usize {
        self.authors.rows.len() + self.genres.rows.len() + self.books.rows.len()
    }
}

/// Durable backend the catalog service flushes to on commit.
///
/// Implementors are `Send`: a catalog holding a store may be shared across
/// threads behind one `Mutex`.
pub trait SnapshotStore: Send {
    fn load(&self) -> DbResult<CatalogSnapshot>;
    fn save(&mut self, snapshot: &CatalogSnapshot) -> DbResult<()>;
}

/// SQLite-backed snapshot store.
pub struct SqliteSnapshotStore {
    conn: Connection,
}

impl SqliteSnapshotStore {
    /// Opens (or creates) a snapshot file with migrations applied.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps a connection that already went through `open_db`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> DbResult<CatalogSnapshot> {
        let authors = load_named(&self.conn, TableKind::Author, |id, name| Author { id, name })?;
        let genres = load_named(&self.conn, TableKind::Genre, |id, name| Genre { id, name })?;
        let books = load_books(&self.conn)?;

        Ok(CatalogSnapshot {
            authors: with_counter(&self.conn, TableKind::Author, authors, |a| a.id)?,
            genres: with_counter(&self.conn, TableKind::Genre, genres, |g| g.id)?,
            books: with_counter(&self.conn, TableKind::Book, books, |b| b.id)?,
        })
    }

    fn save(&mut self, snapshot: &CatalogSnapshot) -> DbResult<()> {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute_batch(
            "DELETE FROM books;
             DELETE FROM authors;
             DELETE FROM genres;",
        )?;

        {
            let mut stmt = tx.prepare("INSERT INTO authors (id, name) VALUES (?1, ?2);")?;
            for author in &snapshot.authors.rows {
                stmt.execute(params![sql_id(author.id)?, author.name.as_str()])?;
            }
        }
        {
            let mut stmt = tx.prepare("INSERT INTO genres (id, name) VALUES (?1, ?2);")?;
            for genre in &snapshot.genres.rows {
                stmt.execute(params![sql_id(genre.id)?, genre.name.as_str()])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO books (id, title, author_id, genre_id) VALUES (?1, ?2, ?3, ?4);",
            )?;
            for book in &snapshot.books.rows {
                stmt.execute(params![
                    sql_id(book.id)?,
                    book.title.as_str(),
                    book.author_id.map(sql_id).transpose()?,
                    book.genre_id.map(sql_id).transpose()?,
                ])?;
            }
        }

        write_counter(&tx, TableKind::Author, snapshot.authors.next_id)?;
        write_counter(&tx, TableKind::Genre, snapshot.genres.next_id)?;
        write_counter(&tx, TableKind::Book, snapshot.books.next_id)?;
        tx.commit()?;

        info!(
            "event=snapshot_save module=db status=ok rows={} duration_ms={}",
            snapshot.row_count(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn load_named<E>(
    conn: &Connection,
    table: TableKind,
    build: impl Fn(RecordId, String) -> E,
) -> DbResult<Vec<E>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name FROM {} ORDER BY id ASC;",
        table.table_name()
    ))?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let id = record_id(row.get("id")?, table, "id")?;
        records.push(build(id, row.get("name")?));
    }
    Ok(records)
}

fn load_books(conn: &Connection) -> DbResult<Vec<Book>> {
    let mut stmt =
        conn.prepare("SELECT id, title, author_id, genre_id FROM books ORDER BY id ASC;")?;
    let mut rows = stmt.query([])?;
    let mut books = Vec::new();
    while let Some(row) = rows.next()? {
        books.push(Book {
            id: record_id(row.get("id")?, TableKind::Book, "id")?,
            title: row.get("title")?,
            author_id: row
                .get::<_, Option<i64>>("author_id")?
                .map(|value| record_id(value, TableKind::Book, "author_id"))
                .transpose()?,
            genre_id: row
                .get::<_, Option<i64>>("genre_id")?
                .map(|value| record_id(value, TableKind::Book, "genre_id"))
                .transpose()?,
        });
    }
    Ok(books)
}

fn with_counter<E>(
    conn: &Connection,
    table: TableKind,
    rows: Vec<E>,
    id_of: impl Fn(&E) -> RecordId,
) -> DbResult<TableSnapshot<E>> {
    let stored: Option<i64> = conn
        .query_row(
            "SELECT next_id FROM table_sequences WHERE table_name = ?1;",
            [table.table_name()],
            |row| row.get(0),
        )
        .optional()?;
    let stored = match stored {
        Some(value) => record_id(value, table, "next_id")?,
        None => 1,
    };
    let past_max = rows.iter().map(&id_of).max().map_or(1, |max| max + 1);

    Ok(TableSnapshot {
        rows,
        next_id: stored.max(past_max),
    })
}

fn write_counter(tx: &Transaction<'_>, table: TableKind, next_id: RecordId) -> DbResult<()> {
    tx.execute(
        "INSERT INTO table_sequences (table_name, next_id) VALUES (?1, ?2)
         ON CONFLICT(table_name) DO UPDATE SET next_id = excluded.next_id;",
        params![table.table_name(), sql_id(next_id)?],
    )?;
    Ok(())
}

fn sql_id(id: RecordId) -> DbResult<i64> {
    i64::try_from(id).map_err(|_| DbError::InvalidData(format!("id {id} exceeds SQLite range")))
}

fn record_id(value: i64, table: TableKind, column: &str) -> DbResult<RecordId> {
    match RecordId::try_from(value) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DbError::InvalidData(format!(
            "invalid id `{value}` in {}.{column}",
            table.table_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogSnapshot, SnapshotStore, SqliteSnapshotStore, TableSnapshot};
    use crate::model::{Author, Book, Genre};

    fn sample() -> CatalogSnapshot {
        CatalogSnapshot {
            authors: TableSnapshot {
                rows: vec![Author {
                    id: 2,
                    name: "Jane Smith".to_string(),
                }],
                next_id: 5,
            },
            genres: TableSnapshot {
                rows: vec![Genre {
                    id: 1,
                    name: "Mystery".to_string(),
                }],
                next_id: 2,
            },
            books: TableSnapshot {
                rows: vec![Book {
                    id: 3,
                    title: "Mystery Novel".to_string(),
                    author_id: Some(2),
                    genre_id: None,
                }],
                next_id: 4,
            },
        }
    }

    #[test]
    fn empty_store_loads_empty_snapshot() {
        let store = SqliteSnapshotStore::open_in_memory().unwrap();
        assert_eq!(store.load().unwrap(), CatalogSnapshot::default());
    }

    #[test]
    fn save_then_load_preserves_rows_and_counters() {
        let mut store = SqliteSnapshotStore::open_in_memory().unwrap();
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let mut store = SqliteSnapshotStore::open_in_memory().unwrap();
        store.save(&sample()).unwrap();

        let mut smaller = sample();
        smaller.books.rows.clear();
        store.save(&smaller).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.books.rows.is_empty());
        assert_eq!(loaded.books.next_id, 4);
        assert_eq!(loaded.authors.rows.len(), 1);
    }

    #[test]
    fn dangling_reference_rolls_back_whole_save() {
        let mut store = SqliteSnapshotStore::open_in_memory().unwrap();
        store.save(&sample()).unwrap();

        let mut broken = sample();
        broken.books.rows[0].genre_id = Some(42);
        broken.authors.rows[0].name = "Changed".to_string();
        store.save(&broken).unwrap_err();

        assert_eq!(store.load().unwrap(), sample());
    }
}
