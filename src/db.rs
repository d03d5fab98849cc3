use crate::config::Config;
use crate::error::StoreError;
use crate::model::{Book, BookForm, BookInput};
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase, Row};
use std::path::Path;
use tokio::sync::Mutex;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

const IN_MEMORY: &str = ":memory:";

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

const BOOK_COLUMNS: &str = "id, title, author, genre, year, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Author,
    Genre,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Ordering {
    pub const TITLE_ASC: Ordering = Ordering {
        field: SortField::Title,
        direction: SortDirection::Asc,
    };

    fn to_sql(self) -> String {
        // text columns sort alphabetically regardless of case
        let column = match self.field {
            SortField::Id => "id",
            SortField::Title => "title COLLATE NOCASE",
            SortField::Author => "author COLLATE NOCASE",
            SortField::Genre => "genre COLLATE NOCASE",
            SortField::Year => "year",
        };
        let direction = match self.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        // id breaks ties so pages never overlap
        format!("ORDER BY {column} {direction}, id ASC")
    }
}

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    tx_lock: Mutex<()>,
}

impl Database {
    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the catalog database and brings its schema up to date.
    ///
    /// A relative database path is resolved against `data_dir`; `:memory:`
    /// opens a private in-memory catalog.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let db = if cfg.app.get_db() == IN_MEMORY {
            Builder::new_local(IN_MEMORY).build().await?
        } else {
            let path = data_dir.join(cfg.app.get_db());
            tracing::info!(path = ?path, "[db] opening local database");
            Builder::new_local(&path).build().await?
        };

        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            tx_lock: Mutex::new(()),
        })
    }

    /// Releases the connection and the underlying database handle.
    pub fn close(self) {
        let Database { db, conn, .. } = self;
        drop(conn);
        drop(db);
        tracing::info!("[db] database closed");
    }

    fn row_to_book(row: &Row) -> Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            genre: row.get::<Option<String>>(3)?,
            year: row.get::<Option<i32>>(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    pub async fn count_books(&self) -> StoreResult<u64> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM books", ()).await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(count as u64)
    }

    /// One page of books plus the total number of books in the catalog.
    pub async fn list_page(&self, offset: u64, limit: u32, ordering: Ordering) -> StoreResult<(Vec<Book>, u64)> {
        if limit == 0 {
            return Err(anyhow::anyhow!("page limit must be positive").into());
        }

        let query = format!("SELECT {BOOK_COLUMNS} FROM books {} LIMIT ? OFFSET ?", ordering.to_sql());
        let mut rows = self
            .conn
            .query(&query, libsql::params![limit as i64, offset as i64])
            .await?;

        let mut books = vec![];
        while let Some(row) = rows.next().await? {
            books.push(Self::row_to_book(&row)?);
        }
        drop(rows);

        let total = self.count_books().await?;
        Ok((books, total))
    }

    /// Books whose title, author, genre or year contains `term`.
    ///
    /// The term is matched literally (`%` and `_` are escaped) with SQLite's
    /// `LIKE`, so ASCII letters match case-insensitively. An empty term
    /// matches every book.
    pub async fn search(&self, term: &str) -> StoreResult<Vec<Book>> {
        let query = format!(
            r#"
SELECT {BOOK_COLUMNS}
FROM books
WHERE title LIKE ?1 ESCAPE '\'
   OR author LIKE ?1 ESCAPE '\'
   OR genre LIKE ?1 ESCAPE '\'
   OR CAST(year AS TEXT) LIKE ?1 ESCAPE '\'
{}
"#,
            Ordering::TITLE_ASC.to_sql()
        );

        let mut rows = self.conn.query(&query, libsql::params![like_pattern(term)]).await?;

        let mut books = vec![];
        while let Some(row) = rows.next().await? {
            books.push(Self::row_to_book(&row)?);
        }
        Ok(books)
    }

    pub async fn get_book(&self, book_id: i64) -> StoreResult<Book> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![book_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Self::row_to_book(&row)?),
            None => Err(StoreError::NotFound(book_id)),
        }
    }

    /// Validates `form` and inserts it as a new book. Nothing is written when
    /// validation fails.
    pub async fn create_book(&self, form: &BookForm) -> StoreResult<Book> {
        let input = form.validate().map_err(StoreError::Validation)?;

        let _guard = self.tx_lock.lock().await;

        let query = format!(
            r#"
            INSERT INTO books (title, author, genre, year)
            VALUES (?, ?, ?, ?)
            RETURNING {BOOK_COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![input.title, input.author, input.genre, input.year],
            )
            .await?;

        let book = match rows.next().await? {
            Some(row) => Self::row_to_book(&row)?,
            None => return Err(anyhow::anyhow!("insert returned no row").into()),
        };

        tracing::info!(book_id = book.id, "created book");
        Ok(book)
    }

    /// Overwrites every field of an existing book.
    ///
    /// Fails with `NotFound` when the book is absent and with `Validation`
    /// (leaving the stored row untouched) when `form` is invalid.
    pub async fn update_book(&self, book_id: i64, form: &BookForm) -> StoreResult<Book> {
        let _guard = self.tx_lock.lock().await;

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = self.update_book_internal(book_id, form).await;
        let book = self.finish_transaction(result).await?;

        tracing::info!(book_id, "updated book");
        Ok(book)
    }

    /// Commits on success and rolls back otherwise, including when the
    /// `COMMIT` itself fails, so the shared connection never stays inside a
    /// transaction.
    async fn finish_transaction<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        match result {
            Ok(value) => match self.conn.execute("COMMIT", ()).await {
                Ok(_) => Ok(value),
                Err(e) => {
                    let _ = self.conn.execute("ROLLBACK", ()).await;
                    Err(e.into())
                }
            },
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn update_book_internal(&self, book_id: i64, form: &BookForm) -> StoreResult<Book> {
        let mut existing = self
            .conn
            .query("SELECT 1 FROM books WHERE id = ?", libsql::params![book_id])
            .await?;
        if existing.next().await?.is_none() {
            return Err(StoreError::NotFound(book_id));
        }
        drop(existing);

        let BookInput {
            title,
            author,
            genre,
            year,
        } = form.validate().map_err(StoreError::Validation)?;

        let query = format!(
            r#"
            UPDATE books
            SET title = ?, author = ?, genre = ?, year = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING {BOOK_COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(&query, libsql::params![title, author, genre, year, book_id])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Self::row_to_book(&row)?),
            None => Err(StoreError::NotFound(book_id)),
        }
    }

    pub async fn delete_book(&self, book_id: i64) -> StoreResult<()> {
        let _guard = self.tx_lock.lock().await;

        let deleted = self
            .conn
            .execute("DELETE FROM books WHERE id = ?", libsql::params![book_id])
            .await?;

        if deleted == 0 {
            return Err(StoreError::NotFound(book_id));
        }

        tracing::info!(book_id, "deleted book");
        Ok(())
    }
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
