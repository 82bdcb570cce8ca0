//! Persistence for [`Book`] rows.
//!
//! Every mutating call commits before it returns. Lookups that match no row
//! come back as `None`/`false` rather than an error.

use bookstore_db::{DbResult, Migration};
use sqlx::SqlitePool;

use super::models::{Book, UpdateBook};

pub(crate) const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_init",
    up: r#"
        CREATE TABLE IF NOT EXISTS books (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            title   VARCHAR(256) NOT NULL,
            price   REAL NOT NULL,
            soldout BOOLEAN NOT NULL DEFAULT 0
        );
        "#,
}];

const SELECT_ALL: &str = "SELECT id, title, price, soldout FROM books ORDER BY id";
const SELECT_BY_ID: &str = "SELECT id, title, price, soldout FROM books WHERE id = ?";

#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new, not sold out book and return its id.
    pub async fn create(&self, title: &str, price: f64) -> DbResult<i64> {
        let result = sqlx::query("INSERT INTO books (title, price, soldout) VALUES (?, ?, ?)")
            .bind(title)
            .bind(price)
            .bind(false)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// All books in insertion order.
    pub async fn list_all(&self) -> DbResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Apply `changes` to the book with `id`; the read and the write share one transaction.
    pub async fn update(&self, id: i64, changes: UpdateBook) -> DbResult<Option<Book>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut book) = sqlx::query_as::<_, Book>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        changes.apply_to(&mut book);

        sqlx::query("UPDATE books SET title = ?, price = ?, soldout = ? WHERE id = ?")
            .bind(&book.title)
            .bind(book.price)
            .bind(book.soldout)
            .bind(book.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(book))
    }

    pub async fn set_soldout(&self, id: i64, soldout: bool) -> DbResult<Option<Book>> {
        self.update(
            id,
            UpdateBook {
                soldout: Some(soldout),
                ..UpdateBook::default()
            },
        )
        .await
    }

    /// Remove the book with `id`; `false` when no such row existed.
    pub async fn delete(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repository() -> BookRepository {
        let pool = bookstore_db::connect_in_memory().await.unwrap();
        let migrations: Vec<_> = MIGRATIONS
            .iter()
            .map(|m| ("books".to_string(), m.clone()))
            .collect();
        bookstore_db::run_migrations(&pool, &migrations).await.unwrap();
        BookRepository::new(pool)
    }

    #[tokio::test]
    async fn create_then_list_returns_new_row() {
        let repo = repository().await;
        let id = repo.create("Dune", 9.99).await.unwrap();

        let books = repo.list_all().await.unwrap();
        assert_eq!(
            books,
            vec![Book {
                id,
                title: "Dune".to_string(),
                price: 9.99,
                soldout: false,
            }]
        );
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let repo = repository().await;
        repo.create("Dune", 9.99).await.unwrap();
        repo.create("Emma", 4.5).await.unwrap();

        let titles: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Dune", "Emma"]);
    }

    #[tokio::test]
    async fn find_missing_book_is_none() {
        let repo = repository().await;
        assert!(repo.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let repo = repository().await;
        let id = repo.create("Dune", 9.99).await.unwrap();

        let updated = repo
            .update(
                id,
                UpdateBook {
                    price: Some(14.0),
                    ..UpdateBook::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.price, 14.0);
        assert!(!updated.soldout);
        assert_eq!(repo.find_by_id(id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_missing_book_changes_nothing() {
        let repo = repository().await;
        let id = repo.create("Dune", 9.99).await.unwrap();

        let result = repo
            .update(
                id + 1,
                UpdateBook {
                    title: Some("Other".to_string()),
                    ..UpdateBook::default()
                },
            )
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(repo.list_all().await.unwrap()[0].title, "Dune");
    }

    #[tokio::test]
    async fn set_soldout_toggles_flag() {
        let repo = repository().await;
        let id = repo.create("Dune", 9.99).await.unwrap();

        assert!(repo.set_soldout(id, true).await.unwrap().unwrap().soldout);
        assert!(!repo.set_soldout(id, false).await.unwrap().unwrap().soldout);
        assert!(repo.set_soldout(id + 1, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let repo = repository().await;
        let id = repo.create("Dune", 9.99).await.unwrap();

        assert!(!repo.delete(id + 1).await.unwrap());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);

        assert!(repo.delete(id).await.unwrap());
        assert!(repo.list_all().await.unwrap().is_empty());
    }
}
