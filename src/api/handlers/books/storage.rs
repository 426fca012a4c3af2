//! Database helpers for book listings.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{Book, BookOwner, BookPayload};

const BOOK_COLUMNS: &str = r"
    books.id, books.title, books.author, books.genre, books.condition,
    books.availability_status, books.location, books.description,
    users.id AS owner_id, users.name AS owner_name, users.email AS owner_email
";

fn book_from_row(row: &sqlx::postgres::PgRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        genre: row.get("genre"),
        condition: row.get("condition"),
        availability_status: row.get("availability_status"),
        location: row.get("location"),
        description: row.get("description"),
        owner: BookOwner {
            id: row.get("owner_id"),
            name: row.get("owner_name"),
            email: row.get("owner_email"),
        },
    }
}

pub(crate) async fn insert_book(
    pool: &PgPool,
    owner_id: Uuid,
    payload: &BookPayload,
) -> Result<Uuid> {
    let query = r"
        INSERT INTO books
            (title, author, genre, condition, availability_status, location, description, owner_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&payload.title)
        .bind(&payload.author)
        .bind(&payload.genre)
        .bind(&payload.condition)
        .bind(&payload.availability_status)
        .bind(&payload.location)
        .bind(&payload.description)
        .bind(owner_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert book")?;

    Ok(row.get("id"))
}

pub(crate) async fn lookup_book(pool: &PgPool, book_id: Uuid) -> Result<Option<Book>> {
    let query = format!(
        "SELECT {BOOK_COLUMNS} FROM books JOIN users ON users.id = books.owner_id WHERE books.id = $1"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(book_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup book")?;

    Ok(row.as_ref().map(book_from_row))
}

pub(crate) async fn list_books(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Book>> {
    let query = format!(
        r"SELECT {BOOK_COLUMNS}
          FROM books JOIN users ON users.id = books.owner_id
          ORDER BY books.created_at DESC
          LIMIT $1 OFFSET $2"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list books")?;

    Ok(rows.iter().map(book_from_row).collect())
}

pub(crate) async fn list_books_by_owner(
    pool: &PgPool,
    owner_id: Uuid,
    owned: bool,
) -> Result<Vec<Book>> {
    // owned = true: the caller's listings; false: everyone else's.
    let comparison = if owned { "=" } else { "<>" };
    let query = format!(
        r"SELECT {BOOK_COLUMNS}
          FROM books JOIN users ON users.id = books.owner_id
          WHERE books.owner_id {comparison} $1
          ORDER BY books.created_at DESC"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(owner_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list books by owner")?;

    Ok(rows.iter().map(book_from_row).collect())
}

/// Case-insensitive substring match on title and author.
pub(crate) async fn search_books(pool: &PgPool, needle: &str) -> Result<Vec<Book>> {
    let pattern = format!("%{}%", escape_like(needle));
    let query = format!(
        r"SELECT {BOOK_COLUMNS}
          FROM books JOIN users ON users.id = books.owner_id
          WHERE books.title ILIKE $1 OR books.author ILIKE $1
          ORDER BY books.created_at DESC"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(&pattern)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to search books")?;

    Ok(rows.iter().map(book_from_row).collect())
}

pub(crate) async fn update_book(
    pool: &PgPool,
    book_id: Uuid,
    payload: &BookPayload,
) -> Result<()> {
    let query = r"
        UPDATE books
        SET title = $2, author = $3, genre = $4, condition = $5,
            availability_status = $6, location = $7, description = $8
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(book_id)
        .bind(&payload.title)
        .bind(&payload.author)
        .bind(&payload.genre)
        .bind(&payload.condition)
        .bind(&payload.availability_status)
        .bind(&payload.location)
        .bind(&payload.description)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update book")?;
    Ok(())
}

pub(crate) async fn delete_book(pool: &PgPool, book_id: Uuid) -> Result<()> {
    let query = "DELETE FROM books WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(book_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete book")?;
    Ok(())
}

/// Escape LIKE metacharacters so user input only ever matches literally.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_handles_metacharacters() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
