//! Book listing CRUD and search. Every route requires an authenticated
//! principal; mutations additionally require resource ownership.

mod storage;
pub(crate) mod types;

use axum::{
    extract::{Extension, Path, Query},
    http::HeaderMap,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::{require_auth, AuthState, Principal};
use crate::api::error::ApiError;
use storage::{
    delete_book, insert_book, list_books, list_books_by_owner, lookup_book, search_books,
    update_book,
};
use types::{Book, BookListResponse, BookPayload, BookResponse, ListParams, SearchParams};

const DEFAULT_PAGE_LIMIT: i64 = 20;
const MAX_PAGE_LIMIT: i64 = 100;

fn check_payload(payload: &BookPayload) -> Result<(), ApiError> {
    let required = [
        ("title", &payload.title),
        ("author", &payload.author),
        ("genre", &payload.genre),
        ("condition", &payload.condition),
        ("availabilityStatus", &payload.availability_status),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!(
                "Missing required field: {field}"
            )));
        }
    }
    Ok(())
}

/// Fetch a book and check the caller owns it.
async fn owned_book(pool: &PgPool, book_id: Uuid, principal: &Principal) -> Result<Book, ApiError> {
    let Some(book) = lookup_book(pool, book_id).await? else {
        return Err(ApiError::NotFound("Book not found".to_string()));
    };
    if book.owner.id != principal.user_id {
        return Err(ApiError::Forbidden(
            "You are not the owner of this book".to_string(),
        ));
    }
    Ok(book)
}

fn success_list(books: Vec<Book>) -> Json<BookListResponse> {
    Json(BookListResponse {
        status: "success".to_string(),
        books,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/books/add",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book listed", body = BookResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn add_book(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<BookPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };
    check_payload(&payload)?;

    let book_id = insert_book(&pool, principal.user_id, &payload).await?;
    let Some(book) = lookup_book(&pool, book_id).await? else {
        return Err(ApiError::Internal(anyhow::anyhow!(
            "inserted book {book_id} not found"
        )));
    };

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            status: "success".to_string(),
            book,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/books",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, capped at 100"),
        ("offset" = Option<i64>, Query, description = "Rows to skip")
    ),
    responses(
        (status = 200, description = "All book listings", body = BookListResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn get_all_books(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_auth(&headers, &pool, &auth_state).await?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let books = list_books(&pool, limit, offset).await?;
    Ok((StatusCode::OK, success_list(books)))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/search",
    params(("q" = String, Query, description = "Substring matched against title and author")),
    responses(
        (status = 200, description = "Matching book listings", body = BookListResponse),
        (status = 400, description = "Empty query"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn search(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_auth(&headers, &pool, &auth_state).await?;

    let needle = params.q.trim();
    if needle.is_empty() {
        return Err(ApiError::Validation(
            "Missing required query parameter: q".to_string(),
        ));
    }

    let books = search_books(&pool, needle).await?;
    Ok((StatusCode::OK, success_list(books)))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/me",
    responses(
        (status = 200, description = "Caller's own listings", body = BookListResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn get_my_books(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    let books = list_books_by_owner(&pool, principal.user_id, true).await?;
    Ok((StatusCode::OK, success_list(books)))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/other",
    responses(
        (status = 200, description = "Listings owned by other users", body = BookListResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn get_other_books(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    let books = list_books_by_owner(&pool, principal.user_id, false).await?;
    Ok((StatusCode::OK, success_list(books)))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book found", body = BookResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn get_book(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_auth(&headers, &pool, &auth_state).await?;

    let Some(book) = lookup_book(&pool, book_id).await? else {
        return Err(ApiError::NotFound("Book not found".to_string()));
    };

    Ok((
        StatusCode::OK,
        Json(BookResponse {
            status: "success".to_string(),
            book,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn update_book_listing(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(book_id): Path<Uuid>,
    payload: Option<Json<BookPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    let book = owned_book(&pool, book_id, &principal).await?;

    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };
    check_payload(&payload)?;

    update_book(&pool, book.id, &payload).await?;
    let Some(updated) = lookup_book(&pool, book.id).await? else {
        return Err(ApiError::NotFound("Book not found".to_string()));
    };

    Ok((
        StatusCode::OK,
        Json(BookResponse {
            status: "success".to_string(),
            book: updated,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn delete_book_listing(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;

    let book = owned_book(&pool, book_id, &principal).await?;
    delete_book(&pool, book.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> BookPayload {
        BookPayload {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Sci-Fi".to_string(),
            condition: "Good".to_string(),
            availability_status: "Available".to_string(),
            location: None,
            description: None,
        }
    }

    #[test]
    fn check_payload_accepts_complete_payload() {
        assert!(check_payload(&payload()).is_ok());
    }

    #[test]
    fn check_payload_names_the_missing_field() {
        let mut bad = payload();
        bad.availability_status = "  ".to_string();
        let err = check_payload(&bad).unwrap_err();
        assert!(err.to_string().contains("availabilityStatus"));
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }
}
