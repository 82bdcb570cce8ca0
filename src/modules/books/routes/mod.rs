//! HTTP handlers for the books catalogue.
//!
//! Lookups by id that match nothing answer `204 No Content` with an empty
//! body; existing clients treat that status as "not found".

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use bookstore_http::error::AppError;

use super::models::{Book, CreateBook, UpdateBook};
use super::repository::BookRepository;
use crate::utils;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const BOOKVIEW_JS: &str = include_str!("../assets/bookview.js");

/// Build the books router over `repository`.
pub fn router(repository: BookRepository) -> Router {
    tracing::debug!(target: "bookstore.routes", prefix = %utils::log_prefix("books"), "registering book routes");

    Router::new()
        .route("/", get(index))
        .route("/static/js/bookview.js", get(bookview_script))
        .route("/health", get(health_check))
        .route("/get-books", get(get_books))
        .route("/new-book", post(new_book))
        .route("/del-book/{id}", delete(del_book))
        .route("/update-book/{id}", put(update_book))
        .route("/update-book/{id}/soldout/{flag}", put(update_soldout))
        .with_state(repository)
}

/// Path ids arrive as text; anything that is not an integer matches no row.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// `"1"` marks the book sold out, any other value clears the flag.
fn parse_flag(raw: &str) -> bool {
    raw == "1"
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn bookview_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        BOOKVIEW_JS,
    )
}

/// Health check endpoint
async fn health_check(State(repository): State<BookRepository>) -> Result<&'static str, AppError> {
    repository.list_all().await?;
    Ok("books module is healthy")
}

async fn get_books(State(repository): State<BookRepository>) -> Result<Json<Vec<Book>>, AppError> {
    let books = repository.list_all().await?;
    Ok(Json(books))
}

async fn new_book(
    State(repository): State<BookRepository>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(input) = payload?;
    let id = repository.create(&input.title, input.price).await?;
    tracing::info!(book_id = id, title = %input.title, "book created");
    Ok(StatusCode::OK)
}

async fn del_book(
    State(repository): State<BookRepository>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(no_content());
    };

    if repository.delete(id).await? {
        tracing::info!(book_id = id, "book deleted");
        Ok(StatusCode::OK.into_response())
    } else {
        tracing::debug!(book_id = id, "delete requested for missing book");
        Ok(no_content())
    }
}

async fn update_book(
    State(repository): State<BookRepository>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBook>, JsonRejection>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(no_content());
    };
    // A missing book answers 204 whatever the body holds
    if repository.find_by_id(id).await?.is_none() {
        return Ok(no_content());
    }
    let Json(changes) = payload?;

    match repository.update(id, changes).await? {
        Some(book) => {
            tracing::info!(book_id = id, "book updated");
            Ok(Json(book).into_response())
        }
        None => Ok(no_content()),
    }
}

async fn update_soldout(
    State(repository): State<BookRepository>,
    Path((id, flag)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(no_content());
    };

    match repository.set_soldout(id, parse_flag(&flag)).await? {
        Some(book) => {
            tracing::info!(book_id = id, soldout = book.soldout, "book availability changed");
            Ok(Json(book).into_response())
        }
        None => Ok(no_content()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_marks_sold_out() {
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("true"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn non_numeric_ids_match_nothing() {
        assert_eq!(parse_id("17"), Some(17));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
    }
}
