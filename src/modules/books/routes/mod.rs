//! HTTP handlers for `/books`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use bookshelf_http::{error::AppError, response::ApiResponse};

use super::models::{BookDetail, BookFilter, BookList, BookPayload, CreatedBook, ListQuery};
use super::store::{BookError, BookStore};

/// A mutating request, used to pick its response messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Add,
    Update,
    Delete,
}

impl Operation {
    fn verb(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Operation::Add => "Book added successfully",
            Operation::Update => "Book updated successfully",
            Operation::Delete => "Book deleted successfully",
        }
    }

    /// Map a store failure to the HTTP error for this operation.
    fn fail(self, err: BookError) -> AppError {
        let verb = self.verb();
        match err {
            BookError::MissingName => AppError::bad_request(format!(
                "Failed to {verb} book. Please provide the book name"
            )),
            BookError::ReadPageExceedsPageCount { .. } => AppError::bad_request(format!(
                "Failed to {verb} book. readPage must not be greater than pageCount"
            )),
            BookError::NotFound(_) => {
                AppError::not_found(format!("Failed to {verb} book. Id not found"))
            }
        }
    }

    fn payload<T>(self, payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
        payload.map(|Json(body)| body).map_err(|rejection| {
            AppError::bad_request(format!(
                "Failed to {} book. Invalid request payload: {}",
                self.verb(),
                rejection.body_text()
            ))
        })
    }
}

/// Build the router for the books resource over the given store
pub fn router(store: Arc<BookStore>) -> Router {
    Router::new()
        .route("/books", get(list_books).post(add_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

async fn add_book(
    State(store): State<Arc<BookStore>>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<ApiResponse<CreatedBook>, AppError> {
    let op = Operation::Add;
    let payload = op.payload(payload)?;
    let book_id = store.add(payload).map_err(|err| op.fail(err))?;

    Ok(ApiResponse::created(
        op.success_message(),
        CreatedBook { book_id },
    ))
}

/// Lookups only fail with `NotFound`; anything else is a server fault.
fn get_failure(err: BookError) -> AppError {
    match err {
        BookError::NotFound(_) => AppError::not_found("Book not found"),
        other => AppError::Internal(other.into()),
    }
}

/// Query pairs are collected raw so repeated keys never reject the request.
async fn list_books(
    State(store): State<Arc<BookStore>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<ApiResponse<BookList>, AppError> {
    let Query(pairs) = query.map_err(|rejection| {
        AppError::bad_request(format!(
            "Failed to list books. Invalid query string: {}",
            rejection.body_text()
        ))
    })?;

    let filter = BookFilter::from(pairs.into_iter().collect::<ListQuery>());
    let books = store.list(&filter);
    tracing::debug!(count = books.len(), "listing books");
    Ok(ApiResponse::ok(BookList { books }))
}

async fn get_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<BookDetail>, AppError> {
    let book = store.get(&id).map_err(get_failure)?;
    Ok(ApiResponse::ok(BookDetail { book }))
}

async fn update_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let op = Operation::Update;
    let payload = op.payload(payload)?;
    store.update(&id, payload).map_err(|err| op.fail(err))?;
    Ok(ApiResponse::message(op.success_message()))
}

async fn delete_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let op = Operation::Delete;
    store.remove(&id).map_err(|err| op.fail(err))?;
    Ok(ApiResponse::message(op.success_message()))
}
