//! HTTP handlers for the books collection.
//!
//! Each handler performs exactly one store call and serializes the result;
//! there is no cross-request state beyond the shared store handle.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use bookshelf_http::error::AppError;

use super::models::{Book, BookFilter, BookInput, DeleteConfirmation};
use super::store::{BookStore, BookStoreError};

pub type SharedStore = Arc<dyn BookStore>;

const REQUIRED_FIELDS_MESSAGE: &str = "name, img, and summary are required";

/// Build the books router; mounted by the HTTP facade under `/books`.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

/// POST /books
async fn create_book(
    State(store): State<SharedStore>,
    Json(input): Json<BookInput>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let fields = input
        .validate()
        .map_err(|details| AppError::validation(details, REQUIRED_FIELDS_MESSAGE))?;

    // Write failures surface as client errors carrying the driver message.
    let book = store
        .insert(fields)
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /books
async fn list_books(
    State(store): State<SharedStore>,
    Query(filter): Query<BookFilter>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = store
        .list(&filter)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(Json(books))
}

/// GET /books/{id}
async fn get_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    match store.get(&id).await {
        Ok(book) => Ok(Json(book)),
        Err(BookStoreError::NotFound(_)) => Err(AppError::not_found("Book not found")),
        Err(err) => Err(AppError::Internal(err.into())),
    }
}

/// PUT /books/{id} — full replacement, no partial-patch semantics
async fn update_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Json(input): Json<BookInput>,
) -> Result<Json<Book>, AppError> {
    let fields = input
        .validate()
        .map_err(|details| AppError::validation(details, REQUIRED_FIELDS_MESSAGE))?;

    match store.replace(&id, fields).await {
        Ok(book) => Ok(Json(book)),
        Err(BookStoreError::NotFound(_)) => Err(AppError::not_found("Book not found")),
        Err(err) => Err(AppError::bad_request(err.to_string())),
    }
}

/// DELETE /books/{id} — any request body is ignored; the contract depends
/// only on the path identifier, and unknown ids still succeed
async fn delete_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>, AppError> {
    let deleted = store
        .remove(&id)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    tracing::debug!(id = %id, deleted, "delete book");

    Ok(Json(DeleteConfirmation {
        message: "Deleted book".to_string(),
    }))
}
