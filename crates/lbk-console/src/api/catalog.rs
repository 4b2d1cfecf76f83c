//! Catalog and circulation endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use lbk_core::catalog::{Book, CatalogStore, User};
use lbk_core::errors::CoreError;

use crate::api::error::ApiError;
use crate::api::router::AppState;

#[derive(Serialize, Deserialize)]
pub struct UsersDocument {
    pub users: Vec<User>,
}

pub async fn list_users(State(state): State<AppState>) -> Json<UsersDocument> {
    let users = state.circulation.store().load_users().await;
    Json(UsersDocument { users })
}

/// Replace the whole user document. This is the raw editing path the admin
/// UI uses; it deliberately skips the uniqueness checks that `register`
/// performs.
pub async fn replace_users(
    State(state): State<AppState>,
    Json(payload): Json<UsersDocument>,
) -> Result<Json<Value>, ApiError> {
    state.circulation.store().save_users(&payload.users).await?;
    Ok(Json(json!({ "status": "saved" })))
}

#[derive(Serialize, Deserialize)]
pub struct BooksDocument {
    pub books: Vec<Book>,
}

pub async fn list_books(State(state): State<AppState>) -> Json<BooksDocument> {
    let books = state.circulation.store().load_books().await;
    Json(BooksDocument { books })
}

/// Replace the whole book document. Same raw path as `replace_users`.
pub async fn replace_books(
    State(state): State<AppState>,
    Json(payload): Json<BooksDocument>,
) -> Result<Json<Value>, ApiError> {
    state.circulation.store().save_books(&payload.books).await?;
    Ok(Json(json!({ "status": "saved" })))
}

/// Register a single new user or book, enforcing card-UID uniqueness across
/// both collections.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RegisterRequest {
    User { user: User },
    Book { book: Book },
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<StatusCode, ApiError> {
    match payload {
        RegisterRequest::User { user } => state.circulation.register_user(user).await?,
        RegisterRequest::Book { book } => state.circulation.register_book(book).await?,
    }
    Ok(StatusCode::CREATED)
}

#[derive(Deserialize)]
pub struct CheckBorrowedQuery {
    pub id: Option<String>,
}

pub async fn check_borrowed(
    State(state): State<AppState>,
    Query(query): Query<CheckBorrowedQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = query.id.ok_or(CoreError::MissingParameter("id"))?;
    let borrowed = state.circulation.is_borrowed(&id).await;
    Ok(Json(json!({ "borrowed": borrowed })))
}

#[derive(Deserialize)]
pub struct BorrowRequest {
    #[serde(rename = "bookId")]
    pub book_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

pub async fn borrow_book(
    State(state): State<AppState>,
    Json(payload): Json<BorrowRequest>,
) -> Result<Json<Book>, ApiError> {
    let book = state
        .circulation
        .borrow(&payload.book_id, &payload.user_id, Utc::now())
        .await?;
    Ok(Json(book))
}

#[derive(Deserialize)]
pub struct ReturnRequest {
    #[serde(rename = "bookId")]
    pub book_id: String,
}

pub async fn return_book(
    State(state): State<AppState>,
    Json(payload): Json<ReturnRequest>,
) -> Result<Json<Book>, ApiError> {
    let book = state
        .circulation
        .return_book(&payload.book_id, Utc::now())
        .await?;
    Ok(Json(book))
}
