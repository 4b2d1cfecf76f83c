//! Catalog persistence for users and books.
//!
//! The wire schema is the kiosk's JSON documents (`users.json`, `books.json`)
//! with camelCase field names; a book's top-level `returnDate` is its due
//! date, while the per-record `returnDate` in `history` is the actual return
//! time.
//!
//! Load contract: a missing, unreadable, or structurally invalid document
//! yields an empty collection rather than an error visible to callers. The
//! malformed case is logged distinctly so corruption is not silent. Save
//! overwrites the whole collection and trusts a single concurrent writer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::CatalogError;
use crate::types::CardUid;

pub const USERS_FILE: &str = "users.json";
pub const BOOKS_FILE: &str = "books.json";

// ============================================================================
// Data Model
// ============================================================================

/// A registered cardholder. One card UID maps to at most one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum User {
    Staff {
        username: String,
        password: String,
        #[serde(rename = "cardUid")]
        card_uid: CardUid,
    },
    Student {
        #[serde(rename = "studentId")]
        student_id: String,
        password: String,
        name: String,
        email: String,
        #[serde(rename = "cardUid")]
        card_uid: CardUid,
    },
}

impl User {
    pub fn card_uid(&self) -> &CardUid {
        match self {
            User::Staff { card_uid, .. } | User::Student { card_uid, .. } => card_uid,
        }
    }

    /// The identifier recorded as the borrower in book history.
    pub fn borrower_id(&self) -> &str {
        match self {
            User::Staff { username, .. } => username,
            User::Student { student_id, .. } => student_id,
        }
    }
}

/// One loan in a book's history. Append-only once written; only the terminal
/// `returnDate` of the open record is ever set afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub username: String,
    #[serde(rename = "borrowDate")]
    pub borrow_date: DateTime<Utc>,
    #[serde(rename = "returnDate")]
    pub return_date: Option<DateTime<Utc>>,
}

/// A catalog entry for a physical book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub shelf: String,
    pub floor: String,
    pub borrowed: bool,
    #[serde(rename = "borrowedBy", default, skip_serializing_if = "Option::is_none")]
    pub borrowed_by: Option<String>,
    #[serde(rename = "borrowDate", default, skip_serializing_if = "Option::is_none")]
    pub borrow_date: Option<DateTime<Utc>>,
    /// Due date; serialized as `returnDate` for compatibility with the
    /// kiosk's document schema.
    #[serde(rename = "returnDate", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "cardUid")]
    pub card_uid: CardUid,
    #[serde(default)]
    pub history: Vec<BorrowRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersDoc {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BooksDoc {
    #[serde(default)]
    books: Vec<Book>,
}

// ============================================================================
// Store Trait
// ============================================================================

/// Persistence abstraction for the two catalog collections.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Load all users. Infallible by contract: unreadable data loads empty.
    async fn load_users(&self) -> Vec<User>;

    /// Load all books. Infallible by contract: unreadable data loads empty.
    async fn load_books(&self) -> Vec<Book>;

    /// Replace the whole user collection.
    async fn save_users(&self, users: &[User]) -> Result<(), CatalogError>;

    /// Replace the whole book collection.
    async fn save_books(&self, books: &[Book]) -> Result<(), CatalogError>;
}

// ============================================================================
// JSON File Store
// ============================================================================

/// Catalog store backed by JSON documents in a data directory.
pub struct JsonCatalogStore {
    dir: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    pub fn books_path(&self) -> PathBuf {
        self.dir.join(BOOKS_FILE)
    }

    async fn load_doc<T: Default + for<'de> Deserialize<'de>>(&self, path: &Path) -> T {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "catalog file unreadable, loading empty");
                return T::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(err) => {
                // Observable behavior is an empty collection (compatibility
                // with the kiosk's original semantics); the corruption still
                // surfaces in logs.
                let malformed = CatalogError::Malformed {
                    file: path.display().to_string(),
                    detail: err.to_string(),
                };
                warn!(error = %malformed, "discarding malformed catalog document");
                T::default()
            }
        }
    }

    async fn save_doc<T: Serialize>(&self, path: &Path, doc: &T) -> Result<(), CatalogError> {
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| CatalogError::WriteFailure(e.to_string()))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| CatalogError::WriteFailure(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl CatalogStore for JsonCatalogStore {
    async fn load_users(&self) -> Vec<User> {
        self.load_doc::<UsersDoc>(&self.users_path()).await.users
    }

    async fn load_books(&self) -> Vec<Book> {
        self.load_doc::<BooksDoc>(&self.books_path()).await.books
    }

    async fn save_users(&self, users: &[User]) -> Result<(), CatalogError> {
        let doc = UsersDoc { users: users.to_vec() };
        self.save_doc(&self.users_path(), &doc).await
    }

    async fn save_books(&self, books: &[Book]) -> Result<(), CatalogError> {
        let doc = BooksDoc { books: books.to_vec() };
        self.save_doc(&self.books_path(), &doc).await
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// Thread-safe in-memory catalog for tests and the simulator.
#[derive(Default)]
pub struct MemoryCatalog {
    users: Arc<RwLock<Vec<User>>>,
    books: Arc<RwLock<Vec<Book>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_data(users: Vec<User>, books: Vec<Book>) -> Self {
        let catalog = Self::new();
        *catalog.users.write().await = users;
        *catalog.books.write().await = books;
        catalog
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn load_users(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    async fn load_books(&self) -> Vec<Book> {
        self.books.read().await.clone()
    }

    async fn save_users(&self, users: &[User]) -> Result<(), CatalogError> {
        *self.users.write().await = users.to_vec();
        Ok(())
    }

    async fn save_books(&self, books: &[Book]) -> Result<(), CatalogError> {
        *self.books.write().await = books.to_vec();
        Ok(())
    }
}
