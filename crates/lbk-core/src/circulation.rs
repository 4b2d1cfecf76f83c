//! Circulation rules: borrow, return, and registration.
//!
//! Every operation is load-check-mutate-save over whole catalog collections.
//! A single write lock serializes the mutating operations so two concurrent
//! borrows of the same book cannot both observe it available; reads
//! (`is_borrowed`, lookups) go straight to the store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::catalog::{Book, BorrowRecord, CatalogStore, User};
use crate::errors::CirculationError;
use crate::types::CardUid;

/// Loan period granted at borrow time.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Circulation workflow over a catalog store.
pub struct Circulation<S: CatalogStore> {
    store: Arc<S>,
    write_lock: tokio::sync::Mutex<()>,
}

impl<S: CatalogStore> Circulation<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Whether the book with `book_id` is currently out on loan.
    ///
    /// An unknown id reports `false`: the caller asked about availability,
    /// not existence.
    pub async fn is_borrowed(&self, book_id: &str) -> bool {
        self.store
            .load_books()
            .await
            .iter()
            .any(|b| b.id == book_id && b.borrowed)
    }

    /// Find the user holding `card_uid`, if any.
    pub async fn user_by_card(&self, card_uid: &CardUid) -> Option<User> {
        self.store
            .load_users()
            .await
            .into_iter()
            .find(|u| u.card_uid() == card_uid)
    }

    /// Find the book carrying `card_uid` as its tag, if any.
    pub async fn book_by_card(&self, card_uid: &CardUid) -> Option<Book> {
        self.store
            .load_books()
            .await
            .into_iter()
            .find(|b| &b.card_uid == card_uid)
    }

    /// Check out `book_id` to `borrower_id`.
    ///
    /// Marks the book borrowed, stamps the loan dates, and appends an open
    /// history record. The due date is `now + LOAN_PERIOD_DAYS`.
    pub async fn borrow(
        &self,
        book_id: &str,
        borrower_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Book, CirculationError> {
        let _guard = self.write_lock.lock().await;

        let mut books = self.store.load_books().await;
        let book = books
            .iter_mut()
            .find(|b| b.id == book_id)
            .ok_or_else(|| CirculationError::UnknownBook(book_id.to_string()))?;
        if book.borrowed {
            return Err(CirculationError::AlreadyBorrowed(book_id.to_string()));
        }

        book.borrowed = true;
        book.borrowed_by = Some(borrower_id.to_string());
        book.borrow_date = Some(now);
        book.due_date = Some(now + Duration::days(LOAN_PERIOD_DAYS));
        book.history.push(BorrowRecord {
            username: borrower_id.to_string(),
            borrow_date: now,
            return_date: None,
        });

        let updated = book.clone();
        self.store.save_books(&books).await?;
        info!(book = book_id, borrower = borrower_id, "book borrowed");
        Ok(updated)
    }

    /// Check `book_id` back in.
    ///
    /// Clears the loan fields and closes the open history record with the
    /// return time. The borrower is not re-verified; possession of the book
    /// is the credential at the kiosk.
    pub async fn return_book(
        &self,
        book_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Book, CirculationError> {
        let _guard = self.write_lock.lock().await;

        let mut books = self.store.load_books().await;
        let book = books
            .iter_mut()
            .find(|b| b.id == book_id)
            .ok_or_else(|| CirculationError::UnknownBook(book_id.to_string()))?;
        if !book.borrowed {
            return Err(CirculationError::NotBorrowed(book_id.to_string()));
        }

        book.borrowed = false;
        book.borrowed_by = None;
        book.borrow_date = None;
        book.due_date = None;
        if let Some(open) = book
            .history
            .iter_mut()
            .rev()
            .find(|r| r.return_date.is_none())
        {
            open.return_date = Some(now);
        }

        let updated = book.clone();
        self.store.save_books(&books).await?;
        info!(book = book_id, "book returned");
        Ok(updated)
    }

    /// Register a new user, enforcing card-UID uniqueness across both
    /// collections. Card UIDs join physical cards to records, so a card tag
    /// can belong to one user or one book but never two things at once.
    pub async fn register_user(&self, user: User) -> Result<(), CirculationError> {
        let _guard = self.write_lock.lock().await;

        self.ensure_card_unused(user.card_uid()).await?;
        let mut users = self.store.load_users().await;
        let id = user.borrower_id().to_string();
        users.push(user);
        self.store.save_users(&users).await?;
        info!(user = %id, "user registered");
        Ok(())
    }

    /// Register a new book, enforcing card-UID uniqueness across both
    /// collections.
    pub async fn register_book(&self, book: Book) -> Result<(), CirculationError> {
        let _guard = self.write_lock.lock().await;

        self.ensure_card_unused(&book.card_uid).await?;
        let mut books = self.store.load_books().await;
        let id = book.id.clone();
        books.push(book);
        self.store.save_books(&books).await?;
        info!(book = %id, "book registered");
        Ok(())
    }

    async fn ensure_card_unused(&self, card_uid: &CardUid) -> Result<(), CirculationError> {
        let user_taken = self
            .store
            .load_users()
            .await
            .iter()
            .any(|u| u.card_uid() == card_uid);
        let book_taken = self
            .store
            .load_books()
            .await
            .iter()
            .any(|b| &b.card_uid == card_uid);
        if user_taken || book_taken {
            return Err(CirculationError::DuplicateIdentifier(card_uid.clone()));
        }
        Ok(())
    }
}
