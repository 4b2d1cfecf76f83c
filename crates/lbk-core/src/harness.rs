//! Test harness utilities.
//!
//! Scripted collaborators and catalog fixtures shared by unit and integration
//! tests. Compiled into the crate so integration tests under `tests/` can use
//! them without a separate support crate.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::{Book, BorrowRecord, User};
use crate::reader::CardReader;
use crate::types::CardUid;

/// Card reader fed from a script of raw UIDs. Each poll pops one entry;
/// an empty script reads as "no card present".
pub struct ScriptedReader {
    cards: Mutex<VecDeque<Vec<u8>>>,
    fail_next: Mutex<bool>,
}

impl ScriptedReader {
    pub fn empty() -> Self {
        Self::with_cards(Vec::new())
    }

    pub fn with_cards(cards: Vec<Vec<u8>>) -> Self {
        Self {
            cards: Mutex::new(cards.into()),
            fail_next: Mutex::new(false),
        }
    }

    /// Reader whose first poll fails with a transport error, then reads empty.
    pub fn failing_once() -> Self {
        let reader = Self::empty();
        *reader.fail_next.lock().unwrap() = true;
        reader
    }

    /// Queue a card for a later poll.
    pub fn push_card(&self, raw: Vec<u8>) {
        self.cards.lock().unwrap().push_back(raw);
    }
}

#[async_trait]
impl CardReader for ScriptedReader {
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn poll_card(&self) -> anyhow::Result<Option<Vec<u8>>> {
        if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
            anyhow::bail!("reader bus fault");
        }
        Ok(self.cards.lock().unwrap().pop_front())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A staff fixture.
pub fn staff(username: &str, card: &str) -> User {
    User::Staff {
        username: username.to_string(),
        password: "admin123".to_string(),
        card_uid: CardUid::new(card),
    }
}

/// A student fixture.
pub fn student(id: &str, card: &str) -> User {
    User::Student {
        student_id: id.to_string(),
        password: "password123".to_string(),
        name: format!("Student {id}"),
        email: format!("{}@example.com", id.to_ascii_lowercase()),
        card_uid: CardUid::new(card),
    }
}

/// An available book fixture.
pub fn book(id: &str, title: &str, card: &str) -> Book {
    Book {
        id: id.to_string(),
        isbn: id.to_string(),
        title: title.to_string(),
        author: "Test Author".to_string(),
        shelf: "R1C1".to_string(),
        floor: "1".to_string(),
        borrowed: false,
        borrowed_by: None,
        borrow_date: None,
        due_date: None,
        card_uid: CardUid::new(card),
        history: Vec::new(),
    }
}

/// A book fixture that is currently out on loan to `borrower`.
pub fn borrowed_book(
    id: &str,
    title: &str,
    card: &str,
    borrower: &str,
    borrowed_at: chrono::DateTime<chrono::Utc>,
) -> Book {
    let mut b = book(id, title, card);
    b.borrowed = true;
    b.borrowed_by = Some(borrower.to_string());
    b.borrow_date = Some(borrowed_at);
    b.due_date = Some(borrowed_at + chrono::Duration::days(crate::circulation::LOAN_PERIOD_DAYS));
    b.history.push(BorrowRecord {
        username: borrower.to_string(),
        borrow_date: borrowed_at,
        return_date: None,
    });
    b
}
