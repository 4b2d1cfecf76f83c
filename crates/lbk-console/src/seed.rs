//! First-run catalog seeding.
//!
//! Creates `users.json` and `books.json` in the data directory when they do
//! not exist yet, so a fresh kiosk comes up with a small working catalog.
//! Existing documents are never touched.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::info;

use lbk_core::catalog::{Book, BorrowRecord, CatalogStore, JsonCatalogStore, User};
use lbk_core::circulation::LOAN_PERIOD_DAYS;
use lbk_core::types::CardUid;

pub async fn seed_catalog(store: &JsonCatalogStore) -> anyhow::Result<()> {
    if !store.users_path().exists() {
        store.save_users(&default_users()).await?;
        info!(path = %store.users_path().display(), "seeded default users");
    }
    if !store.books_path().exists() {
        store.save_books(&default_books()).await?;
        info!(path = %store.books_path().display(), "seeded default books");
    }
    Ok(())
}

fn staff(username: &str, password: &str, card: &str) -> User {
    User::Staff {
        username: username.to_string(),
        password: password.to_string(),
        card_uid: CardUid::new(card),
    }
}

fn student(id: &str, name: &str, card: &str) -> User {
    User::Student {
        student_id: id.to_string(),
        password: "password123".to_string(),
        name: name.to_string(),
        email: format!("{}@university.edu", id.to_ascii_lowercase()),
        card_uid: CardUid::new(card),
    }
}

fn default_users() -> Vec<User> {
    vec![
        staff("admin", "admin123", "A286FF03"),
        staff("staff1", "staff123", "B3A51F77"),
        student("S001", "John Smith", "538426E2023F80"),
        student("S002", "Emily Johnson", "53A9B1D4027C80"),
        student("S003", "Michael Brown", "530F62C8021180"),
    ]
}

fn book(id: &str, title: &str, author: &str, shelf: &str, card: &str) -> Book {
    Book {
        id: id.to_string(),
        isbn: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        shelf: shelf.to_string(),
        floor: "1".to_string(),
        borrowed: false,
        borrowed_by: None,
        borrow_date: None,
        due_date: None,
        card_uid: CardUid::new(card),
        history: Vec::new(),
    }
}

fn seed_date(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn default_books() -> Vec<Book> {
    let mut books = vec![
        book(
            "B001",
            "Introduction to Programming",
            "Jane Smith",
            "R1C1",
            "53C4734302A380",
        ),
        book(
            "B002",
            "Data Structures and Algorithms",
            "Robert Johnson",
            "R2C3",
            "53FC884B020880",
        ),
        book("B003", "Database Systems", "Maria Garcia", "R3C2", "53D11A27031480"),
        book("B004", "Operating Systems", "David Lee", "R1C4", "534E90F5025B80"),
    ];

    // B002 ships already out on loan, with one completed cycle behind it.
    let first = seed_date(2025, 3, 3, 9, 30);
    let current = seed_date(2025, 4, 2, 10, 15);
    books[1].borrowed = true;
    books[1].borrowed_by = Some("S001".to_string());
    books[1].borrow_date = Some(current);
    books[1].due_date = Some(current + Duration::days(LOAN_PERIOD_DAYS));
    books[1].history = vec![
        BorrowRecord {
            username: "S003".to_string(),
            borrow_date: first,
            return_date: Some(first + Duration::days(10)),
        },
        BorrowRecord {
            username: "S001".to_string(),
            borrow_date: current,
            return_date: None,
        },
    ];

    books
}
