//! End-to-end kiosk flows: motion to capture to circulation, driven with
//! explicit timestamps.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use lbk_core::catalog::MemoryCatalog;
use lbk_core::circulation::{Circulation, LOAN_PERIOD_DAYS};
use lbk_core::context::KioskContext;
use lbk_core::errors::CirculationError;
use lbk_core::harness::{book, borrowed_book, staff, student, ScriptedReader};
use lbk_core::mailbox::CARD_VALIDITY_MS;
use lbk_core::runtime::{KioskRuntime, NullObserver, Step};
use lbk_core::session::SCAN_WINDOW_MS;
use lbk_core::types::{CardUid, ScanMode};

const RAW_UID: &[u8] = &[0x04, 0xA3, 0xFF, 0x12];

fn runtime_with(
    reader: ScriptedReader,
) -> (Arc<KioskContext>, KioskRuntime<ScriptedReader, NullObserver>) {
    let ctx = KioskContext::new();
    let rt = KioskRuntime::new(ctx.clone(), Arc::new(reader), NullObserver);
    (ctx, rt)
}

#[tokio::test]
async fn motion_without_a_card_times_out_and_leaves_the_mailbox_empty() {
    let (ctx, mut rt) = runtime_with(ScriptedReader::empty());

    ctx.motion().trigger();
    assert_eq!(rt.step(0).await, Step::Armed { remaining_secs: 5 });
    assert_eq!(rt.step(4_999).await, Step::Armed { remaining_secs: 1 });
    assert_eq!(rt.step(SCAN_WINDOW_MS).await, Step::TimedOut);

    assert!(ctx.read_capture(SCAN_WINDOW_MS + 1).await.is_none());
    assert_eq!(rt.step(SCAN_WINDOW_MS + 50).await, Step::Idle);
}

#[tokio::test]
async fn registration_capture_is_one_shot_and_expires() {
    let (ctx, mut rt) = runtime_with(ScriptedReader::with_cards(vec![RAW_UID.to_vec()]));

    // Registration mode opens the window itself at t=0; the card arrives at
    // t=1200.
    ctx.set_mode(ScanMode::RegisterBook, 0).await;
    let Step::Captured(notice) = rt.step(1_200).await else {
        panic!("expected a capture");
    };
    assert_eq!(notice.uid.as_str(), "04A3FF12");
    assert_eq!(notice.mode, ScanMode::RegisterBook);

    // First read sees the registration mode, second sees normal, and past the
    // validity window the capture is gone.
    let first = ctx.read_capture(1_300).await.unwrap();
    assert_eq!(first.mode, ScanMode::RegisterBook);
    let second = ctx.read_capture(1_400).await.unwrap();
    assert_eq!(second.mode, ScanMode::Normal);
    assert_eq!(second.uid.as_str(), "04A3FF12");
    assert!(ctx.read_capture(1_200 + CARD_VALIDITY_MS + 300).await.is_none());

    // The pending mode was consumed too: the next capture is a normal one.
    assert_eq!(ctx.mode().await, ScanMode::Normal);
}

#[tokio::test]
async fn motion_during_an_open_window_does_not_extend_it() {
    let (ctx, mut rt) = runtime_with(ScriptedReader::empty());

    ctx.motion().trigger();
    rt.step(0).await;

    // A second visitor walks by mid-window.
    ctx.motion().trigger();
    assert_eq!(rt.step(3_000).await, Step::Armed { remaining_secs: 2 });
    assert_eq!(rt.step(SCAN_WINDOW_MS).await, Step::TimedOut);
}

#[tokio::test]
async fn capture_then_lookup_then_borrow() {
    let (ctx, mut rt) = runtime_with(ScriptedReader::with_cards(vec![RAW_UID.to_vec()]));
    let store = Arc::new(
        MemoryCatalog::with_data(
            vec![staff("admin", "A286FF03"), student("S001", "04A3FF12")],
            vec![book("B001", "Introduction to Programming", "53C4734302A380")],
        )
        .await,
    );
    let circ = Circulation::new(store);

    ctx.motion().trigger();
    let Step::Captured(notice) = rt.step(800).await else {
        panic!("expected a capture");
    };

    let user = circ.user_by_card(&notice.uid).await.unwrap();
    assert_eq!(user.borrower_id(), "S001");

    let now = Utc.with_ymd_and_hms(2025, 4, 2, 10, 15, 0).unwrap();
    let updated = circ.borrow("B001", user.borrower_id(), now).await.unwrap();
    assert_eq!(updated.due_date, Some(now + Duration::days(LOAN_PERIOD_DAYS)));
    assert!(circ.is_borrowed("B001").await);
}

#[tokio::test]
async fn double_borrow_is_rejected_and_history_tracks_each_loan() {
    let now = Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap();
    let store = Arc::new(
        MemoryCatalog::with_data(
            vec![student("S001", "AA01"), student("S002", "BB02")],
            vec![borrowed_book("B002", "Data Structures", "53FC884B020880", "S001", now)],
        )
        .await,
    );
    let circ = Circulation::new(store);

    let err = circ.borrow("B002", "S002", now + Duration::days(1)).await.unwrap_err();
    assert!(matches!(err, CirculationError::AlreadyBorrowed(_)));

    circ.return_book("B002", now + Duration::days(7)).await.unwrap();
    let updated = circ
        .borrow("B002", "S002", now + Duration::days(8))
        .await
        .unwrap();

    assert_eq!(updated.history.len(), 2);
    assert_eq!(updated.history[0].username, "S001");
    assert_eq!(updated.history[0].return_date, Some(now + Duration::days(7)));
    assert_eq!(updated.history[1].username, "S002");
    assert!(updated.history[1].return_date.is_none());
}

#[tokio::test]
async fn registration_flow_from_captured_uid() {
    let (ctx, mut rt) = runtime_with(ScriptedReader::with_cards(vec![RAW_UID.to_vec()]));
    let store = Arc::new(MemoryCatalog::new());
    let circ = Circulation::new(store);

    ctx.set_mode(ScanMode::RegisterUser, 0).await;
    let Step::Captured(_) = rt.step(900).await else {
        panic!("expected a capture");
    };

    let capture = ctx.read_capture(1_000).await.unwrap();
    assert_eq!(capture.mode, ScanMode::RegisterUser);

    circ.register_user(student("S009", capture.uid.as_str()))
        .await
        .unwrap();
    assert!(circ.user_by_card(&CardUid::new("04A3FF12")).await.is_some());

    // The same tag cannot also become a book tag.
    let err = circ
        .register_book(book("B009", "Duplicate Tag", "04A3FF12"))
        .await
        .unwrap_err();
    assert!(matches!(err, CirculationError::DuplicateIdentifier(_)));
}

#[tokio::test]
async fn clearing_the_capture_makes_the_next_read_empty() {
    let (ctx, mut rt) = runtime_with(ScriptedReader::with_cards(vec![RAW_UID.to_vec()]));

    ctx.motion().trigger();
    rt.step(700).await;
    assert!(ctx.read_capture(800).await.is_some());

    ctx.clear_capture().await;
    assert!(ctx.read_capture(900).await.is_none());
}
