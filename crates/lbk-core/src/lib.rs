//! LBK Core - Business logic and state machines for the library book kiosk.
//!
//! This crate implements:
//! - The scan-session state machine (motion-armed card window)
//! - The card mailbox bridging the scan task and the request layer
//! - The motion event source (edge-triggered, at-most-one-pending)
//! - Catalog persistence (users/books JSON documents)
//! - Circulation rules (borrow, return, history, registration)
//! - The kiosk runtime loop and hardware seams

#![forbid(unsafe_code)]

// Core state machine
pub mod session;

// Shared state between scan task and request layer
pub mod context;
pub mod mailbox;
pub mod motion;

// Catalog and circulation
pub mod catalog;
pub mod circulation;

// Driving loop and hardware seams
pub mod reader;
pub mod runtime;

// Supporting modules
pub mod errors;
pub mod harness;
pub mod types;
