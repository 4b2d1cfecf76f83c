pub mod router;
pub mod error;
pub mod scan;
pub mod catalog;
pub mod debug;
