//! Foundational low-level utilities shared across Autowork crates.
//!
//! Provides atomic file-write helpers, whole-document JSON persistence, process
//! spawning, and the small time/text helpers used by the command renderers.

pub mod atomic_io;
pub mod json_document;
pub mod process_utils;
pub mod text_utils;
pub mod time_utils;

pub use atomic_io::{write_private_text_atomic, write_text_atomic};
pub use json_document::{load_json_document, save_json_document, save_private_json_document};
pub use process_utils::spawn_with_text_file_busy_retry;
pub use text_utils::truncate_chars;
pub use time_utils::{current_unix_timestamp_ms, format_local_clock, format_local_minute};
