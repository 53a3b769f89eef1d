//! Estate storage crate - static datasets and per-user preferences.
//!
//! Loads the intent table, the scripted dialogues and the listing dataset
//! once at startup, and provides the [`PreferenceStore`] abstraction with
//! in-memory, JSON-file and SQLite backends.

pub mod db;
pub mod dialogues;
pub mod intents;
pub mod listings;
pub mod migrations;
pub mod preferences;
pub mod repository;

pub use db::Database;
pub use dialogues::DialogueScript;
pub use intents::{IntentEntry, IntentTable};
pub use listings::ListingSet;
pub use preferences::{open_store, JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use repository::SqlitePreferenceStore;
