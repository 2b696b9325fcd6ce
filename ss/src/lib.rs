//! SpecStore - SQLite history of generated specifications
//!
//! Keeps every specification the generator produced so it can be listed,
//! re-opened, or deleted later. The generator never reads from the store;
//! it is a pure sink.
//!
//! # Layout
//!
//! ```text
//! specgen.db
//! └── specifications
//!     ├── id               INTEGER PRIMARY KEY AUTOINCREMENT
//!     ├── title            TEXT
//!     ├── feature          TEXT
//!     ├── json_output      TEXT
//!     ├── markdown_output  TEXT
//!     └── created_at       TEXT (ISO-8601, UTC)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use specstore::{NewSpec, SpecStore};
//!
//! let store = SpecStore::open("specgen.db")?;
//! let id = store.save(&NewSpec::new("Login page", "Build a login page", json, markdown))?;
//! for summary in store.list()? {
//!     println!("{} {}", summary.id, summary.title);
//! }
//! ```

mod store;

pub use store::{NewSpec, SpecStore, SpecSummary, StoredSpec, derive_title};

/// Default database file name
pub const DEFAULT_DB_FILE: &str = "specgen.db";

/// Maximum length of a derived title
pub const MAX_TITLE_CHARS: usize = 60;
