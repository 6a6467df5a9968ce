//! Local video cache.
//!
//! Sub-modules:
//! - `types`: Persisted and display record shapes plus pure mappings.
//! - `schema`: SQLite DDL definitions.
//! - `sqlite`: SQLite-backed [`VideoStore`].

pub(crate) mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::VideoStore;
pub use types::{as_display, StoredVideo, Video};
