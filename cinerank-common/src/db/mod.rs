//! Database access
//!
//! Schema initialization for the cinerank SQLite database. Row-level access
//! lives with the service crate; this module only owns pool creation and the
//! idempotent schema.

mod init;

pub use init::init_database;
