//! SQLite record store for fieldcrypt migrations.
//!
//! This crate implements the fieldcrypt store seam on top of
//! `tokio-rusqlite`, so encryption migrations can run against SQLite
//! databases without any migration-engine code knowing about SQL.
//!
//! # Features
//!
//! - Async access via `tokio-rusqlite` (one connection, one worker thread)
//! - Keyset batch reads driven by the model's cursor column
//! - Single-statement row updates covering all changed fields
//! - Busy/locked errors surfaced as transient so the engine retries them
//! - In-memory and file-based databases
//!
//! # Example
//!
//! ```rust
//! use fieldcrypt_sqlite::{SqliteConfig, SqliteStore};
//! use fieldcrypt_migrate::RecordStore;
//! use smol_str::SmolStr;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open(SqliteConfig::memory()).await?;
//! store
//!     .execute_batch(
//!         r#"
//!         CREATE TABLE "User" (id INTEGER PRIMARY KEY, email TEXT);
//!         INSERT INTO "User" (id, email) VALUES (1, 'ada@example.com');
//!         "#,
//!     )
//!     .await?;
//!
//! let rows = store
//!     .read_batch("User", "id", None, &[SmolStr::new("email")], 100)
//!     .await?;
//! assert_eq!(rows[0].value("email"), Some("ada@example.com"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::{DatabasePath, SqliteConfig};
pub use error::{SqliteError, SqliteResult};
pub use store::SqliteStore;
