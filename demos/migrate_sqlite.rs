//! End-to-end demo: encrypt the marked columns of a SQLite database.
//!
//! Builds an in-memory database with a mix of plaintext and already-migrated
//! rows, analyzes a schema document for `@encrypted` markers, runs the
//! migration, and prints the per-model report.
//!
//! ```bash
//! cargo run --example migrate_sqlite
//!
//! # With engine logs
//! RUST_LOG=fieldcrypt_migrate=debug cargo run --example migrate_sqlite
//! ```

use std::sync::Arc;

use fieldcrypt::prelude::*;
use fieldcrypt_sqlite::{SqliteConfig, SqliteStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = SqliteStore::open(SqliteConfig::memory()).await?;
    store
        .execute_batch(r#"CREATE TABLE "User" (id INTEGER PRIMARY KEY, email TEXT, phone TEXT);"#)
        .await?;

    let mut seed = String::new();
    for id in 1..=500 {
        // Every fifth row was already migrated by an earlier run.
        let (email, phone) = if id % 5 == 0 {
            (
                format!("enc:v1:user{id}@example.com"),
                format!("enc:v1:555-{id:04}"),
            )
        } else {
            (format!("user{id}@example.com"), format!("555-{id:04}"))
        };
        seed.push_str(&format!(
            r#"INSERT INTO "User" (id, email, phone) VALUES ({id}, '{email}', '{phone}');"#,
        ));
        seed.push('\n');
    }
    store.execute_batch(seed).await?;

    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "User",
                    "fields": [
                        { "name": "id", "type": "Int", "isId": true },
                        { "name": "email", "type": "String", "documentation": "@encrypted" },
                        { "name": "phone", "type": "String", "documentation": "@encrypted" }
                    ]
                }
            ]
        }"#,
    )?;
    let analysis = analyze(&document)?;

    let orchestrator = MigrationOrchestrator::new(
        Arc::new(store),
        Arc::new(EnvelopeCipher::new()),
        MigrationConfig::new().batch_size(100),
    );
    let report = orchestrator.run(&analysis.eligible).await;

    println!("{}", report.render_table());
    std::process::exit(report.exit_code());
}
