// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Forward-only embedded SQL migrations, applied ascending and tracked in a
//! `schema_migrations` table. Each migration runs in its own transaction.

use sqlx::{PgPool, Row};

/// One embedded migration: a stable ordinal, a short name, and its SQL.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "init",
    sql: include_str!("migrations_sql/001_init.sql"),
}];

/// Apply every migration not yet recorded in `schema_migrations`, in
/// ascending version order. Idempotent: running twice against an
/// up-to-date database is a no-op.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version BIGINT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    let applied: Vec<i64> = sqlx::query("SELECT version FROM schema_migrations")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.get("version"))
        .collect();

    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }
        tracing::info!(version = migration.version, name = migration.name, "applying migration");
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "migrations_tests.rs"]
mod migrations_tests;
