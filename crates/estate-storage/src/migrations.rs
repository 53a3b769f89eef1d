//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use estate_core::error::EstateError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), EstateError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| EstateError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| EstateError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: user_preferences");
    }

    Ok(())
}

/// Version 1: per-user preference flags.
fn apply_v1(conn: &Connection) -> Result<(), EstateError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user_preferences (
            user_id     TEXT PRIMARY KEY NOT NULL,
            ai_mode     INTEGER NOT NULL DEFAULT 0 CHECK (ai_mode IN (0, 1)),
            voice_mode  INTEGER NOT NULL DEFAULT 0 CHECK (voice_mode IN (0, 1)),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'user_preferences');
        ",
    )
    .map_err(|e| EstateError::Storage(format!("Migration v1 failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_flag_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let bad = conn.execute(
            "INSERT INTO user_preferences (user_id, ai_mode) VALUES ('u', 2)",
            [],
        );
        assert!(bad.is_err());
    }
}
