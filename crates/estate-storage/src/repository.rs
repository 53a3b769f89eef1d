//! SQLite-backed preference repository.

use std::sync::Arc;

use rusqlite::OptionalExtension;
use tracing::debug;

use estate_core::error::{EstateError, Result};
use estate_core::types::{PreferenceFlag, UserId, UserPreferences};

use crate::db::Database;
use crate::preferences::PreferenceStore;

/// [`PreferenceStore`] over the `user_preferences` table.
pub struct SqlitePreferenceStore {
    db: Arc<Database>,
}

impl SqlitePreferenceStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Number of users with a stored record.
    pub fn count(&self) -> Result<u64> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM user_preferences", [], |row| row.get(0))
                .map_err(|e| EstateError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, user: &UserId) -> Result<UserPreferences> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT ai_mode, voice_mode FROM user_preferences WHERE user_id = ?1",
                    rusqlite::params![user.0],
                    |row| {
                        Ok(UserPreferences {
                            ai_mode: row.get::<_, i64>(0)? != 0,
                            voice_mode: row.get::<_, i64>(1)? != 0,
                        })
                    },
                )
                .optional()
                .map_err(|e| EstateError::Storage(format!("Failed to read preferences: {}", e)))?;
            Ok(row.unwrap_or_default())
        })
    }

    fn set(&self, user: &UserId, prefs: UserPreferences) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_preferences (user_id, ai_mode, voice_mode)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                    ai_mode = excluded.ai_mode,
                    voice_mode = excluded.voice_mode,
                    updated_at = strftime('%s', 'now')",
                rusqlite::params![user.0, prefs.ai_mode as i64, prefs.voice_mode as i64],
            )
            .map_err(|e| EstateError::Storage(format!("Failed to save preferences: {}", e)))?;
            Ok(())
        })
    }

    fn toggle(&self, user: &UserId, flag: PreferenceFlag) -> Result<bool> {
        // Column names come from a closed set, never from user input.
        let column = flag.key();
        let sql = format!(
            "INSERT INTO user_preferences (user_id, {column}) VALUES (?1, 1)
             ON CONFLICT(user_id) DO UPDATE SET
                {column} = 1 - {column},
                updated_at = strftime('%s', 'now')
             RETURNING {column}"
        );
        let value = self.db.with_conn(|conn| {
            conn.query_row(&sql, rusqlite::params![user.0], |row| row.get::<_, i64>(0))
                .map_err(|e| EstateError::Storage(format!("Failed to toggle {}: {}", column, e)))
        })? != 0;
        debug!(user = %user, flag = column, value, "Preference toggled");
        Ok(value)
    }
}
