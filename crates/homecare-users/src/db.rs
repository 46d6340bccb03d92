use rusqlite::{Connection, Result};

use crate::types::User;

/// Column order shared by every SELECT in this crate.
pub(crate) const USER_SELECT_SQL: &str = "SELECT username, role, created_at FROM users";

/// Map a SELECT row (column order from USER_SELECT_SQL) to a User.
pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(1)?;
    let role = role.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(User {
        username: row.get(0)?,
        role,
        created_at: row.get(2)?,
    })
}

/// Initialise the users table. Safe to call on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            username       TEXT PRIMARY KEY NOT NULL,
            password_hash  TEXT NOT NULL,   -- argon2 PHC string
            role           TEXT NOT NULL DEFAULT 'staff',
            created_at     TEXT NOT NULL
        );",
    )
}
