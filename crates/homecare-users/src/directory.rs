use std::sync::{Mutex, MutexGuard};

use homecare_core::config::SeedUser;
use rusqlite::{params, Connection};
use tracing::{info, instrument, warn};

use crate::auth::{hash_password, verify_password};
use crate::db::{self, row_to_user, USER_SELECT_SQL};
use crate::error::{Result, UserError};
use crate::types::{NewUser, User};

const MAX_USERNAME_LEN: usize = 64;
const MIN_PASSWORD_LEN: usize = 4;

/// Operator accounts backed by the `users` table.
pub struct UserDirectory {
    db: Mutex<Connection>,
}

impl UserDirectory {
    /// Wrap an open connection and create the table if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        db::init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| UserError::Poisoned)
    }

    #[instrument(skip(self, new), fields(username = %new.username, role = %new.role))]
    pub fn create_user(&self, new: NewUser) -> Result<User> {
        let username = new.username.trim().to_string();
        if username.is_empty()
            || username.len() > MAX_USERNAME_LEN
            || username.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(UserError::Validation(format!(
                "username must be 1-{MAX_USERNAME_LEN} characters without spaces"
            )));
        }
        check_password(&new.password)?;

        let hash = hash_password(&new.password)?;
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (username, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, hash, new.role.to_string(), now],
        )?;
        if inserted == 0 {
            return Err(UserError::AlreadyExists(username));
        }
        info!("user created");
        Ok(User {
            username,
            role: new.role,
            created_at: now,
        })
    }

    pub fn get(&self, username: &str) -> Result<User> {
        let conn = self.lock()?;
        let sql = format!("{USER_SELECT_SQL} WHERE username = ?1");
        match conn.query_row(&sql, params![username], row_to_user) {
            Ok(user) => Ok(user),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(UserError::NotFound(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All accounts, ordered by username.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} ORDER BY username"))?;
        let rows = stmt.query_map([], row_to_user)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Check credentials. Unknown user and wrong password are
    /// indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        let stored: Option<(String, User)> = {
            let conn = self.lock()?;
            let sql = "SELECT username, role, created_at, password_hash FROM users WHERE username = ?1";
            match conn.query_row(sql, params![username.trim()], |row| {
                Ok((row.get::<_, String>(3)?, row_to_user(row)?))
            }) {
                Ok(found) => Some(found),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            }
        };

        let Some((hash, user)) = stored else {
            warn!("login failed: unknown user");
            return Err(UserError::AuthFailed);
        };
        if !verify_password(password, &hash)? {
            warn!("login failed: wrong password");
            return Err(UserError::AuthFailed);
        }
        info!(role = %user.role, "login succeeded");
        Ok(user)
    }

    /// Replace the caller's own password after checking the current one.
    #[instrument(skip(self, current, new_password))]
    pub fn change_password(&self, username: &str, current: &str, new_password: &str) -> Result<()> {
        check_password(new_password)?;
        let user = self.login(username, current)?;
        self.store_password(&user.username, new_password)?;
        info!("password changed");
        Ok(())
    }

    /// Set a new password without knowing the old one.
    #[instrument(skip(self, new_password))]
    pub fn reset_password(&self, username: &str, new_password: &str) -> Result<User> {
        check_password(new_password)?;
        self.store_password(username, new_password)?;
        info!("password reset");
        self.get(username)
    }

    fn store_password(&self, username: &str, password: &str) -> Result<()> {
        let hash = hash_password(password)?;
        let updated = self.lock()?.execute(
            "UPDATE users SET password_hash = ?1 WHERE username = ?2",
            params![hash, username],
        )?;
        if updated == 0 {
            return Err(UserError::NotFound(username.to_string()));
        }
        Ok(())
    }

    /// Create `seeds` when the table is empty. Returns how many were created.
    pub fn seed(&self, seeds: &[SeedUser]) -> Result<usize> {
        let existing: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }
        for seed in seeds {
            self.create_user(NewUser {
                username: seed.username.clone(),
                password: seed.password.clone(),
                role: seed.role,
            })?;
        }
        if !seeds.is_empty() {
            warn!(
                count = seeds.len(),
                "seeded initial accounts; change their passwords"
            );
        }
        Ok(seeds.len())
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
