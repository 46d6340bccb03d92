use rusqlite::Connection;

use crate::error::Result;

/// Connection settings every store connection needs. `foreign_keys` is
/// per-connection in SQLite, so this runs on each open.
pub fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(())
}

/// Initialise all tables for the record store. Safe to call on every
/// startup; every statement is CREATE IF NOT EXISTS.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_allocator_table(conn)?;
    create_patients_table(conn)?;
    create_staff_table(conn)?;
    create_schedules_table(conn)?;
    Ok(())
}

fn create_allocator_table(conn: &Connection) -> Result<()> {
    // One row per entity kind; high_water only ever grows.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS id_allocator (
            entity      TEXT    NOT NULL PRIMARY KEY,
            high_water  INTEGER NOT NULL
        ) STRICT;",
    )?;
    Ok(())
}

fn create_patients_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS patients (
            id                  INTEGER NOT NULL PRIMARY KEY,
            name                TEXT    NOT NULL,
            age                 INTEGER NOT NULL,
            gender              TEXT,
            phone               TEXT,
            email               TEXT,
            address             TEXT,
            emergency_contact   TEXT,
            insurance_provider  TEXT,
            insurance_number    TEXT,
            diagnosis           TEXT,
            allergies           TEXT    NOT NULL DEFAULT '[]',  -- JSON array
            medications         TEXT    NOT NULL DEFAULT '[]',  -- JSON array
            equipment           TEXT    NOT NULL DEFAULT '[]',  -- JSON array
            mobility            TEXT    NOT NULL,
            care_plan           TEXT,
            notes               TEXT,
            created_by          TEXT    NOT NULL,
            created_at          TEXT    NOT NULL
        ) STRICT;",
    )?;
    Ok(())
}

fn create_staff_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS staff (
            id              INTEGER NOT NULL PRIMARY KEY,
            name            TEXT    NOT NULL,
            role            TEXT    NOT NULL,
            license_number  TEXT,
            specialties     TEXT    NOT NULL DEFAULT '[]',  -- JSON array
            phone           TEXT,
            email           TEXT,
            availability    TEXT,
            notes           TEXT,
            created_by      TEXT    NOT NULL,
            created_at      TEXT    NOT NULL
        ) STRICT;",
    )?;
    Ok(())
}

fn create_schedules_table(conn: &Connection) -> Result<()> {
    // RESTRICT backs up the store's own reference check on delete.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schedules (
            id                INTEGER NOT NULL PRIMARY KEY,
            patient_id        INTEGER NOT NULL REFERENCES patients(id) ON DELETE RESTRICT,
            staff_id          INTEGER NOT NULL REFERENCES staff(id) ON DELETE RESTRICT,
            start             TEXT    NOT NULL,   -- %Y-%m-%dT%H:%M, sorts lexically
            duration_minutes  INTEGER NOT NULL,
            priority          TEXT    NOT NULL,
            visit_type        TEXT    NOT NULL,
            notes             TEXT,
            created_by        TEXT    NOT NULL,
            created_at        TEXT    NOT NULL
        ) STRICT;
        CREATE INDEX IF NOT EXISTS idx_schedules_patient ON schedules (patient_id);
        CREATE INDEX IF NOT EXISTS idx_schedules_staff ON schedules (staff_id);
        CREATE INDEX IF NOT EXISTS idx_schedules_start ON schedules (start);",
    )?;
    Ok(())
}
