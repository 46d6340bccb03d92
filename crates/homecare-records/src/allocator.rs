//! Per-kind identifier allocation.
//!
//! The high-water mark lives in `id_allocator` and is bumped with a single
//! upsert, so it advances in the same transaction as the row it is issued
//! for. A rolled-back insert rolls the mark back too; a committed one is
//! durable across restarts. Deletes never lower it.

use homecare_core::EntityKind;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;

/// Issue the next identifier for `kind`: strictly greater than every value
/// issued before. Call inside the transaction that uses the identifier.
pub fn next_id(conn: &Connection, kind: EntityKind) -> Result<i64> {
    let id = conn.query_row(
        "INSERT INTO id_allocator (entity, high_water) VALUES (?1, 1)
         ON CONFLICT(entity) DO UPDATE SET high_water = high_water + 1
         RETURNING high_water",
        params![kind.as_str()],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(id)
}

/// Largest identifier ever issued for `kind`, or 0 if none yet.
pub fn high_water(conn: &Connection, kind: EntityKind) -> Result<i64> {
    let mark = conn
        .query_row(
            "SELECT high_water FROM id_allocator WHERE entity = ?1",
            params![kind.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(mark.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn ids_increase_per_kind_independently() {
        let conn = conn();
        assert_eq!(high_water(&conn, EntityKind::Patients).unwrap(), 0);
        assert_eq!(next_id(&conn, EntityKind::Patients).unwrap(), 1);
        assert_eq!(next_id(&conn, EntityKind::Patients).unwrap(), 2);
        assert_eq!(next_id(&conn, EntityKind::Staff).unwrap(), 1);
        assert_eq!(high_water(&conn, EntityKind::Patients).unwrap(), 2);
        assert_eq!(high_water(&conn, EntityKind::Schedules).unwrap(), 0);
    }

    #[test]
    fn rolled_back_allocation_is_not_consumed() {
        let mut conn = conn();
        next_id(&conn, EntityKind::Schedules).unwrap();
        {
            let tx = conn.transaction().unwrap();
            assert_eq!(next_id(&tx, EntityKind::Schedules).unwrap(), 2);
            // dropped without commit
        }
        assert_eq!(high_water(&conn, EntityKind::Schedules).unwrap(), 1);
    }
}
