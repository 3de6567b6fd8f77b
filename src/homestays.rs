use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::AdminError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Homestay {
    id: i64,
    #[serde(skip)]
    owner_id: i64,
    name: String,
    address: String,
}

/// Tables whose rows point at a homestay through `homestay_id`.
///
/// Every variant is declared with `ON DELETE CASCADE` in the schema, so deleting a
/// homestay removes any of these rows that were not reassigned first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChildTable {
    Rooms,
    Bookings,
    Features,
}

impl ChildTable {
    pub const ALL: [ChildTable; 3] = [ChildTable::Rooms, ChildTable::Bookings, ChildTable::Features];

    pub fn table_name(&self) -> &'static str {
        match self {
            ChildTable::Rooms => "rooms",
            ChildTable::Bookings => "bookings",
            ChildTable::Features => "homestay_features",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChildTable::Rooms => "Rooms",
            ChildTable::Bookings => "Bookings",
            ChildTable::Features => "Features",
        }
    }

    /// Number of rows referencing any of `homestay_ids`.
    pub fn count_for(&self, conn: &Connection, homestay_ids: &[i64]) -> Result<usize, AdminError> {
        if homestay_ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE homestay_id IN ({})",
            self.table_name(),
            placeholders(homestay_ids.len())
        );
        let count: i64 = conn.query_row(&sql, params_from_iter(homestay_ids.iter()), |row| {
            row.get(0)
        })?;

        Ok(count as usize)
    }

    /// Points every row referencing one of `from_ids` at `to_id`. Returns the rows updated.
    pub fn reassign(&self, conn: &Connection, from_ids: &[i64], to_id: i64) -> Result<usize, AdminError> {
        if from_ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE {} SET homestay_id = ? WHERE homestay_id IN ({})",
            self.table_name(),
            placeholders(from_ids.len())
        );
        let params = std::iter::once(&to_id).chain(from_ids.iter());
        let updated = conn.execute(&sql, params_from_iter(params))?;

        Ok(updated)
    }
}

/// One owner that has more than one homestay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub owner_id: i64,
    pub owner_username: Option<String>,
    pub count: usize,
    pub listings: Vec<Homestay>,
}

impl Homestay {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Homestay {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            address: row.get(3)?,
        })
    }

    /// All homestays of one owner, lowest id first.
    pub fn for_owner(conn: &Connection, owner_id: i64) -> Result<Vec<Self>, AdminError> {
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, name, address
            FROM homestays
            WHERE owner_id = ?
            ORDER BY id ASC",
        )?;

        let homestays = stmt
            .query_map([owner_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(homestays)
    }

    pub fn get_for_owner(conn: &Connection, id: i64, owner_id: i64) -> Result<Option<Self>, AdminError> {
        conn.query_row(
            "SELECT id, owner_id, name, address FROM homestays WHERE id = ? AND owner_id = ?",
            [id, owner_id],
            Self::from_row,
        )
        .optional()
        .map_err(AdminError::DatabaseError)
    }

    /// Every owner with more than one homestay, ordered by owner id.
    pub fn duplicate_groups(conn: &Connection) -> Result<Vec<DuplicateGroup>, AdminError> {
        let mut stmt = conn.prepare(
            "SELECT h.owner_id, u.username, COUNT(h.id) AS c
            FROM homestays h
            LEFT JOIN users u ON u.id = h.owner_id
            GROUP BY h.owner_id
            HAVING c > 1
            ORDER BY h.owner_id ASC",
        )?;

        let owners: Vec<(i64, Option<String>, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups = Vec::with_capacity(owners.len());
        for (owner_id, owner_username, count) in owners {
            groups.push(DuplicateGroup {
                owner_id,
                owner_username,
                count: count as usize,
                listings: Self::for_owner(conn, owner_id)?,
            });
        }

        Ok(groups)
    }

    /// Re-reads a homestay inside the merge transaction. Errors if it no longer exists.
    pub fn lock(conn: &Connection, id: i64) -> Result<Self, AdminError> {
        conn.query_row(
            "SELECT id, owner_id, name, address FROM homestays WHERE id = ?",
            [id],
            Self::from_row,
        )
        .optional()?
        .ok_or_else(|| AdminError::Error(format!("Homestay id={} disappeared before merge", id)))
    }

    /// Deletes the given homestays. Child rows still attached are removed by cascade.
    pub fn delete_many(conn: &Connection, ids: &[i64]) -> Result<usize, AdminError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!("DELETE FROM homestays WHERE id IN ({})", placeholders(ids.len()));
        let deleted = conn.execute(&sql, params_from_iter(ids.iter()))?;

        Ok(deleted)
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
