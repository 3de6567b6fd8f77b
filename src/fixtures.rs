//! Row builders shared by the unit tests.

use rusqlite::{params, Connection};

pub fn owner(conn: &Connection, username: &str) -> i64 {
    conn.query_row(
        "INSERT INTO users (username, email, password_hash, date_joined)
         VALUES (?, '', 'unusable', 0) RETURNING id",
        [username],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn homestay(conn: &Connection, owner_id: i64, name: &str) -> i64 {
    conn.query_row(
        "INSERT INTO homestays (owner_id, name, address) VALUES (?, ?, ?) RETURNING id",
        params![owner_id, name, format!("{} Road", name)],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn room(conn: &Connection, homestay_id: i64) -> i64 {
    conn.query_row(
        "INSERT INTO rooms (homestay_id, name, capacity) VALUES (?, 'Room', 2) RETURNING id",
        [homestay_id],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn booking(conn: &Connection, homestay_id: i64) -> i64 {
    conn.query_row(
        "INSERT INTO bookings (homestay_id, guest_name, check_in, check_out)
         VALUES (?, 'Guest', '2026-01-01', '2026-01-03') RETURNING id",
        [homestay_id],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn feature(conn: &Connection, homestay_id: i64) -> i64 {
    conn.query_row(
        "INSERT INTO homestay_features (homestay_id, name) VALUES (?, 'Wifi') RETURNING id",
        [homestay_id],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

pub fn count_where(conn: &Connection, table: &str, homestay_id: i64) -> i64 {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE homestay_id = ?", table),
        [homestay_id],
        |row| row.get(0),
    )
    .unwrap()
}

/// Every row of every table, for before/after comparisons.
pub fn snapshot(conn: &Connection) -> Vec<String> {
    let mut rows = Vec::new();
    for table in ["users", "homestays", "rooms", "bookings", "homestay_features"] {
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {} ORDER BY id", table))
            .unwrap();
        let column_count = stmt.column_count();
        let mut query = stmt.query([]).unwrap();
        while let Some(row) = query.next().unwrap() {
            let values: Vec<String> = (0..column_count)
                .map(|i| format!("{:?}", row.get_ref(i).unwrap()))
                .collect();
            rows.push(format!("{}: {}", table, values.join("|")));
        }
    }
    rows
}
