pub const SCHEMA_VERSION: &str = "1";

// Child tables cascade on homestay delete. Connections must enable
// foreign_keys for the cascade to fire (see Database::configure).
pub const CREATE_SCHEMA_SQL: &str = r#"
BEGIN TRANSACTION;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', '1');

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    is_staff BOOLEAN NOT NULL DEFAULT 0,
    is_superuser BOOLEAN NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    date_joined INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS homestays (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_homestays_owner ON homestays (owner_id, id);

CREATE TABLE IF NOT EXISTS rooms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    homestay_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    capacity INTEGER NOT NULL DEFAULT 1,
    FOREIGN KEY (homestay_id) REFERENCES homestays(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_rooms_homestay ON rooms (homestay_id);

CREATE TABLE IF NOT EXISTS bookings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    homestay_id INTEGER NOT NULL,
    guest_name TEXT NOT NULL,
    check_in TEXT NOT NULL,       -- ISO-8601 date
    check_out TEXT NOT NULL,      -- ISO-8601 date
    FOREIGN KEY (homestay_id) REFERENCES homestays(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_bookings_homestay ON bookings (homestay_id);

CREATE TABLE IF NOT EXISTS homestay_features (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    homestay_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    FOREIGN KEY (homestay_id) REFERENCES homestays(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_features_homestay ON homestay_features (homestay_id);

COMMIT;
"#;
