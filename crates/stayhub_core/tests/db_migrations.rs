use stayhub_core::db::migrations::{apply_migrations, latest_version};
use stayhub_core::db::{open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn fresh_connection_is_migrated_to_latest_version() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn all_required_tables_exist_after_migration() {
    let conn = open_db_in_memory().unwrap();

    for table in ["users", "places", "reviews", "amenities", "place_amenities"] {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists, "table `{table}` should exist");
    }
}

#[test]
fn reapplying_migrations_is_a_noop() {
    let mut conn = open_db_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn newer_schema_version_is_rejected() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
        .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert!(matches!(err, DbError::UnsupportedSchemaVersion { .. }));
}

#[test]
fn foreign_keys_are_enforced_on_bootstrapped_connections() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO places (id, created_at, updated_at, title, description, price, latitude, longitude, owner_id)
         VALUES ('00000000-0000-4000-8000-000000000001', '2026-01-01T00:00:00+00:00',
                 '2026-01-01T00:00:00+00:00', 'Orphan', NULL, 10.0, 0.0, 0.0,
                 '00000000-0000-4000-8000-000000000099');",
        [],
    );
    assert!(result.is_err(), "insert referencing a missing user must fail");
}
