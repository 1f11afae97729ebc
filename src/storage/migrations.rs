use duckdb::Connection;

const CURRENT_VERSION: u32 = 1;

/// Initialize the schema version tracking table and run any pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), duckdb::Error> {
    // Create version tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL, applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
    )?;

    let current = get_current_version(conn)?;

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> Result<u32, duckdb::Error> {
    let mut stmt = conn.prepare("SELECT COALESCE(MAX(version), 0) FROM schema_version")?;
    stmt.query_row([], |row| row.get(0))
}

fn migrate_v1(conn: &Connection) -> Result<(), duckdb::Error> {
    // V1: Initial schema — visits table + id sequence
    crate::storage::schema::init_schema(conn)?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?)",
        [CURRENT_VERSION],
    )?;
    Ok(())
}
