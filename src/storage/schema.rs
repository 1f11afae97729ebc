use duckdb::Connection;

/// SQL statements to create the visit log.
///
/// Ids come from a sequence so every insert gets a monotonically
/// increasing, unique identifier assigned by the store.
pub const CREATE_VISITS_TABLE: &str = r"
CREATE SEQUENCE IF NOT EXISTS visits_id_seq;
CREATE TABLE IF NOT EXISTS visits (
    id          BIGINT PRIMARY KEY DEFAULT nextval('visits_id_seq'),
    visited_at  TIMESTAMP NOT NULL,
    page_url    VARCHAR NOT NULL,
    referer_url VARCHAR NOT NULL,
    user_agent  VARCHAR NOT NULL,
    ip_address  VARCHAR NOT NULL
)
";

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), duckdb::Error> {
    conn.execute_batch(CREATE_VISITS_TABLE)?;
    Ok(())
}
