use super::{BaselineStore, PersistenceResult};
use crate::baseline::BaselineSnapshot;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

/// Durable baseline store over a single sqlite database. The connection
/// mutex serializes writers, so a save's supersede-and-insert is the only
/// write in flight for its project.
pub struct SqliteBaselineStore {
    connection: Mutex<Connection>,
}

impl SqliteBaselineStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS baselines (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                version INTEGER NOT NULL,
                active INTEGER NOT NULL DEFAULT 0,
                snapshot_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_baselines_project ON baselines(project_id);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn parse_row(json: String) -> PersistenceResult<BaselineSnapshot> {
        let snapshot: BaselineSnapshot = serde_json::from_str(&json)?;
        Ok(snapshot)
    }
}

impl BaselineStore for SqliteBaselineStore {
    fn save(&self, snapshot: &BaselineSnapshot) -> PersistenceResult<()> {
        let json = serde_json::to_string(snapshot)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE baselines SET active = 0 WHERE project_id = ?1",
            params![snapshot.project_id],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO baselines (id, project_id, version, active, snapshot_json) \
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![snapshot.id, snapshot.project_id, snapshot.version, json],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn active(&self, project_id: &str) -> PersistenceResult<Option<BaselineSnapshot>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT snapshot_json FROM baselines WHERE project_id = ?1 AND active = 1")?;
        let json: Option<String> = stmt
            .query_row(params![project_id], |row| row.get(0))
            .optional()?;
        json.map(Self::parse_row).transpose()
    }

    fn snapshot(&self, snapshot_id: &str) -> PersistenceResult<Option<BaselineSnapshot>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare("SELECT snapshot_json FROM baselines WHERE id = ?1")?;
        let json: Option<String> = stmt
            .query_row(params![snapshot_id], |row| row.get(0))
            .optional()?;
        json.map(Self::parse_row).transpose()
    }

    fn snapshots(&self, project_id: &str) -> PersistenceResult<Vec<BaselineSnapshot>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT snapshot_json FROM baselines WHERE project_id = ?1 ORDER BY version ASC",
        )?;
        let rows = stmt.query_map(params![project_id], |row| row.get::<_, String>(0))?;

        let mut snapshots = Vec::new();
        for json in rows {
            snapshots.push(Self::parse_row(json?)?);
        }
        Ok(snapshots)
    }

    fn delete(&self, snapshot_id: &str) -> PersistenceResult<bool> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let affected = conn.execute("DELETE FROM baselines WHERE id = ?1", params![snapshot_id])?;
        Ok(affected > 0)
    }
}
