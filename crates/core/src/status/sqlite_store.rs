//! SQLite-backed status store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};

use super::{StatusDocument, StatusError, StatusFilter, StatusStore};

/// SQLite-backed status store.
///
/// The full document is kept as JSON; tenant, status and timestamps are
/// duplicated into columns so listings can filter and sort without decoding.
pub struct SqliteStatusStore {
    conn: Mutex<Connection>,
}

impl SqliteStatusStore {
    /// Create a new SQLite status store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StatusError> {
        let conn = Connection::open(path).map_err(|e| StatusError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite status store (useful for testing).
    pub fn in_memory() -> Result<Self, StatusError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StatusError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StatusError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS status_documents (
                fetch_id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                import_type TEXT NOT NULL,
                status TEXT NOT NULL,
                total_records INTEGER NOT NULL DEFAULT 0,
                start_timestamp TEXT NOT NULL,
                end_timestamp TEXT,
                document TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_status_tenant ON status_documents(tenant_id);
            CREATE INDEX IF NOT EXISTS idx_status_status ON status_documents(status);
            CREATE INDEX IF NOT EXISTS idx_status_start ON status_documents(start_timestamp DESC);
            "#,
        )
        .map_err(|e| StatusError::Database(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StatusError> {
        self.conn
            .lock()
            .map_err(|_| StatusError::Database("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &StatusFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref tenant_id) = filter.tenant_id {
            conditions.push("tenant_id = ?");
            params.push(Box::new(tenant_id.clone()));
        }

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn encode(document: &StatusDocument) -> Result<String, StatusError> {
        serde_json::to_string(document).map_err(|e| StatusError::Serialization(e.to_string()))
    }

    fn decode(json: &str) -> Result<StatusDocument, StatusError> {
        serde_json::from_str(json).map_err(|e| StatusError::Serialization(e.to_string()))
    }
}

impl StatusStore for SqliteStatusStore {
    fn insert(&self, document: &StatusDocument) -> Result<(), StatusError> {
        let json = Self::encode(document)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO status_documents (fetch_id, tenant_id, import_type, status, total_records, start_timestamp, end_timestamp, document, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                document.fetch_id,
                document.tenant_id,
                document.import_type,
                document.status.as_str(),
                document.total_records as i64,
                document.start_timestamp.to_rfc3339(),
                document.end_timestamp.map(|t| t.to_rfc3339()),
                json,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                StatusError::AlreadyExists(document.fetch_id.clone())
            }
            other => StatusError::Database(other.to_string()),
        })?;

        Ok(())
    }

    fn update(&self, document: &StatusDocument) -> Result<(), StatusError> {
        let json = Self::encode(document)?;
        let conn = self.conn()?;

        let rows = conn
            .execute(
                "UPDATE status_documents SET status = ?, total_records = ?, end_timestamp = ?, document = ?, updated_at = ? WHERE fetch_id = ?",
                params![
                    document.status.as_str(),
                    document.total_records as i64,
                    document.end_timestamp.map(|t| t.to_rfc3339()),
                    json,
                    Utc::now().to_rfc3339(),
                    document.fetch_id,
                ],
            )
            .map_err(|e| StatusError::Database(e.to_string()))?;

        if rows == 0 {
            return Err(StatusError::NotFound(document.fetch_id.clone()));
        }

        Ok(())
    }

    fn get(&self, fetch_id: &str) -> Result<Option<StatusDocument>, StatusError> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT document FROM status_documents WHERE fetch_id = ?",
            params![fetch_id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(json) => Self::decode(&json).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StatusError::Database(e.to_string())),
        }
    }

    fn list(&self, filter: &StatusFilter) -> Result<Vec<StatusDocument>, StatusError> {
        let conn = self.conn()?;
        let (where_clause, mut params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT document FROM status_documents {} ORDER BY start_timestamp DESC, rowid DESC LIMIT ? OFFSET ?",
            where_clause
        );
        params.push(Box::new(filter.limit));
        params.push(Box::new(filter.offset));

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StatusError::Database(e.to_string()))?;

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), |row| row.get::<_, String>(0))
            .map_err(|e| StatusError::Database(e.to_string()))?;

        let mut documents = Vec::new();
        for row in rows {
            let json = row.map_err(|e| StatusError::Database(e.to_string()))?;
            documents.push(Self::decode(&json)?);
        }

        Ok(documents)
    }

    fn count(&self, filter: &StatusFilter) -> Result<i64, StatusError> {
        let conn = self.conn()?;
        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM status_documents {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| StatusError::Database(e.to_string()))
    }
}
