//! Persistence seam and its SQLite implementation.
//!
//! The board and the orchestrator call the gateway on every successful
//! mutation or refresh; gateway failures are reported by the callers but
//! never roll back in-memory state.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use stratus_core::error::{DatabaseError, RusqliteErrorExt};

use crate::place::{Place, PlaceId};

const SCHEMA_VERSION: i32 = 1;

/// Durable storage for the place list.
pub trait PersistenceGateway: Send + Sync {
    /// All stored places, in stored order.
    fn load_all(&self) -> Result<Vec<Place>, DatabaseError>;

    /// Insert or update one place, keeping its position (new places go to
    /// the tail).
    fn save_one(&self, place: &Place) -> Result<(), DatabaseError>;

    fn delete_one(&self, id: &PlaceId) -> Result<(), DatabaseError>;

    /// Persist the full ordering after a move.
    fn save_order(&self, ids: &[PlaceId]) -> Result<(), DatabaseError>;
}

/// SQLite-backed gateway. Places are stored as a JSON payload column plus a
/// position column for ordering.
pub struct SqlitePlaceGateway {
    conn: Mutex<Connection>,
}

impl SqlitePlaceGateway {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        let gateway = Self {
            conn: Mutex::new(conn),
        };
        gateway.init_schema()?;
        Ok(gateway)
    }

    /// Create an in-memory database (testing and ephemeral sessions).
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        let gateway = Self {
            conn: Mutex::new(conn),
        };
        gateway.init_schema()?;
        Ok(gateway)
    }

    fn init_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

            CREATE TABLE IF NOT EXISTS places (
                city TEXT NOT NULL,
                country_code TEXT NOT NULL,
                position INTEGER NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (city, country_code)
            );

            CREATE INDEX IF NOT EXISTS idx_places_position ON places(position);",
        )
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()
            .map_err(|e| e.into_database_error())?;

        if version.is_none() {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|e| e.into_database_error())?;
        }

        Ok(())
    }
}

impl PersistenceGateway for SqlitePlaceGateway {
    fn load_all(&self) -> Result<Vec<Place>, DatabaseError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT city, country_code, payload FROM places ORDER BY position")
            .map_err(|e| e.into_database_error())?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| e.into_database_error())?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.into_database_error())?;

        let mut places = Vec::with_capacity(rows.len());
        for (city, country_code, payload) in rows {
            match serde_json::from_str::<Place>(&payload) {
                Ok(place) => places.push(place),
                Err(e) => {
                    // A corrupt row loses that one place, not the session
                    tracing::warn!(
                        city = %city,
                        country = %country_code,
                        error = %e,
                        "skipping undecodable place row"
                    );
                }
            }
        }

        Ok(places)
    }

    fn save_one(&self, place: &Place) -> Result<(), DatabaseError> {
        let payload = serde_json::to_string(place)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let conn = self.conn.lock();
        let existing: Option<i64> = conn
            .query_row(
                "SELECT position FROM places WHERE city = ?1 AND country_code = ?2",
                params![place.id().city(), place.id().country_code()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| e.into_database_error())?;

        let position = match existing {
            Some(position) => position,
            None => conn
                .query_row(
                    "SELECT COALESCE(MAX(position), -1) + 1 FROM places",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| e.into_database_error())?,
        };

        conn.execute(
            "INSERT OR REPLACE INTO places (city, country_code, position, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![place.id().city(), place.id().country_code(), position, payload],
        )
        .map_err(|e| e.into_database_error())?;

        Ok(())
    }

    fn delete_one(&self, id: &PlaceId) -> Result<(), DatabaseError> {
        self.conn
            .lock()
            .execute(
                "DELETE FROM places WHERE city = ?1 AND country_code = ?2",
                params![id.city(), id.country_code()],
            )
            .map_err(|e| e.into_database_error())?;
        Ok(())
    }

    fn save_order(&self, ids: &[PlaceId]) -> Result<(), DatabaseError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| e.into_database_error())?;
        for (position, id) in ids.iter().enumerate() {
            tx.execute(
                "UPDATE places SET position = ?1 WHERE city = ?2 AND country_code = ?3",
                params![position as i64, id.city(), id.country_code()],
            )
            .map_err(|e| e.into_database_error())?;
        }
        tx.commit().map_err(|e| e.into_database_error())?;
        Ok(())
    }
}
