use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::Mutex;
use vdtrack_core::{OrgId, Thing, ThingId};

use super::{ThingRegistry, register_defaults};

/// SQLite-backed registry.
///
/// Things are small configuration-like records, so a single mutex-guarded
/// connection is enough; holding the lock across a lookup-then-insert also
/// keeps registration free of duplicate rows.
#[derive(Clone)]
pub struct SqliteThingRegistry {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SqliteRegistryError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid stored id: {0}")]
    InvalidId(#[from] ulid::DecodeError),
    #[error("invalid stored timestamp: {0}")]
    InvalidTimestamp(#[from] jiff::Error),
    #[error("thing {0:?} is not registered")]
    NotFound(String),
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS things (
    device_id TEXT PRIMARY KEY,
    id TEXT NOT NULL,
    org_id TEXT,
    enabled INTEGER NOT NULL DEFAULT 0,
    location_topic TEXT NOT NULL,
    registered_at INTEGER NOT NULL
)";

impl SqliteThingRegistry {
    pub fn open(path: &Path) -> Result<Self, SqliteRegistryError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, SqliteRegistryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SqliteRegistryError> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn get_row(conn: &Connection, device_id: &str) -> Result<Option<Thing>, SqliteRegistryError> {
    let row = conn
        .query_row(
            "SELECT id, org_id, enabled, location_topic, registered_at
             FROM things WHERE device_id = ?1",
            params![device_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id, org, enabled, location_topic, registered_at)) = row else {
        return Ok(None);
    };

    Ok(Some(Thing {
        id: ThingId(id.parse()?),
        device_id: device_id.into(),
        org: org.map(|raw| raw.parse().map(OrgId)).transpose()?,
        enabled,
        location_topic: location_topic.into(),
        registered_at: jiff::Timestamp::from_second(registered_at)?,
    }))
}

#[async_trait]
impl ThingRegistry for SqliteThingRegistry {
    type Error = SqliteRegistryError;

    async fn find_or_register(&self, device_id: &str) -> Result<Thing, Self::Error> {
        let conn = self.conn.lock().await;

        if let Some(thing) = get_row(&conn, device_id)? {
            return Ok(thing);
        }

        let thing = register_defaults(device_id);
        conn.execute(
            "INSERT INTO things (device_id, id, org_id, enabled, location_topic, registered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                device_id,
                thing.id.0.to_string(),
                thing.org.map(|org| org.0.to_string()),
                thing.enabled,
                &*thing.location_topic,
                thing.registered_at.as_second(),
            ],
        )?;

        Ok(thing)
    }

    async fn get(&self, device_id: &str) -> Result<Option<Thing>, Self::Error> {
        let conn = self.conn.lock().await;
        get_row(&conn, device_id)
    }

    async fn update(&self, device_id: &str, new: Thing) -> Result<(), Self::Error> {
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE things
             SET id = ?2, org_id = ?3, enabled = ?4, location_topic = ?5, registered_at = ?6
             WHERE device_id = ?1",
            params![
                device_id,
                new.id.0.to_string(),
                new.org.map(|org| org.0.to_string()),
                new.enabled,
                &*new.location_topic,
                new.registered_at.as_second(),
            ],
        )?;

        if updated == 0 {
            return Err(SqliteRegistryError::NotFound(device_id.to_owned()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ulid::Ulid;
    use vdtrack_core::{OrgId, Thing};

    use super::super::{DEFAULT_LOCATION_TOPIC, ThingRegistry};
    use super::SqliteThingRegistry;

    #[tokio::test]
    async fn registers_and_finds_things() {
        let registry = SqliteThingRegistry::open_in_memory().unwrap();

        let thing = registry.find_or_register("VDdev01").await.unwrap();
        assert_eq!(&*thing.location_topic, DEFAULT_LOCATION_TOPIC);
        assert!(!thing.enabled);

        let again = registry.find_or_register("VDdev01").await.unwrap();
        assert_eq!(thing.id, again.id);

        let fetched = registry.get("VDdev01").await.unwrap().unwrap();
        assert_eq!(fetched.id, thing.id);
        assert_eq!(fetched.registered_at.as_second(), thing.registered_at.as_second());
    }

    #[tokio::test]
    async fn unknown_device_is_absent() {
        let registry = SqliteThingRegistry::open_in_memory().unwrap();
        assert!(registry.get("VDmissing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_round_trips_assignment() {
        let registry = SqliteThingRegistry::open_in_memory().unwrap();

        let thing = registry.find_or_register("VDdev01").await.unwrap();
        let org = OrgId(Ulid::new());
        let updated = Thing {
            org: Some(org),
            enabled: true,
            ..thing
        };
        registry.update("VDdev01", updated).await.unwrap();

        let fetched = registry.get("VDdev01").await.unwrap().unwrap();
        assert_eq!(fetched.org, Some(org));
        assert!(fetched.enabled);
    }

    #[tokio::test]
    async fn update_of_unknown_device_fails() {
        let registry = SqliteThingRegistry::open_in_memory().unwrap();
        let thing = registry.find_or_register("VDdev01").await.unwrap();

        assert!(registry.update("VDother", thing).await.is_err());
    }
}
