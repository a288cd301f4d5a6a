//! SQLite record store.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{Connection, OptionalExtension, ToSql, params, params_from_iter};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::store::{RecordStore, SchemaSource};
use crate::types::{FieldDescriptor, Group, GroupId, Record, RecordId, SchemaId, SqlParam};

use super::schema;

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::String(s) => ToSqlOutput::from(s.as_str()),
            SqlParam::Integer(i) => ToSqlOutput::from(*i),
            SqlParam::Float(f) => ToSqlOutput::from(*f),
            SqlParam::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

/// Configuration for the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Enable WAL mode for file databases.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Enable foreign key constraints.
    #[serde(default = "default_true")]
    pub enable_foreign_keys: bool,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

/// SQLite-backed record store.
///
/// Holds a single connection: temporary sort tables are connection scoped,
/// so every statement of a search has to run on the same connection.
pub struct SqliteStore {
    conn: Connection,
    config: SqliteStoreConfig,
    is_memory: bool,
}

impl Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Creates a new in-memory store.
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_config(":memory:", SqliteStoreConfig::default())
    }

    /// Opens or creates a file-based store.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::with_config(path, SqliteStoreConfig::default())
    }

    /// Opens a store with custom configuration.
    pub fn with_config<P: AsRef<Path>>(path: P, config: SqliteStoreConfig) -> StoreResult<Self> {
        let is_memory = path.as_ref().to_string_lossy() == ":memory:";

        let conn = if is_memory {
            Connection::open_in_memory()
        } else {
            Connection::open(path.as_ref())
        }
        .map_err(|e| StoreError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: e.to_string(),
        })?;

        let store = Self {
            conn,
            config,
            is_memory,
        };
        store.configure_connection()?;

        Ok(store)
    }

    /// Initialize the database schema.
    pub fn init_schema(&self) -> StoreResult<()> {
        schema::initialize_schema(&self.conn)
    }

    /// Configure connection settings.
    fn configure_connection(&self) -> StoreResult<()> {
        self.conn
            .busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;

        if self.config.enable_foreign_keys {
            self.conn.execute("PRAGMA foreign_keys = ON", [])?;
        }

        if self.config.enable_wal && !self.is_memory {
            // journal_mode returns the resulting mode as a row
            self.conn
                .query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))?;
        }

        Ok(())
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Returns the underlying connection for ad-hoc statements.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Inserts or replaces a group schema.
    pub fn add_schema(
        &self,
        id: SchemaId,
        name: &str,
        fields: &[FieldDescriptor],
    ) -> StoreResult<()> {
        let flds = serde_json::to_string(fields)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO models (id, name, flds) VALUES (?1, ?2, ?3)",
            params![id, name, flds],
        )?;
        Ok(())
    }

    /// Inserts or replaces a group.
    pub fn add_group(&self, group: &Group) -> StoreResult<()> {
        let tags = group.tags.trim();
        let stored_tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" {} ", tags)
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO notes (id, mid, mod, tags, flds, sfld)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                group.id,
                group.schema_id,
                group.modified,
                stored_tags,
                group.joined_fields(),
                group.sort_field
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces a record.
    pub fn add_record(&self, record: &Record) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cards
             (id, nid, did, ord, mod, type, queue, due, ivl, factor, reps, lapses)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.id,
                record.group_id,
                record.deck_id,
                record.ordinal,
                record.modified,
                record.card_type,
                record.queue,
                record.due,
                record.interval,
                record.ease_factor,
                record.reps,
                record.lapses
            ],
        )?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn execute(&self, sql: &str, params: &[SqlParam]) -> StoreResult<usize> {
        Ok(self.conn.execute(sql, params_from_iter(params.iter()))?)
    }

    fn query_ids(&self, sql: &str, params: &[SqlParam]) -> StoreResult<Vec<RecordId>> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get(0))?
            .collect::<Result<Vec<RecordId>, _>>()?;
        Ok(ids)
    }

    fn query_ranked(&self, sql: &str, params: &[SqlParam]) -> StoreResult<Vec<(RecordId, bool)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<(RecordId, bool)>, _>>()?;
        Ok(rows)
    }

    fn group_ids(&self, record_ids: &[RecordId]) -> StoreResult<HashMap<RecordId, GroupId>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT nid FROM cards WHERE id = ?1")?;
        let mut groups = HashMap::with_capacity(record_ids.len());
        for &id in record_ids {
            if let Some(group_id) = stmt.query_row([id], |row| row.get(0)).optional()? {
                groups.insert(id, group_id);
            }
        }
        Ok(groups)
    }

    fn record(&self, id: RecordId) -> StoreResult<Option<Record>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, nid, did, ord, mod, type, queue, due, ivl, factor, reps, lapses
                 FROM cards WHERE id = ?1",
                [id],
                |row| {
                    Ok(Record {
                        id: row.get(0)?,
                        group_id: row.get(1)?,
                        deck_id: row.get(2)?,
                        ordinal: row.get(3)?,
                        modified: row.get(4)?,
                        card_type: row.get(5)?,
                        queue: row.get(6)?,
                        due: row.get(7)?,
                        interval: row.get(8)?,
                        ease_factor: row.get(9)?,
                        reps: row.get(10)?,
                        lapses: row.get(11)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn group(&self, id: GroupId) -> StoreResult<Option<Group>> {
        let group = self
            .conn
            .query_row(
                "SELECT id, mid, mod, tags, flds, sfld FROM notes WHERE id = ?1",
                [id],
                |row| {
                    let tags: String = row.get(3)?;
                    let flds: String = row.get(4)?;
                    Ok(Group {
                        id: row.get(0)?,
                        schema_id: row.get(1)?,
                        modified: row.get(2)?,
                        tags: tags.trim().to_string(),
                        fields: Group::split_fields(&flds),
                        sort_field: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(group)
    }
}

impl SchemaSource for SqliteStore {
    fn schema_fields(&self, schema_id: SchemaId) -> StoreResult<Option<Vec<FieldDescriptor>>> {
        let flds: Option<String> = self
            .conn
            .query_row("SELECT flds FROM models WHERE id = ?1", [schema_id], |row| {
                row.get(0)
            })
            .optional()?;

        match flds {
            Some(flds) => Ok(Some(serde_json::from_str(&flds)?)),
            None => Ok(None),
        }
    }
}
