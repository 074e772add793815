use crate::{ProseError, Result};
use rusqlite::Connection;
use std::path::Path;

/// Tables every library file must contain.
const REQUIRED_TABLES: [&str; 3] = ["books", "chapters", "concrete_ideas"];

/// Columns added after the first release; older files are migrated on open.
const TIMESTAMP_MIGRATIONS: [(&str, &str); 4] = [
    ("books", "created_at"),
    ("books", "modified_at"),
    ("chapters", "created_at"),
    ("chapters", "modified_at"),
];

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens a private, throw-away library held entirely in memory.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Validate database structure
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN ('books', 'chapters', 'concrete_ideas')",
            [],
            |row| row.get(0),
        )?;

        if table_count != REQUIRED_TABLES.len() as i64 {
            return Err(ProseError::InvalidLibrary(
                "Not a valid ReinventProse database".to_string(),
            ));
        }

        // Migrate: add timestamp columns to files written before they existed
        for (table, column) in TIMESTAMP_MIGRATIONS {
            let column_exists: bool = conn.query_row(
                &format!("SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = ?"),
                [column],
                |row| row.get::<_, i64>(0).map(|count| count > 0),
            )?;

            if !column_exists {
                log::info!("Migrating library: adding {table}.{column}");
                conn.execute(
                    &format!("ALTER TABLE {table} ADD COLUMN {column} INTEGER NOT NULL DEFAULT 0"),
                    [],
                )?;
            }
        }

        Ok(Self { conn })
    }

    /// Opens the library at `path`, initialising a fresh one when the file is
    /// missing or empty.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_new = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if is_new {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            log::info!("Creating new library at {}", path.display());
            Self::create(path)
        } else {
            log::info!("Opening library at {}", path.display());
            Self::open(path)
        }
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
