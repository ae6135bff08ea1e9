use std::path::Path;

use log::debug;
use rusqlite::{params, Connection, OpenFlags, Transaction};

use crate::protocol::{ImageInfoRecord, NormalizationMapping};

/// Tables whose `image` column references a wiki file page.
const REFERENCING_TABLES: [&str; 2] = ["wikipages", "relation_pages"];

/// Owns the connection to the wiki database. Tables are never created here.
pub struct DbManager {
    conn: Connection,
}

impl DbManager {
    /// Opens an existing database read-write; a missing file is an error.
    pub fn open(db_path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Starts the transaction that spans a whole import run.
    pub fn begin_import(&mut self) -> Result<Transaction<'_>, rusqlite::Error> {
        self.conn.transaction()
    }
}

/// Writes title rewrites and image rows within the run's transaction.
pub struct WikiImageSink<'conn> {
    conn: &'conn Connection,
}

impl<'conn> WikiImageSink<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Rewrites references to `from` into `to`; returns the number of rows
    /// changed across all referencing tables.
    pub fn apply_normalization(
        &self,
        mapping: &NormalizationMapping,
    ) -> Result<usize, rusqlite::Error> {
        let mut changed = 0;
        for table in REFERENCING_TABLES {
            changed += self.conn.execute(
                &format!("UPDATE {table} SET image = ?1 WHERE image = ?2"),
                params![mapping.to, mapping.from],
            )?;
        }
        debug!(
            "Renamed '{}' to '{}' in {} row(s)",
            mapping.from, mapping.to, changed
        );
        Ok(changed)
    }

    pub fn insert_image(&self, record: &ImageInfoRecord) -> Result<(), rusqlite::Error> {
        let (prefix, suffix) = match &record.thumbnail {
            Some(template) => (Some(template.prefix.as_str()), Some(template.suffix.as_str())),
            None => (None, None),
        };
        self.conn.execute(
            "INSERT INTO wiki_images (image, width, height, size, mime, image_url, thumb_url_prefix, thumb_url_suffix) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.title,
                record.width,
                record.height,
                record.size,
                record.mime,
                record.image_url,
                prefix,
                suffix
            ],
        )?;
        Ok(())
    }
}
