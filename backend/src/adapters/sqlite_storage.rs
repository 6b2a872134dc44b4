//! Hierarchical file storage on top of a single SQLite catalog.
//!
//! Folders and files are rows keyed by UUID v4 identifiers; file content is
//! kept in the catalog itself together with its MIME type and MD5 checksum.
//! Folder names are not unique. Name lookup returns the oldest match.

use crate::error::{ObjectKind, ReportError, ReportResult};
use crate::pipeline::capabilities::{Blob, FileId, FileStorage, FolderId};
use mime_guess::from_path;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS folders (
    id        TEXT PRIMARY KEY,
    parent_id TEXT,
    name      TEXT NOT NULL,
    read_only INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS files (
    id        TEXT PRIMARY KEY,
    folder_id TEXT NOT NULL,
    name      TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    md5       TEXT NOT NULL,
    content   BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS folders_by_name ON folders(name);
CREATE INDEX IF NOT EXISTS files_by_folder ON files(folder_id);
";

/// Catalog metadata of a stored file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub id: FileId,
    pub folder: FolderId,
    pub name: String,
    pub mime_type: String,
    pub md5: String,
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> ReportResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    fn with_connection(conn: Connection) -> ReportResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Creates a folder with no parent.
    pub fn create_top_level_folder(&self, name: &str) -> ReportResult<FolderId> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO folders (id, parent_id, name) VALUES (?1, NULL, ?2)",
            params![id, name],
        )?;
        Ok(FolderId(id))
    }

    /// Oldest folder without a parent named `name`. Subfolders never match.
    pub fn find_top_level_folder(&self, name: &str) -> ReportResult<FolderId> {
        self.conn
            .query_row(
                "SELECT id FROM folders WHERE name = ?1 AND parent_id IS NULL ORDER BY rowid LIMIT 1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(FolderId)
            .ok_or_else(|| ReportError::not_found(ObjectKind::Folder, name))
    }

    /// Returns the top-level folder named `name`, creating it if there is none.
    /// The flag is true when the folder was created by this call.
    pub fn find_or_create_top_level_folder(&self, name: &str) -> ReportResult<(FolderId, bool)> {
        match self.find_top_level_folder(name) {
            Ok(folder) => Ok((folder, false)),
            Err(ReportError::NotFound { .. }) => Ok((self.create_top_level_folder(name)?, true)),
            Err(e) => Err(e),
        }
    }

    pub fn set_read_only(&self, folder: &FolderId, read_only: bool) -> ReportResult<()> {
        let updated = self.conn.execute(
            "UPDATE folders SET read_only = ?1 WHERE id = ?2",
            params![read_only, folder.0],
        )?;
        if updated == 0 {
            return Err(ReportError::not_found(ObjectKind::Folder, &folder.0));
        }
        Ok(())
    }

    pub fn file_entry(&self, file: &FileId) -> ReportResult<FileEntry> {
        self.conn
            .query_row(
                "SELECT id, folder_id, name, mime_type, md5 FROM files WHERE id = ?1",
                params![file.0],
                |row| {
                    Ok(FileEntry {
                        id: FileId(row.get(0)?),
                        folder: FolderId(row.get(1)?),
                        name: row.get(2)?,
                        mime_type: row.get(3)?,
                        md5: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| ReportError::not_found(ObjectKind::File, &file.0))
    }

    /// Fails with `NotFound` for an unknown folder and `PermissionDenied` for a read-only one.
    fn ensure_writable(&self, folder: &FolderId) -> ReportResult<()> {
        let read_only: Option<bool> = self
            .conn
            .query_row(
                "SELECT read_only FROM folders WHERE id = ?1",
                params![folder.0],
                |row| row.get(0),
            )
            .optional()?;
        match read_only {
            None => Err(ReportError::not_found(ObjectKind::Folder, &folder.0)),
            Some(true) => Err(ReportError::PermissionDenied(format!(
                "folder {} is read-only",
                folder
            ))),
            Some(false) => Ok(()),
        }
    }

    fn insert_file(
        &self,
        folder: &FolderId,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> ReportResult<FileId> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO files (id, folder_id, name, mime_type, md5, content) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, folder.0, name, mime_type, checksum(bytes), bytes],
        )?;
        Ok(FileId(id))
    }
}

#[cfg(test)]
impl SqliteStorage {
    pub fn in_memory() -> ReportResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Files directly inside `folder`, in creation order.
    pub fn list_files(&self, folder: &FolderId) -> ReportResult<Vec<FileEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, folder_id, name, mime_type, md5 FROM files WHERE folder_id = ?1 ORDER BY rowid",
        )?;
        let entries = stmt
            .query_map(params![folder.0], |row| {
                Ok(FileEntry {
                    id: FileId(row.get(0)?),
                    folder: FolderId(row.get(1)?),
                    name: row.get(2)?,
                    mime_type: row.get(3)?,
                    md5: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Folders named `name`, in creation order.
    pub fn folders_named(&self, name: &str) -> ReportResult<Vec<FolderId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM folders WHERE name = ?1 ORDER BY rowid")?;
        let ids = stmt
            .query_map(params![name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().map(FolderId).collect())
    }
}

impl FileStorage for SqliteStorage {
    fn find_folder_by_name(&self, name: &str) -> ReportResult<FolderId> {
        self.conn
            .query_row(
                "SELECT id FROM folders WHERE name = ?1 ORDER BY rowid LIMIT 1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(FolderId)
            .ok_or_else(|| ReportError::not_found(ObjectKind::Folder, name))
    }

    fn create_folder(&self, parent: &FolderId, name: &str) -> ReportResult<FolderId> {
        self.ensure_writable(parent)?;
        let id = new_id();
        self.conn.execute(
            "INSERT INTO folders (id, parent_id, name) VALUES (?1, ?2, ?3)",
            params![id, parent.0, name],
        )?;
        Ok(FolderId(id))
    }

    fn copy_file(&self, file: &FileId, destination: &FolderId, name: &str) -> ReportResult<FileId> {
        let source = self.get_file(file)?;
        self.ensure_writable(destination)?;
        self.insert_file(destination, name, &source.mime_type, &source.bytes)
    }

    fn get_file(&self, file: &FileId) -> ReportResult<Blob> {
        self.conn
            .query_row(
                "SELECT name, mime_type, content FROM files WHERE id = ?1",
                params![file.0],
                |row| {
                    Ok(Blob {
                        name: row.get(0)?,
                        mime_type: row.get(1)?,
                        bytes: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| ReportError::not_found(ObjectKind::File, &file.0))
    }

    fn move_file(&self, file: &FileId, destination: &FolderId) -> ReportResult<()> {
        let entry = self.file_entry(file)?;
        self.ensure_writable(&entry.folder)?;
        self.ensure_writable(destination)?;
        self.conn.execute(
            "UPDATE files SET folder_id = ?1 WHERE id = ?2",
            params![destination.0, file.0],
        )?;
        Ok(())
    }

    fn rename_file(&self, file: &FileId, name: &str) -> ReportResult<()> {
        let entry = self.file_entry(file)?;
        self.ensure_writable(&entry.folder)?;
        self.conn.execute(
            "UPDATE files SET name = ?1 WHERE id = ?2",
            params![name, file.0],
        )?;
        Ok(())
    }

    fn create_file(&self, folder: &FolderId, blob: &Blob) -> ReportResult<FileId> {
        self.ensure_writable(folder)?;
        let mime_type = if blob.mime_type.is_empty() {
            from_path(&blob.name).first_or_octet_stream().to_string()
        } else {
            blob.mime_type.clone()
        };
        self.insert_file(folder, &blob.name, &mime_type, &blob.bytes)
    }

    fn overwrite_file(&self, file: &FileId, bytes: &[u8], mime_type: &str) -> ReportResult<()> {
        let entry = self.file_entry(file)?;
        self.ensure_writable(&entry.folder)?;
        self.conn.execute(
            "UPDATE files SET content = ?1, md5 = ?2, mime_type = ?3 WHERE id = ?4",
            params![bytes, checksum(bytes), mime_type, file.0],
        )?;
        Ok(())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}
