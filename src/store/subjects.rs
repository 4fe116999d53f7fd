use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{DataError, DataResult};

#[derive(Debug, Clone)]
pub struct SubjectRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

pub fn list(conn: &Connection) -> DataResult<Vec<SubjectRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, description FROM subjects ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(SubjectRow {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn add(conn: &Connection, name: &str, description: Option<&str>) -> DataResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DataError::InvalidInput(
            "subject name must not be empty".to_string(),
        ));
    }
    let taken: Option<i64> = conn
        .query_row("SELECT 1 FROM subjects WHERE name = ?", [name], |r| r.get(0))
        .optional()?;
    if taken.is_some() {
        return Err(DataError::DuplicateName("subject"));
    }

    let subject_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO subjects(id, name, description) VALUES(?, ?, ?)",
        (&subject_id, name, normalize_description(description).as_deref()),
    )?;
    Ok(subject_id)
}

/// Renaming onto another subject's name is refused; renaming a subject to its
/// own current name is fine.
pub fn update(
    conn: &Connection,
    subject_id: &str,
    name: &str,
    description: Option<&str>,
) -> DataResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DataError::InvalidInput(
            "subject name must not be empty".to_string(),
        ));
    }
    if !exists(conn, subject_id)? {
        return Err(DataError::NotFound("subject"));
    }
    let collision: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM subjects WHERE name = ? AND id != ?",
            (name, subject_id),
            |r| r.get(0),
        )
        .optional()?;
    if collision.is_some() {
        return Err(DataError::DuplicateName("subject"));
    }

    conn.execute(
        "UPDATE subjects SET name = ?, description = ? WHERE id = ?",
        (name, normalize_description(description).as_deref(), subject_id),
    )?;
    Ok(())
}

/// Attendance rows keep their history when a subject goes away; the reference
/// is nulled in the same transaction.
pub fn delete(conn: &Connection, subject_id: &str) -> DataResult<()> {
    if !exists(conn, subject_id)? {
        return Err(DataError::NotFound("subject"));
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE attendance SET subject_id = NULL WHERE subject_id = ?",
        [subject_id],
    )?;
    tx.execute("DELETE FROM subjects WHERE id = ?", [subject_id])?;
    tx.commit()?;
    Ok(())
}

pub(crate) fn exists(conn: &Connection, subject_id: &str) -> DataResult<bool> {
    let row: Option<i64> = conn
        .query_row("SELECT 1 FROM subjects WHERE id = ?", [subject_id], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(row.is_some())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
