use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{DataError, DataResult};
use crate::store::groups;

#[derive(Debug, Clone)]
pub struct StudentRow {
    pub id: String,
    pub surname: String,
    pub name: String,
    pub middle_name: Option<String>,
    pub group_name: String,
    pub is_nonresident: bool,
}

/// Roster rows joined to their group. Filtered by group the order is
/// surname/name; across all groups the group name leads.
pub fn list(conn: &Connection, group_id: Option<&str>) -> DataResult<Vec<StudentRow>> {
    let rows = match group_id {
        Some(gid) => {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.surname, s.name, s.middle_name, s.is_nonresident, g.name
                 FROM students s
                 JOIN groups g ON g.id = s.group_id
                 WHERE s.group_id = ?
                 ORDER BY s.surname, s.name",
            )?;
            let mapped = stmt.query_map([gid], map_row)?;
            mapped.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.surname, s.name, s.middle_name, s.is_nonresident, g.name
                 FROM students s
                 JOIN groups g ON g.id = s.group_id
                 ORDER BY g.name, s.surname, s.name",
            )?;
            let mapped = stmt.query_map([], map_row)?;
            mapped.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(rows)
}

fn map_row(row: &Row) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        id: row.get(0)?,
        surname: row.get(1)?,
        name: row.get(2)?,
        middle_name: row.get(3)?,
        is_nonresident: row.get::<_, i64>(4)? != 0,
        group_name: row.get(5)?,
    })
}

pub fn add(
    conn: &Connection,
    surname: &str,
    name: &str,
    middle_name: Option<&str>,
    group_id: &str,
    is_nonresident: bool,
) -> DataResult<String> {
    let surname = surname.trim();
    let name = name.trim();
    if surname.is_empty() || name.is_empty() {
        return Err(DataError::InvalidInput(
            "surname and name must not be empty".to_string(),
        ));
    }
    if !groups::exists(conn, group_id)? {
        return Err(DataError::InvalidInput(
            "groupId does not reference an existing group".to_string(),
        ));
    }
    let middle = middle_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let student_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(id, surname, name, middle_name, group_id, is_nonresident)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &student_id,
            surname,
            name,
            middle.as_deref(),
            group_id,
            is_nonresident as i64,
        ),
    )?;
    Ok(student_id)
}

/// Hard delete. The student's attendance rows go in the same transaction so
/// the ledger never references a missing student.
pub fn delete(conn: &Connection, student_id: &str) -> DataResult<()> {
    if !exists(conn, student_id)? {
        return Err(DataError::NotFound("student"));
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendance WHERE student_id = ?", [student_id])?;
    tx.execute("DELETE FROM students WHERE id = ?", [student_id])?;
    tx.commit()?;
    Ok(())
}

pub fn transfer(conn: &Connection, student_id: &str, new_group_id: &str) -> DataResult<()> {
    if !exists(conn, student_id)? {
        return Err(DataError::NotFound("student"));
    }
    if !groups::exists(conn, new_group_id)? {
        return Err(DataError::NotFound("group"));
    }
    conn.execute(
        "UPDATE students SET group_id = ? WHERE id = ?",
        (new_group_id, student_id),
    )?;
    Ok(())
}

pub fn set_nonresident(conn: &Connection, student_id: &str, flag: bool) -> DataResult<()> {
    let updated = conn.execute(
        "UPDATE students SET is_nonresident = ? WHERE id = ?",
        (flag as i64, student_id),
    )?;
    if updated == 0 {
        return Err(DataError::NotFound("student"));
    }
    Ok(())
}

pub(crate) fn exists(conn: &Connection, student_id: &str) -> DataResult<bool> {
    let row: Option<i64> = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(row.is_some())
}
