use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{DataError, DataResult};

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub course: i64,
    pub student_count: i64,
}

/// Groups with their dependent-student counts. Groups with no students still
/// appear with a zero count.
pub fn list(conn: &Connection) -> DataResult<Vec<GroupRow>> {
    // Correlated subquery instead of a join to avoid double-counting.
    let mut stmt = conn.prepare(
        "SELECT
           g.id,
           g.name,
           g.course,
           (SELECT COUNT(*) FROM students s WHERE s.group_id = g.id) AS student_count
         FROM groups g
         ORDER BY g.course, g.name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(GroupRow {
                id: row.get(0)?,
                name: row.get(1)?,
                course: row.get(2)?,
                student_count: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn add(conn: &Connection, name: &str, course: i64) -> DataResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DataError::InvalidInput(
            "group name must not be empty".to_string(),
        ));
    }
    if !(1..=4).contains(&course) {
        return Err(DataError::InvalidInput(
            "course must be between 1 and 4".to_string(),
        ));
    }

    let taken: Option<i64> = conn
        .query_row("SELECT 1 FROM groups WHERE name = ?", [name], |r| r.get(0))
        .optional()?;
    if taken.is_some() {
        return Err(DataError::DuplicateName("group"));
    }

    let group_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO groups(id, name, course) VALUES(?, ?, ?)",
        (&group_id, name, course),
    )?;
    Ok(group_id)
}

/// Without `cascade`, a group that still has students is refused with the
/// dependent count so the caller can offer delete-all or transfer. With
/// `cascade`, the students and their attendance rows go with the group in one
/// transaction.
pub fn delete(conn: &Connection, group_id: &str, cascade: bool) -> DataResult<()> {
    if !exists(conn, group_id)? {
        return Err(DataError::NotFound("group"));
    }
    let student_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE group_id = ?",
        [group_id],
        |r| r.get(0),
    )?;
    if student_count > 0 && !cascade {
        return Err(DataError::HasDependents(student_count));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM attendance
         WHERE student_id IN (SELECT id FROM students WHERE group_id = ?)",
        [group_id],
    )?;
    tx.execute("DELETE FROM students WHERE group_id = ?", [group_id])?;
    tx.execute("DELETE FROM groups WHERE id = ?", [group_id])?;
    tx.commit()?;
    Ok(())
}

/// Reassign every student of `old_id` to `new_id`, then delete `old_id`.
/// All-or-nothing; returns the number of students moved.
pub fn transfer_and_delete(conn: &Connection, old_id: &str, new_id: &str) -> DataResult<i64> {
    if old_id == new_id {
        return Err(DataError::InvalidInput(
            "target group must differ from the group being deleted".to_string(),
        ));
    }
    if !exists(conn, old_id)? || !exists(conn, new_id)? {
        return Err(DataError::NotFound("group"));
    }

    let tx = conn.unchecked_transaction()?;
    let moved = tx.execute(
        "UPDATE students SET group_id = ? WHERE group_id = ?",
        (new_id, old_id),
    )?;
    tx.execute("DELETE FROM groups WHERE id = ?", [old_id])?;
    tx.commit()?;
    Ok(moved as i64)
}

pub(crate) fn exists(conn: &Connection, group_id: &str) -> DataResult<bool> {
    let row: Option<i64> = conn
        .query_row("SELECT 1 FROM groups WHERE id = ?", [group_id], |r| r.get(0))
        .optional()?;
    Ok(row.is_some())
}
