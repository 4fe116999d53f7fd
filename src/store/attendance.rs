use std::collections::HashMap;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::error::{DataError, DataResult};
use crate::store::{check_lesson_number, parse_date, students, subjects};

/// The closed set of per-lesson outcomes. Anything else is rejected at the
/// boundary; the database never holds another string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Late,
    Sick,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Sick => "sick",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn parse(s: &str) -> Option<AttendanceStatus> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "late" => Some(AttendanceStatus::Late),
            "sick" => Some(AttendanceStatus::Sick),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

/// Recorded statuses for one date/lesson slot, keyed by student id. A student
/// missing from the map has no record yet; callers apply their own default
/// (the sheet UIs preselect `present`).
pub fn sheet(
    conn: &Connection,
    date: &str,
    lesson_number: i64,
    group_id: Option<&str>,
    subject_id: Option<&str>,
) -> DataResult<HashMap<String, AttendanceStatus>> {
    parse_date(date)?;
    check_lesson_number(lesson_number)?;

    let mut sql = String::from(
        "SELECT a.student_id, a.status
         FROM attendance a
         WHERE a.date = ? AND a.lesson_number = ?",
    );
    let mut params: Vec<Value> = vec![
        Value::Text(date.to_string()),
        Value::Integer(lesson_number),
    ];
    if let Some(gid) = group_id {
        sql.push_str(" AND a.student_id IN (SELECT id FROM students WHERE group_id = ?)");
        params.push(Value::Text(gid.to_string()));
    }
    if let Some(sid) = subject_id {
        sql.push_str(" AND a.subject_id = ?");
        params.push(Value::Text(sid.to_string()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt
        .query_map(params_from_iter(params), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = HashMap::with_capacity(raw.len());
    for (student_id, status) in raw {
        let status = AttendanceStatus::parse(&status).ok_or_else(|| {
            DataError::InvalidInput(format!("attendance row holds unrecognized status '{}'", status))
        })?;
        records.insert(student_id, status);
    }
    Ok(records)
}

/// Upsert keyed by (student, date, lesson): a second save for the same slot
/// replaces status and subject, never duplicates.
pub fn save(
    conn: &Connection,
    student_id: &str,
    date: &str,
    lesson_number: i64,
    status: &str,
    subject_id: Option<&str>,
) -> DataResult<()> {
    let Some(status) = AttendanceStatus::parse(status) else {
        return Err(DataError::InvalidInput(
            "status must be one of present, late, sick, absent".to_string(),
        ));
    };
    parse_date(date)?;
    check_lesson_number(lesson_number)?;
    if !students::exists(conn, student_id)? {
        return Err(DataError::NotFound("student"));
    }
    if let Some(sid) = subject_id {
        if !subjects::exists(conn, sid)? {
            return Err(DataError::NotFound("subject"));
        }
    }

    conn.execute(
        "INSERT INTO attendance(student_id, date, lesson_number, subject_id, status)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(student_id, date, lesson_number) DO UPDATE SET
           subject_id = excluded.subject_id,
           status = excluded.status",
        (student_id, date, lesson_number, subject_id, status.as_str()),
    )?;
    Ok(())
}
