use rusqlite::{params, Connection};

use crate::error::{DataError, DataResult};
use crate::store::{check_lesson_number, parse_date};

#[derive(Debug, Clone)]
pub struct StudentStats {
    pub student_id: String,
    pub surname: String,
    pub name: String,
    pub group_name: String,
    pub present: i64,
    pub late: i64,
    pub sick: i64,
    pub absent: i64,
    pub total: i64,
    pub percent: f64,
}

#[derive(Debug, Clone)]
pub struct StatsTotals {
    pub present: i64,
    pub late: i64,
    pub sick: i64,
    pub absent: i64,
    pub total: i64,
    pub percent: f64,
}

#[derive(Debug, Clone)]
pub struct StatisticsReport {
    pub rows: Vec<StudentStats>,
    pub totals: StatsTotals,
}

/// Presentation band for a percentage. Every consumer that colors rows must
/// agree on these cut-offs, so the classification lives here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Critical,
    Warning,
    Good,
}

impl Band {
    pub fn of(percent: f64) -> Band {
        if percent < 70.0 {
            Band::Critical
        } else if percent < 90.0 {
            Band::Warning
        } else {
            Band::Good
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Band::Critical => "critical",
            Band::Warning => "warning",
            Band::Good => "good",
        }
    }
}

/// Share of attended lessons (present + late both count), rounded to one
/// decimal. Zero when there is nothing to count.
pub fn attendance_percent(attended: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round1(100.0 * attended as f64 / total as f64)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Per-student attendance counts over an inclusive date range, with optional
/// group/subject/lesson narrowing. Every grouped student in scope appears,
/// zeroed when nothing matched; ungrouped students are out of scope. The
/// totals row is computed over the summed counts, not averaged percentages.
pub fn compute(
    conn: &Connection,
    start_date: &str,
    end_date: &str,
    group_id: Option<&str>,
    subject_id: Option<&str>,
    lesson_number: Option<i64>,
) -> DataResult<StatisticsReport> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    if start > end {
        return Err(DataError::InvalidInput(
            "start date must not be after end date".to_string(),
        ));
    }
    if let Some(n) = lesson_number {
        check_lesson_number(n)?;
    }

    let mut stmt = conn.prepare(
        "SELECT
           s.id,
           s.surname,
           s.name,
           g.name,
           SUM(CASE WHEN a.status = 'present' THEN 1 ELSE 0 END),
           SUM(CASE WHEN a.status = 'late' THEN 1 ELSE 0 END),
           SUM(CASE WHEN a.status = 'sick' THEN 1 ELSE 0 END),
           SUM(CASE WHEN a.status = 'absent' THEN 1 ELSE 0 END),
           COUNT(a.student_id)
         FROM students s
         JOIN groups g ON g.id = s.group_id
         LEFT JOIN attendance a ON a.student_id = s.id
           AND a.date BETWEEN ?1 AND ?2
           AND (?3 IS NULL OR a.lesson_number = ?3)
           AND (?4 IS NULL OR a.subject_id = ?4)
         WHERE (?5 IS NULL OR s.group_id = ?5)
         GROUP BY s.id, s.surname, s.name, g.name
         ORDER BY g.name, s.surname, s.name",
    )?;

    let rows = stmt
        .query_map(
            params![start_date, end_date, lesson_number, subject_id, group_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    let mut totals = StatsTotals {
        present: 0,
        late: 0,
        sick: 0,
        absent: 0,
        total: 0,
        percent: 0.0,
    };
    for (student_id, surname, name, group_name, present, late, sick, absent, total) in rows {
        totals.present += present;
        totals.late += late;
        totals.sick += sick;
        totals.absent += absent;
        totals.total += total;
        out.push(StudentStats {
            student_id,
            surname,
            name,
            group_name,
            present,
            late,
            sick,
            absent,
            total,
            percent: attendance_percent(present + late, total),
        });
    }
    totals.percent = attendance_percent(totals.present + totals.late, totals.total);

    Ok(StatisticsReport {
        rows: out,
        totals,
    })
}
