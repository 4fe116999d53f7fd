use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("university.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Idempotent schema pass. Safe on every startup; must run before any other
/// operation touches the database file.
pub fn ensure_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS groups(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            course INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;
    // Databases from before the course column existed get it added with the
    // legacy default; existing rows are untouched.
    ensure_groups_course(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            surname TEXT NOT NULL,
            name TEXT NOT NULL,
            middle_name TEXT,
            group_id TEXT,
            is_nonresident INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(group_id) REFERENCES groups(id)
        )",
        [],
    )?;
    ensure_students_middle_name(conn)?;
    ensure_students_is_nonresident(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_group ON students(group_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            lesson_number INTEGER NOT NULL,
            subject_id TEXT,
            status TEXT NOT NULL,
            PRIMARY KEY(student_id, date, lesson_number),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date, lesson_number)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_subject ON attendance(subject_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            username TEXT PRIMARY KEY,
            password TEXT NOT NULL,
            role TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn ensure_groups_course(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "groups", "course")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE groups ADD COLUMN course INTEGER NOT NULL DEFAULT 1",
        [],
    )?;
    Ok(())
}

fn ensure_students_middle_name(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "middle_name")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE students ADD COLUMN middle_name TEXT", [])?;
    Ok(())
}

fn ensure_students_is_nonresident(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "is_nonresident")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE students ADD COLUMN is_nonresident INTEGER NOT NULL DEFAULT 0",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
