use rusqlite::{Connection, OptionalExtension};

use crate::error::{DataError, DataResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub username: String,
    pub password: String,
    pub role: Role,
}

pub fn list(conn: &Connection) -> DataResult<Vec<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT username, password, role FROM users ORDER BY username")?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::with_capacity(raw.len());
    for (username, password, role) in raw {
        let role = Role::parse(&role).ok_or_else(|| {
            DataError::InvalidInput(format!("user '{}' has unrecognized role '{}'", username, role))
        })?;
        rows.push(UserRow {
            username,
            password,
            role,
        });
    }
    Ok(rows)
}

pub fn add(conn: &Connection, username: &str, password: &str, role: &str) -> DataResult<()> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(DataError::InvalidInput(
            "username and password must not be empty".to_string(),
        ));
    }
    let Some(role) = Role::parse(role) else {
        return Err(DataError::InvalidInput(
            "role must be admin or user".to_string(),
        ));
    };

    let taken: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE username = ?", [username], |r| {
            r.get(0)
        })
        .optional()?;
    if taken.is_some() {
        return Err(DataError::DuplicateName("user"));
    }

    conn.execute(
        "INSERT INTO users(username, password, role) VALUES(?, ?, ?)",
        (username, password, role.as_str()),
    )?;
    Ok(())
}

/// The system must always keep at least one admin account; deleting the last
/// one is refused.
pub fn delete(conn: &Connection, username: &str) -> DataResult<()> {
    let role: Option<String> = conn
        .query_row(
            "SELECT role FROM users WHERE username = ?",
            [username],
            |r| r.get(0),
        )
        .optional()?;
    let Some(role) = role else {
        return Err(DataError::NotFound("user"));
    };

    if role == Role::Admin.as_str() {
        let admin_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |r| r.get(0),
        )?;
        if admin_count == 1 {
            return Err(DataError::LastAdminProtected);
        }
    }

    conn.execute("DELETE FROM users WHERE username = ?", [username])?;
    Ok(())
}

/// Plain-text credential comparison, as the system it replaces did. Returns
/// the role on an exact match, `None` otherwise.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> DataResult<Option<Role>> {
    let role: Option<String> = conn
        .query_row(
            "SELECT role FROM users WHERE username = ? AND password = ?",
            (username, password),
            |r| r.get(0),
        )
        .optional()?;
    Ok(role.as_deref().and_then(Role::parse))
}
