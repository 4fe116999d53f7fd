use thiserror::Error;

/// Failures the store layer can hand back to a caller. Everything here is a
/// per-call outcome; nothing aborts the process. Raw rusqlite errors only
/// cross the store boundary wrapped as `Storage`.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("a {0} with that name already exists")]
    DuplicateName(&'static str),

    /// Delete blocked by dependent students; carries the count so the caller
    /// can offer cascade or transfer.
    #[error("group still has {0} students")]
    HasDependents(i64),

    #[error("cannot delete the last admin account")]
    LastAdminProtected,

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type DataResult<T> = Result<T, DataError>;
