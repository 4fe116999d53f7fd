use serde_json::json;

use crate::error::DataError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// One place maps the store's failure taxonomy onto wire codes, so every
/// handler surfaces identical envelopes for identical failures.
pub fn data_err(id: &str, e: DataError) -> serde_json::Value {
    let message = e.to_string();
    match e {
        DataError::InvalidInput(_) => err(id, "invalid_input", message, None),
        DataError::NotFound(_) => err(id, "not_found", message, None),
        DataError::DuplicateName(_) => err(id, "duplicate_name", message, None),
        DataError::HasDependents(count) => err(
            id,
            "has_dependents",
            message,
            Some(json!({ "studentCount": count })),
        ),
        DataError::LastAdminProtected => err(id, "last_admin_protected", message, None),
        DataError::Storage(_) => err(id, "storage_failure", message, None),
    }
}
