use crate::ipc::error::{data_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::subjects;
use serde_json::json;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match subjects::list(conn) {
        Ok(rows) => {
            let subjects_json: Vec<serde_json::Value> = rows
                .iter()
                .map(|s| {
                    json!({
                        "id": s.id,
                        "name": s.name,
                        "description": s.description
                    })
                })
                .collect();
            ok(&req.id, json!({ "subjects": subjects_json }))
        }
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    let description = req.params.get("description").and_then(|v| v.as_str());

    match subjects::add(conn, name, description) {
        Ok(subject_id) => ok(&req.id, json!({ "subjectId": subject_id })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_subjects_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(subject_id) = req.params.get("subjectId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing subjectId", None);
    };
    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    let description = req.params.get("description").and_then(|v| v.as_str());

    match subjects::update(conn, subject_id, name, description) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(subject_id) = req.params.get("subjectId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing subjectId", None);
    };

    match subjects::delete(conn, subject_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.update" => Some(handle_subjects_update(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}
