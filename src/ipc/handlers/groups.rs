use crate::ipc::error::{data_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::groups;
use serde_json::json;

fn handle_groups_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match groups::list(conn) {
        Ok(rows) => {
            let groups_json: Vec<serde_json::Value> = rows
                .iter()
                .map(|g| {
                    json!({
                        "id": g.id,
                        "name": g.name,
                        "course": g.course,
                        "studentCount": g.student_count
                    })
                })
                .collect();
            ok(&req.id, json!({ "groups": groups_json }))
        }
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_groups_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    let Some(course) = req.params.get("course").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing course", None);
    };

    match groups::add(conn, name, course) {
        Ok(group_id) => ok(&req.id, json!({ "groupId": group_id })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_groups_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(group_id) = req.params.get("groupId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing groupId", None);
    };
    let cascade = req
        .params
        .get("cascade")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    match groups::delete(conn, group_id, cascade) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_groups_transfer_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(old_group_id) = req.params.get("oldGroupId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing oldGroupId", None);
    };
    let Some(new_group_id) = req.params.get("newGroupId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing newGroupId", None);
    };

    match groups::transfer_and_delete(conn, old_group_id, new_group_id) {
        Ok(moved) => ok(&req.id, json!({ "movedStudents": moved })),
        Err(e) => data_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "groups.list" => Some(handle_groups_list(state, req)),
        "groups.create" => Some(handle_groups_create(state, req)),
        "groups.delete" => Some(handle_groups_delete(state, req)),
        "groups.transferDelete" => Some(handle_groups_transfer_delete(state, req)),
        _ => None,
    }
}
