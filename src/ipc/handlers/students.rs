use crate::ipc::error::{data_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::students;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let group_id = req.params.get("groupId").and_then(|v| v.as_str());

    match students::list(conn, group_id) {
        Ok(rows) => {
            let students_json: Vec<serde_json::Value> = rows
                .iter()
                .map(|s| {
                    json!({
                        "id": s.id,
                        "surname": s.surname,
                        "name": s.name,
                        "middleName": s.middle_name,
                        "groupName": s.group_name,
                        "isNonresident": s.is_nonresident
                    })
                })
                .collect();
            ok(&req.id, json!({ "students": students_json }))
        }
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(surname) = req.params.get("surname").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing surname", None);
    };
    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    let Some(group_id) = req.params.get("groupId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing groupId", None);
    };
    let middle_name = req.params.get("middleName").and_then(|v| v.as_str());
    let is_nonresident = req
        .params
        .get("isNonresident")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    match students::add(conn, surname, name, middle_name, group_id, is_nonresident) {
        Ok(student_id) => ok(&req.id, json!({ "studentId": student_id })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };

    match students::delete(conn, student_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_students_transfer(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(new_group_id) = req.params.get("newGroupId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing newGroupId", None);
    };

    match students::transfer(conn, student_id, new_group_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_students_set_nonresident(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(flag) = req.params.get("isNonresident").and_then(|v| v.as_bool()) else {
        return err(&req.id, "bad_params", "missing isNonresident", None);
    };

    match students::set_nonresident(conn, student_id, flag) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.transfer" => Some(handle_students_transfer(state, req)),
        "students.setNonresident" => Some(handle_students_set_nonresident(state, req)),
        _ => None,
    }
}
