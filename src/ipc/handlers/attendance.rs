use crate::ipc::error::{data_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::attendance;
use serde_json::json;

fn handle_attendance_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(date) = req.params.get("date").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing date", None);
    };
    let Some(lesson_number) = req.params.get("lessonNumber").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing lessonNumber", None);
    };
    let group_id = req.params.get("groupId").and_then(|v| v.as_str());
    let subject_id = req.params.get("subjectId").and_then(|v| v.as_str());

    match attendance::sheet(conn, date, lesson_number, group_id, subject_id) {
        Ok(records) => {
            let mut records_json = serde_json::Map::new();
            for (student_id, status) in records {
                records_json.insert(student_id, json!(status.as_str()));
            }
            ok(&req.id, json!({ "records": records_json }))
        }
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_attendance_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(date) = req.params.get("date").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing date", None);
    };
    let Some(lesson_number) = req.params.get("lessonNumber").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing lessonNumber", None);
    };
    let Some(status) = req.params.get("status").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing status", None);
    };
    let subject_id = req.params.get("subjectId").and_then(|v| v.as_str());

    match attendance::save(conn, student_id, date, lesson_number, status, subject_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.sheet" => Some(handle_attendance_sheet(state, req)),
        "attendance.save" => Some(handle_attendance_save(state, req)),
        _ => None,
    }
}
