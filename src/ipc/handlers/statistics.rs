use crate::ipc::error::{data_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::stats::{self, Band};
use serde_json::json;

fn handle_statistics_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(start_date) = req.params.get("startDate").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing startDate", None);
    };
    let Some(end_date) = req.params.get("endDate").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing endDate", None);
    };
    let group_id = req.params.get("groupId").and_then(|v| v.as_str());
    let subject_id = req.params.get("subjectId").and_then(|v| v.as_str());
    let lesson_number = req.params.get("lessonNumber").and_then(|v| v.as_i64());

    match stats::compute(conn, start_date, end_date, group_id, subject_id, lesson_number) {
        Ok(report) => {
            let rows_json: Vec<serde_json::Value> = report
                .rows
                .iter()
                .map(|r| {
                    json!({
                        "studentId": r.student_id,
                        "surname": r.surname,
                        "name": r.name,
                        "groupName": r.group_name,
                        "present": r.present,
                        "late": r.late,
                        "sick": r.sick,
                        "absent": r.absent,
                        "total": r.total,
                        "percent": r.percent,
                        "band": Band::of(r.percent).as_str()
                    })
                })
                .collect();
            let totals = &report.totals;
            ok(
                &req.id,
                json!({
                    "rows": rows_json,
                    "totals": {
                        "present": totals.present,
                        "late": totals.late,
                        "sick": totals.sick,
                        "absent": totals.absent,
                        "total": totals.total,
                        "percent": totals.percent,
                        "band": Band::of(totals.percent).as_str()
                    }
                }),
            )
        }
        Err(e) => data_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "statistics.compute" => Some(handle_statistics_compute(state, req)),
        _ => None,
    }
}
