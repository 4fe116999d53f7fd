use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendanced");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendanced");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .expect("error code")
}

#[test]
fn roster_create_list_and_flags() {
    let workspace = temp_dir("attendanced-roster");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let group = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "groups.create",
        json!({ "name": "CS-101", "course": 1 }),
    );
    let group_id = group.get("groupId").and_then(|v| v.as_str()).unwrap().to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({
            "surname": "Petrov",
            "name": "Petr",
            "middleName": "  ",
            "groupId": group_id
        }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({
            "surname": "Ivanov",
            "name": "Ivan",
            "middleName": "Ivanovich",
            "groupId": group_id,
            "isNonresident": true
        }),
    );
    let ivanov_id = created
        .get("studentId")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.list",
        json!({ "groupId": group_id }),
    );
    let students = listed.get("students").and_then(|v| v.as_array()).unwrap();
    assert_eq!(students.len(), 2);
    // Ordered by surname: Ivanov before Petrov.
    assert_eq!(
        students[0].get("surname").and_then(|v| v.as_str()),
        Some("Ivanov")
    );
    assert_eq!(
        students[0].get("middleName").and_then(|v| v.as_str()),
        Some("Ivanovich")
    );
    assert_eq!(
        students[0].get("isNonresident").and_then(|v| v.as_bool()),
        Some(true)
    );
    assert_eq!(
        students[0].get("groupName").and_then(|v| v.as_str()),
        Some("CS-101")
    );
    // Blank middle name collapses to null.
    assert!(students[1].get("middleName").map(|v| v.is_null()).unwrap_or(false));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.setNonresident",
        json!({ "studentId": ivanov_id, "isNonresident": false }),
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "groupId": group_id }),
    );
    let students = listed.get("students").and_then(|v| v.as_array()).unwrap();
    assert_eq!(
        students[0].get("isNonresident").and_then(|v| v.as_bool()),
        Some(false)
    );
}

#[test]
fn roster_validation_and_missing_ids() {
    let workspace = temp_dir("attendanced-roster-validation");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let group = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "groups.create",
        json!({ "name": "CS-101", "course": 1 }),
    );
    let group_id = group.get("groupId").and_then(|v| v.as_str()).unwrap().to_string();

    let blank = request(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "surname": " ", "name": "Ivan", "groupId": group_id }),
    );
    assert_eq!(error_code(&blank), "invalid_input");

    let orphan = request(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({ "surname": "Ivanov", "name": "Ivan", "groupId": "no-such-group" }),
    );
    assert_eq!(error_code(&orphan), "invalid_input");

    let missing_delete = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.delete",
        json!({ "studentId": "no-such-student" }),
    );
    assert_eq!(error_code(&missing_delete), "not_found");

    let missing_flag = request(
        &mut stdin,
        &mut reader,
        "6",
        "students.setNonresident",
        json!({ "studentId": "no-such-student", "isNonresident": true }),
    );
    assert_eq!(error_code(&missing_flag), "not_found");
}

#[test]
fn transfer_moves_one_student_between_groups() {
    let workspace = temp_dir("attendanced-roster-transfer");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let a = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "groups.create",
        json!({ "name": "CS-101", "course": 1 }),
    );
    let a_id = a.get("groupId").and_then(|v| v.as_str()).unwrap().to_string();
    let b = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "groups.create",
        json!({ "name": "CS-102", "course": 1 }),
    );
    let b_id = b.get("groupId").and_then(|v| v.as_str()).unwrap().to_string();

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({ "surname": "Ivanov", "name": "Ivan", "groupId": a_id }),
    );
    let student_id = created
        .get("studentId")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();

    let bad_target = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.transfer",
        json!({ "studentId": student_id, "newGroupId": "no-such-group" }),
    );
    assert_eq!(error_code(&bad_target), "not_found");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.transfer",
        json!({ "studentId": student_id, "newGroupId": b_id }),
    );

    let in_a = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "groupId": a_id }),
    );
    assert_eq!(
        in_a.get("students").and_then(|v| v.as_array()).map(|v| v.len()),
        Some(0)
    );
    let in_b = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.list",
        json!({ "groupId": b_id }),
    );
    assert_eq!(
        in_b.get("students").and_then(|v| v.as_array()).map(|v| v.len()),
        Some(1)
    );
}

#[test]
fn delete_is_a_hard_delete() {
    let workspace = temp_dir("attendanced-roster-delete");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let group = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "groups.create",
        json!({ "name": "CS-101", "course": 1 }),
    );
    let group_id = group.get("groupId").and_then(|v| v.as_str()).unwrap().to_string();
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "surname": "Ivanov", "name": "Ivan", "groupId": group_id }),
    );
    let student_id = created
        .get("studentId")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.delete",
        json!({ "studentId": student_id }),
    );

    // Gone from every listing, not just detached from its group.
    let all = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    assert_eq!(
        all.get("students").and_then(|v| v.as_array()).map(|v| v.len()),
        Some(0)
    );
    let listed = request_ok(&mut stdin, &mut reader, "6", "groups.list", json!({}));
    let groups = listed.get("groups").and_then(|v| v.as_array()).unwrap();
    assert_eq!(groups[0].get("studentCount").and_then(|v| v.as_i64()), Some(0));
}
