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
fn last_admin_cannot_be_deleted() {
    let workspace = temp_dir("attendanced-last-admin");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "users.create",
        json!({ "username": "root", "password": "toor", "role": "admin" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "users.create",
        json!({ "username": "second", "password": "pw", "role": "admin" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "users.create",
        json!({ "username": "teacher", "password": "pw", "role": "user" }),
    );

    // With two admins, deleting one is fine.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "users.delete",
        json!({ "username": "second" }),
    );

    let blocked = request(
        &mut stdin,
        &mut reader,
        "6",
        "users.delete",
        json!({ "username": "root" }),
    );
    assert_eq!(error_code(&blocked), "last_admin_protected");

    // Non-admins are never protected.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "users.delete",
        json!({ "username": "teacher" }),
    );

    let listed = request_ok(&mut stdin, &mut reader, "8", "users.list", json!({}));
    let users = listed.get("users").and_then(|v| v.as_array()).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].get("username").and_then(|v| v.as_str()), Some("root"));
    assert_eq!(users[0].get("role").and_then(|v| v.as_str()), Some("admin"));
}

#[test]
fn account_validation_and_login() {
    let workspace = temp_dir("attendanced-auth");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "users.create",
        json!({ "username": "root", "password": "toor", "role": "admin" }),
    );

    let dup = request(
        &mut stdin,
        &mut reader,
        "3",
        "users.create",
        json!({ "username": "root", "password": "other", "role": "user" }),
    );
    assert_eq!(error_code(&dup), "duplicate_name");

    let bad_role = request(
        &mut stdin,
        &mut reader,
        "4",
        "users.create",
        json!({ "username": "x", "password": "y", "role": "superadmin" }),
    );
    assert_eq!(error_code(&bad_role), "invalid_input");

    let empty_password = request(
        &mut stdin,
        &mut reader,
        "5",
        "users.create",
        json!({ "username": "x", "password": "", "role": "user" }),
    );
    assert_eq!(error_code(&empty_password), "invalid_input");

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "auth.login",
        json!({ "username": "root", "password": "toor" }),
    );
    assert_eq!(login.get("role").and_then(|v| v.as_str()), Some("admin"));

    let wrong = request(
        &mut stdin,
        &mut reader,
        "7",
        "auth.login",
        json!({ "username": "root", "password": "wrong" }),
    );
    assert_eq!(error_code(&wrong), "auth_failed");

    let unknown = request(
        &mut stdin,
        &mut reader,
        "8",
        "auth.login",
        json!({ "username": "ghost", "password": "toor" }),
    );
    assert_eq!(error_code(&unknown), "auth_failed");

    let missing = request(
        &mut stdin,
        &mut reader,
        "9",
        "users.delete",
        json!({ "username": "ghost" }),
    );
    assert_eq!(error_code(&missing), "not_found");
}
