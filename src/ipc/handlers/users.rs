use crate::ipc::error::{data_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::users;
use serde_json::json;

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match users::list(conn) {
        Ok(rows) => {
            // Passwords are part of the admin-panel contract here; the system
            // this replaces stored and displayed them in the clear.
            let users_json: Vec<serde_json::Value> = rows
                .iter()
                .map(|u| {
                    json!({
                        "username": u.username,
                        "password": u.password,
                        "role": u.role.as_str()
                    })
                })
                .collect();
            ok(&req.id, json!({ "users": users_json }))
        }
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(username) = req.params.get("username").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing username", None);
    };
    let Some(password) = req.params.get("password").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing password", None);
    };
    let Some(role) = req.params.get("role").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing role", None);
    };

    match users::add(conn, username, password, role) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(username) = req.params.get("username").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing username", None);
    };

    match users::delete(conn, username) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => data_err(&req.id, e),
    }
}

fn handle_auth_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(username) = req.params.get("username").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing username", None);
    };
    let Some(password) = req.params.get("password").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing password", None);
    };

    match users::authenticate(conn, username, password) {
        Ok(Some(role)) => ok(&req.id, json!({ "role": role.as_str() })),
        Ok(None) => err(&req.id, "auth_failed", "invalid username or password", None),
        Err(e) => data_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.list" => Some(handle_users_list(state, req)),
        "users.create" => Some(handle_users_create(state, req)),
        "users.delete" => Some(handle_users_delete(state, req)),
        "auth.login" => Some(handle_auth_login(state, req)),
        _ => None,
    }
}
