use serde_json::json;
use std::path::PathBuf;

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{Actor, AppState, Request, Role, Session};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Opens (or creates) the workspace database and hydrates a fresh session:
/// roster, subject catalog, and the three record stores. A failed hydration
/// leaves the previous session untouched.
fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let conn = match db::open_db(&path) {
        Ok(conn) => conn,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };

    let mut session = Session::default();
    let hydrated = db::list_students(&conn)
        .and_then(|roster| {
            session.roster = roster;
            db::list_subjects(&conn)
        })
        .and_then(|subjects| {
            session.subjects = subjects;
            db::hydrate_attendance(&conn)
        })
        .and_then(|attendance| {
            for r in attendance {
                session.attendance.upsert(r);
            }
            db::hydrate_grades(&conn)
        })
        .and_then(|grades| {
            for r in grades {
                session.grades.upsert(r);
            }
            db::hydrate_payments(&conn)
        })
        .map(|payments| {
            for r in payments {
                session.payments.upsert(r);
            }
        });
    if let Err(e) = hydrated {
        return err(&req.id, "db_query_failed", e.to_string(), None);
    }

    state.workspace = Some(path.clone());
    state.db = Some(conn);
    state.session = session;
    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "students": state.session.roster.len(),
            "attendanceRecords": state.session.attendance.len(),
            "gradeRecords": state.session.grades.len(),
            "paymentRecords": state.session.payments.len()
        }),
    )
}

fn handle_session_set_actor(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match get_required_str(&req.params, "id") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let display_name = match get_required_str(&req.params, "displayName") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let role_raw = match get_required_str(&req.params, "role") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(role) = Role::parse(&role_raw) else {
        return err(
            &req.id,
            "bad_params",
            "role must be admin or teacher",
            Some(json!({ "role": role_raw })),
        );
    };
    state.actor = Some(Actor {
        id,
        display_name,
        role,
    });
    ok(&req.id, json!({ "ok": true }))
}

fn handle_session_current_actor(state: &mut AppState, req: &Request) -> serde_json::Value {
    let actor = state.actor.as_ref().map(|a| {
        json!({
            "id": a.id,
            "displayName": a.display_name,
            "role": a.role.as_str()
        })
    });
    ok(&req.id, json!({ "actor": actor }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "session.setActor" => Some(handle_session_set_actor(state, req)),
        "session.currentActor" => Some(handle_session_current_actor(state, req)),
        _ => None,
    }
}
