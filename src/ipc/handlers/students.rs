use serde_json::json;
use uuid::Uuid;

use crate::db;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::{Nivel, Student};

fn parse_nivel(raw: &str) -> Result<Nivel, HandlerErr> {
    Nivel::parse(raw).ok_or_else(|| {
        HandlerErr::bad_params("unknown nivel").with_details(json!({ "nivel": raw }))
    })
}

fn students_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let nivel = match params.get("nivel").and_then(|v| v.as_str()) {
        Some(raw) => Some(parse_nivel(raw)?),
        None => None,
    };
    let students: Vec<&Student> = state
        .session
        .roster
        .iter()
        .filter(|s| nivel.map_or(true, |n| s.nivel == n))
        .collect();
    Ok(json!({ "students": students }))
}

fn students_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let nombre = get_required_str(params, "nombre")?;
    let nivel = parse_nivel(&get_required_str(params, "nivel")?)?;
    let student = Student {
        id: Uuid::new_v4().to_string(),
        nombre,
        nivel,
        activo: params.get("activo").and_then(|v| v.as_bool()).unwrap_or(true),
        sort_order: params
            .get("sortOrder")
            .and_then(|v| v.as_i64())
            .unwrap_or(state.session.roster.len() as i64),
    };
    db::insert_student(conn, &student).map_err(HandlerErr::db)?;
    state.session.roster.push(student.clone());
    Ok(json!({ "student": student }))
}

fn students_update(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let id = get_required_str(params, "id")?;
    let Some(pos) = state.session.roster.iter().position(|s| s.id == id) else {
        return Err(HandlerErr::new("not_found", "student not found"));
    };
    let mut student = state.session.roster[pos].clone();
    if let Some(nombre) = get_optional_str(params, "nombre") {
        student.nombre = nombre;
    }
    if let Some(raw) = params.get("nivel").and_then(|v| v.as_str()) {
        student.nivel = parse_nivel(raw)?;
    }
    if let Some(activo) = params.get("activo").and_then(|v| v.as_bool()) {
        student.activo = activo;
    }
    if let Some(sort_order) = params.get("sortOrder").and_then(|v| v.as_i64()) {
        student.sort_order = sort_order;
    }
    if !db::update_student(conn, &student).map_err(HandlerErr::db)? {
        return Err(HandlerErr::new("not_found", "student not found"));
    }
    state.session.roster[pos] = student.clone();
    Ok(json!({ "student": student }))
}

fn students_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let id = get_required_str(params, "id")?;
    if !db::delete_student(conn, &id).map_err(HandlerErr::db)? {
        return Err(HandlerErr::new("not_found", "student not found"));
    }
    state.session.roster.retain(|s| s.id != id);
    Ok(json!({ "ok": true }))
}

fn subjects_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "subjects": state.session.subjects }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state, &req.params),
        "students.create" => students_create(state, &req.params),
        "students.update" => students_update(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        "subjects.list" => subjects_list(state),
        _ => return None,
    };
    Some(match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    })
}
