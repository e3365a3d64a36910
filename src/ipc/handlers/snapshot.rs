use serde_json::json;
use std::path::PathBuf;

use crate::calc;
use crate::db;
use crate::export::{export_snapshot, import_snapshot, SnapshotData};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, hoy_or_today, parse_fecha, HandlerErr};
use crate::ipc::types::{AppState, Request, Session};

fn session_data(state: &AppState) -> SnapshotData {
    SnapshotData {
        students: state.session.roster.clone(),
        subjects: state.session.subjects.clone(),
        attendance: state.session.attendance.all(|_| true).into_iter().cloned().collect(),
        grades: state.session.grades.all(|_| true).into_iter().cloned().collect(),
        payments: state.session.payments.all(|_| true).into_iter().cloned().collect(),
    }
}

/// Plain-data view for the external print/PDF renderer: committed record
/// lists plus the derived aggregates, nothing presentational.
fn report(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let hoy = hoy_or_today(params)?;
    let fecha = params
        .get("fecha")
        .and_then(|v| v.as_str())
        .map(|raw| parse_fecha(raw, "fecha"))
        .transpose()?;

    let attendance = match fecha {
        Some(f) => state.session.attendance.in_scope(&f),
        None => state.session.attendance.all(|_| true),
    };
    let attendance_summary = calc::attendance_summary(attendance.iter().copied());

    let payments = state.session.payments.all(|_| true);
    let payment_vistas: Vec<_> = payments
        .iter()
        .map(|r| {
            let mut vista = (*r).clone();
            vista.recompute_estado(hoy);
            vista
        })
        .collect();
    let payment_summary = calc::payment_totals(payment_vistas.iter());

    Ok(json!({
        "students": state.session.roster,
        "attendance": { "records": attendance, "summary": attendance_summary },
        "payments": { "records": payment_vistas, "summary": payment_summary },
        "grades": { "records": state.session.grades.all(|_| true) },
    }))
}

fn export(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    if state.db.is_none() {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    }
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let summary = export_snapshot(&session_data(state), &out_path)
        .map_err(|e| HandlerErr::new("export_failed", e.to_string()))?;
    Ok(json!({
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "outPath": out_path.to_string_lossy(),
    }))
}

/// Replaces the whole workspace with a bundle's content, then rehydrates the
/// session from what actually landed in the database.
fn import(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let in_path = PathBuf::from(get_required_str(params, "inPath")?);
    let data = import_snapshot(&in_path)
        .map_err(|e| HandlerErr::new("import_failed", e.to_string()))?;

    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    db::restore_snapshot(conn, &data).map_err(HandlerErr::db)?;

    let mut session = Session::default();
    session.roster = db::list_students(conn).map_err(HandlerErr::db)?;
    session.subjects = db::list_subjects(conn).map_err(HandlerErr::db)?;
    for r in db::hydrate_attendance(conn).map_err(HandlerErr::db)? {
        session.attendance.upsert(r);
    }
    for r in db::hydrate_grades(conn).map_err(HandlerErr::db)? {
        session.grades.upsert(r);
    }
    for r in db::hydrate_payments(conn).map_err(HandlerErr::db)? {
        session.payments.upsert(r);
    }
    state.session = session;

    Ok(json!({
        "students": state.session.roster.len(),
        "attendanceRecords": state.session.attendance.len(),
        "gradeRecords": state.session.grades.len(),
        "paymentRecords": state.session.payments.len(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "report.snapshot" => report(state, &req.params),
        "snapshot.export" => export(state, &req.params),
        "snapshot.import" => import(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    })
}
