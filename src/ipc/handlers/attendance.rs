use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::calc;
use crate::commit::{apply_commit, materialize_scope};
use crate::db;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    ahora_or_now, get_bool, get_optional_str, get_required_fecha, get_required_str, hoy_or_today,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request, Role};
use crate::records::{
    AttendanceRecord, EstadoAsistencia, Justificacion, MotivoJustificacion, Nivel, Student,
};
use crate::validate::{validate_attendance_scope, violations_json};

fn roster_for_nivel<'a>(state: &'a AppState, nivel: Nivel) -> Vec<&'a Student> {
    let mut roster: Vec<&Student> = state
        .session
        .roster
        .iter()
        .filter(|s| s.nivel == nivel)
        .collect();
    roster.sort_by(|a, b| (a.sort_order, &a.nombre).cmp(&(b.sort_order, &b.nombre)));
    roster
}

fn open_fecha(state: &AppState) -> Result<NaiveDate, HandlerErr> {
    state
        .session
        .attendance_drafts
        .open_scope()
        .copied()
        .ok_or_else(|| HandlerErr::new("no_scope", "open an attendance date first"))
}

fn parse_estado(raw: &str) -> Result<EstadoAsistencia, HandlerErr> {
    EstadoAsistencia::parse(raw).ok_or_else(|| {
        HandlerErr::bad_params("unknown estado").with_details(json!({ "estado": raw }))
    })
}

fn student_in_roster(state: &AppState, estudiante_id: &str) -> Result<(), HandlerErr> {
    if state.session.roster.iter().any(|s| s.id == estudiante_id) {
        Ok(())
    } else {
        Err(HandlerErr::new("not_found", "student not found"))
    }
}

fn effective_records_json(state: &AppState, fecha: NaiveDate, nivel: Nivel) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = roster_for_nivel(state, nivel)
        .iter()
        .map(|s| {
            let record = state
                .session
                .attendance
                .get_effective(&state.session.attendance_drafts, &s.id, &fecha);
            json!({
                "estudianteId": s.id,
                "nombre": s.nombre,
                "activo": s.activo,
                "record": record,
            })
        })
        .collect();
    json!(rows)
}

/// Opens the editor for (fecha, nivel) and seeds the overlay from every
/// committed record of that date. Seeding is what keeps the bulk-replace
/// commit from dropping records the user never touched.
fn scope_open(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let fecha = get_required_fecha(params, "fecha")?;
    let nivel = Nivel::parse(&get_required_str(params, "nivel")?)
        .ok_or_else(|| HandlerErr::bad_params("unknown nivel"))?;

    state.session.attendance_drafts.open(fecha);
    state.session.attendance_nivel = Some(nivel);
    let committed: Vec<AttendanceRecord> = state
        .session
        .attendance
        .in_scope(&fecha)
        .into_iter()
        .cloned()
        .collect();
    for r in committed {
        state.session.attendance_drafts.put(r);
    }

    Ok(json!({
        "fecha": fecha.format("%Y-%m-%d").to_string(),
        "nivel": nivel.as_str(),
        "rows": effective_records_json(state, fecha, nivel),
    }))
}

fn set_status(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let fecha = open_fecha(state)?;
    let estudiante_id = get_required_str(params, "estudianteId")?;
    let estado = parse_estado(&get_required_str(params, "estado")?)?;
    student_in_roster(state, &estudiante_id)?;
    let ahora = ahora_or_now(params);

    state.session.attendance_drafts.upsert_with(
        &estudiante_id,
        || AttendanceRecord::draft(&estudiante_id, fecha, estado),
        |r| r.set_estado(estado, &ahora),
    );
    let entry = state
        .session
        .attendance_drafts
        .get(&fecha, &estudiante_id)
        .cloned();
    Ok(json!({ "draft": entry }))
}

fn edit_draft<F>(
    state: &mut AppState,
    estudiante_id: &str,
    edit: F,
) -> Result<serde_json::Value, HandlerErr>
where
    F: FnOnce(&mut AttendanceRecord),
{
    let fecha = open_fecha(state)?;
    student_in_roster(state, estudiante_id)?;
    let Some(entry) = state.session.attendance_drafts.get_mut(estudiante_id) else {
        return Err(HandlerErr::new(
            "no_draft",
            "mark a status for the student first",
        ));
    };
    edit(entry);
    let entry = state
        .session
        .attendance_drafts
        .get(&fecha, estudiante_id)
        .cloned();
    Ok(json!({ "draft": entry }))
}

fn set_arrival_time(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let estudiante_id = get_required_str(params, "estudianteId")?;
    let hora = get_required_str(params, "hora")?;
    edit_draft(state, &estudiante_id, |r| {
        r.hora_llegada = Some(hora.trim().to_string());
    })
}

fn set_observation(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let estudiante_id = get_required_str(params, "estudianteId")?;
    let texto = get_required_str(params, "texto")?;
    edit_draft(state, &estudiante_id, |r| {
        r.observacion = Some(texto.clone());
    })
}

fn attach_justification(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let estudiante_id = get_required_str(params, "estudianteId")?;
    let motivo_raw = get_required_str(params, "motivo")?;
    let motivo = MotivoJustificacion::parse(&motivo_raw).ok_or_else(|| {
        HandlerErr::bad_params("unknown motivo").with_details(json!({ "motivo": motivo_raw }))
    })?;
    let descripcion = get_required_str(params, "descripcion")?;
    if descripcion.trim().is_empty() {
        return Err(HandlerErr::bad_params("descripcion must not be empty"));
    }
    let documento = get_optional_str(params, "documento");

    let justificacion = Justificacion {
        id: Uuid::new_v4().to_string(),
        motivo,
        descripcion,
        documento,
        aprobado_por: None,
        aprobada: false,
    };
    edit_draft(state, &estudiante_id, |r| {
        r.attach_justificacion(justificacion);
    })
}

fn require_admin(state: &AppState) -> Result<String, HandlerErr> {
    match state.actor.as_ref() {
        Some(a) if a.role == Role::Admin => Ok(a.id.clone()),
        Some(_) => Err(HandlerErr::new(
            "forbidden",
            "only an admin can approve justifications",
        )),
        None => Err(HandlerErr::new("no_actor", "set an actor first")),
    }
}

fn approve_justification(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let aprobador = require_admin(state)?;
    let estudiante_id = get_required_str(params, "estudianteId")?;
    let fecha = open_fecha(state)?;
    student_in_roster(state, &estudiante_id)?;
    let Some(entry) = state.session.attendance_drafts.get_mut(&estudiante_id) else {
        return Err(HandlerErr::new("no_draft", "no draft entry for student"));
    };
    let Some(j) = entry.justificacion.as_mut() else {
        return Err(HandlerErr::new("not_found", "draft has no justification"));
    };
    j.aprobada = true;
    j.aprobado_por = Some(aprobador);
    let entry = state
        .session
        .attendance_drafts
        .get(&fecha, &estudiante_id)
        .cloned();
    Ok(json!({ "draft": entry }))
}

/// Committed-record approval toggle; an approved justification is immutable
/// apart from this admin flip.
fn justification_approve(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let aprobador = require_admin(state)?;
    let record_id = get_required_str(params, "recordId")?;
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };

    let target = state
        .session
        .attendance
        .all(|r| r.id == record_id)
        .into_iter()
        .next()
        .cloned();
    let Some(mut record) = target else {
        return Err(HandlerErr::new("not_found", "record not found"));
    };
    if record.justificacion.is_none() {
        return Err(HandlerErr::new("not_found", "record has no justification"));
    }
    if !db::set_justificacion_approval(conn, &record_id, &aprobador, true).map_err(HandlerErr::db)? {
        return Err(HandlerErr::new("not_found", "justification not persisted"));
    }
    if let Some(j) = record.justificacion.as_mut() {
        j.aprobada = true;
        j.aprobado_por = Some(aprobador);
    }
    state.session.attendance.upsert(record.clone());
    Ok(json!({ "record": record }))
}

fn validate(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let fecha = open_fecha(state)?;
    let nivel = state
        .session
        .attendance_nivel
        .ok_or_else(|| HandlerErr::new("no_scope", "open an attendance date first"))?;
    let hoy = hoy_or_today(params)?;
    let roster: Vec<Student> = roster_for_nivel(state, nivel).into_iter().cloned().collect();
    let violations = validate_attendance_scope(
        &roster,
        &state.session.attendance,
        &state.session.attendance_drafts,
        fecha,
        hoy,
    );
    Ok(json!({
        "valid": violations.is_empty(),
        "violations": violations_json(&violations)["violations"],
    }))
}

fn commit(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let fecha = open_fecha(state)?;
    let nivel = state
        .session
        .attendance_nivel
        .ok_or_else(|| HandlerErr::new("no_scope", "open an attendance date first"))?;
    if !get_bool(params, "confirmado") {
        return Err(HandlerErr::bad_params(
            "commit requires explicit confirmation (confirmado: true)",
        ));
    }
    let actor = state
        .actor
        .as_ref()
        .map(|a| a.id.clone())
        .ok_or_else(|| HandlerErr::new("no_actor", "set an actor first"))?;
    let hoy = hoy_or_today(params)?;

    let roster: Vec<Student> = roster_for_nivel(state, nivel).into_iter().cloned().collect();
    let violations = validate_attendance_scope(
        &roster,
        &state.session.attendance,
        &state.session.attendance_drafts,
        fecha,
        hoy,
    );
    if !violations.is_empty() {
        return Err(HandlerErr::new("validation_failed", "commit blocked")
            .with_details(violations_json(&violations)));
    }

    let records = materialize_scope(&state.session.attendance_drafts, &actor);

    // Persist first; a failed persist must leave the overlay intact so the
    // user can retry without losing edits.
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    db::replace_attendance_scope(conn, fecha, &records).map_err(HandlerErr::db)?;

    let count = records.len();
    apply_commit(
        &mut state.session.attendance,
        &mut state.session.attendance_drafts,
        &fecha,
        records,
    );
    state.session.attendance_nivel = None;

    let committed = state.session.attendance.in_scope(&fecha);
    let summary = calc::attendance_summary(committed.into_iter());
    Ok(json!({ "committed": count, "summary": summary }))
}

fn discard(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    state.session.attendance_drafts.clear();
    state.session.attendance_nivel = None;
    Ok(json!({ "ok": true }))
}

fn records(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let fecha = get_required_fecha(params, "fecha")?;
    let nivel = Nivel::parse(&get_required_str(params, "nivel")?)
        .ok_or_else(|| HandlerErr::bad_params("unknown nivel"))?;
    Ok(json!({ "rows": effective_records_json(state, fecha, nivel) }))
}

fn summary(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let fecha = get_required_fecha(params, "fecha")?;
    let nivel = match params.get("nivel").and_then(|v| v.as_str()) {
        Some(raw) => {
            Some(Nivel::parse(raw).ok_or_else(|| HandlerErr::bad_params("unknown nivel"))?)
        }
        None => None,
    };
    let committed = state.session.attendance.in_scope(&fecha);
    let filtered: Vec<&AttendanceRecord> = match nivel {
        None => committed,
        Some(n) => {
            let ids: Vec<&str> = state
                .session
                .roster
                .iter()
                .filter(|s| s.nivel == n)
                .map(|s| s.id.as_str())
                .collect();
            committed
                .into_iter()
                .filter(|r| ids.contains(&r.estudiante_id.as_str()))
                .collect()
        }
    };
    Ok(json!({ "summary": calc::attendance_summary(filtered.into_iter()) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.scopeOpen" => scope_open(state, &req.params),
        "attendance.setStatus" => set_status(state, &req.params),
        "attendance.setArrivalTime" => set_arrival_time(state, &req.params),
        "attendance.setObservation" => set_observation(state, &req.params),
        "attendance.attachJustification" => attach_justification(state, &req.params),
        "attendance.approveJustification" => approve_justification(state, &req.params),
        "attendance.justificationApprove" => justification_approve(state, &req.params),
        "attendance.validate" => validate(state, &req.params),
        "attendance.commit" => commit(state, &req.params),
        "attendance.discard" => discard(state),
        "attendance.records" => records(state, &req.params),
        "attendance.summary" => summary(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    })
}
