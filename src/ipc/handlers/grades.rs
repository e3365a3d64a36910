use serde_json::json;

use crate::calc;
use crate::commit::{apply_commit, materialize_scope};
use crate::db;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_bool, get_required_i64, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::{GradeRecord, GradeScope, Subject, Valoracion};
use crate::validate::apply_grade_defaults;

fn scope_params(params: &serde_json::Value) -> Result<GradeScope, HandlerErr> {
    let estudiante_id = get_required_str(params, "estudianteId")?;
    let periodo = get_required_i64(params, "periodo")?;
    let anio = get_required_i64(params, "anio")?;
    if !(1..=4).contains(&periodo) {
        return Err(HandlerErr::bad_params("periodo must be between 1 and 4"));
    }
    Ok(GradeScope {
        estudiante_id,
        periodo: periodo as u8,
        anio: anio as i32,
    })
}

fn open_scope(state: &AppState) -> Result<GradeScope, HandlerErr> {
    state
        .session
        .grade_drafts
        .open_scope()
        .cloned()
        .ok_or_else(|| HandlerErr::new("no_scope", "open a grade period first"))
}

fn active_subjects(state: &AppState) -> Vec<Subject> {
    state
        .session
        .subjects
        .iter()
        .filter(|s| s.activo)
        .cloned()
        .collect()
}

fn drafts_json(state: &AppState, scope: &GradeScope) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = active_subjects(state)
        .iter()
        .map(|s| {
            json!({
                "materiaId": s.id,
                "nombre": s.nombre,
                "record": state.session.grades.get_effective(
                    &state.session.grade_drafts,
                    &s.id,
                    scope,
                ),
            })
        })
        .collect();
    json!(rows)
}

/// Opens the grade editor for one (student, periodo, anio). Every active
/// subject gets a draft seeded from the committed record when one exists,
/// otherwise a fresh one; missing dimensions are pre-filled with basico so
/// save is never blocked on an unselected valuation.
fn scope_open(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let scope = scope_params(params)?;
    if !state
        .session
        .roster
        .iter()
        .any(|s| s.id == scope.estudiante_id)
    {
        return Err(HandlerErr::new("not_found", "student not found"));
    }

    state.session.grade_drafts.open(scope.clone());
    for subject in active_subjects(state) {
        let mut draft = state
            .session
            .grades
            .get(&subject.id, &scope)
            .cloned()
            .unwrap_or_else(|| GradeRecord::draft(&subject.id, &scope));
        apply_grade_defaults(&mut draft, &subject);
        state.session.grade_drafts.put(draft);
    }

    Ok(json!({
        "estudianteId": scope.estudiante_id,
        "periodo": scope.periodo,
        "anio": scope.anio,
        "rows": drafts_json(state, &scope),
    }))
}

fn set_valuation(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let scope = open_scope(state)?;
    let materia_id = get_required_str(params, "materiaId")?;
    let dimension = get_required_str(params, "dimension")?;
    let valoracion_raw = get_required_str(params, "valoracion")?;
    let valoracion = Valoracion::parse(&valoracion_raw).ok_or_else(|| {
        HandlerErr::bad_params("unknown valoracion")
            .with_details(json!({ "valoracion": valoracion_raw }))
    })?;

    let subject = state
        .session
        .subjects
        .iter()
        .find(|s| s.id == materia_id)
        .cloned()
        .ok_or_else(|| HandlerErr::new("not_found", "subject not found"))?;
    if !subject.dimensiones.iter().any(|d| d == &dimension) {
        return Err(HandlerErr::bad_params("unknown dimension for subject")
            .with_details(json!({ "dimension": dimension })));
    }

    state.session.grade_drafts.upsert_with(
        &materia_id,
        || {
            let mut draft = GradeRecord::draft(&materia_id, &scope);
            apply_grade_defaults(&mut draft, &subject);
            draft
        },
        |r| {
            r.valoraciones.insert(dimension.clone(), valoracion);
        },
    );
    let entry = state.session.grade_drafts.get(&scope, &materia_id).cloned();
    Ok(json!({ "draft": entry }))
}

fn commit(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let scope = open_scope(state)?;
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

    let records = materialize_scope(&state.session.grade_drafts, &actor);
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    db::replace_grade_scope(conn, &scope, &records).map_err(HandlerErr::db)?;

    let count = records.len();
    apply_commit(
        &mut state.session.grades,
        &mut state.session.grade_drafts,
        &scope,
        records,
    );
    Ok(json!({ "committed": count }))
}

fn discard(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    state.session.grade_drafts.clear();
    Ok(json!({ "ok": true }))
}

/// Committed per-dimension lookup; no numeric aggregate exists on the
/// qualitative scale.
fn get(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let scope = scope_params(params)?;
    match params.get("materiaId").and_then(|v| v.as_str()) {
        Some(materia_id) => {
            let record = state.session.grades.get(materia_id, &scope);
            let valoracion = params
                .get("dimension")
                .and_then(|v| v.as_str())
                .and_then(|dim| record.and_then(|r| calc::grade_valuation(r, dim)));
            Ok(json!({ "record": record, "valoracion": valoracion }))
        }
        None => {
            let records = state.session.grades.in_scope(&scope);
            Ok(json!({ "records": records }))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "grades.scopeOpen" => scope_open(state, &req.params),
        "grades.setValuation" => set_valuation(state, &req.params),
        "grades.commit" => commit(state, &req.params),
        "grades.discard" => discard(state),
        "grades.get" => get(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    })
}
