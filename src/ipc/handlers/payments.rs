use serde_json::json;
use uuid::Uuid;

use crate::calc;
use crate::db;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_optional_str, get_required_i64, get_required_str, hoy_or_today, parse_fecha, parse_mes,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::records::{Abono, EstadoPago, PaymentRecord};
use crate::validate::{validate_payment, violations_json};

/// Registers (or re-registers) the invoice for one (student, month) key.
/// Payments commit one record at a time; the validation gate runs here
/// instead of on a scope-wide draft.
fn register(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = state
        .actor
        .as_ref()
        .map(|a| a.id.clone())
        .ok_or_else(|| HandlerErr::new("no_actor", "set an actor first"))?;
    let estudiante_id = get_required_str(params, "estudianteId")?;
    let mes = parse_mes(&get_required_str(params, "mes")?)?;
    let concepto = get_optional_str(params, "concepto").unwrap_or_else(|| "Mensualidad".to_string());
    let monto = get_required_i64(params, "monto")?;
    let monto_pagado = params
        .get("montoPagado")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    let fecha_vencimiento = params
        .get("fechaVencimiento")
        .and_then(|v| v.as_str())
        .map(|raw| parse_fecha(raw, "fechaVencimiento"))
        .transpose()?;
    let hoy = hoy_or_today(params)?;

    let estudiante_existe = state.session.roster.iter().any(|s| s.id == estudiante_id);
    let violations = validate_payment(monto, monto_pagado, fecha_vencimiento, estudiante_existe);
    if !violations.is_empty() {
        return Err(HandlerErr::new("validation_failed", "payment rejected")
            .with_details(violations_json(&violations)));
    }
    // The gate guarantees the due date is present past this point.
    let Some(fecha_vencimiento) = fecha_vencimiento else {
        return Err(HandlerErr::bad_params("missing fechaVencimiento"));
    };

    let mut record = PaymentRecord {
        id: Uuid::new_v4().to_string(),
        estudiante_id,
        mes,
        concepto,
        monto,
        monto_pagado: 0,
        fecha_vencimiento,
        estado: EstadoPago::Pendiente,
        abonos: vec![],
        registrado_por: actor,
    };
    if monto_pagado > 0 {
        record.add_abono(
            Abono {
                id: Uuid::new_v4().to_string(),
                monto: monto_pagado,
                fecha: hoy,
                metodo: get_optional_str(params, "metodo").unwrap_or_else(|| "efectivo".to_string()),
                recibo_no: get_optional_str(params, "reciboNo"),
            },
            hoy,
        );
    } else {
        record.recompute_estado(hoy);
    }

    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    db::upsert_payment(conn, &record).map_err(HandlerErr::db)?;
    state.session.payments.upsert(record.clone());

    Ok(json!({
        "record": record,
        "saldoPendiente": record.saldo_pendiente(),
    }))
}

fn add_abono(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let pago_id = get_required_str(params, "pagoId")?;
    let monto = get_required_i64(params, "monto")?;
    let metodo = get_required_str(params, "metodo")?;
    let hoy = hoy_or_today(params)?;

    let target = state
        .session
        .payments
        .all(|r| r.id == pago_id)
        .into_iter()
        .next()
        .cloned();
    let Some(mut record) = target else {
        return Err(HandlerErr::new("not_found", "payment not found"));
    };

    if monto <= 0 {
        return Err(HandlerErr::new("validation_failed", "payment rejected")
            .with_details(violations_json(&validate_payment(
                monto,
                0,
                Some(record.fecha_vencimiento),
                true,
            ))));
    }
    let nuevo_pagado = record.monto_pagado + monto;
    if nuevo_pagado > record.monto {
        let violations = validate_payment(
            record.monto,
            nuevo_pagado,
            Some(record.fecha_vencimiento),
            true,
        );
        return Err(HandlerErr::new("validation_failed", "payment rejected")
            .with_details(violations_json(&violations)));
    }

    record.add_abono(
        Abono {
            id: Uuid::new_v4().to_string(),
            monto,
            fecha: hoy,
            metodo,
            recibo_no: get_optional_str(params, "reciboNo"),
        },
        hoy,
    );

    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    db::upsert_payment(conn, &record).map_err(HandlerErr::db)?;
    state.session.payments.upsert(record.clone());

    Ok(json!({
        "record": record,
        "saldoPendiente": record.saldo_pendiente(),
    }))
}

fn record_json(record: &PaymentRecord, hoy: chrono::NaiveDate) -> serde_json::Value {
    // Overdue reclassification is a read-side view; the stored estado only
    // changes on the next write.
    let mut vista = record.clone();
    vista.recompute_estado(hoy);
    json!({
        "record": vista,
        "saldoPendiente": vista.saldo_pendiente(),
        "diasParaVencimiento": calc::dias_para_vencimiento(record.fecha_vencimiento, hoy),
    })
}

fn list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let hoy = hoy_or_today(params)?;
    let mes = params.get("mes").and_then(|v| v.as_str());
    let estudiante_id = params.get("estudianteId").and_then(|v| v.as_str());
    let mut records = state.session.payments.all(|r| {
        mes.map_or(true, |m| r.mes == m)
            && estudiante_id.map_or(true, |e| r.estudiante_id == e)
    });
    records.sort_by(|a, b| (&a.mes, &a.estudiante_id).cmp(&(&b.mes, &b.estudiante_id)));
    let rows: Vec<serde_json::Value> = records.iter().map(|r| record_json(r, hoy)).collect();
    Ok(json!({ "rows": rows }))
}

fn summary(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let hoy = hoy_or_today(params)?;
    let vistas: Vec<PaymentRecord> = state
        .session
        .payments
        .all(|_| true)
        .into_iter()
        .map(|r| {
            let mut vista = r.clone();
            vista.recompute_estado(hoy);
            vista
        })
        .collect();
    Ok(json!({ "summary": calc::payment_totals(vistas.iter()) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "payments.register" => register(state, &req.params),
        "payments.addAbono" => add_abono(state, &req.params),
        "payments.list" => list(state, &req.params),
        "payments.summary" => summary(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    })
}
