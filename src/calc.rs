use chrono::NaiveDate;
use serde::Serialize;

use crate::records::{
    AttendanceRecord, EstadoAsistencia, EstadoPago, GradeRecord, PaymentRecord, Valoracion,
};

/// Read-side attendance statistics for one scope. Recomputed on demand from
/// store state; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total: usize,
    pub presentes: usize,
    pub ausentes: usize,
    pub justificados: usize,
    pub tardes: usize,
    pub ausencias_sin_justificar: usize,
    /// round((presentes + tardes) / total * 100); 0 for an empty scope.
    pub porcentaje_asistencia: i64,
}

pub fn attendance_summary<'a, I>(records: I) -> AttendanceSummary
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut s = AttendanceSummary {
        total: 0,
        presentes: 0,
        ausentes: 0,
        justificados: 0,
        tardes: 0,
        ausencias_sin_justificar: 0,
        porcentaje_asistencia: 0,
    };
    for r in records {
        s.total += 1;
        match r.estado {
            EstadoAsistencia::Presente => s.presentes += 1,
            EstadoAsistencia::Ausente => {
                s.ausentes += 1;
                s.ausencias_sin_justificar += 1;
            }
            EstadoAsistencia::Justificado => s.justificados += 1,
            EstadoAsistencia::Tarde => s.tardes += 1,
        }
    }
    if s.total > 0 {
        let asistieron = (s.presentes + s.tardes) as f64;
        s.porcentaje_asistencia = ((asistieron / s.total as f64) * 100.0).round() as i64;
    }
    s
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTotals {
    /// Sum of amounts received on fully paid invoices.
    pub total_recaudado: i64,
    /// Face value of invoices still fully unpaid (pendiente or vencido).
    pub total_pendiente: i64,
    /// Outstanding balance across partially paid invoices.
    pub saldo_parcial: i64,
}

pub fn payment_totals<'a, I>(records: I) -> PaymentTotals
where
    I: IntoIterator<Item = &'a PaymentRecord>,
{
    let mut t = PaymentTotals {
        total_recaudado: 0,
        total_pendiente: 0,
        saldo_parcial: 0,
    };
    for r in records {
        match r.estado {
            EstadoPago::Pagado => t.total_recaudado += r.monto_pagado,
            EstadoPago::Pendiente | EstadoPago::Vencido => t.total_pendiente += r.monto,
            EstadoPago::Parcial => t.saldo_parcial += r.saldo_pendiente(),
        }
    }
    t
}

/// Whole days until the due date; negative once it has passed.
pub fn dias_para_vencimiento(fecha_vencimiento: NaiveDate, hoy: NaiveDate) -> i64 {
    (fecha_vencimiento - hoy).num_days()
}

/// Qualitative scale only; the one grade-side lookup is per dimension.
pub fn grade_valuation(record: &GradeRecord, dimension: &str) -> Option<Valoracion> {
    record.valoraciones.get(dimension).copied()
}
