use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use crate::records::{AttendanceRecord, EstadoAsistencia, GradeRecord, Student, Subject, Valoracion};
use crate::store::{DraftOverlay, RecordStore};

/// Pre-commit rule violations. User-correctable; a commit is blocked while any
/// remain. Messages are what the dashboard shows inline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum Violation {
    /// Active students in the open scope without a draft or committed status.
    #[serde(rename_all = "camelCase")]
    IncompleteScope { faltantes: usize },
    /// Tarde requires a captured arrival time.
    #[serde(rename_all = "camelCase")]
    MissingArrivalTime { estudiantes: Vec<String> },
    /// The scope date lies after today (start-of-day comparison).
    FutureScope,
    InvalidAmount,
    MissingDueDate,
    MissingStudent,
    #[serde(rename_all = "camelCase")]
    PartialExceedsTotal { monto: i64, monto_pagado: i64 },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::IncompleteScope { faltantes } => {
                write!(f, "faltan {} estudiantes por marcar", faltantes)
            }
            Violation::MissingArrivalTime { estudiantes } => write!(
                f,
                "registre la hora de llegada para: {}",
                estudiantes.join(", ")
            ),
            Violation::FutureScope => {
                write!(f, "no se puede registrar asistencia para una fecha futura")
            }
            Violation::InvalidAmount => write!(f, "el monto debe ser mayor que cero"),
            Violation::MissingDueDate => write!(f, "seleccione la fecha de vencimiento"),
            Violation::MissingStudent => write!(f, "seleccione el estudiante"),
            Violation::PartialExceedsTotal {
                monto,
                monto_pagado,
            } => write!(
                f,
                "el abono ({}) no puede superar el monto total ({})",
                monto_pagado, monto
            ),
        }
    }
}

/// Violations as the `error.details` payload of a `validation_failed`
/// response.
pub fn violations_json(violations: &[Violation]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = violations
        .iter()
        .map(|v| {
            let mut item = serde_json::to_value(v).unwrap_or_else(|_| json!({}));
            item["message"] = json!(v.to_string());
            item
        })
        .collect();
    json!({ "violations": items })
}

/// Attendance gate for one date scope. Pure over (roster, drafts, store,
/// today); the caller still owes the explicit confirmation flag before
/// commit.
pub fn validate_attendance_scope(
    roster: &[Student],
    store: &RecordStore<AttendanceRecord>,
    drafts: &DraftOverlay<AttendanceRecord>,
    fecha: NaiveDate,
    hoy: NaiveDate,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if fecha > hoy {
        violations.push(Violation::FutureScope);
    }

    let mut faltantes = 0usize;
    let mut sin_hora: Vec<String> = Vec::new();
    for student in roster.iter().filter(|s| s.activo) {
        match store.get_effective(drafts, &student.id, &fecha) {
            None => faltantes += 1,
            Some(r) => {
                if r.estado == EstadoAsistencia::Tarde
                    && r.hora_llegada.as_deref().map_or(true, |h| h.trim().is_empty())
                {
                    sin_hora.push(student.id.clone());
                }
            }
        }
    }
    if faltantes > 0 {
        violations.push(Violation::IncompleteScope { faltantes });
    }
    if !sin_hora.is_empty() {
        sin_hora.sort();
        violations.push(Violation::MissingArrivalTime {
            estudiantes: sin_hora,
        });
    }

    violations
}

/// Payment registration gate. `estudiante_existe` comes from the roster
/// lookup done by the caller.
pub fn validate_payment(
    monto: i64,
    monto_pagado: i64,
    fecha_vencimiento: Option<NaiveDate>,
    estudiante_existe: bool,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    if monto <= 0 {
        violations.push(Violation::InvalidAmount);
    }
    if fecha_vencimiento.is_none() {
        violations.push(Violation::MissingDueDate);
    }
    if !estudiante_existe {
        violations.push(Violation::MissingStudent);
    }
    if monto > 0 && monto_pagado > monto {
        violations.push(Violation::PartialExceedsTotal {
            monto,
            monto_pagado,
        });
    }
    violations
}

/// Grade gate is defaulting, not blocking: any dimension of the subject
/// without a selected valuation gets `basico` before commit.
pub fn apply_grade_defaults(draft: &mut GradeRecord, subject: &Subject) {
    for dim in &subject.dimensiones {
        draft
            .valoraciones
            .entry(dim.clone())
            .or_insert(Valoracion::Basico);
    }
}
