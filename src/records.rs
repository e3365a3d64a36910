use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::Scoped;

/// Preschool levels used for roster grouping and scope filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nivel {
    Parvulos,
    Prejardin,
    Jardin,
    Transicion,
}

impl Nivel {
    pub fn as_str(self) -> &'static str {
        match self {
            Nivel::Parvulos => "parvulos",
            Nivel::Prejardin => "prejardin",
            Nivel::Jardin => "jardin",
            Nivel::Transicion => "transicion",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "parvulos" => Some(Nivel::Parvulos),
            "prejardin" => Some(Nivel::Prejardin),
            "jardin" => Some(Nivel::Jardin),
            "transicion" => Some(Nivel::Transicion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub nombre: String,
    pub nivel: Nivel,
    pub activo: bool,
    pub sort_order: i64,
}

/// Grade subject with the competency dimensions it is assessed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub nombre: String,
    pub dimensiones: Vec<String>,
    pub activo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstadoAsistencia {
    Presente,
    Ausente,
    Justificado,
    Tarde,
}

impl EstadoAsistencia {
    /// Presente and tarde carry an arrival time; the other states must not.
    pub fn requires_arrival_time(self) -> bool {
        matches!(self, EstadoAsistencia::Presente | EstadoAsistencia::Tarde)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EstadoAsistencia::Presente => "presente",
            EstadoAsistencia::Ausente => "ausente",
            EstadoAsistencia::Justificado => "justificado",
            EstadoAsistencia::Tarde => "tarde",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "presente" => Some(EstadoAsistencia::Presente),
            "ausente" => Some(EstadoAsistencia::Ausente),
            "justificado" => Some(EstadoAsistencia::Justificado),
            "tarde" => Some(EstadoAsistencia::Tarde),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotivoJustificacion {
    Enfermedad,
    CalamidadFamiliar,
    CitaMedica,
    Otro,
}

impl MotivoJustificacion {
    pub fn as_str(self) -> &'static str {
        match self {
            MotivoJustificacion::Enfermedad => "enfermedad",
            MotivoJustificacion::CalamidadFamiliar => "calamidad_familiar",
            MotivoJustificacion::CitaMedica => "cita_medica",
            MotivoJustificacion::Otro => "otro",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "enfermedad" => Some(MotivoJustificacion::Enfermedad),
            "calamidad_familiar" => Some(MotivoJustificacion::CalamidadFamiliar),
            "cita_medica" => Some(MotivoJustificacion::CitaMedica),
            "otro" => Some(MotivoJustificacion::Otro),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Justificacion {
    pub id: String,
    pub motivo: MotivoJustificacion,
    pub descripcion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aprobado_por: Option<String>,
    pub aprobada: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub estudiante_id: String,
    pub fecha: NaiveDate,
    pub estado: EstadoAsistencia,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora_llegada: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justificacion: Option<Justificacion>,
    pub registrado_por: String,
}

impl AttendanceRecord {
    /// Fresh draft entry for one student in the open date scope. Id and actor
    /// are stamped at materialization, not here.
    pub fn draft(estudiante_id: &str, fecha: NaiveDate, estado: EstadoAsistencia) -> Self {
        AttendanceRecord {
            id: String::new(),
            estudiante_id: estudiante_id.to_string(),
            fecha,
            estado,
            hora_llegada: None,
            observacion: None,
            justificacion: None,
            registrado_por: String::new(),
        }
    }

    /// Status transition with the arrival-time rules: entering a state that
    /// carries an arrival time defaults the wall-clock HH:MM when none was
    /// captured yet; leaving such a state clears it.
    pub fn set_estado(&mut self, estado: EstadoAsistencia, ahora_hhmm: &str) {
        if estado.requires_arrival_time() {
            if self.hora_llegada.is_none() {
                self.hora_llegada = Some(ahora_hhmm.to_string());
            }
        } else {
            self.hora_llegada = None;
        }
        self.estado = estado;
    }

    /// Attaching a justification to an absence reclassifies it.
    pub fn attach_justificacion(&mut self, justificacion: Justificacion) {
        self.justificacion = Some(justificacion);
        if self.estado == EstadoAsistencia::Ausente {
            self.estado = EstadoAsistencia::Justificado;
        }
    }
}

impl Scoped for AttendanceRecord {
    type Scope = NaiveDate;

    fn entity_id(&self) -> &str {
        &self.estudiante_id
    }

    fn scope(&self) -> NaiveDate {
        self.fecha
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valoracion {
    Superior,
    Alto,
    Basico,
    Bajo,
}

impl Valoracion {
    pub fn as_str(self) -> &'static str {
        match self {
            Valoracion::Superior => "superior",
            Valoracion::Alto => "alto",
            Valoracion::Basico => "basico",
            Valoracion::Bajo => "bajo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "superior" => Some(Valoracion::Superior),
            "alto" => Some(Valoracion::Alto),
            "basico" => Some(Valoracion::Basico),
            "bajo" => Some(Valoracion::Bajo),
            _ => None,
        }
    }
}

/// Grade editor scope: one student in one (periodo, anio). Subjects are the
/// entities inside the scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeScope {
    pub estudiante_id: String,
    pub periodo: u8,
    pub anio: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub id: String,
    pub materia_id: String,
    pub estudiante_id: String,
    pub periodo: u8,
    pub anio: i32,
    /// Dimension name -> qualitative valuation. BTreeMap keeps report output
    /// in a stable order.
    pub valoraciones: BTreeMap<String, Valoracion>,
    pub registrado_por: String,
}

impl GradeRecord {
    pub fn draft(materia_id: &str, scope: &GradeScope) -> Self {
        GradeRecord {
            id: String::new(),
            materia_id: materia_id.to_string(),
            estudiante_id: scope.estudiante_id.clone(),
            periodo: scope.periodo,
            anio: scope.anio,
            valoraciones: BTreeMap::new(),
            registrado_por: String::new(),
        }
    }
}

impl Scoped for GradeRecord {
    type Scope = GradeScope;

    fn entity_id(&self) -> &str {
        &self.materia_id
    }

    fn scope(&self) -> GradeScope {
        GradeScope {
            estudiante_id: self.estudiante_id.clone(),
            periodo: self.periodo,
            anio: self.anio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstadoPago {
    Pagado,
    Pendiente,
    Vencido,
    Parcial,
}

impl EstadoPago {
    pub fn as_str(self) -> &'static str {
        match self {
            EstadoPago::Pagado => "pagado",
            EstadoPago::Pendiente => "pendiente",
            EstadoPago::Vencido => "vencido",
            EstadoPago::Parcial => "parcial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pagado" => Some(EstadoPago::Pagado),
            "pendiente" => Some(EstadoPago::Pendiente),
            "vencido" => Some(EstadoPago::Vencido),
            "parcial" => Some(EstadoPago::Parcial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Abono {
    pub id: String,
    pub monto: i64,
    pub fecha: NaiveDate,
    pub metodo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recibo_no: Option<String>,
}

/// One invoice per student per month. Amounts are integer pesos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub estudiante_id: String,
    /// Invoice month descriptor, `YYYY-MM`.
    pub mes: String,
    pub concepto: String,
    pub monto: i64,
    pub monto_pagado: i64,
    pub fecha_vencimiento: NaiveDate,
    pub estado: EstadoPago,
    pub abonos: Vec<Abono>,
    pub registrado_por: String,
}

impl PaymentRecord {
    pub fn saldo_pendiente(&self) -> i64 {
        (self.monto - self.monto_pagado).max(0)
    }

    /// Appends an installment and rebuilds the paid amount from the abono
    /// list, keeping `monto_pagado == sum(abonos)` by construction.
    pub fn add_abono(&mut self, abono: Abono, hoy: NaiveDate) {
        self.abonos.push(abono);
        self.monto_pagado = self.abonos.iter().map(|a| a.monto).sum();
        self.recompute_estado(hoy);
    }

    /// Estado is derived from balance and due date, never set directly once
    /// abonos exist.
    pub fn recompute_estado(&mut self, hoy: NaiveDate) {
        self.estado = if self.monto_pagado >= self.monto {
            EstadoPago::Pagado
        } else if self.monto_pagado > 0 {
            EstadoPago::Parcial
        } else if self.fecha_vencimiento < hoy {
            EstadoPago::Vencido
        } else {
            EstadoPago::Pendiente
        };
    }
}

impl Scoped for PaymentRecord {
    type Scope = String;

    fn entity_id(&self) -> &str {
        &self.estudiante_id
    }

    fn scope(&self) -> String {
        self.mes.clone()
    }
}
