use anyhow::anyhow;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

use crate::records::{
    Abono, AttendanceRecord, EstadoAsistencia, EstadoPago, GradeRecord, GradeScope, Justificacion,
    MotivoJustificacion, Nivel, PaymentRecord, Student, Subject, Valoracion,
};

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("aula.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            nombre TEXT NOT NULL,
            nivel TEXT NOT NULL,
            activo INTEGER NOT NULL,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_nivel ON students(nivel)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            nombre TEXT NOT NULL,
            activo INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subject_dimensions(
            subject_id TEXT NOT NULL,
            dimension TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            PRIMARY KEY(subject_id, dimension),
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance_records(
            id TEXT PRIMARY KEY,
            estudiante_id TEXT NOT NULL,
            fecha TEXT NOT NULL,
            estado TEXT NOT NULL,
            hora_llegada TEXT,
            observacion TEXT,
            registrado_por TEXT NOT NULL,
            UNIQUE(estudiante_id, fecha),
            FOREIGN KEY(estudiante_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_fecha ON attendance_records(fecha)",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS justifications(
            id TEXT PRIMARY KEY,
            record_id TEXT NOT NULL UNIQUE,
            motivo TEXT NOT NULL,
            descripcion TEXT NOT NULL,
            documento TEXT,
            aprobado_por TEXT,
            aprobada INTEGER NOT NULL,
            FOREIGN KEY(record_id) REFERENCES attendance_records(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grade_records(
            id TEXT PRIMARY KEY,
            estudiante_id TEXT NOT NULL,
            materia_id TEXT NOT NULL,
            periodo INTEGER NOT NULL,
            anio INTEGER NOT NULL,
            registrado_por TEXT NOT NULL,
            UNIQUE(estudiante_id, materia_id, periodo, anio),
            FOREIGN KEY(estudiante_id) REFERENCES students(id),
            FOREIGN KEY(materia_id) REFERENCES subjects(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS grade_valuations(
            record_id TEXT NOT NULL,
            dimension TEXT NOT NULL,
            valoracion TEXT NOT NULL,
            PRIMARY KEY(record_id, dimension),
            FOREIGN KEY(record_id) REFERENCES grade_records(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payment_records(
            id TEXT PRIMARY KEY,
            estudiante_id TEXT NOT NULL,
            mes TEXT NOT NULL,
            concepto TEXT NOT NULL,
            monto INTEGER NOT NULL,
            monto_pagado INTEGER NOT NULL,
            fecha_vencimiento TEXT NOT NULL,
            estado TEXT NOT NULL,
            registrado_por TEXT NOT NULL,
            UNIQUE(estudiante_id, mes),
            FOREIGN KEY(estudiante_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS abonos(
            id TEXT PRIMARY KEY,
            payment_id TEXT NOT NULL,
            monto INTEGER NOT NULL,
            fecha TEXT NOT NULL,
            metodo TEXT NOT NULL,
            recibo_no TEXT,
            sort_order INTEGER NOT NULL,
            FOREIGN KEY(payment_id) REFERENCES payment_records(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_abonos_payment ON abonos(payment_id)",
        [],
    )?;

    seed_subject_catalog(&conn)?;

    Ok(conn)
}

/// Fresh workspaces get the fixed preschool subject catalog so the grade
/// editor has entities to scope over. Existing catalogs are left alone.
fn seed_subject_catalog(conn: &Connection) -> anyhow::Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM subjects", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }
    let dimensiones = ["cognitiva", "comunicativa", "corporal", "socioafectiva"];
    let catalogo = [
        ("mat", "Matemáticas"),
        ("len", "Lenguaje"),
        ("art", "Artística"),
        ("edf", "Educación Física"),
    ];
    for (id, nombre) in catalogo {
        conn.execute(
            "INSERT INTO subjects(id, nombre, activo) VALUES(?, ?, 1)",
            (id, nombre),
        )?;
        for (i, dim) in dimensiones.iter().enumerate() {
            conn.execute(
                "INSERT INTO subject_dimensions(subject_id, dimension, sort_order)
                 VALUES(?, ?, ?)",
                (id, dim, i as i64),
            )?;
        }
    }
    Ok(())
}

fn parse_fecha(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| anyhow!("bad date {s}: {e}"))
}

pub fn list_students(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT id, nombre, nivel, activo, sort_order FROM students ORDER BY sort_order, nombre",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, i64>(3)?,
            r.get::<_, i64>(4)?,
        ))
    })?;
    let mut students = Vec::new();
    for row in rows {
        let (id, nombre, nivel, activo, sort_order) = row?;
        let nivel = Nivel::parse(&nivel).ok_or_else(|| anyhow!("unknown nivel: {nivel}"))?;
        students.push(Student {
            id,
            nombre,
            nivel,
            activo: activo != 0,
            sort_order,
        });
    }
    Ok(students)
}

pub fn insert_student(conn: &Connection, student: &Student) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO students(id, nombre, nivel, activo, sort_order) VALUES(?, ?, ?, ?, ?)",
        (
            &student.id,
            &student.nombre,
            student.nivel.as_str(),
            student.activo as i64,
            student.sort_order,
        ),
    )?;
    Ok(())
}

pub fn update_student(conn: &Connection, student: &Student) -> anyhow::Result<bool> {
    let n = conn.execute(
        "UPDATE students SET nombre = ?, nivel = ?, activo = ?, sort_order = ? WHERE id = ?",
        (
            &student.nombre,
            student.nivel.as_str(),
            student.activo as i64,
            student.sort_order,
            &student.id,
        ),
    )?;
    Ok(n > 0)
}

pub fn delete_student(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let n = conn.execute("DELETE FROM students WHERE id = ?", [id])?;
    Ok(n > 0)
}

pub fn list_subjects(conn: &Connection) -> anyhow::Result<Vec<Subject>> {
    let mut stmt = conn.prepare("SELECT id, nombre, activo FROM subjects ORDER BY nombre")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, i64>(2)?,
        ))
    })?;
    let mut subjects = Vec::new();
    for row in rows {
        let (id, nombre, activo) = row?;
        let mut dim_stmt = conn.prepare(
            "SELECT dimension FROM subject_dimensions WHERE subject_id = ? ORDER BY sort_order",
        )?;
        let dimensiones = dim_stmt
            .query_map([&id], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        subjects.push(Subject {
            id,
            nombre,
            dimensiones,
            activo: activo != 0,
        });
    }
    Ok(subjects)
}

pub fn hydrate_attendance(conn: &Connection) -> anyhow::Result<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, estudiante_id, fecha, estado, hora_llegada, observacion, registrado_por
         FROM attendance_records",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, String>(6)?,
        ))
    })?;
    let mut records = Vec::new();
    for row in rows {
        let (id, estudiante_id, fecha, estado, hora_llegada, observacion, registrado_por) = row?;
        let estado = EstadoAsistencia::parse(&estado)
            .ok_or_else(|| anyhow!("unknown estado: {estado}"))?;
        let justificacion = get_justificacion(conn, &id)?;
        records.push(AttendanceRecord {
            id,
            estudiante_id,
            fecha: parse_fecha(&fecha)?,
            estado,
            hora_llegada,
            observacion,
            justificacion,
            registrado_por,
        });
    }
    Ok(records)
}

fn get_justificacion(conn: &Connection, record_id: &str) -> anyhow::Result<Option<Justificacion>> {
    let row = conn
        .query_row(
            "SELECT id, motivo, descripcion, documento, aprobado_por, aprobada
             FROM justifications WHERE record_id = ?",
            [record_id],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Option<String>>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, i64>(5)?,
                ))
            },
        )
        .optional()?;
    let Some((id, motivo, descripcion, documento, aprobado_por, aprobada)) = row else {
        return Ok(None);
    };
    let motivo =
        MotivoJustificacion::parse(&motivo).ok_or_else(|| anyhow!("unknown motivo: {motivo}"))?;
    Ok(Some(Justificacion {
        id,
        motivo,
        descripcion,
        documento,
        aprobado_por,
        aprobada: aprobada != 0,
    }))
}

/// Scope-atomic persist: deletes everything for the date, reinserts the
/// committed records, all inside one transaction.
pub fn replace_attendance_scope(
    conn: &Connection,
    fecha: NaiveDate,
    records: &[AttendanceRecord],
) -> anyhow::Result<()> {
    let fecha_str = fecha.format("%Y-%m-%d").to_string();
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM justifications WHERE record_id IN
           (SELECT id FROM attendance_records WHERE fecha = ?)",
        [&fecha_str],
    )?;
    tx.execute("DELETE FROM attendance_records WHERE fecha = ?", [&fecha_str])?;
    for r in records {
        tx.execute(
            "INSERT INTO attendance_records(id, estudiante_id, fecha, estado, hora_llegada,
                                            observacion, registrado_por)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &r.id,
                &r.estudiante_id,
                &fecha_str,
                r.estado.as_str(),
                &r.hora_llegada,
                &r.observacion,
                &r.registrado_por,
            ),
        )?;
        if let Some(j) = &r.justificacion {
            tx.execute(
                "INSERT INTO justifications(id, record_id, motivo, descripcion, documento,
                                            aprobado_por, aprobada)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                (
                    &j.id,
                    &r.id,
                    j.motivo.as_str(),
                    &j.descripcion,
                    &j.documento,
                    &j.aprobado_por,
                    j.aprobada as i64,
                ),
            )?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn set_justificacion_approval(
    conn: &Connection,
    record_id: &str,
    aprobado_por: &str,
    aprobada: bool,
) -> anyhow::Result<bool> {
    let n = conn.execute(
        "UPDATE justifications SET aprobada = ?, aprobado_por = ? WHERE record_id = ?",
        (aprobada as i64, aprobado_por, record_id),
    )?;
    Ok(n > 0)
}

pub fn hydrate_grades(conn: &Connection) -> anyhow::Result<Vec<GradeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, estudiante_id, materia_id, periodo, anio, registrado_por FROM grade_records",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, i64>(3)?,
            r.get::<_, i64>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;
    let mut records = Vec::new();
    for row in rows {
        let (id, estudiante_id, materia_id, periodo, anio, registrado_por) = row?;
        let mut val_stmt = conn.prepare(
            "SELECT dimension, valoracion FROM grade_valuations WHERE record_id = ?",
        )?;
        let vals = val_stmt.query_map([&id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        let mut valoraciones = BTreeMap::new();
        for v in vals {
            let (dimension, valoracion) = v?;
            let valoracion = Valoracion::parse(&valoracion)
                .ok_or_else(|| anyhow!("unknown valoracion: {valoracion}"))?;
            valoraciones.insert(dimension, valoracion);
        }
        records.push(GradeRecord {
            id,
            materia_id,
            estudiante_id,
            periodo: periodo as u8,
            anio: anio as i32,
            valoraciones,
            registrado_por,
        });
    }
    Ok(records)
}

pub fn replace_grade_scope(
    conn: &Connection,
    scope: &GradeScope,
    records: &[GradeRecord],
) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM grade_valuations WHERE record_id IN
           (SELECT id FROM grade_records WHERE estudiante_id = ? AND periodo = ? AND anio = ?)",
        (&scope.estudiante_id, scope.periodo as i64, scope.anio as i64),
    )?;
    tx.execute(
        "DELETE FROM grade_records WHERE estudiante_id = ? AND periodo = ? AND anio = ?",
        (&scope.estudiante_id, scope.periodo as i64, scope.anio as i64),
    )?;
    for r in records {
        tx.execute(
            "INSERT INTO grade_records(id, estudiante_id, materia_id, periodo, anio, registrado_por)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &r.id,
                &r.estudiante_id,
                &r.materia_id,
                r.periodo as i64,
                r.anio as i64,
                &r.registrado_por,
            ),
        )?;
        for (dimension, valoracion) in &r.valoraciones {
            tx.execute(
                "INSERT INTO grade_valuations(record_id, dimension, valoracion) VALUES(?, ?, ?)",
                (&r.id, dimension, valoracion.as_str()),
            )?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn hydrate_payments(conn: &Connection) -> anyhow::Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, estudiante_id, mes, concepto, monto, monto_pagado, fecha_vencimiento,
                estado, registrado_por
         FROM payment_records",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, i64>(4)?,
            r.get::<_, i64>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, String>(7)?,
            r.get::<_, String>(8)?,
        ))
    })?;
    let mut records = Vec::new();
    for row in rows {
        let (id, estudiante_id, mes, concepto, monto, monto_pagado, venc, estado, registrado_por) =
            row?;
        let estado =
            EstadoPago::parse(&estado).ok_or_else(|| anyhow!("unknown estado: {estado}"))?;
        let abonos = list_abonos(conn, &id)?;
        records.push(PaymentRecord {
            id,
            estudiante_id,
            mes,
            concepto,
            monto,
            monto_pagado,
            fecha_vencimiento: parse_fecha(&venc)?,
            estado,
            abonos,
            registrado_por,
        });
    }
    Ok(records)
}

fn list_abonos(conn: &Connection, payment_id: &str) -> anyhow::Result<Vec<Abono>> {
    let mut stmt = conn.prepare(
        "SELECT id, monto, fecha, metodo, recibo_no FROM abonos
         WHERE payment_id = ? ORDER BY sort_order",
    )?;
    let rows = stmt.query_map([payment_id], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
        ))
    })?;
    let mut abonos = Vec::new();
    for row in rows {
        let (id, monto, fecha, metodo, recibo_no) = row?;
        abonos.push(Abono {
            id,
            monto,
            fecha: parse_fecha(&fecha)?,
            metodo,
            recibo_no,
        });
    }
    Ok(abonos)
}

/// Upserts one payment record with its full abono list. Replaces any prior
/// row for the same (estudiante, mes) key so the stored abono sum always
/// matches monto_pagado and the row id matches the in-memory record.
pub fn upsert_payment(conn: &Connection, record: &PaymentRecord) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM abonos WHERE payment_id IN
           (SELECT id FROM payment_records WHERE estudiante_id = ? AND mes = ?)",
        (&record.estudiante_id, &record.mes),
    )?;
    tx.execute(
        "DELETE FROM payment_records WHERE estudiante_id = ? AND mes = ?",
        (&record.estudiante_id, &record.mes),
    )?;
    tx.execute(
        "INSERT INTO payment_records(id, estudiante_id, mes, concepto, monto, monto_pagado,
                                     fecha_vencimiento, estado, registrado_por)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &record.id,
            &record.estudiante_id,
            &record.mes,
            &record.concepto,
            record.monto,
            record.monto_pagado,
            record.fecha_vencimiento.format("%Y-%m-%d").to_string(),
            record.estado.as_str(),
            &record.registrado_por,
        ),
    )?;
    for (i, a) in record.abonos.iter().enumerate() {
        tx.execute(
            "INSERT INTO abonos(id, payment_id, monto, fecha, metodo, recibo_no, sort_order)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &a.id,
                &record.id,
                a.monto,
                a.fecha.format("%Y-%m-%d").to_string(),
                &a.metodo,
                &a.recibo_no,
                i as i64,
            ),
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Replaces the entire workspace content with a snapshot bundle's data, in
/// one transaction. Either everything lands or nothing does.
pub fn restore_snapshot(conn: &Connection, data: &crate::export::SnapshotData) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM justifications", [])?;
    tx.execute("DELETE FROM attendance_records", [])?;
    tx.execute("DELETE FROM grade_valuations", [])?;
    tx.execute("DELETE FROM grade_records", [])?;
    tx.execute("DELETE FROM abonos", [])?;
    tx.execute("DELETE FROM payment_records", [])?;
    tx.execute("DELETE FROM subject_dimensions", [])?;
    tx.execute("DELETE FROM subjects", [])?;
    tx.execute("DELETE FROM students", [])?;

    for s in &data.students {
        tx.execute(
            "INSERT INTO students(id, nombre, nivel, activo, sort_order) VALUES(?, ?, ?, ?, ?)",
            (&s.id, &s.nombre, s.nivel.as_str(), s.activo as i64, s.sort_order),
        )?;
    }
    for s in &data.subjects {
        tx.execute(
            "INSERT INTO subjects(id, nombre, activo) VALUES(?, ?, ?)",
            (&s.id, &s.nombre, s.activo as i64),
        )?;
        for (i, dim) in s.dimensiones.iter().enumerate() {
            tx.execute(
                "INSERT INTO subject_dimensions(subject_id, dimension, sort_order) VALUES(?, ?, ?)",
                (&s.id, dim, i as i64),
            )?;
        }
    }
    for r in &data.attendance {
        tx.execute(
            "INSERT INTO attendance_records(id, estudiante_id, fecha, estado, hora_llegada,
                                            observacion, registrado_por)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &r.id,
                &r.estudiante_id,
                r.fecha.format("%Y-%m-%d").to_string(),
                r.estado.as_str(),
                &r.hora_llegada,
                &r.observacion,
                &r.registrado_por,
            ),
        )?;
        if let Some(j) = &r.justificacion {
            tx.execute(
                "INSERT INTO justifications(id, record_id, motivo, descripcion, documento,
                                            aprobado_por, aprobada)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                (
                    &j.id,
                    &r.id,
                    j.motivo.as_str(),
                    &j.descripcion,
                    &j.documento,
                    &j.aprobado_por,
                    j.aprobada as i64,
                ),
            )?;
        }
    }
    for r in &data.grades {
        tx.execute(
            "INSERT INTO grade_records(id, estudiante_id, materia_id, periodo, anio, registrado_por)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &r.id,
                &r.estudiante_id,
                &r.materia_id,
                r.periodo as i64,
                r.anio as i64,
                &r.registrado_por,
            ),
        )?;
        for (dimension, valoracion) in &r.valoraciones {
            tx.execute(
                "INSERT INTO grade_valuations(record_id, dimension, valoracion) VALUES(?, ?, ?)",
                (&r.id, dimension, valoracion.as_str()),
            )?;
        }
    }
    for r in &data.payments {
        tx.execute(
            "INSERT INTO payment_records(id, estudiante_id, mes, concepto, monto, monto_pagado,
                                         fecha_vencimiento, estado, registrado_por)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &r.id,
                &r.estudiante_id,
                &r.mes,
                &r.concepto,
                r.monto,
                r.monto_pagado,
                r.fecha_vencimiento.format("%Y-%m-%d").to_string(),
                r.estado.as_str(),
                &r.registrado_por,
            ),
        )?;
        for (i, a) in r.abonos.iter().enumerate() {
            tx.execute(
                "INSERT INTO abonos(id, payment_id, monto, fecha, metodo, recibo_no, sort_order)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                (
                    &a.id,
                    &r.id,
                    a.monto,
                    a.fecha.format("%Y-%m-%d").to_string(),
                    &a.metodo,
                    &a.recibo_no,
                    i as i64,
                ),
            )?;
        }
    }
    tx.commit()?;
    Ok(())
}
