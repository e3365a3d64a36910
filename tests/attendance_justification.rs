use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_aulad");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn aulad");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn justification_reclassifies_absence_and_needs_admin_approval() {
    let workspace = temp_dir("aula-justification");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "session.setActor",
        json!({ "id": "prof1", "displayName": "Profe Uno", "role": "teacher" }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "nombre": "Ana Torres", "nivel": "parvulos" }),
    );
    let estudiante = created["student"]["id"].as_str().expect("id").to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.scopeOpen",
        json!({ "fecha": "2024-03-04", "nivel": "parvulos" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.setStatus",
        json!({ "estudianteId": estudiante, "estado": "ausente" }),
    );

    // An empty description is rejected before anything is attached.
    let empty = request(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.attachJustification",
        json!({ "estudianteId": estudiante, "motivo": "enfermedad", "descripcion": "  " }),
    );
    assert_eq!(error_code(&empty), "bad_params");

    let attached = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.attachJustification",
        json!({ "estudianteId": estudiante, "motivo": "enfermedad", "descripcion": "Gripe" }),
    );
    let draft = attached.get("draft").expect("draft");
    assert_eq!(draft["estado"].as_str(), Some("justificado"));
    assert_eq!(draft["justificacion"]["descripcion"].as_str(), Some("Gripe"));
    assert_eq!(draft["justificacion"]["aprobada"].as_bool(), Some(false));

    // Approval is admin-only, at draft level too.
    let forbidden = request(
        &mut stdin,
        &mut reader,
        "8",
        "attendance.approveJustification",
        json!({ "estudianteId": estudiante }),
    );
    assert_eq!(error_code(&forbidden), "forbidden");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "attendance.commit",
        json!({ "confirmado": true, "hoy": "2024-03-04" }),
    );

    // The justified absence no longer counts as unjustified.
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "attendance.summary",
        json!({ "fecha": "2024-03-04" }),
    );
    assert_eq!(summary["summary"]["justificados"].as_u64(), Some(1));
    assert_eq!(summary["summary"]["ausenciasSinJustificar"].as_u64(), Some(0));

    // Committed-record approval: still forbidden for the teacher, allowed
    // for an admin.
    let rows = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "attendance.records",
        json!({ "fecha": "2024-03-04", "nivel": "parvulos" }),
    );
    let record_id = rows["rows"][0]["record"]["id"]
        .as_str()
        .expect("record id")
        .to_string();

    let forbidden = request(
        &mut stdin,
        &mut reader,
        "12",
        "attendance.justificationApprove",
        json!({ "recordId": record_id }),
    );
    assert_eq!(error_code(&forbidden), "forbidden");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "session.setActor",
        json!({ "id": "admin1", "displayName": "Rectora", "role": "admin" }),
    );
    let approved = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "attendance.justificationApprove",
        json!({ "recordId": record_id }),
    );
    assert_eq!(
        approved["record"]["justificacion"]["aprobada"].as_bool(),
        Some(true)
    );
    assert_eq!(
        approved["record"]["justificacion"]["aprobadoPor"].as_str(),
        Some("admin1")
    );
}
