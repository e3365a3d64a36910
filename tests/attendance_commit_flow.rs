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

fn setup_parvulos(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) -> Vec<String> {
    let _ = request_ok(
        stdin,
        reader,
        "s1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "s2",
        "session.setActor",
        json!({ "id": "prof1", "displayName": "Profe Uno", "role": "teacher" }),
    );
    let mut ids = Vec::new();
    for (i, nombre) in ["Ana Torres", "Benito Díaz", "Carla Mejía"].iter().enumerate() {
        let created = request_ok(
            stdin,
            reader,
            &format!("s3-{}", i),
            "students.create",
            json!({ "nombre": nombre, "nivel": "parvulos" }),
        );
        ids.push(
            created
                .get("student")
                .and_then(|s| s.get("id"))
                .and_then(|v| v.as_str())
                .expect("student id")
                .to_string(),
        );
    }
    ids
}

#[test]
fn incomplete_scope_blocks_then_full_commit_succeeds() {
    let workspace = temp_dir("aula-attendance-commit");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let ids = setup_parvulos(&mut stdin, &mut reader, &workspace);

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.scopeOpen",
        json!({ "fecha": "2024-03-04", "nivel": "parvulos" }),
    );
    assert_eq!(
        opened.get("rows").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(3)
    );

    // Mark two presente; the arrival time defaults in.
    for (i, id) in ids.iter().take(2).enumerate() {
        let marked = request_ok(
            &mut stdin,
            &mut reader,
            &format!("2-{}", i),
            "attendance.setStatus",
            json!({ "estudianteId": id, "estado": "presente", "ahora": "07:45" }),
        );
        assert_eq!(
            marked
                .get("draft")
                .and_then(|d| d.get("horaLlegada"))
                .and_then(|v| v.as_str()),
            Some("07:45")
        );
    }

    let blocked = request(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.commit",
        json!({ "confirmado": true, "hoy": "2024-03-04" }),
    );
    assert_eq!(error_code(&blocked), "validation_failed");
    let violations = blocked["error"]["details"]["violations"]
        .as_array()
        .expect("violations")
        .clone();
    assert!(violations
        .iter()
        .any(|v| v["rule"] == "incompleteScope" && v["faltantes"] == 1));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.setStatus",
        json!({ "estudianteId": ids[2], "estado": "ausente" }),
    );

    // Confirmation is a required explicit flag, not re-derived.
    let unconfirmed = request(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.commit",
        json!({ "hoy": "2024-03-04" }),
    );
    assert_eq!(error_code(&unconfirmed), "bad_params");

    let committed = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.commit",
        json!({ "confirmado": true, "hoy": "2024-03-04" }),
    );
    assert_eq!(committed.get("committed").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(
        committed
            .get("summary")
            .and_then(|s| s.get("porcentajeAsistencia"))
            .and_then(|v| v.as_i64()),
        Some(67)
    );

    // Re-opening the date shows the three as committed records, draft gone.
    let reopened = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.scopeOpen",
        json!({ "fecha": "2024-03-04", "nivel": "parvulos" }),
    );
    let rows = reopened.get("rows").and_then(|v| v.as_array()).expect("rows");
    assert_eq!(rows.len(), 3);
    for row in rows {
        let record = row.get("record").expect("record");
        assert!(!record.is_null(), "every student has a committed record");
        assert_eq!(
            record.get("registradoPor").and_then(|v| v.as_str()),
            Some("prof1")
        );
        assert!(record
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| !s.is_empty())
            .unwrap_or(false));
    }
}

#[test]
fn committed_records_survive_a_restart() {
    let workspace = temp_dir("aula-attendance-restart");
    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let ids = setup_parvulos(&mut stdin, &mut reader, &workspace);
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "attendance.scopeOpen",
            json!({ "fecha": "2024-03-04", "nivel": "parvulos" }),
        );
        for (i, id) in ids.iter().enumerate() {
            let _ = request_ok(
                &mut stdin,
                &mut reader,
                &format!("2-{}", i),
                "attendance.setStatus",
                json!({ "estudianteId": id, "estado": "presente", "ahora": "07:30" }),
            );
        }
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "attendance.commit",
            json!({ "confirmado": true, "hoy": "2024-03-04" }),
        );
        drop(stdin);
        let _ = child.wait();
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(
        selected.get("attendanceRecords").and_then(|v| v.as_u64()),
        Some(3)
    );
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.summary",
        json!({ "fecha": "2024-03-04" }),
    );
    assert_eq!(
        summary
            .get("summary")
            .and_then(|s| s.get("presentes"))
            .and_then(|v| v.as_u64()),
        Some(3)
    );
}

#[test]
fn discard_drops_pending_edits() {
    let workspace = temp_dir("aula-attendance-discard");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let ids = setup_parvulos(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.scopeOpen",
        json!({ "fecha": "2024-03-04", "nivel": "parvulos" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.setStatus",
        json!({ "estudianteId": ids[0], "estado": "presente", "ahora": "07:45" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "3", "attendance.discard", json!({}));

    let rows = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.records",
        json!({ "fecha": "2024-03-04", "nivel": "parvulos" }),
    );
    for row in rows.get("rows").and_then(|v| v.as_array()).expect("rows") {
        assert!(row.get("record").expect("record").is_null());
    }
}
