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

fn setup(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) -> String {
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
    let created = request_ok(
        stdin,
        reader,
        "s3",
        "students.create",
        json!({ "nombre": "Ana Torres", "nivel": "parvulos" }),
    );
    created["student"]["id"].as_str().expect("id").to_string()
}

#[test]
fn scope_open_seeds_basico_and_commit_persists_valuations() {
    let workspace = temp_dir("aula-grades");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let estudiante = setup(&mut stdin, &mut reader, &workspace);

    let subjects = request_ok(&mut stdin, &mut reader, "1", "subjects.list", json!({}));
    let subjects = subjects["subjects"].as_array().expect("subjects");
    assert!(!subjects.is_empty());
    let materia = subjects[0]["id"].as_str().expect("materia id").to_string();
    let dimension = subjects[0]["dimensiones"][0]
        .as_str()
        .expect("dimension")
        .to_string();

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.scopeOpen",
        json!({ "estudianteId": estudiante, "periodo": 1, "anio": 2024 }),
    );
    let rows = opened["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), subjects.len());
    // Unselected dimensions read as basico from the moment the scope opens.
    for row in rows {
        let valoraciones = row["record"]["valoraciones"]
            .as_object()
            .expect("valoraciones");
        assert!(!valoraciones.is_empty());
        assert!(valoraciones.values().all(|v| v == "basico"));
    }

    let set = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.setValuation",
        json!({
            "materiaId": materia,
            "dimension": dimension,
            "valoracion": "superior",
        }),
    );
    assert_eq!(
        set["draft"]["valoraciones"][&dimension].as_str(),
        Some("superior")
    );

    let bad_dim = request(
        &mut stdin,
        &mut reader,
        "4",
        "grades.setValuation",
        json!({ "materiaId": materia, "dimension": "astral", "valoracion": "alto" }),
    );
    assert_eq!(error_code(&bad_dim), "bad_params");

    let committed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "grades.commit",
        json!({ "confirmado": true }),
    );
    assert_eq!(
        committed["committed"].as_u64(),
        Some(subjects.len() as u64)
    );

    let looked_up = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "grades.get",
        json!({
            "estudianteId": estudiante,
            "periodo": 1,
            "anio": 2024,
            "materiaId": materia,
            "dimension": dimension,
        }),
    );
    assert_eq!(looked_up["valoracion"].as_str(), Some("superior"));
    assert_eq!(
        looked_up["record"]["registradoPor"].as_str(),
        Some("prof1")
    );
}

#[test]
fn reopening_a_period_seeds_from_committed_records() {
    let workspace = temp_dir("aula-grades-reopen");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let estudiante = setup(&mut stdin, &mut reader, &workspace);

    let subjects = request_ok(&mut stdin, &mut reader, "1", "subjects.list", json!({}));
    let materia = subjects["subjects"][0]["id"]
        .as_str()
        .expect("materia id")
        .to_string();
    let dimension = subjects["subjects"][0]["dimensiones"][0]
        .as_str()
        .expect("dimension")
        .to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.scopeOpen",
        json!({ "estudianteId": estudiante, "periodo": 2, "anio": 2024 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.setValuation",
        json!({ "materiaId": materia, "dimension": dimension, "valoracion": "bajo" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "grades.commit",
        json!({ "confirmado": true }),
    );

    let reopened = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "grades.scopeOpen",
        json!({ "estudianteId": estudiante, "periodo": 2, "anio": 2024 }),
    );
    let row = reopened["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .find(|r| r["materiaId"] == materia.as_str())
        .expect("materia row")
        .clone();
    assert_eq!(row["record"]["valoraciones"][&dimension].as_str(), Some("bajo"));

    // Other periods stay untouched.
    let other = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "grades.get",
        json!({ "estudianteId": estudiante, "periodo": 1, "anio": 2024 }),
    );
    assert_eq!(
        other["records"].as_array().map(|a| a.len()),
        Some(0)
    );

    let unknown = request(
        &mut stdin,
        &mut reader,
        "7",
        "grades.scopeOpen",
        json!({ "estudianteId": "nope", "periodo": 1, "anio": 2024 }),
    );
    assert_eq!(error_code(&unknown), "not_found");
}
