use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollbookd");
    let mut child = Command::new(exe)
        .env_remove("ROLLBOOKD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollbookd");
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

fn error_code(resp: &serde_json::Value) -> Option<&str> {
    resp.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn is_ok(resp: &serde_json::Value) -> bool {
    resp.get("ok").and_then(|v| v.as_bool()) == Some(true)
}

#[test]
fn login_gate_and_student_lifecycle() {
    let workspace = tempfile::tempdir().expect("workspace dir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(is_ok(&health));
    assert_eq!(health["result"]["loggedIn"], json!(false));

    let early = request(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(error_code(&early), Some("no_workspace"));

    let selected = request(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    assert!(is_ok(&selected));

    let gated = request(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(error_code(&gated), Some("not_authenticated"));

    let bad = request(
        &mut stdin,
        &mut reader,
        "5",
        "auth.login",
        json!({ "username": "admin", "password": "wrong" }),
    );
    assert_eq!(error_code(&bad), Some("invalid_credentials"));

    let blank = request(
        &mut stdin,
        &mut reader,
        "6",
        "auth.login",
        json!({ "username": "  ", "password": "1234" }),
    );
    assert_eq!(error_code(&blank), Some("bad_params"));

    let login = request(
        &mut stdin,
        &mut reader,
        "7",
        "auth.login",
        json!({ "username": "admin", "password": "1234" }),
    );
    assert!(is_ok(&login));
    assert!(login["result"]["sessionId"].as_str().is_some());

    let created = request(
        &mut stdin,
        &mut reader,
        "8",
        "students.create",
        json!({ "rollNo": 1, "name": "Alice", "marks": 95 }),
    );
    assert!(is_ok(&created));
    assert_eq!(created["result"]["student"]["grade"], json!("A+"));

    let dup = request(
        &mut stdin,
        &mut reader,
        "9",
        "students.create",
        json!({ "rollNo": 1, "name": "Bob", "marks": 50 }),
    );
    assert_eq!(error_code(&dup), Some("duplicate_key"));
    assert_eq!(dup["error"]["details"]["rollNo"], json!(1));

    let bad_roll = request(
        &mut stdin,
        &mut reader,
        "10",
        "students.create",
        json!({ "rollNo": 1.5, "name": "Half", "marks": 50 }),
    );
    assert_eq!(error_code(&bad_roll), Some("bad_params"));

    let out_of_range = request(
        &mut stdin,
        &mut reader,
        "11",
        "students.create",
        json!({ "rollNo": 2, "name": "Over", "marks": 120 }),
    );
    assert_eq!(error_code(&out_of_range), Some("validation_failed"));

    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "students.create",
        json!({ "rollNo": 2, "name": "Carl", "marks": 55 }),
    );
    let updated = request(
        &mut stdin,
        &mut reader,
        "13",
        "students.update",
        json!({ "rollNo": 2, "name": "Carl", "marks": 92 }),
    );
    assert_eq!(updated["result"]["student"]["grade"], json!("A+"));

    let missing = request(
        &mut stdin,
        &mut reader,
        "14",
        "students.update",
        json!({ "rollNo": 3, "name": "X", "marks": 10 }),
    );
    assert_eq!(error_code(&missing), Some("not_found"));

    let listed = request(&mut stdin, &mut reader, "15", "students.list", json!({}));
    let rolls: Vec<i64> = listed["result"]["students"]
        .as_array()
        .expect("students array")
        .iter()
        .filter_map(|s| s["rollNo"].as_i64())
        .collect();
    assert_eq!(rolls, vec![1, 2]);

    let summary = request(&mut stdin, &mut reader, "16", "stats.summary", json!({}));
    assert_eq!(summary["result"]["count"], json!(2));
    assert_eq!(summary["result"]["gradeCounts"]["A+"], json!(2));
    assert_eq!(summary["result"]["topper"]["rollNo"], json!(1));

    let deleted = request(
        &mut stdin,
        &mut reader,
        "17",
        "students.delete",
        json!({ "rollNo": 2 }),
    );
    assert!(is_ok(&deleted));
    let exists = request(
        &mut stdin,
        &mut reader,
        "18",
        "students.exists",
        json!({ "rollNo": 2 }),
    );
    assert_eq!(exists["result"]["exists"], json!(false));
    let got = request(
        &mut stdin,
        &mut reader,
        "19",
        "students.get",
        json!({ "rollNo": 2 }),
    );
    assert!(got["result"]["student"].is_null());

    let avg = request(&mut stdin, &mut reader, "20", "stats.average", json!({}));
    assert_eq!(avg["result"]["average"], json!(95.0));

    let logout = request(&mut stdin, &mut reader, "21", "auth.logout", json!({}));
    assert_eq!(logout["result"]["loggedOut"], json!(true));
    let after = request(&mut stdin, &mut reader, "22", "stats.topper", json!({}));
    assert_eq!(error_code(&after), Some("not_authenticated"));

    let unknown = request(&mut stdin, &mut reader, "23", "students.reorder", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn empty_store_aggregates_are_null() {
    let workspace = tempfile::tempdir().expect("workspace dir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "admin", "password": "1234" }),
    );
    let avg = request(&mut stdin, &mut reader, "3", "stats.average", json!({}));
    assert!(is_ok(&avg));
    assert!(avg["result"]["average"].is_null());
    let top = request(&mut stdin, &mut reader, "4", "stats.topper", json!({}));
    assert!(top["result"]["topper"].is_null());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_line_gets_bad_json() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response");
    assert_eq!(error_code(&value), Some("bad_json"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn status_and_backup_roundtrip_over_protocol() {
    let workspace = tempfile::tempdir().expect("workspace dir");
    let out = tempfile::tempdir().expect("out dir");
    let bundle = out.path().join("roll.zip");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let before = request(&mut stdin, &mut reader, "2", "auth.status", json!({}));
    assert_eq!(before["result"]["loggedIn"], json!(false));

    let login = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "username": "admin", "password": "1234" }),
    );
    let session_id = login["result"]["sessionId"]
        .as_str()
        .expect("sessionId")
        .to_string();
    let status = request(&mut stdin, &mut reader, "4", "auth.status", json!({}));
    assert_eq!(status["result"]["loggedIn"], json!(true));
    assert_eq!(status["result"]["username"], json!("admin"));
    assert_eq!(status["result"]["sessionId"], json!(session_id));
    assert!(status["result"]["since"].as_str().is_some());

    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "rollNo": 7, "name": "Dana", "marks": 81.5 }),
    );
    let exported = request(
        &mut stdin,
        &mut reader,
        "6",
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert!(is_ok(&exported));
    assert_eq!(exported["result"]["bundleFormat"], json!("rollbook-workspace-v1"));
    assert_eq!(exported["result"]["entryCount"], json!(3));

    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "students.delete",
        json!({ "rollNo": 7 }),
    );
    let imported = request(
        &mut stdin,
        &mut reader,
        "8",
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert!(is_ok(&imported));
    assert_eq!(
        imported["result"]["bundleFormatDetected"],
        json!("rollbook-workspace-v1")
    );

    // Session survives the import.
    let restored = request(
        &mut stdin,
        &mut reader,
        "9",
        "students.get",
        json!({ "rollNo": 7 }),
    );
    assert!(is_ok(&restored));
    assert_eq!(restored["result"]["student"]["name"], json!("Dana"));
    assert_eq!(restored["result"]["student"]["grade"], json!("A"));

    let junk = out.path().join("junk.txt");
    std::fs::write(&junk, b"not a backup").expect("write junk");
    let failed = request(
        &mut stdin,
        &mut reader,
        "10",
        "backup.importWorkspaceBundle",
        json!({ "inPath": junk.to_string_lossy() }),
    );
    assert_eq!(error_code(&failed), Some("backup_failed"));
    let still = request(
        &mut stdin,
        &mut reader,
        "11",
        "students.exists",
        json!({ "rollNo": 7 }),
    );
    assert_eq!(still["result"]["exists"], json!(true));

    let _ = request(&mut stdin, &mut reader, "12", "auth.logout", json!({}));
    let after = request(&mut stdin, &mut reader, "13", "auth.status", json!({}));
    assert_eq!(after["result"]["loggedIn"], json!(false));

    drop(stdin);
    let _ = child.wait();
}
