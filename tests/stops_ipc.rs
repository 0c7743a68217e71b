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
    let exe = env!("CARGO_BIN_EXE_eunhad");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn eunhad");
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
    value.get("result").cloned().unwrap_or(json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn open_as_admin(prefix: &str) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let workspace = temp_dir(prefix);
    let (child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "open",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "admin",
        "admin.enter",
        json!({ "secret": "0000" }),
    );
    (child, stdin, reader)
}

#[test]
fn create_requires_time_or_none() {
    let (mut child, mut stdin, mut reader) = open_as_admin("eunhad-stops-create");

    let pending = request(
        &mut stdin,
        &mut reader,
        "1",
        "stops.create",
        json!({ "apt": "검단신도시", "stop": "정문", "outNone": true }),
    );
    assert_eq!(error_code(&pending), "validation_failed");
    assert_eq!(pending["error"]["details"]["field"], "inTime");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "stops.create",
        json!({ "apt": "검단신도시", "stop": "정문", "inNone": true, "outTime": "15:30" }),
    );
    assert_eq!(created["applied"], true);
    assert_eq!(created["stop"]["inTime"], "");
    assert_eq!(created["stop"]["outTime"], "15:30");
    assert_eq!(created["stop"]["outTime2"], "");

    let bad_text = request(
        &mut stdin,
        &mut reader,
        "3",
        "stops.create",
        json!({ "apt": "검단<신도시>", "stop": "정문", "inTime": "08:00", "outNone": true }),
    );
    assert_eq!(error_code(&bad_text), "validation_failed");
    assert_eq!(bad_text["error"]["details"]["field"], "apt");

    let bad_time = request(
        &mut stdin,
        &mut reader,
        "4",
        "stops.create",
        json!({ "apt": "푸르지오", "stop": "후문", "inTime": "8시", "outNone": true }),
    );
    assert_eq!(error_code(&bad_time), "validation_failed");

    let list = request_ok(&mut stdin, &mut reader, "5", "stops.list", json!({}));
    assert_eq!(list["stops"].as_array().map(|a| a.len()), Some(1));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn edit_and_save_in_time_keeps_none_slots_empty() {
    let (mut child, mut stdin, mut reader) = open_as_admin("eunhad-stops-edit");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "stops.create",
        json!({ "apt": "검단신도시", "stop": "정문", "inTime": "08:00", "outNone": true }),
    );
    let id = created["id"].as_str().expect("id").to_string();
    let before = created["stop"]["updatedAt"].clone();

    let entry = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "stops.editTime",
        json!({ "id": id, "slot": "inTime", "value": "08:10" }),
    );
    assert_eq!(entry["dirty"], true);
    assert_eq!(entry["form"]["outTime"]["none"], true);

    let saved = request_ok(&mut stdin, &mut reader, "3", "stops.save", json!({ "id": id }));
    assert_eq!(saved["applied"], true);
    assert_eq!(
        saved["times"],
        json!({ "inTime": "08:10", "outTime": "", "outTime2": "" })
    );

    let list = request_ok(&mut stdin, &mut reader, "4", "stops.list", json!({}));
    let stop = &list["stops"][0];
    assert_eq!(stop["inTime"], "08:10");
    assert_eq!(stop["outTime"], "");
    assert_eq!(stop["outTime2"], "");
    assert_eq!(stop["apt"], "검단신도시");
    assert_ne!(stop["updatedAt"], before);

    let buffer = request_ok(&mut stdin, &mut reader, "5", "stops.buffer", json!({}));
    assert_eq!(buffer["entries"][0]["dirty"], false);
    assert_eq!(buffer["entries"][0]["conflict"], false);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn guest_cannot_write_stops() {
    let (mut child, mut stdin, mut reader) = open_as_admin("eunhad-stops-guest");
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "stops.create",
        json!({ "apt": "검단신도시", "stop": "정문", "inTime": "08:00", "outTime": "15:00" }),
    );
    let id = created["id"].as_str().expect("id").to_string();
    let _ = request_ok(&mut stdin, &mut reader, "2", "admin.exit", json!({}));

    for (i, (method, params)) in [
        (
            "stops.create",
            json!({ "apt": "푸르지오", "stop": "후문", "inTime": "08:00", "outTime": "15:00" }),
        ),
        ("stops.update", json!({ "id": id, "inTime": "09:00", "outNone": true })),
        ("stops.save", json!({ "id": id })),
        ("stops.remove", json!({ "id": id, "confirmed": true })),
    ]
    .into_iter()
    .enumerate()
    {
        let r = request_ok(&mut stdin, &mut reader, &format!("g{}", i), method, params);
        assert_eq!(r, json!({ "applied": false, "reason": "not_admin" }), "{}", method);
    }

    let list = request_ok(&mut stdin, &mut reader, "3", "stops.list", json!({}));
    assert_eq!(list["stops"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(list["stops"][0]["inTime"], "08:00");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn remove_needs_confirmation_and_search_defaults() {
    let (mut child, mut stdin, mut reader) = open_as_admin("eunhad-stops-remove");
    let mut ids = Vec::new();
    for (i, (apt, stop)) in [("검단신도시 2단지", "정문"), ("호반베르디움", "후문")]
        .into_iter()
        .enumerate()
    {
        let r = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{}", i),
            "stops.create",
            json!({ "apt": apt, "stop": stop, "inTime": "08:00", "outTime": "15:00" }),
        );
        ids.push(r["id"].as_str().expect("id").to_string());
    }

    let found = request_ok(&mut stdin, &mut reader, "1", "stops.search", json!({ "term": "" }));
    let apts: Vec<&str> = found["stops"]
        .as_array()
        .expect("stops")
        .iter()
        .map(|s| s["apt"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(apts, vec!["검단신도시 2단지"]);

    let found = request_ok(&mut stdin, &mut reader, "2", "stops.search", json!({ "term": "후문" }));
    assert_eq!(found["stops"][0]["apt"], "호반베르디움");

    let declined = request(
        &mut stdin,
        &mut reader,
        "3",
        "stops.remove",
        json!({ "id": ids[0], "confirmed": false }),
    );
    assert_eq!(error_code(&declined), "confirmation_declined");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "stops.remove",
        json!({ "id": ids[0], "confirmed": true }),
    );
    let missing = request(
        &mut stdin,
        &mut reader,
        "5",
        "stops.remove",
        json!({ "id": ids[0], "confirmed": true }),
    );
    assert_eq!(error_code(&missing), "not_found");

    let buffer = request_ok(&mut stdin, &mut reader, "6", "stops.buffer", json!({}));
    assert_eq!(buffer["entries"].as_array().map(|a| a.len()), Some(1));

    drop(stdin);
    let _ = child.wait();
}
