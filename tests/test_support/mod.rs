#![allow(dead_code)]

use arise_content::{Category, ContentRecord, ContentStore};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tempfile::TempDir;

pub fn temp_dir(prefix: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("create temp dir")
}

pub fn fresh_store() -> ContentStore {
    ContentStore::open_in_memory().expect("open in-memory store")
}

pub fn quiz(title: &str, subject: &str, grade: &str) -> ContentRecord {
    ContentRecord::new(title, subject, grade).with_field(
        "questions",
        json!([{ "question": "2+2?", "options": ["3", "4"], "answer": "4" }]),
    )
}

/// Titles of every record in `category`, in storage order.
pub fn titles(store: &ContentStore, category: Category) -> Vec<String> {
    store
        .get_all(category)
        .expect("get_all")
        .into_iter()
        .map(|r| r.title)
        .collect()
}

pub struct Sidecar {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_sidecar() -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_arise-contentd");
    let mut child = Command::new(exe)
        .env_remove("ARISE_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn arise-contentd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
    }
}

pub fn request(sidecar: &mut Sidecar, id: &str, method: &str, params: Value) -> Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(sidecar.stdin, "{}", payload).expect("write request");
    sidecar.stdin.flush().expect("flush request");

    let mut line = String::new();
    sidecar
        .reader
        .read_line(&mut line)
        .expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(sidecar: &mut Sidecar, id: &str, method: &str, params: Value) -> Value {
    let value = request(sidecar, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(Value::Null)
}

pub fn error_code(value: &Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}
