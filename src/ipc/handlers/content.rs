use crate::content::Category;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::snapshot::ExportSelection;
use serde_json::json;
use std::path::PathBuf;

pub(crate) fn category_param(req: &Request) -> Result<Category, serde_json::Value> {
    let Some(raw) = req.params.get("category").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing category", None));
    };
    Category::parse(raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "category must be one of: quiz, lesson, game",
            Some(json!({ "category": raw })),
        )
    })
}

pub(crate) fn id_param(req: &Request) -> Result<i64, serde_json::Value> {
    req.params
        .get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", "missing or non-integer id", None))
}

fn handle_content_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let category = match category_param(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Some(record) = req.params.get("record").cloned() else {
        return err(&req.id, "bad_params", "missing record", None);
    };

    match store.add_json(category, record) {
        Ok(id) => ok(&req.id, json!({ "id": id, "category": category.as_str() })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_content_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let category = match category_param(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let id = match id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.get_by_id(category, id) {
        Ok(rec) => ok(
            &req.id,
            json!({ "record": rec.map(|r| r.to_json()) }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_content_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let category = match category_param(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let rows = match req.params.get("subject").and_then(|v| v.as_str()) {
        Some(subject) => store.get_by_subject(category, subject),
        None => store.get_all(category),
    };
    match rows {
        Ok(records) => {
            let records: Vec<serde_json::Value> = records.iter().map(|r| r.to_json()).collect();
            ok(&req.id, json!({ "records": records }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_content_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let result = if let Some(snapshot) = req.params.get("snapshot") {
        match snapshot {
            // Raw file contents passed through by the host.
            serde_json::Value::String(text) => store.import_snapshot_text(text),
            other => store.import_snapshot(other),
        }
    } else if let Some(in_path) = req.params.get("inPath").and_then(|v| v.as_str()) {
        store.import_snapshot_file(&PathBuf::from(in_path))
    } else {
        return err(
            &req.id,
            "bad_params",
            "provide params.snapshot or params.inPath",
            None,
        );
    };

    match result {
        Ok(summary) => ok(
            &req.id,
            json!({
                "inserted": summary.inserted(),
                "skipped": summary.skipped(),
                "categories": summary,
            }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_content_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let selection = ExportSelection::from_json(&req.params);

    let Some(out_path) = req.params.get("outPath").and_then(|v| v.as_str()) else {
        return match store.export_snapshot(&selection) {
            Ok(snap) => ok(&req.id, json!({ "snapshot": snap.to_json() })),
            Err(e) => store_err(&req.id, &e),
        };
    };

    match store.export_snapshot_file(
        &selection,
        &PathBuf::from(out_path),
        state.config.pretty_export,
    ) {
        Ok((snap, path)) => ok(
            &req.id,
            json!({
                "snapshot": snap.to_json(),
                "path": path.to_string_lossy(),
            }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "content.add" => Some(handle_content_add(state, req)),
        "content.get" => Some(handle_content_get(state, req)),
        "content.list" => Some(handle_content_list(state, req)),
        "content.import" => Some(handle_content_import(state, req)),
        "content.export" => Some(handle_content_export(state, req)),
        _ => None,
    }
}
