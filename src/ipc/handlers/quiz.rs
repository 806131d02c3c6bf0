use crate::content::Category;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::handlers::content::id_param;
use crate::ipc::types::{AppState, Request};
use crate::quiz;
use serde_json::json;

fn handle_quiz_share(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let id = match id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let rec = match store.get_by_id(Category::Quiz, id) {
        Ok(Some(r)) => r,
        Ok(None) => return err(&req.id, "not_found", "quiz not found", Some(json!({ "id": id }))),
        Err(e) => return store_err(&req.id, &e),
    };
    let payload = quiz::share_payload(&rec);
    let text = payload.to_string();
    ok(&req.id, json!({ "payload": payload, "text": text }))
}

fn handle_quiz_import_shared(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    match quiz::import_shared_quiz(store, text) {
        Ok(id) => ok(&req.id, json!({ "id": id })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_quiz_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let id = match id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let selections: Vec<Option<String>> = match req.params.get("selections") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(s) => s,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("selections must be an array of strings or nulls: {e}"),
                    None,
                )
            }
        },
        None => Vec::new(),
    };

    let rec = match store.get_by_id(Category::Quiz, id) {
        Ok(Some(r)) => r,
        Ok(None) => return err(&req.id, "not_found", "quiz not found", Some(json!({ "id": id }))),
        Err(e) => return store_err(&req.id, &e),
    };
    let questions = match quiz::questions(&rec) {
        Ok(q) => q,
        Err(e) => {
            return err(
                &req.id,
                "malformed_record",
                format!("quiz questions are malformed: {e}"),
                Some(json!({ "id": id })),
            )
        }
    };
    let score = quiz::score_attempt(&questions, &selections);
    ok(&req.id, json!({ "correct": score.correct, "total": score.total }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "quiz.share" => Some(handle_quiz_share(state, req)),
        "quiz.importShared" => Some(handle_quiz_import_shared(state, req)),
        "quiz.score" => Some(handle_quiz_score(state, req)),
        _ => None,
    }
}
