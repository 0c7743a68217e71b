use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use eunhad::ClassId;
use serde_json::json;

/// The class list is compiled in, so this answers before a workspace is open;
/// roster sizes are included once one is.
fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = state.workspace.as_ref().map(|w| w.records.roster());
    let classes: Vec<serde_json::Value> = ClassId::ALL
        .into_iter()
        .map(|c| {
            json!({
                "id": c,
                "name": c.display_name(),
                "total": roster.map(|r| r.total(c)),
            })
        })
        .collect();
    ok(&req.id, json!({ "classes": classes }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        _ => None,
    }
}
