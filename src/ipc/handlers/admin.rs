use crate::ipc::helpers::{get_required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn status(state: &AppState) -> serde_json::Value {
    json!({
        "admin": state.gate.is_admin(),
        "capability": state.gate.capability(),
    })
}

/// A wrong secret is reported in the result, not as an error.
fn handle_enter(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let secret = get_required_str(&req.params, "secret")?;
    state.gate.enter(&secret);
    Ok(status(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "admin.enter" => handle_enter(state, req),
        "admin.exit" => {
            state.gate.exit();
            Ok(status(state))
        }
        "admin.status" => Ok(status(state)),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
