use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Workspace};
use eunhad::registry::{TimeInput, TimeSlot, TimesForm};
use eunhad::{ClassId, StoreError};
use serde_json::json;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details: e.details(),
        }
    }
}

pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}

/// Result body for a gated call made without the admin capability.
pub fn skipped() -> serde_json::Value {
    json!({ "applied": false, "reason": "not_admin" })
}

pub fn workspace_mut(state: &mut AppState) -> Result<&mut Workspace, HandlerErr> {
    state.workspace.as_mut().ok_or_else(|| HandlerErr {
        code: "no_workspace",
        message: "select a workspace first".to_string(),
        details: None,
    })
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

pub fn get_required_bool(params: &serde_json::Value, key: &str) -> Result<bool, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_bool_or(params: &serde_json::Value, key: &str, default: bool) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

pub fn get_class_id(params: &serde_json::Value) -> Result<ClassId, HandlerErr> {
    Ok(get_required_str(params, "classId")?.parse::<ClassId>()?)
}

/// Reads a time field and its "none" flag, e.g. `outTime` + `outNone`.
pub fn get_time_input(params: &serde_json::Value, value_key: &str, none_key: &str) -> TimeInput {
    let mut input = TimeInput::at(get_optional_str(params, value_key).unwrap_or_default());
    input.set_none(get_bool_or(params, none_key, false));
    input
}

pub fn get_times_form(params: &serde_json::Value) -> TimesForm {
    let mut form = TimesForm::default();
    for slot in TimeSlot::ALL {
        *form.slot_mut(slot) = get_time_input(params, slot.field(), slot.none_field());
    }
    form
}
