use crate::ipc::helpers::{
    get_class_id, get_optional_str, get_required_bool, get_required_str, respond, workspace_mut,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use eunhad::attendance::{parse_day, today};
use serde_json::json;

/// `date` defaults to today.
fn get_date(params: &serde_json::Value) -> Result<String, HandlerErr> {
    match get_optional_str(params, "date") {
        Some(d) => Ok(parse_day(&d)?),
        None => Ok(today()),
    }
}

fn handle_toggle(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let date = get_date(&req.params)?;
    let class_id = get_class_id(&req.params)?;
    let name = get_required_str(&req.params, "name")?;
    let absent = get_required_bool(&req.params, "absent")?;
    let count = ws.records.toggle_absent(&date, class_id, &name, absent)?;
    Ok(json!({
        "date": date,
        "classId": class_id,
        "name": name,
        "absent": absent,
        "count": count,
    }))
}

fn handle_count(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let class_id = get_class_id(&req.params)?;
    let date = get_date(&req.params)?;
    let count = ws.records.count_absent(&date, class_id)?;
    Ok(json!({ "date": date, "classId": class_id, "count": count }))
}

fn handle_clear_day(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let class_id = get_class_id(&req.params)?;
    let date = get_date(&req.params)?;
    let count = ws.records.clear_day(&date, class_id)?;
    Ok(json!({ "date": date, "classId": class_id, "count": count }))
}

fn handle_day(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let class_id = get_class_id(&req.params)?;
    let date = get_date(&req.params)?;
    let absent = ws.records.absentees(&date, class_id)?;
    let count = ws.records.count_absent(&date, class_id)?;
    Ok(json!({
        "date": date,
        "classId": class_id,
        "absent": absent,
        "count": count,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.toggle" => handle_toggle(state, req),
        "attendance.count" => handle_count(state, req),
        "attendance.clearDay" => handle_clear_day(state, req),
        "attendance.day" => handle_day(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
