use crate::ipc::helpers::{
    get_bool_or, get_class_id, get_optional_str, get_required_str, respond, skipped,
    workspace_mut, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use eunhad::attendance::{parse_day, today};
use eunhad::search::student_view;
use eunhad::{Confirmation, Outcome};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let class_id = get_class_id(&req.params)?;
    let date = match get_optional_str(&req.params, "date") {
        Some(d) => parse_day(&d)?,
        None => today(),
    };
    let query = get_optional_str(&req.params, "query").unwrap_or_default();

    let (mode, rows) = student_view(ws.records.roster(), &query, class_id);
    let attendance = ws.records.attendance();
    let students: Vec<serde_json::Value> = rows
        .iter()
        .map(|r| {
            json!({
                "classId": r.class_id,
                "className": r.class_name,
                "name": r.name,
                "label": r.label(),
                "absent": attendance.is_absent(&date, r.class_id, &r.name),
            })
        })
        .collect();
    let count = ws.records.count_absent(&date, class_id)?;
    Ok(json!({
        "mode": mode,
        "classId": class_id,
        "date": date,
        "students": students,
        "count": count,
    }))
}

fn handle_students_add(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let cap = state.gate.capability();
    let ws = workspace_mut(state)?;
    let class_id = get_class_id(&req.params)?;
    let name = get_required_str(&req.params, "name")?;
    match ws.records.add_student(cap, class_id, &name)? {
        Outcome::Applied(name) => Ok(json!({
            "applied": true,
            "classId": class_id,
            "name": name,
            "total": ws.records.roster().total(class_id),
        })),
        Outcome::Skipped => Ok(skipped()),
    }
}

fn handle_students_remove(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let cap = state.gate.capability();
    let ws = workspace_mut(state)?;
    let class_id = get_class_id(&req.params)?;
    let name = get_required_str(&req.params, "name")?;
    let confirmation = Confirmation::from(get_bool_or(&req.params, "confirmed", false));
    match ws.records.remove_student(cap, class_id, &name, confirmation)? {
        Outcome::Applied(removed) => Ok(json!({
            "applied": true,
            "classId": class_id,
            "name": removed.name,
            "marksRemoved": removed.marks_removed,
            "total": ws.records.roster().total(class_id),
        })),
        Outcome::Skipped => Ok(skipped()),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "students.add" => handle_students_add(state, req),
        "students.remove" => handle_students_remove(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
