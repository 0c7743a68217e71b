use crate::ipc::helpers::{
    get_bool_or, get_optional_str, get_required_bool, get_required_str, get_times_form,
    respond, skipped, workspace_mut, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use eunhad::registry::{EditEntry, StopForm, StopTimes, TimeSlot};
use eunhad::{Confirmation, Outcome, StoreError};
use serde_json::json;

fn get_slot(params: &serde_json::Value) -> Result<TimeSlot, HandlerErr> {
    Ok(get_required_str(params, "slot")?.parse::<TimeSlot>()?)
}

fn entry_json(id: &str, entry: &EditEntry) -> serde_json::Value {
    json!({
        "id": id,
        "form": entry.form,
        "base": entry.base,
        "dirty": entry.dirty,
        "conflict": entry.conflict,
    })
}

fn saved_json(id: &str, outcome: Outcome<StopTimes>) -> serde_json::Value {
    match outcome {
        Outcome::Applied(times) => json!({ "applied": true, "id": id, "times": times }),
        Outcome::Skipped => skipped(),
    }
}

fn handle_list(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    Ok(json!({
        "seq": ws.registry.last_seq(),
        "stops": ws.registry.stops(),
    }))
}

fn handle_search(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let term = get_optional_str(&req.params, "term").unwrap_or_default();
    let stops = ws.registry.search(&term, &ws.config.default_stop_search);
    Ok(json!({ "term": term, "stops": stops }))
}

async fn handle_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let cap = state.gate.capability();
    let ws = workspace_mut(state)?;
    let p = &req.params;
    let form = StopForm {
        apt: get_optional_str(p, "apt").unwrap_or_default(),
        stop: get_optional_str(p, "stop").unwrap_or_default(),
        times: get_times_form(p),
    };
    match ws.registry.create(cap, &form).await? {
        Outcome::Applied(id) => Ok(json!({
            "applied": true,
            "id": id,
            "stop": ws.registry.stop(&id),
        })),
        Outcome::Skipped => Ok(skipped()),
    }
}

async fn handle_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let cap = state.gate.capability();
    let ws = workspace_mut(state)?;
    let id = get_required_str(&req.params, "id")?;
    let form = get_times_form(&req.params);
    let outcome = ws.registry.update(cap, &id, &form).await?;
    Ok(saved_json(&id, outcome))
}

fn handle_edit_time(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let id = get_required_str(&req.params, "id")?;
    let slot = get_slot(&req.params)?;
    let value = get_required_str(&req.params, "value")?;
    ws.registry.edit_time(&id, slot, &value)?;
    buffer_entry(ws.registry.buffer().get(&id), &id)
}

fn handle_set_none(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let id = get_required_str(&req.params, "id")?;
    let slot = get_slot(&req.params)?;
    let none = get_required_bool(&req.params, "none")?;
    ws.registry.set_none(&id, slot, none)?;
    buffer_entry(ws.registry.buffer().get(&id), &id)
}

fn handle_discard(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let id = get_required_str(&req.params, "id")?;
    ws.registry.discard_edit(&id)?;
    buffer_entry(ws.registry.buffer().get(&id), &id)
}

fn buffer_entry(entry: Option<&EditEntry>, id: &str) -> Result<serde_json::Value, HandlerErr> {
    entry
        .map(|e| entry_json(id, e))
        .ok_or_else(|| StoreError::NotFound { what: format!("stop {id}") }.into())
}

async fn handle_save(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let cap = state.gate.capability();
    let ws = workspace_mut(state)?;
    let id = get_required_str(&req.params, "id")?;
    let outcome = ws.registry.save_edit(cap, &id).await?;
    Ok(saved_json(&id, outcome))
}

async fn handle_remove(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let cap = state.gate.capability();
    let ws = workspace_mut(state)?;
    let id = get_required_str(&req.params, "id")?;
    let confirmation = Confirmation::from(get_bool_or(&req.params, "confirmed", false));
    match ws.registry.remove(cap, &id, confirmation).await? {
        Outcome::Applied(()) => Ok(json!({ "applied": true, "id": id })),
        Outcome::Skipped => Ok(skipped()),
    }
}

fn handle_buffer(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let entries: Vec<serde_json::Value> = ws
        .registry
        .buffer()
        .iter()
        .map(|(id, e)| entry_json(id, e))
        .collect();
    Ok(json!({ "entries": entries }))
}

/// Applies snapshots this process has already published. The channel is in-process:
/// another sidecar writing the same `bus_stops.sqlite3` is not seen here until this
/// process publishes its own next snapshot, which re-reads the whole table.
fn handle_sync(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let ws = workspace_mut(state)?;
    let applied = ws.registry.apply_pending();
    Ok(json!({
        "applied": applied,
        "seq": ws.registry.last_seq(),
        "stops": ws.registry.stops().len(),
    }))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "stops.list" => handle_list(state),
        "stops.search" => handle_search(state, req),
        "stops.create" => handle_create(state, req).await,
        "stops.update" => handle_update(state, req).await,
        "stops.editTime" => handle_edit_time(state, req),
        "stops.setNone" => handle_set_none(state, req),
        "stops.discard" => handle_discard(state, req),
        "stops.save" => handle_save(state, req).await,
        "stops.remove" => handle_remove(state, req).await,
        "stops.buffer" => handle_buffer(state),
        "stops.sync" => handle_sync(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
