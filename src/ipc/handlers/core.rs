use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Workspace};
use eunhad::config::Config;
use eunhad::db;
use eunhad::registry::{SnapshotCache, SqliteStopStore};
use eunhad::{LocationRegistry, Records};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|w| w.path.to_string_lossy().to_string()),
            "capability": state.gate.capability(),
        }),
    )
}

async fn open_workspace(path: &Path) -> anyhow::Result<Workspace> {
    let conn = db::open_db(path)?;
    // Best-effort: a bad config file must not prevent the workspace from opening.
    let config = Config::load_for_workspace(path);
    let records = Records::load(conn)?;
    let store = Arc::new(SqliteStopStore::open(config.stop_store_path(path))?);
    let cache = SnapshotCache::open_or_degrade(&path.join(db::DB_FILE_NAME));
    let registry = LocationRegistry::connect(store, cache).await?;
    Ok(Workspace {
        path: path.to_path_buf(),
        config,
        records,
        registry,
    })
}

async fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(&path).await {
        Ok(ws) => {
            // New workspace, new secret: always start as guest.
            state.gate.rekey(ws.config.admin_secret.clone());
            let stops = ws.registry.stops().len();
            tracing::info!(path = %path.display(), stops, "workspace opened");
            state.workspace = Some(ws);
            ok(
                &req.id,
                json!({ "workspacePath": path.to_string_lossy(), "stops": stops }),
            )
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "workspace open failed");
            err(&req.id, "workspace_open_failed", format!("{e:?}"), None)
        }
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req).await),
        _ => None,
    }
}
