use crate::ipc::error::{err, ok, sheets_err};
use crate::ipc::types::{AppState, Dispatch, Request};
use std::sync::Arc;
use serde_json::json;

fn no_config(req: &Request) -> serde_json::Value {
    err(&req.id, "no_config", "load a configuration first", None)
}

fn required_name(req: &Request) -> Result<String, serde_json::Value> {
    match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        Some(_) => Err(err(&req.id, "bad_params", "name must not be empty", None)),
        None => Err(err(&req.id, "bad_params", "missing name", None)),
    }
}

fn handle_tables_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return ok(&req.id, json!({ "tables": [] }));
    };
    let tables: Vec<serde_json::Value> = services
        .store
        .tables()
        .iter()
        .map(|(name, tab)| json!({ "name": name, "tab": tab }))
        .collect();
    ok(&req.id, json!({ "tables": tables }))
}

fn handle_tables_get(state: &mut AppState, req: &Request) -> Dispatch {
    let Some(services) = state.services.as_ref().map(Arc::clone) else {
        return Dispatch::Reply(no_config(req));
    };
    let name = match required_name(req) {
        Ok(v) => v,
        Err(resp) => return Dispatch::Reply(resp),
    };
    let range = req
        .params
        .get("range")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let id = req.id.clone();
    Dispatch::deferred(move || match services.store.get_table(&name, range.as_deref()) {
        Ok(values) => ok(&id, json!({ "values": values })),
        Err(e) => sheets_err(&id, &e),
    })
}

fn handle_tables_fetch(state: &mut AppState, req: &Request) -> Dispatch {
    let Some(services) = state.services.as_ref().map(Arc::clone) else {
        return Dispatch::Reply(no_config(req));
    };
    let name = match required_name(req) {
        Ok(v) => v,
        Err(resp) => return Dispatch::Reply(resp),
    };

    let id = req.id.clone();
    Dispatch::deferred(move || match services.store.fetch_and_parse(&name) {
        Ok(rows) => ok(&id, json!({ "rows": rows })),
        Err(e) => sheets_err(&id, &e),
    })
}

fn handle_tables_clear_cache(state: &mut AppState, req: &Request) -> serde_json::Value {
    let cleared = state
        .services
        .as_ref()
        .map(|s| s.store.clear_cache())
        .unwrap_or(0);
    ok(&req.id, json!({ "cleared": cleared }))
}

fn handle_tables_cache_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return ok(&req.id, json!({ "entries": [] }));
    };
    let entries: Vec<serde_json::Value> = services
        .store
        .cached_entries()
        .into_iter()
        .map(|e| {
            json!({
                "name": e.name,
                "range": e.range,
                "ageMs": e.age.as_millis() as u64,
            })
        })
        .collect();
    ok(
        &req.id,
        json!({
            "ttlMs": services.store.ttl().as_millis() as u64,
            "entries": entries
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Dispatch> {
    match req.method.as_str() {
        "tables.list" => Some(Dispatch::Reply(handle_tables_list(state, req))),
        "tables.get" => Some(handle_tables_get(state, req)),
        "tables.fetch" => Some(handle_tables_fetch(state, req)),
        "tables.clearCache" => Some(Dispatch::Reply(handle_tables_clear_cache(state, req))),
        "tables.cacheStatus" => Some(Dispatch::Reply(handle_tables_cache_status(state, req))),
        _ => None,
    }
}
