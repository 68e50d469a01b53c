use crate::config::Config;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Dispatch, Request, Services};
use crate::rpc::RpcChannel;
use crate::sheets::TabularStore;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "configLoaded": state.services.is_some(),
            "configPath": state
                .services
                .as_ref()
                .map(|s| s.config_path.to_string_lossy().to_string())
        }),
    )
}

fn build_services(path: PathBuf) -> anyhow::Result<Services> {
    let config = Config::load(&path)?;
    let store = TabularStore::from_config(&config)?;
    let rpc = RpcChannel::from_config(&config);
    Ok(Services {
        config_path: path,
        config,
        store,
        rpc,
    })
}

fn handle_config_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match build_services(path) {
        Ok(services) => {
            let cfg = &services.config;
            tracing::info!(
                spreadsheet = %cfg.spreadsheet_id,
                tables = cfg.sheets.len(),
                "configuration loaded"
            );
            let result = json!({
                "spreadsheetId": cfg.spreadsheet_id,
                "rpcUrl": cfg.rpc_url,
                "transport": cfg.rpc_transport,
                "tables": cfg.sheets.keys().collect::<Vec<_>>(),
            });
            // A reload replaces the cache and any defaults from the old file.
            // Requests already running keep the services they started with.
            state.services = Some(Arc::new(services));
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "config_load_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Dispatch> {
    match req.method.as_str() {
        "health" => Some(Dispatch::Reply(handle_health(state, req))),
        "config.load" => Some(Dispatch::Reply(handle_config_load(state, req))),
        _ => None,
    }
}
