use super::handlers;
use super::types::{AppState, Dispatch, Request};
use crate::ipc::error::err;

/// Routes a request. Network-bound methods come back as
/// `Dispatch::Deferred` so the caller can run them off its own thread.
pub fn dispatch(state: &mut AppState, req: Request) -> Dispatch {
    if let Some(d) = handlers::core::try_handle(state, &req) {
        return d;
    }
    if let Some(d) = handlers::tables::try_handle(state, &req) {
        return d;
    }
    if let Some(d) = handlers::actions::try_handle(state, &req) {
        return d;
    }

    Dispatch::Reply(err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    ))
}
