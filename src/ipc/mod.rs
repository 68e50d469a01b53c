mod error;
mod handlers;
mod router;
mod types;

pub use error::err;
pub use router::dispatch;
pub use types::{AppState, Dispatch, Job, Request, Services};
