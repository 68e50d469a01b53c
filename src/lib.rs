pub mod clock;
pub mod config;
pub mod error;
pub mod ipc;
pub mod logging;
pub mod rpc;
pub mod sheets;
