#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod desktop_bridge;
mod logging;
mod offline_sync;
mod preference_store;
mod realtime_channel;
mod request_bridge;
mod runtime_paths;
mod shell_events;
mod update_check;

pub(crate) use app_constants::*;
pub(crate) use app_types::{
    AppContext, AtomicFlagGuard, BridgeResult, OfflineQueueEntry, RequestConfig, RequestMethod,
    RequestResult, SyncBridgeResult, SyncReport, UpdateCheckResult,
};
pub(crate) use logging::{
    append_channel_log, append_desktop_log, append_shutdown_log, append_startup_log,
    append_sync_log,
};
pub(crate) use shell_events::{emit_shell_event, ShellEvent};

fn main() {
    app_runtime::run();
}
