use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::{runtime_paths, DESKTOP_LOG_FILE};

/// Desktop log location; falls back to the working directory when no
/// application root can be resolved.
pub(crate) fn resolve_desktop_log_path(root_dir: Option<PathBuf>, file_name: &str) -> PathBuf {
    match root_dir {
        Some(root) => runtime_paths::logs_dir(&root).join(file_name),
        None => PathBuf::from(file_name),
    }
}

pub(crate) fn append_desktop_log(message: &str) {
    append_log_line("desktop", message);
}

pub(crate) fn append_startup_log(message: &str) {
    append_log_line("startup", message);
}

pub(crate) fn append_shutdown_log(message: &str) {
    append_log_line("shutdown", message);
}

pub(crate) fn append_sync_log(message: &str) {
    append_log_line("sync", message);
}

pub(crate) fn append_channel_log(message: &str) {
    append_log_line("channel", message);
}

fn format_log_line(area: &str, message: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    format!("[{timestamp}] [{area}] {message}\n")
}

// Logging must never take the shell down; all write failures are swallowed.
fn append_log_line(area: &str, message: &str) {
    let path = resolve_desktop_log_path(runtime_paths::default_app_root_dir(), DESKTOP_LOG_FILE);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && fs::create_dir_all(parent_dir).is_err() {
            return;
        }
    }

    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = file.write_all(format_log_line(area, message).as_bytes());
    }
}
