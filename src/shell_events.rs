use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::append_desktop_log;

/// One-way lifecycle notifications from the privileged context to the UI
/// context. Names are the wire channel names the UI allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ShellEvent {
    Login,
    Logout,
    NewBooking,
    OpenPreferences,
    UpdateAvailable,
    UpdateDownloaded,
}

impl ShellEvent {
    pub(crate) fn channel_name(&self) -> &'static str {
        match self {
            ShellEvent::Login => "login",
            ShellEvent::Logout => "logout",
            ShellEvent::NewBooking => "new-booking",
            ShellEvent::OpenPreferences => "open-preferences",
            ShellEvent::UpdateAvailable => "update-available",
            ShellEvent::UpdateDownloaded => "update-downloaded",
        }
    }
}

/// Fire-and-forget delivery: no acknowledgment, and a send error only means
/// no UI context is currently subscribed.
pub(crate) fn emit_shell_event(events: &broadcast::Sender<ShellEvent>, event: ShellEvent) {
    if events.send(event).is_err() {
        append_desktop_log(&format!(
            "shell event '{}' dropped: no subscribers",
            event.channel_name()
        ));
    }
}
