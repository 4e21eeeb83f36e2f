use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast;

use crate::{
    append_desktop_log, append_shutdown_log, append_startup_log, desktop_bridge, logging,
    preference_store::PreferenceStore, realtime_channel, runtime_paths, update_check, AppContext,
    AUTO_START_KEY, DESKTOP_LOG_FILE, RECONNECT_DELAY_SECS,
};

pub(crate) fn run() {
    append_startup_log("desktop process starting");
    append_startup_log(&format!(
        "desktop log path: {}",
        logging::resolve_desktop_log_path(runtime_paths::default_app_root_dir(), DESKTOP_LOG_FILE)
            .display()
    ));

    let Some(root_dir) = runtime_paths::default_app_root_dir() else {
        show_startup_error("Cannot resolve an application data directory.");
        return;
    };

    let preferences_path = runtime_paths::preferences_path(&root_dir);
    let preferences = match PreferenceStore::open(&preferences_path) {
        Ok(store) => store,
        Err(error) => {
            show_startup_error(&error);
            return;
        }
    };
    append_startup_log(&format!(
        "preference store loaded from {}",
        preferences_path.display()
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("error while building desktop runtime");

    runtime.block_on(async move {
        let context = Arc::new(AppContext::new(preferences));

        // Login-item registration itself belongs to the OS packaging layer;
        // the shell only persists and reports the preference.
        let auto_start = context
            .preferences
            .get(AUTO_START_KEY)
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        append_startup_log(&format!("auto-start preference: {auto_start}"));

        let _bridge_handle = desktop_bridge::spawn_bridge_loop(Arc::clone(&context));

        let mut shell_events = context.subscribe_shell_events();
        tokio::spawn(async move {
            loop {
                match shell_events.recv().await {
                    Ok(event) => {
                        append_desktop_log(&format!("shell event sent: {}", event.channel_name()));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        append_desktop_log(&format!("shell event log lagged, skipped {skipped}"));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let channel_context = Arc::clone(&context);
        tokio::spawn(async move {
            realtime_channel::run_channel_task(
                channel_context,
                realtime_channel::ReconnectPolicy::fixed(Duration::from_secs(
                    RECONNECT_DELAY_SECS,
                )),
            )
            .await;
        });

        tokio::spawn(update_check::run_update_check_task(Arc::clone(&context)));

        match tokio::signal::ctrl_c().await {
            Ok(()) => append_shutdown_log("interrupt received, exiting desktop process"),
            Err(error) => append_shutdown_log(&format!("failed to wait for interrupt: {error}")),
        }
    });
}

fn show_startup_error(message: &str) {
    append_startup_log(&format!("startup failed: {message}"));
    eprintln!("Rentala startup failed: {message}");
    std::process::exit(1);
}
