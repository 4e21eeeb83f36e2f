use std::{sync::Arc, time::Duration};

use semver::Version;
use serde_json::Value;

use crate::{
    append_desktop_log, emit_shell_event, request_bridge, AppContext, RequestConfig, RequestMethod,
    RequestResult, ShellEvent, UpdateCheckResult, UPDATE_CHECK_INTERVAL_SECS, VERSION_ENDPOINT,
};

/// Asks the booking API for its published client version and compares it to
/// this build. All failure modes come back as `ok: false` with a reason; the
/// caller decides whether that is worth surfacing.
pub(crate) async fn check_for_update(context: &AppContext) -> UpdateCheckResult {
    let current_version = env!("CARGO_PKG_VERSION");
    let result = request_bridge::dispatch(
        context,
        RequestConfig::new(RequestMethod::Get, VERSION_ENDPOINT),
    )
    .await;
    evaluate_version_response(current_version, &result)
}

pub(crate) fn evaluate_version_response(
    current_version: &str,
    result: &RequestResult,
) -> UpdateCheckResult {
    let failure = |reason: String| UpdateCheckResult {
        ok: false,
        reason: Some(reason),
        current_version: current_version.to_string(),
        latest_version: None,
        has_update: false,
    };

    let data = match result {
        RequestResult::Success { data, .. } => data,
        RequestResult::Failure { error, status } => {
            return failure(format!("Version check failed with status {status}: {error}"));
        }
    };

    let Some(latest_raw) = data.get("version").and_then(Value::as_str) else {
        return failure("Version response is missing a 'version' field.".to_string());
    };

    let current = match Version::parse(current_version) {
        Ok(version) => version,
        Err(error) => return failure(format!("Unparsable current version: {error}")),
    };
    let latest = match Version::parse(latest_raw) {
        Ok(version) => version,
        Err(error) => return failure(format!("Unparsable server version '{latest_raw}': {error}")),
    };

    UpdateCheckResult {
        ok: true,
        reason: None,
        current_version: current.to_string(),
        latest_version: Some(latest.to_string()),
        has_update: latest > current,
    }
}

/// Hourly fire-and-forget poll. Failures are logged and otherwise discarded;
/// this task never blocks anything else and never retries early.
pub(crate) async fn run_update_check_task(context: Arc<AppContext>) {
    loop {
        tokio::time::sleep(Duration::from_secs(UPDATE_CHECK_INTERVAL_SECS)).await;

        let outcome = check_for_update(&context).await;
        if outcome.has_update {
            append_desktop_log(&format!(
                "update available: current={} latest={}",
                outcome.current_version,
                outcome.latest_version.as_deref().unwrap_or("unknown")
            ));
            emit_shell_event(&context.shell_events, ShellEvent::UpdateAvailable);
        } else if let Some(reason) = outcome.reason {
            // Normal on fresh installs with no published version; stay silent.
            append_desktop_log(&format!("update check skipped: {reason}"));
        }
    }
}
