use crate::{
    append_sync_log, request_bridge, AppContext, AtomicFlagGuard, OfflineQueueEntry, RequestConfig,
    RequestResult, SyncReport, OFFLINE_QUEUE_KEY,
};

/// Replays queued offline writes through the request bridge, sequentially and
/// in insertion order. Once every entry has been attempted the queue key is
/// deleted, even if some replays failed — the shipped client wipes the queue
/// unconditionally and this keeps that behavior; `SyncReport::failed` is how
/// callers find out what was lost.
pub(crate) async fn sync_offline_queue(context: &AppContext) -> Result<SyncReport, String> {
    let _guard = AtomicFlagGuard::try_set(&context.sync_in_progress)
        .ok_or_else(|| "Offline sync is already in progress.".to_string())?;

    let Some(raw_queue) = context.preferences.get(OFFLINE_QUEUE_KEY) else {
        return Ok(SyncReport {
            attempted: 0,
            failed: 0,
        });
    };

    let queue: Vec<OfflineQueueEntry> = serde_json::from_value(raw_queue)
        .map_err(|error| format!("Failed to parse offline queue: {error}"))?;
    if queue.is_empty() {
        return Ok(SyncReport {
            attempted: 0,
            failed: 0,
        });
    }

    let mut report = SyncReport {
        attempted: 0,
        failed: 0,
    };
    for entry in queue {
        report.attempted += 1;
        let config = RequestConfig {
            method: entry.method,
            url: entry.url.clone(),
            data: entry.data,
            params: None,
            headers: None,
        };
        if let RequestResult::Failure { error, status } =
            request_bridge::dispatch(context, config).await
        {
            report.failed += 1;
            append_sync_log(&format!(
                "offline replay {} {} failed with status {}: {}",
                entry.method.as_str(),
                entry.url,
                status,
                error
            ));
        }
    }

    context.preferences.delete(OFFLINE_QUEUE_KEY)?;
    append_sync_log(&format!(
        "offline queue replayed: attempted={} failed={}",
        report.attempted, report.failed
    ));

    Ok(report)
}
