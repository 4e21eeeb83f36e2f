use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::{
    emit_shell_event, offline_sync, request_bridge, update_check, AppContext, BridgeResult,
    RequestConfig, RequestResult, ShellEvent, SyncBridgeResult, UpdateCheckResult, AUTH_TOKEN_KEY,
    BRIDGE_QUEUE_CAPACITY,
};

/// Structured requests the untrusted UI context may send to the privileged
/// context. Tags are the IPC channel names the UI already speaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub(crate) enum BridgeRequest {
    StoreGet { key: String },
    StoreSet { key: String, value: Value },
    StoreDelete { key: String },
    StoreClear,
    ApiRequest { config: RequestConfig },
    SyncOfflineQueue,
    CheckAppUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum BridgeResponse {
    StoreValue(Option<Value>),
    Ack(BridgeResult),
    Api(RequestResult),
    Sync(SyncBridgeResult),
    Update(UpdateCheckResult),
}

/// Serves one bridge request. Handler failures are returned as data; this
/// surface never panics back at the UI.
pub(crate) async fn handle_bridge_request(
    context: &AppContext,
    request: BridgeRequest,
) -> BridgeResponse {
    match request {
        BridgeRequest::StoreGet { key } => BridgeResponse::StoreValue(context.preferences.get(&key)),
        BridgeRequest::StoreSet { key, value } => {
            let result = context.preferences.set(&key, value);
            if result.is_ok() && key == AUTH_TOKEN_KEY {
                emit_shell_event(&context.shell_events, ShellEvent::Login);
            }
            BridgeResponse::Ack(ack_from(result))
        }
        BridgeRequest::StoreDelete { key } => {
            let result = context.preferences.delete(&key);
            if result.is_ok() && key == AUTH_TOKEN_KEY {
                emit_shell_event(&context.shell_events, ShellEvent::Logout);
            }
            BridgeResponse::Ack(ack_from(result))
        }
        BridgeRequest::StoreClear => BridgeResponse::Ack(ack_from(context.preferences.clear())),
        BridgeRequest::ApiRequest { config } => {
            BridgeResponse::Api(request_bridge::dispatch(context, config).await)
        }
        BridgeRequest::SyncOfflineQueue => match offline_sync::sync_offline_queue(context).await {
            Ok(report) => BridgeResponse::Sync(SyncBridgeResult {
                ok: true,
                reason: None,
                attempted: report.attempted,
                failed: report.failed,
            }),
            Err(reason) => BridgeResponse::Sync(SyncBridgeResult {
                ok: false,
                reason: Some(reason),
                attempted: 0,
                failed: 0,
            }),
        },
        BridgeRequest::CheckAppUpdate => {
            BridgeResponse::Update(update_check::check_for_update(context).await)
        }
    }
}

fn ack_from(result: Result<(), String>) -> BridgeResult {
    match result {
        Ok(()) => BridgeResult {
            ok: true,
            reason: None,
        },
        Err(reason) => BridgeResult {
            ok: false,
            reason: Some(reason),
        },
    }
}

type BridgeEnvelope = (BridgeRequest, oneshot::Sender<BridgeResponse>);

/// UI-side handle: message passing only, no shared memory with the
/// privileged context.
#[derive(Clone)]
pub(crate) struct DesktopBridgeHandle {
    request_tx: mpsc::Sender<BridgeEnvelope>,
}

impl DesktopBridgeHandle {
    pub(crate) async fn invoke(&self, request: BridgeRequest) -> Result<BridgeResponse, String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .send((request, reply_tx))
            .await
            .map_err(|_| "Desktop bridge is not running.".to_string())?;
        reply_rx
            .await
            .map_err(|_| "Desktop bridge dropped the request.".to_string())
    }
}

/// Spawns the privileged serve loop. Requests are handled one at a time, in
/// arrival order.
pub(crate) fn spawn_bridge_loop(context: Arc<AppContext>) -> DesktopBridgeHandle {
    let (request_tx, mut request_rx) = mpsc::channel::<BridgeEnvelope>(BRIDGE_QUEUE_CAPACITY);

    tokio::spawn(async move {
        while let Some((request, reply_tx)) = request_rx.recv().await {
            let response = handle_bridge_request(&context, request).await;
            // A reply failure means the UI side stopped waiting.
            let _ = reply_tx.send(response);
        }
    });

    DesktopBridgeHandle { request_tx }
}
