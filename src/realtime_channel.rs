use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::{
    append_channel_log, preference_store::PreferenceStore, AppContext, AUTH_TOKEN_KEY,
    DEFAULT_REALTIME_URL, REALTIME_URL_KEY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

/// Reconnect scheduling, injected by the runtime. The shipped client uses an
/// unconditional fixed delay; the exponential variant exists for embedders
/// that want backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReconnectPolicy {
    FixedDelay { delay: Duration },
    ExponentialBackoff { initial: Duration, max: Duration },
}

impl ReconnectPolicy {
    pub(crate) fn fixed(delay: Duration) -> Self {
        ReconnectPolicy::FixedDelay { delay }
    }

    pub(crate) fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            ReconnectPolicy::FixedDelay { delay } => *delay,
            ReconnectPolicy::ExponentialBackoff { initial, max } => {
                let scaled = initial.saturating_mul(1u32 << attempt.min(16));
                scaled.min(*max)
            }
        }
    }
}

/// Push messages from the booking service, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ServerPush {
    Notification { title: String, message: String },
    BookingUpdate { booking: Value },
    NewMessage { message: Value },
}

pub(crate) fn parse_server_push(text: &str) -> Result<ServerPush, String> {
    serde_json::from_str(text).map_err(|error| format!("Unrecognized realtime message: {error}"))
}

pub(crate) fn auth_frame(token: &str) -> String {
    json!({ "type": "auth", "token": token }).to_string()
}

pub(crate) fn resolve_realtime_url(preferences: &PreferenceStore) -> Result<Url, String> {
    let configured = preferences
        .get(REALTIME_URL_KEY)
        .and_then(|value| value.as_str().map(str::to_string));
    let raw = configured.as_deref().unwrap_or(DEFAULT_REALTIME_URL);

    let parsed =
        Url::parse(raw.trim()).map_err(|error| format!("Invalid realtime URL: {error}"))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        scheme => Err(format!(
            "Unsupported realtime URL scheme '{scheme}', only ws/wss are allowed."
        )),
    }
}

/// Connect-and-read loop with the explicit state machine Disconnected ->
/// Connecting -> Connected. Runs forever; every close or error schedules a
/// reconnect through the injected policy, with no max-retry and no user
/// notification (log only).
pub(crate) async fn run_channel_task(context: Arc<AppContext>, policy: ReconnectPolicy) {
    let mut state = ChannelState::Disconnected;
    let mut attempt: u32 = 0;

    loop {
        match connect_once(&context, &mut state).await {
            Ok(()) => attempt = 0,
            Err(error) => append_channel_log(&format!("realtime channel error: {error}")),
        }
        state = ChannelState::Disconnected;

        let delay = policy.delay_for_attempt(attempt);
        attempt = attempt.saturating_add(1);
        append_channel_log(&format!(
            "realtime channel disconnected; reconnecting in {}s",
            delay.as_secs()
        ));
        tokio::time::sleep(delay).await;
    }
}

async fn connect_once(context: &AppContext, state: &mut ChannelState) -> Result<(), String> {
    let url = resolve_realtime_url(&context.preferences)?;

    *state = ChannelState::Connecting;
    let (stream, _response) = connect_async(url.as_str())
        .await
        .map_err(|error| format!("Failed to connect realtime channel to {url}: {error}"))?;
    *state = ChannelState::Connected;
    append_channel_log(&format!("realtime channel connected to {url}"));

    let (mut writer, mut reader) = stream.split();

    if let Some(token) = context
        .preferences
        .get(AUTH_TOKEN_KEY)
        .and_then(|value| value.as_str().map(str::to_string))
    {
        writer
            .send(Message::Text(auth_frame(&token)))
            .await
            .map_err(|error| format!("Failed to send realtime auth frame: {error}"))?;
    }

    while let Some(frame) = reader.next().await {
        match frame {
            Ok(Message::Text(text)) => match parse_server_push(text.as_ref()) {
                Ok(push) => handle_server_push(push),
                Err(error) => append_channel_log(&error),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(error) => {
                append_channel_log(&format!("realtime channel read error: {error}"));
                break;
            }
        }
    }

    Ok(())
}

fn handle_server_push(push: ServerPush) {
    match push {
        ServerPush::Notification { title, message } => {
            append_channel_log(&format!("notification received: {title}: {message}"));
        }
        ServerPush::BookingUpdate { booking } => {
            let booking_id = booking
                .get("id")
                .map(Value::to_string)
                .unwrap_or_else(|| "unknown".to_string());
            append_channel_log(&format!("booking update received for booking {booking_id}"));
        }
        ServerPush::NewMessage { .. } => {
            append_channel_log("new chat message received");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_server_push_accepts_all_known_types() {
        let push = parse_server_push(
            r#"{"type":"notification","title":"Booking confirmed","message":"See you soon"}"#,
        )
        .expect("notification should parse");
        assert_eq!(
            push,
            ServerPush::Notification {
                title: "Booking confirmed".to_string(),
                message: "See you soon".to_string(),
            }
        );

        let push = parse_server_push(r#"{"type":"booking_update","booking":{"id":12}}"#)
            .expect("booking update should parse");
        assert_eq!(
            push,
            ServerPush::BookingUpdate {
                booking: json!({ "id": 12 })
            }
        );

        let push = parse_server_push(r#"{"type":"new_message","message":{"from":"host"}}"#)
            .expect("new message should parse");
        assert_eq!(
            push,
            ServerPush::NewMessage {
                message: json!({ "from": "host" })
            }
        );
    }

    #[test]
    fn parse_server_push_rejects_unknown_and_malformed_messages() {
        assert!(parse_server_push(r#"{"type":"presence","user":3}"#).is_err());
        assert!(parse_server_push(r#"{"title":"missing tag"}"#).is_err());
        assert!(parse_server_push("not json").is_err());
    }

    #[test]
    fn auth_frame_has_expected_shape() {
        let frame: Value = serde_json::from_str(&auth_frame("jwt-token")).expect("frame is JSON");
        assert_eq!(frame, json!({ "type": "auth", "token": "jwt-token" }));
    }

    #[test]
    fn fixed_policy_always_yields_the_same_delay() {
        let policy = ReconnectPolicy::fixed(Duration::from_secs(5));
        for attempt in [0, 1, 7, 100] {
            assert_eq!(policy.delay_for_attempt(attempt), Duration::from_secs(5));
        }
    }

    #[test]
    fn exponential_policy_grows_monotonically_and_caps() {
        let policy = ReconnectPolicy::ExponentialBackoff {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        };

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn realtime_url_defaults_and_validates_scheme() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PreferenceStore::open(dir.path().join("preferences.json")).expect("open");

        let url = resolve_realtime_url(&store).expect("default should resolve");
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/");

        store
            .set(REALTIME_URL_KEY, json!("wss://push.rentala.test/ws/"))
            .expect("set");
        let url = resolve_realtime_url(&store).expect("configured should resolve");
        assert_eq!(url.as_str(), "wss://push.rentala.test/ws/");

        store
            .set(REALTIME_URL_KEY, json!("http://push.rentala.test/ws/"))
            .expect("set");
        let error = resolve_realtime_url(&store).expect_err("http scheme should be rejected");
        assert!(error.contains("only ws/wss are allowed"));
    }

    #[tokio::test]
    async fn failed_connect_surfaces_a_transport_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PreferenceStore::open(dir.path().join("preferences.json")).expect("open");
        store
            .set(REALTIME_URL_KEY, json!("ws://127.0.0.1:1/ws/"))
            .expect("set");
        let context = AppContext::new(store);

        let mut state = ChannelState::Disconnected;
        let error = connect_once(&context, &mut state)
            .await
            .expect_err("nothing listens on port 1");

        assert!(error.contains("Failed to connect realtime channel"));
        assert_eq!(state, ChannelState::Connecting);
    }
}
