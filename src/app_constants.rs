/// Base URL used by the request bridge when no `api-url` preference is set.
pub(crate) const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Endpoint for the realtime push channel when no `ws-url` preference is set.
pub(crate) const DEFAULT_REALTIME_URL: &str = "ws://localhost:8000/ws/";

pub(crate) const API_URL_KEY: &str = "api-url";
pub(crate) const REALTIME_URL_KEY: &str = "ws-url";
pub(crate) const AUTH_TOKEN_KEY: &str = "auth_token";
pub(crate) const AUTO_START_KEY: &str = "auto-start";
pub(crate) const OFFLINE_QUEUE_KEY: &str = "offline_data";

pub(crate) const ROOT_DIR_ENV: &str = "RENTALA_ROOT";
pub(crate) const PREFERENCES_FILE: &str = "preferences.json";
pub(crate) const DESKTOP_LOG_FILE: &str = "desktop.log";

pub(crate) const VERSION_ENDPOINT: &str = "/version/";
pub(crate) const UPDATE_CHECK_INTERVAL_SECS: u64 = 3600;

/// The shipped client retries a dropped realtime socket on a fixed delay,
/// unconditionally.
pub(crate) const RECONNECT_DELAY_SECS: u64 = 5;

pub(crate) const SHELL_EVENT_CAPACITY: usize = 64;
pub(crate) const BRIDGE_QUEUE_CAPACITY: usize = 32;
