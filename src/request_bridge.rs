use serde_json::Value;
use url::Url;

use crate::{
    preference_store::PreferenceStore, AppContext, RequestConfig, RequestResult, API_URL_KEY,
    DEFAULT_API_BASE_URL,
};

/// The bridge never issues a request without a base URL: the `api-url`
/// preference wins when present and non-blank, otherwise the built-in
/// default. A stored value is used as-is; an unusable one surfaces as a
/// request failure at dispatch rather than a silent redirect elsewhere.
pub(crate) fn resolve_base_url(preferences: &PreferenceStore) -> String {
    let configured = preferences
        .get(API_URL_KEY)
        .and_then(|value| value.as_str().map(str::trim).map(str::to_string));
    match configured {
        Some(value) if !value.is_empty() => value.trim_end_matches('/').to_string(),
        _ => DEFAULT_API_BASE_URL.to_string(),
    }
}

/// An already-absolute request URL bypasses the base, matching the HTTP
/// client the shipped renderer used.
pub(crate) fn join_request_url(base_url: &str, path: &str) -> String {
    if is_absolute_request_url(path) {
        return path.to_string();
    }
    if path.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// Only `scheme://host` forms count as absolute. A bare `scheme:` prefix is
// not enough: `url` parses any colon-bearing string such as
// `section:5/items`, which is still a path relative to the base.
fn is_absolute_request_url(path: &str) -> bool {
    Url::parse(path)
        .map(|parsed| parsed.has_host())
        .unwrap_or(false)
}

/// Forwards one request to the booking API. Every failure mode comes back as
/// a `RequestResult` value: transport errors default to status 500, HTTP
/// errors carry the server status. No retry, no timeout, no body validation.
pub(crate) async fn dispatch(context: &AppContext, config: RequestConfig) -> RequestResult {
    let request_url = join_request_url(&resolve_base_url(&context.preferences), &config.url);

    let mut request = context.http.request(config.method.as_http(), &request_url);
    if let Some(params) = &config.params {
        request = request.query(params);
    }
    if let Some(headers) = &config.headers {
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
    }
    if let Some(data) = &config.data {
        request = request.json(data);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(error) => {
            let status = error.status().map(|status| status.as_u16()).unwrap_or(500);
            return RequestResult::Failure {
                error: error.to_string(),
                status,
            };
        }
    };

    let status = response.status().as_u16();
    if !response.status().is_success() {
        return RequestResult::Failure {
            error: format!("Request failed with status code {status}"),
            status,
        };
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(error) => {
            return RequestResult::Failure {
                error: format!("Failed to read response body: {error}"),
                status: 500,
            };
        }
    };

    let data = if body.is_empty() {
        Value::Null
    } else {
        // Non-JSON bodies are relayed verbatim as a JSON string.
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };

    RequestResult::Success { data, status }
}
