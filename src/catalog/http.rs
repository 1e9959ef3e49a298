//! Blocking JSON-over-HTTP helper shared by the catalog clients.

use std::time::Duration;

use log::info;
use serde_json::Value;

use crate::config::CatalogConfig;

/// Thin `ureq` wrapper that tolerates the non-JSON bodies public catalogs
/// sometimes return.
pub struct JsonHttpClient {
    agent: ureq::Agent,
    user_agent: String,
}

impl JsonHttpClient {
    pub fn new(config: &CatalogConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(config.connect_timeout_ms))
            .timeout_read(Duration::from_millis(config.read_timeout_ms))
            .timeout_write(Duration::from_millis(config.read_timeout_ms))
            .build();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    /// Issues one GET. `Ok(None)` means the catalog answered without a usable
    /// JSON document (empty, HTML, or truncated body).
    pub fn get_json(&self, url: &str) -> Result<Option<Value>, String> {
        let response = self
            .agent
            .get(url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/json")
            .call()
            .map_err(|error| match error {
                ureq::Error::Status(code, _) => format!("HTTP status {code} for {url}"),
                ureq::Error::Transport(transport) => {
                    format!("Request failed for {url}: {transport}")
                }
            })?;
        let body = response
            .into_string()
            .map_err(|error| format!("Failed to read response from {url}: {error}"))?;
        parse_json_body(url, &body)
    }
}

/// Builds `{base}/{endpoint}?k=v&...` with every value URL-encoded.
pub fn request_url(base_url: &str, endpoint: &str, params: &[(&str, &str)]) -> String {
    let mut url = format!("{}/{endpoint}", base_url.trim_end_matches('/'));
    if params.is_empty() {
        return url;
    }

    url.push('?');
    for (index, (key, value)) in params.iter().enumerate() {
        if index > 0 {
            url.push('&');
        }
        url.push_str(key);
        url.push('=');
        url.push_str(urlencoding::encode(value).as_ref());
    }
    url
}

pub fn parse_json_body(url: &str, body: &str) -> Result<Option<Value>, String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        info!("Catalog returned empty body for {} (treating as no results)", url);
        return Ok(None);
    }
    if trimmed.starts_with('<') {
        info!(
            "Catalog returned non-JSON body for {} (treating as no results)",
            url
        );
        return Ok(None);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(error) if error.is_eof() => {
            info!(
                "Catalog returned truncated JSON for {} (treating as no results)",
                url
            );
            Ok(None)
        }
        Err(error) => {
            let snippet: String = trimmed.chars().take(120).collect();
            Err(format!(
                "Invalid JSON response: {error}; url={url}; prefix={snippet}"
            ))
        }
    }
}

/// Reads a field as a trimmed, non-empty string. Numeric ids are accepted too.
pub fn non_empty_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
