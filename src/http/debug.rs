use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

const MASK: &str = "***REDACTED***";
const SECRET_NAMES: [&str; 8] = [
    "key",
    "api_key",
    "apikey",
    "x-goog-api-key",
    "authorization",
    "token",
    "secret",
    "password",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDebugConfig {
    pub enabled: bool,
    pub redact_secrets: bool,
    pub max_body_chars: usize,
}

impl HttpDebugConfig {
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            enabled: verbose,
            redact_secrets: true,
            max_body_chars: 4_000,
        }
    }

    pub fn disabled() -> Self {
        Self::from_verbose(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    fn marker(self) -> char {
        match self {
            Self::Outgoing => '>',
            Self::Incoming => '<',
        }
    }
}

/// Formats one side of an HTTP exchange as `[http-debug]` lines, masking secrets when configured.
pub fn exchange_lines(
    config: HttpDebugConfig,
    direction: Direction,
    headline: &str,
    headers: &HeaderMap,
    body: &str,
) -> Vec<String> {
    let marker = direction.marker();
    let mut lines = vec![format!("[http-debug] {marker} {headline}")];

    for (name, value) in headers {
        lines.push(format!(
            "[http-debug] {marker} {}: {}",
            name.as_str(),
            header_for_log(name.as_str(), value, config.redact_secrets)
        ));
    }
    lines.push(format!("[http-debug] {marker}"));

    let body = truncate_for_log(
        &body_for_log(body, config.redact_secrets),
        config.max_body_chars,
    );
    if body.is_empty() {
        lines.push(format!("[http-debug] {marker} <empty body>"));
    } else {
        lines.extend(
            body.lines()
                .map(|line| format!("[http-debug] {marker} {line}")),
        );
    }

    lines
}

pub fn url_for_log(url: &Url, redact: bool) -> String {
    if !redact || url.query().is_none() {
        return url.to_string();
    }

    let masked: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if is_secret_name(&name) {
                MASK.to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();

    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(masked);
    shown.to_string()
}

pub fn header_for_log(name: &str, value: &HeaderValue, redact: bool) -> String {
    if redact && is_secret_name(name) {
        return MASK.to_string();
    }
    value.to_str().unwrap_or("<non-utf8>").to_string()
}

/// JSON bodies get secret-named keys masked at any depth; other bodies pass through.
pub fn body_for_log(raw: &str, redact: bool) -> String {
    if !redact {
        return raw.to_string();
    }

    let Ok(mut json) = serde_json::from_str::<Value>(raw) else {
        return raw.to_string();
    };
    mask_secret_fields(&mut json);
    serde_json::to_string(&json).unwrap_or_else(|_| raw.to_string())
}

pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        None => input.to_string(),
        Some((cut, _)) => {
            let dropped = input[cut..].chars().count();
            format!("{}... <truncated {dropped} chars>", &input[..cut])
        }
    }
}

fn mask_secret_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (name, item) in map.iter_mut() {
                if is_secret_name(name) {
                    *item = Value::String(MASK.to_string());
                } else {
                    mask_secret_fields(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_secret_fields),
        _ => {}
    }
}

fn is_secret_name(name: &str) -> bool {
    SECRET_NAMES
        .iter()
        .any(|secret| secret.eq_ignore_ascii_case(name))
}
