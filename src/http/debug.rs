use reqwest::Url;
use reqwest::header::HeaderValue;
use serde_json::Value;

const MASK: &str = "***REDACTED***";
const SECRET_NAMES: [&str; 8] = [
    "key",
    "api_key",
    "apikey",
    "token",
    "authorization",
    "password",
    "x-api-key",
    "x-goog-api-key",
];

/// Settings for the `--verbose` HTTP dump on stderr. Secrets are always
/// masked in this output; the session trace keeps raw bodies and masks only
/// credential headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDebugConfig {
    pub enabled: bool,
    pub max_body_chars: usize,
}

impl HttpDebugConfig {
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            enabled: verbose,
            max_body_chars: 4_000,
        }
    }

    pub fn disabled() -> Self {
        Self::from_verbose(false)
    }
}

pub(crate) fn masked_url(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let shown = if is_secret(&name) {
                MASK.to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), shown)
        })
        .collect();

    let mut masked = url.clone();
    masked.set_query(None);
    if !pairs.is_empty() {
        masked.query_pairs_mut().extend_pairs(pairs);
    }
    masked.to_string()
}

pub(crate) fn masked_header(name: &str, value: &HeaderValue) -> String {
    if is_secret(name) {
        return MASK.to_string();
    }
    value
        .to_str()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|_| "<non-utf8>".to_string())
}

/// Masks secret keys anywhere in a JSON body. Non-JSON bodies pass through.
pub(crate) fn masked_body(raw: &str) -> String {
    let Ok(mut json) = serde_json::from_str::<Value>(raw) else {
        return raw.to_string();
    };
    mask_json(&mut json);
    serde_json::to_string(&json).unwrap_or_else(|_| raw.to_string())
}

pub(crate) fn clip(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{kept}... <truncated {} chars>", total - max_chars)
}

fn mask_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                if is_secret(key) {
                    *item = Value::String(MASK.to_string());
                } else {
                    mask_json(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_json),
        _ => {}
    }
}

fn is_secret(name: &str) -> bool {
    SECRET_NAMES
        .iter()
        .any(|secret| secret.eq_ignore_ascii_case(name))
}
