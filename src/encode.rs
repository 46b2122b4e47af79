//! Wire encoding for the v1 (form) and v2 (JSON) room notification APIs.

use serde::Serialize;

use crate::config::{ApiVersion, Config};
use crate::format::transform;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A fully built request, ready for a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl EncodedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transform `raw_input` and encode it for the API selected in `config`.
pub fn encode(raw_input: &str, config: &Config) -> EncodedRequest {
    let message = transform(raw_input, config.format);
    match config.api {
        ApiVersion::V1 => EncodedRequest {
            method: "POST",
            url: format!("https://{}/v1/rooms/message", config.host),
            headers: vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: v1_body(&message, config),
        },
        ApiVersion::V2 => EncodedRequest {
            method: "POST",
            url: format!(
                "https://{}/v2/room/{}/notification",
                config.host, config.room_id
            ),
            headers: vec![
                ("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()),
                ("Authorization".to_string(), format!("Bearer {}", config.token)),
            ],
            body: v2_body(&message, config),
        },
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode every byte outside `[A-Za-z0-9]` as uppercase `%XX`.
pub fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
            out.push(HEX_DIGITS[usize::from(byte & 0x0F)] as char);
        }
    }
    out
}

/// Escape backslashes, then double quotes.
pub fn json_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Form body for the v1 API. Only the message is percent-encoded; the other
/// fields go on the wire as given.
pub fn v1_body(message: &str, config: &Config) -> String {
    format!(
        "auth_token={}&room_id={}&from={}&color={}&message_format={}&message={}&notify={}",
        config.token,
        config.room_id,
        config.from,
        config.color,
        config.format,
        percent_encode(message),
        if config.notify { 1 } else { 0 },
    )
}

/// JSON body for the v2 API; `from` is only sent when set.
pub fn v2_body(message: &str, config: &Config) -> String {
    let from = if config.from.is_empty() {
        String::new()
    } else {
        format!("\"from\": \"{}\", ", config.from)
    };
    format!(
        "{{\"color\": \"{}\", {}\"message\":\"{}\", \"message_format\":\"{}\", \"notify\":{}}}",
        config.color,
        from,
        json_escape(message),
        config.format,
        config.notify,
    )
}
