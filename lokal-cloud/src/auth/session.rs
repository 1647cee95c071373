//! Session token extraction
//!
//! A bearer header wins. Otherwise the token is rebuilt from the session
//! cookie, which the browser client splits into numbered chunks
//! (`<name>.0`, `<name>.1`, …) once it outgrows a single cookie.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};
use serde_json::Value;

const BASE64_PREFIX: &str = "base64-";

/// All cookies of the request, in header order
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// First cookie named `name`
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    parse_cookies(headers)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Access token from the bearer header or the (possibly chunked) session cookie
pub fn extract_token(headers: &HeaderMap, session_cookie: &str) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }
    let raw = reassemble_session_cookie(&parse_cookies(headers), session_cookie)?;
    decode_session(&raw)
}

/// Concatenate numbered chunks in ascending order; the plain cookie is
/// only used when there are no chunks.
pub fn reassemble_session_cookie(cookies: &[(String, String)], base: &str) -> Option<String> {
    let prefix = format!("{base}.");
    let mut chunks: Vec<(u32, &str)> = cookies
        .iter()
        .filter_map(|(name, value)| {
            let index = name.strip_prefix(&prefix)?.parse::<u32>().ok()?;
            Some((index, value.as_str()))
        })
        .collect();

    if chunks.is_empty() {
        return cookies
            .iter()
            .find(|(name, _)| name == base)
            .map(|(_, value)| value.clone())
            .filter(|v| !v.is_empty());
    }

    chunks.sort_by_key(|(index, _)| *index);
    Some(chunks.into_iter().map(|(_, value)| value).collect())
}

/// Decode a session cookie value into its access token
///
/// Percent-decode, strip an optional `base64-` prefix and decode, then read
/// `access_token` from a JSON object or the first element of a JSON array.
pub fn decode_session(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    let json = match decoded.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let encoded = encoded.trim_end_matches('=');
            let bytes = URL_SAFE_NO_PAD
                .decode(encoded)
                .or_else(|_| STANDARD.decode(pad(encoded)))
                .ok()?;
            String::from_utf8(bytes).ok()?
        }
        None => decoded.into_owned(),
    };

    let token = match serde_json::from_str::<Value>(&json).ok()? {
        Value::Object(map) => map.get("access_token")?.as_str()?.to_string(),
        Value::Array(items) => items.first()?.as_str()?.to_string(),
        Value::String(token) => token,
        _ => return None,
    };
    (!token.is_empty()).then_some(token)
}

fn pad(encoded: &str) -> String {
    let mut s = encoded.to_string();
    while s.len() % 4 != 0 {
        s.push('=');
    }
    s
}
