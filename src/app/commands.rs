//! Inbound requests from the local configuration page.
//!
//! The HTTP server decodes each request into an [`InboundRequest`]; the
//! [`BoilerService`](super::service::BoilerService) answers with a
//! [`Response`].  Field names match the configuration page's form.

use log::warn;

use super::state::StatusReport;

/// Form field names.
pub mod field {
    pub const SSID: &str = "ssid";
    pub const PASS: &str = "pass";
    pub const DESIRED_TEMP: &str = "desiredTemp";
    pub const BOILER_TEMP: &str = "boilerTemp";
    pub const HEAT: &str = "heat";
    pub const WATER: &str = "water";
    pub const COOLING: &str = "cooling";
    pub const MANUAL: &str = "manual";
    pub const TEMP: &str = "temp";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Decoded form / query arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => {
                v.clear();
                v.push_str(value);
            }
            None => self.fields.push((key.to_owned(), value.to_owned())),
        }
    }

    /// Raw value, `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map_or("", |(_, v)| v.as_str())
    }

    /// Non-empty value, if any.
    pub fn value(&self, key: &str) -> Option<&str> {
        Some(self.get(key)).filter(|v| !v.is_empty())
    }

    /// Checkbox semantics: enabled when the field carries a value.
    pub fn flag(&self, key: &str) -> bool {
        self.value(key).is_some()
    }
}

/// A request handed to the domain by the web collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundRequest {
    /// Configuration page (`/`): `GET` shows status, `POST` updates config.
    Config { method: Method, form: FormData },
    /// External room temperature report (`/temp`).
    Telemetry { method: Method, form: FormData },
    /// Read-only status query.
    Status,
}

/// Answer to an [`InboundRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Update accepted; reload the given page.
    Redirect(&'static str),
    /// Accepted, no body.
    Ok,
    /// Missing or invalid input.
    BadRequest,
    /// Update applied in memory but could not be persisted.
    InternalError,
    /// Current status for rendering.
    Status(StatusReport),
}

/// Lenient decimal parse used for every numeric form field.
///
/// Accepts `,` or `.` as the decimal separator and uses the longest numeric
/// prefix (`"21.5C"` → `21.5`).  Input without a numeric prefix, or one that
/// overflows `f32`, yields `0.0` and a warning.
pub fn parse_decimal(raw: &str) -> f32 {
    let normalized = raw.trim().replace(',', ".");
    let end = numeric_prefix_len(normalized.as_bytes());

    let parsed = normalized[..end]
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite());

    match parsed {
        Some(v) => {
            if end < normalized.len() {
                warn!("parse: trailing input ignored in '{}' -> {}", raw, v);
            }
            v
        }
        None => {
            warn!("parse: '{}' is not a number, using 0.0", raw);
            0.0
        }
    }
}

/// Length of the `[+-]digits[.digits]` prefix, or 0 if there are no digits.
fn numeric_prefix_len(b: &[u8]) -> usize {
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    if i < b.len() && b[i] == b'.' {
        let mut j = i + 1;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        let frac_digits = j - i - 1;
        if int_digits + frac_digits > 0 {
            return j;
        }
    }

    if int_digits == 0 { 0 } else { i }
}
