//! `HX-Trigger` response header builder.
//!
//! Fragments tell the page what happened through client-side events:
//! `notify` carries a [`Notice`] for the toast region and `tickets-changed`
//! makes the list re-fetch itself.

use axum::http::HeaderValue;
use axum::response::{IntoResponseParts, ResponseParts};
use serde_json::{Map, Value};

use crate::models::Notice;

/// Event that shows a toast.
pub const NOTIFY_EVENT: &str = "notify";

/// Event the ticket list listens for (`hx-trigger="tickets-changed from:body"`).
pub const TICKETS_CHANGED_EVENT: &str = "tickets-changed";

/// Events to fire on the client after this response is swapped in.
#[derive(Debug, Default, Clone)]
pub struct HxTrigger {
    events: Map<String, Value>,
}

impl HxTrigger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `notice` as a toast.
    #[must_use]
    pub fn notify(mut self, notice: &Notice) -> Self {
        let detail = serde_json::to_value(notice).unwrap_or(Value::Null);
        self.events.insert(NOTIFY_EVENT.to_owned(), detail);
        self
    }

    /// Ask the ticket list to re-fetch.
    #[must_use]
    pub fn tickets_changed(mut self) -> Self {
        self.events
            .insert(TICKETS_CHANGED_EVENT.to_owned(), Value::Null);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Header value: a JSON object with every non-ASCII or control character
    /// escaped, since header values must be visible ASCII.
    #[must_use]
    pub fn header_value(&self) -> String {
        let json = Value::Object(self.events.clone()).to_string();
        escape_non_ascii(&json)
    }
}

impl IntoResponseParts for HxTrigger {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.is_empty() {
            return Ok(res);
        }
        match HeaderValue::from_str(&self.header_value()) {
            Ok(value) => {
                res.headers_mut().insert("HX-Trigger", value);
            }
            Err(e) => tracing::warn!(error = %e, "Dropping unencodable HX-Trigger header"),
        }
        Ok(res)
    }
}

/// Rewrite everything a header value cannot carry (non-ASCII and ASCII
/// control characters such as DEL) as JSON `\uXXXX` escapes.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() && !c.is_ascii_control() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn test_notify_and_refresh() {
        let trigger = HxTrigger::new()
            .notify(&Notice::success("Ticket created", "done"))
            .tickets_changed();

        let parsed: Value = serde_json::from_str(&trigger.header_value()).unwrap();
        assert_eq!(parsed["notify"]["title"], "Ticket created");
        assert_eq!(parsed["notify"]["severity"], "success");
        assert!(parsed["tickets-changed"].is_null());
        assert!(parsed.as_object().unwrap().contains_key("tickets-changed"));
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let trigger = HxTrigger::new()
            .notify(&Notice::success("Ticket created", "\"Late\u{7f}delivery\" saved"))
            .tickets_changed();
        let value = trigger.header_value();

        assert!(!value.contains('\u{7f}'));
        assert!(value.contains("\\u007f"));
        assert!(HeaderValue::from_str(&value).is_ok());
        let parsed: Value = serde_json::from_str(&value).unwrap();
        assert_eq!(parsed["notify"]["description"], "\"Late\u{7f}delivery\" saved");

        let response = (trigger, "body").into_response();
        assert!(response.headers().contains_key("HX-Trigger"));
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let trigger = HxTrigger::new().notify(&Notice::error("Échec", "💥"));
        let value = trigger.header_value();

        assert!(value.is_ascii());
        let parsed: Value = serde_json::from_str(&value).unwrap();
        assert_eq!(parsed["notify"]["title"], "Échec");
        assert_eq!(parsed["notify"]["description"], "💥");
    }

    #[test]
    fn test_empty_trigger_sets_no_header() {
        let response = (HxTrigger::new(), "body").into_response();
        assert!(response.headers().get("HX-Trigger").is_none());
    }
}
