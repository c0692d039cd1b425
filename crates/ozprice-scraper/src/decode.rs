//! Decoding a [`PriceRecord`] from the page's `widgetStates` map.
//!
//! The page JSON carries a `widgetStates` object whose values are themselves
//! JSON documents serialized as strings, one per rendered widget. Keys are
//! the widget name plus an instance suffix, e.g. `webPrice-3121879-default-1`.
//!
//! `serde_json` is built with `preserve_order`, so "first matching key" below
//! means first in document order, not hash order.

use ozprice_core::PriceRecord;
use serde_json::{Map, Value};

/// Top-level key whose presence marks the real data payload.
pub const MARKER_FIELD: &str = "widgetStates";

const WEB_PRICE_PREFIX: &str = "webPrice-";
const PRODUCT_HEADING_PREFIX: &str = "webProductHeading-";
const STICKY_PRODUCTS_PREFIX: &str = "webStickyProducts-";

/// Decodes the price widget of a page payload.
///
/// Returns `None` on any structural problem: invalid JSON, missing or empty
/// `widgetStates`, no `webPrice-*` widget, or a price widget whose own JSON
/// is not an object. Individual price fields that are missing, `null` or
/// carry no digits stay `None`.
#[must_use]
pub fn decode_price_record(raw: &str) -> Option<PriceRecord> {
    let data: Value = match serde_json::from_str(raw) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!(
                error = %e,
                preview = %preview(raw, 200),
                "payload is not valid JSON"
            );
            return None;
        }
    };

    let Some(widget_states) = data.get(MARKER_FIELD).and_then(Value::as_object) else {
        tracing::debug!("payload has no widgetStates object");
        return None;
    };
    if widget_states.is_empty() {
        tracing::debug!("widgetStates is empty");
        return None;
    }
    tracing::debug!(widget_count = widget_states.len(), "found widget states");

    let Some(web_price) = find_widget_state(widget_states, WEB_PRICE_PREFIX) else {
        tracing::debug!("no webPrice widget in widgetStates");
        return None;
    };

    let price_data: Value = match serde_json::from_str(web_price) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "webPrice widget state is not valid JSON");
            return None;
        }
    };
    let Some(price_data) = price_data.as_object() else {
        tracing::warn!("webPrice widget state is not a JSON object");
        return None;
    };

    let mut record = PriceRecord::available(
        price_field(price_data, "cardPrice"),
        price_field(price_data, "price"),
        price_field(price_data, "originalPrice"),
    );
    record.title = find_product_title(widget_states);
    record.seller = find_seller_name(widget_states);

    Some(record)
}

/// Strips everything but ASCII digits and parses the rest.
///
/// `"55 325 ₽"` → `Some(55325)`, `"0 ₽"` → `Some(0)`, `""` → `None`.
/// A digit run too long for `u64` is treated as absent.
#[must_use]
pub fn normalize_price(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.parse::<u64>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(raw, error = %e, "failed to parse price");
            None
        }
    }
}

fn price_field(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    match obj.get(key)? {
        Value::String(s) => normalize_price(s),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// First widget state whose key starts with `prefix` and whose value is a
/// string, in document order.
#[must_use]
pub fn find_widget_state<'a>(widget_states: &'a Map<String, Value>, prefix: &str) -> Option<&'a str> {
    widget_states
        .iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .find_map(|(_, value)| value.as_str())
}

/// Product title from the first parseable `webProductHeading-*` widget.
#[must_use]
pub fn find_product_title(widget_states: &Map<String, Value>) -> Option<String> {
    widget_states
        .iter()
        .filter(|(key, _)| key.starts_with(PRODUCT_HEADING_PREFIX))
        .filter_map(|(_, value)| value.as_str())
        .filter_map(|state| serde_json::from_str::<Value>(state).ok())
        .find_map(|heading| heading.get("title")?.as_str().map(str::to_owned))
}

/// Seller name from the first `webStickyProducts-*` widget that has one.
///
/// These widget states sometimes arrive with `&quot;` in place of quotes.
#[must_use]
pub fn find_seller_name(widget_states: &Map<String, Value>) -> Option<String> {
    widget_states
        .iter()
        .filter(|(key, _)| key.starts_with(STICKY_PRODUCTS_PREFIX))
        .filter_map(|(_, value)| value.as_str())
        .filter_map(|state| serde_json::from_str::<Value>(&state.replace("&quot;", "\"")).ok())
        .find_map(|sticky| {
            sticky
                .get("seller")?
                .get("name")?
                .as_str()
                .map(str::to_owned)
        })
}

/// First `max_chars` characters of `text`, for log previews.
pub(crate) fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod tests;
