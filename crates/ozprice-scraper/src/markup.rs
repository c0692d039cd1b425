//! Degraded fallback: price fragments scraped from visible markup.
//!
//! Used only when the structured payload yields nothing and the fallback is
//! switched on. It looks for three loosely patterned fragments:
//! - the current price: first rouble amount not tied to card wording;
//! - the original price: a rouble amount inside `<s>`, `<del>` or `<strike>`;
//! - the card price: a rouble amount followed closely by "Ozon Карт…"/"card".
//!
//! Accuracy is lower than the widget decoder and layout changes break it.

use std::sync::LazyLock;

use ozprice_core::PriceRecord;
use regex::Regex;

use crate::decode::normalize_price;

/// How far past a price fragment to look for card wording.
const CARD_LABEL_WINDOW: usize = 120;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid regex")
});

static STRUCK_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:s|del|strike)\b[^>]*>(.*?)</(?:s|del|strike)\s*>").expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static PRICE_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\s\d{3})*)\s*₽").expect("valid regex"));

static CARD_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ozon\s*карт|картой|\bcard\b").expect("valid regex"));

/// Scans `document` markup for price fragments.
///
/// Returns `None` when no current price is found. A missing original or card
/// fragment falls back to the current price.
#[must_use]
pub fn scan_markup_prices(document: &str) -> Option<PriceRecord> {
    let cleaned = SCRIPT_OR_STYLE.replace_all(&replace_space_entities(document), " ").into_owned();

    let original_price = STRUCK_ELEMENT
        .captures_iter(&cleaned)
        .filter_map(|c| c.get(1))
        .find_map(|inner| first_price(&TAG.replace_all(inner.as_str(), " ")));

    let without_struck = STRUCK_ELEMENT.replace_all(&cleaned, " ");
    let visible = TAG.replace_all(&without_struck, " ");

    let mut price = None;
    let mut card_price = None;
    for cap in PRICE_FRAGMENT.captures_iter(&visible) {
        let (Some(whole), Some(amount)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let Some(value) = normalize_price(amount.as_str()) else {
            continue;
        };
        if followed_by_card_label(&visible, whole.end()) {
            card_price.get_or_insert(value);
        } else {
            price.get_or_insert(value);
        }
        if price.is_some() && card_price.is_some() {
            break;
        }
    }

    let price = price?;
    tracing::debug!(
        price,
        card_price,
        original_price,
        "recovered prices from markup"
    );
    Some(PriceRecord::available(
        Some(card_price.unwrap_or(price)),
        Some(price),
        Some(original_price.unwrap_or(price)),
    ))
}

fn first_price(text: &str) -> Option<u64> {
    PRICE_FRAGMENT
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| normalize_price(m.as_str()))
}

fn followed_by_card_label(text: &str, from: usize) -> bool {
    let end = (from + CARD_LABEL_WINDOW).min(text.len());
    let end = (end..=text.len())
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(text.len());
    CARD_LABEL.is_match(&text[from..end])
}

/// Numeric entities would otherwise leak their digits into the amounts.
fn replace_space_entities(text: &str) -> String {
    const SPACE_ENTITIES: [&str; 7] = [
        "&nbsp;", "&thinsp;", "&#160;", "&#xa0;", "&#8201;", "&#8239;", "&#x202f;",
    ];
    SPACE_ENTITIES
        .iter()
        .fold(text.to_owned(), |acc, entity| acc.replace(entity, " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_current_original_and_card_prices() {
        let doc = r#"
            <div data-widget="webPrice">
              <span>11&thinsp;490&nbsp;₽</span> <span>c Ozon Картой</span>
              <span>12 990 ₽</span>
              <s>15 990 ₽</s>
            </div>"#;
        let record = scan_markup_prices(doc).unwrap();
        assert_eq!(record.card_price, Some(11_490));
        assert_eq!(record.price, Some(12_990));
        assert_eq!(record.original_price, Some(15_990));
        assert!(record.is_available);
    }

    #[test]
    fn missing_fragments_default_to_current_price() {
        let doc = "<div><span>2 499 ₽</span></div>";
        let record = scan_markup_prices(doc).unwrap();
        assert_eq!(record.price, Some(2_499));
        assert_eq!(record.card_price, Some(2_499));
        assert_eq!(record.original_price, Some(2_499));
    }

    #[test]
    fn struck_price_is_not_taken_as_current() {
        let doc = "<del><span>3 000</span> ₽</del><b>2 500 ₽</b>";
        let record = scan_markup_prices(doc).unwrap();
        assert_eq!(record.price, Some(2_500));
        assert_eq!(record.original_price, Some(3_000));
    }

    #[test]
    fn script_contents_are_ignored() {
        let doc = r#"<script>var p = "999 ₽";</script><span>1 200 ₽</span>"#;
        assert_eq!(scan_markup_prices(doc).unwrap().price, Some(1_200));
    }

    #[test]
    fn unrelated_leading_digits_do_not_merge() {
        let doc = "<span>Осталось 5</span> <span>12 990 ₽</span>";
        assert_eq!(scan_markup_prices(doc).unwrap().price, Some(12_990));
    }

    #[test]
    fn no_price_fragment_yields_none() {
        assert_eq!(scan_markup_prices("<html><body>Нет в наличии</body></html>"), None);
    }

    #[test]
    fn only_card_price_yields_none() {
        assert_eq!(scan_markup_prices("<span>900 ₽ c Ozon Картой</span>"), None);
    }
}
