//! Decoded price/availability record.

use serde::{Deserialize, Serialize};

/// Prices shown on a product page, in whole roubles.
///
/// `None` means the page did not show that price; it is never coerced to `0`.
/// `title` and `seller` are filled opportunistically from neighbouring
/// widget states and are omitted from JSON when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub is_available: bool,
    pub card_price: Option<u64>,
    pub price: Option<u64>,
    pub original_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
}

impl PriceRecord {
    /// A record for a rendered price widget with no optional metadata.
    #[must_use]
    pub fn available(
        card_price: Option<u64>,
        price: Option<u64>,
        original_price: Option<u64>,
    ) -> Self {
        Self {
            is_available: true,
            card_price,
            price,
            original_price,
            title: None,
            seller: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_and_explicit_nulls() {
        let record = PriceRecord::available(None, Some(1000), None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "isAvailable": true,
                "cardPrice": null,
                "price": 1000,
                "originalPrice": null
            })
        );
    }

    #[test]
    fn includes_title_and_seller_when_known() {
        let mut record = PriceRecord::available(Some(11_490), Some(12_990), None);
        record.title = Some("Наушники".to_owned());
        record.seller = Some("Shop".to_owned());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["title"], "Наушники");
        assert_eq!(json["seller"], "Shop");
    }
}
