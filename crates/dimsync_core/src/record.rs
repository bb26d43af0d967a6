use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lookup::{attribute_value, flag_at, int_at, text_at};
use crate::AttributeKey;

/// Textual form of [`ProductRecord::add_date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One product as used by the resolver and the classifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductRecord {
    pub ean: String,
    pub name: String,
    pub product_id: i64,
    pub stock_quantity: i64,
    pub active: bool,
    pub add_date: Option<NaiveDate>,
    pub attributes: Value,
    pub description_html: String,
    pub category_type: String,
    /// Filled by [`crate::DimensionResolver::enrich`].
    pub dimensions_attribute: String,
    /// Filled by [`crate::DimensionResolver::enrich`].
    pub dimensions_description: String,
    /// Filled by [`crate::DimensionResolver::enrich`].
    pub clean_description: String,
}

impl ProductRecord {
    /// `add_date` rendered with [`DATE_FORMAT`], empty when unknown.
    pub fn add_date_text(&self) -> String {
        self.add_date
            .map(|date| date.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Key of the per-locale translation map holding name and description.
    pub locale: String,
    /// Attribute holding the product type used for classification.
    pub category_type_attribute: AttributeKey,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            locale: "pl_PL".to_string(),
            category_type_attribute: AttributeKey::new("550", "1370"),
        }
    }
}

/// Flattens one raw catalog record.
///
/// Never fails: absent or mistyped leaves become empty strings, zero or
/// `None`, so one bad record cannot abort a batch.
pub fn normalize(raw: &Value, options: &NormalizeOptions) -> ProductRecord {
    let locale = options.locale.as_str();
    let attributes = raw.get("attributes").cloned().unwrap_or(Value::Null);

    let mut ean = text_at(raw, &["code"]);
    if ean.is_empty() {
        ean = text_at(raw, &["stock", "code"]);
    }

    let category_type = attribute_value(
        &attributes,
        &options.category_type_attribute.group,
        &options.category_type_attribute.field,
    )
    .unwrap_or_default();

    ProductRecord {
        ean,
        name: text_at(raw, &["translations", locale, "name"]),
        product_id: int_at(raw, &["product_id"]),
        stock_quantity: int_at(raw, &["stock", "stock"]).max(0),
        active: flag_at(raw, &["stock", "active"]),
        add_date: parse_add_date(&text_at(raw, &["add_date"])),
        attributes,
        description_html: text_at(raw, &["translations", locale, "description"]),
        category_type,
        ..ProductRecord::default()
    }
}

pub fn normalize_all(raw: &[Value], options: &NormalizeOptions) -> Vec<ProductRecord> {
    raw.iter().map(|record| normalize(record, options)).collect()
}

/// Date component of a catalog timestamp; time of day is discarded.
pub fn parse_add_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    chrono::NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(text, DATE_FORMAT))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_date_drops_time_and_round_trips() {
        let date = parse_add_date("2024-03-09 17:45:01").expect("date");
        let record = ProductRecord {
            add_date: Some(date),
            ..ProductRecord::default()
        };
        assert_eq!(record.add_date_text(), "2024-03-09");
        assert_eq!(parse_add_date(&record.add_date_text()), Some(date));
    }

    #[test]
    fn unparseable_add_date_is_none() {
        assert_eq!(parse_add_date(""), None);
        assert_eq!(parse_add_date("yesterday"), None);
    }
}
