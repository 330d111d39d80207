//! Receipt scanning: the extractor seam, parsing of model output, and the
//! offline demo extractor.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{DATE_FORMAT, NewIngredient, non_empty, validate_new_ingredient};

/// Category given to everything added from a receipt.
pub const RECEIPT_CATEGORY: &str = "grocery";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    #[serde(deserialize_with = "whole_number")]
    pub quantity: i64,
    #[serde(default = "default_receipt_unit")]
    pub unit: String,
    #[serde(deserialize_with = "whole_number")]
    pub expiry_days: i64,
}

fn default_receipt_unit() -> String {
    crate::models::DEFAULT_UNIT.to_string()
}

/// Models sometimes answer `3.0` or `"3"` where an integer was asked for.
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Loose::deserialize(deserializer)? {
        Loose::Int(n) => Ok(n),
        Loose::Float(f) if f.is_finite() => Ok(f.round() as i64),
        Loose::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{s}'"))),
        Loose::Float(_) => Err(serde::de::Error::custom("expected a finite number")),
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("image is not a base64 payload or data URL")]
    InvalidImage,
    #[error("receipt extraction request failed: {0}")]
    Request(String),
    #[error("Could not parse items from receipt")]
    Unparseable,
}

/// Turns a receipt photo into a list of grocery items.
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    /// `image` is a `data:` URL or raw base64.
    async fn extract(&self, image: &str) -> Result<Vec<ReceiptItem>, ExtractionError>;
}

/// Normalise an uploaded image to a `data:` URL.
pub fn image_data_url(image: &str) -> Result<String, ExtractionError> {
    let image = image.trim();
    if image.is_empty() {
        return Err(ExtractionError::InvalidImage);
    }
    if let Some(rest) = image.strip_prefix("data:") {
        let (_, payload) = rest
            .split_once(";base64,")
            .ok_or(ExtractionError::InvalidImage)?;
        STANDARD
            .decode(payload)
            .map_err(|_| ExtractionError::InvalidImage)?;
        return Ok(image.to_string());
    }
    STANDARD
        .decode(image)
        .map_err(|_| ExtractionError::InvalidImage)?;
    Ok(format!("data:image/jpeg;base64,{image}"))
}

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));

/// Pull the item array out of free-form model output.
///
/// Takes the span from the first `[` to the last `]`, or the whole text when
/// there is none.
pub fn parse_items(text: &str) -> Result<Vec<ReceiptItem>, ExtractionError> {
    let candidate = JSON_ARRAY.find(text).map_or(text, |m| m.as_str());
    serde_json::from_str(candidate).map_err(|_| ExtractionError::Unparseable)
}

/// New inventory rows for the given items, expiring `expiry_days` after `today`.
///
/// Items missing a name or quantity, or whose expiry falls outside the
/// calendar, are skipped with a warning.
#[must_use]
pub fn items_to_ingredients(items: &[ReceiptItem], today: NaiveDate) -> Vec<NewIngredient> {
    items
        .iter()
        .filter_map(|item| match receipt_ingredient(item, today) {
            Ok(ingredient) => Some(ingredient),
            Err(e) => {
                warn!(item = %item.name, error = %e, "skipping receipt item");
                None
            }
        })
        .collect()
}

fn receipt_ingredient(item: &ReceiptItem, today: NaiveDate) -> anyhow::Result<NewIngredient> {
    let expiry_date = chrono::Duration::try_days(item.expiry_days)
        .and_then(|offset| today.checked_add_signed(offset))
        .with_context(|| format!("expiry_days {} is out of range", item.expiry_days))?;
    let (name, quantity, expiry_date) = validate_new_ingredient(
        Some(&item.name),
        Some(item.quantity),
        Some(&expiry_date.format(DATE_FORMAT).to_string()),
    )?;
    Ok(NewIngredient {
        name,
        category: Some(RECEIPT_CATEGORY.to_string()),
        quantity,
        unit: non_empty(Some(item.unit.clone())),
        expiry_date,
    })
}

/// Offline extractor returning a fixed list after a simulated delay.
pub struct DemoReceiptExtractor {
    delay: Duration,
}

impl DemoReceiptExtractor {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[must_use]
    pub fn items() -> Vec<ReceiptItem> {
        [
            ("tomato", 3, "pieces", 5),
            ("apple", 6, "pieces", 7),
            ("milk", 1, "bottle", 5),
            ("bread", 1, "loaf", 3),
        ]
        .into_iter()
        .map(|(name, quantity, unit, expiry_days)| ReceiptItem {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            expiry_days,
        })
        .collect()
    }
}

impl Default for DemoReceiptExtractor {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl ReceiptExtractor for DemoReceiptExtractor {
    async fn extract(&self, _image: &str) -> Result<Vec<ReceiptItem>, ExtractionError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Self::items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items_plain_array() {
        let items = parse_items(
            r#"[{"name": "tomato", "quantity": 3, "unit": "pieces", "expiry_days": 5}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "tomato");
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].unit, "pieces");
        assert_eq!(items[0].expiry_days, 5);
    }

    #[test]
    fn test_parse_items_surrounded_by_prose() {
        let text = "Here are the items I found:\n```json\n[\n  {\"name\": \"milk\", \"quantity\": 1, \"unit\": \"bottle\", \"expiry_days\": 5},\n  {\"name\": \"bread\", \"quantity\": 1, \"unit\": \"loaf\", \"expiry_days\": 3}\n]\n```\nLet me know if you need more.";
        let items = parse_items(text).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["milk", "bread"]);
    }

    #[test]
    fn test_parse_items_lenient_numbers_and_default_unit() {
        let items = parse_items(r#"[{"name": "eggs", "quantity": 12.0, "expiry_days": "14"}]"#)
            .unwrap();
        assert_eq!(items[0].quantity, 12);
        assert_eq!(items[0].expiry_days, 14);
        assert_eq!(items[0].unit, "units");
    }

    #[test]
    fn test_parse_items_rejects_non_json() {
        assert!(matches!(
            parse_items("Sorry, I cannot read this receipt."),
            Err(ExtractionError::Unparseable)
        ));
        assert!(matches!(
            parse_items("[not json at all]"),
            Err(ExtractionError::Unparseable)
        ));
    }

    #[test]
    fn test_parse_items_empty_array() {
        assert!(parse_items("[]").unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_message() {
        assert_eq!(
            ExtractionError::Unparseable.to_string(),
            "Could not parse items from receipt"
        );
    }

    #[test]
    fn test_image_data_url() {
        let url = image_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");

        let url = image_data_url("aGVsbG8=").unwrap();
        assert_eq!(url, "data:image/jpeg;base64,aGVsbG8=");

        assert!(image_data_url("").is_err());
        assert!(image_data_url("not base64!!").is_err());
        assert!(image_data_url("data:image/png,rawbytes").is_err());
    }

    #[test]
    fn test_items_to_ingredients() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let ingredients = items_to_ingredients(&DemoReceiptExtractor::items(), today);
        assert_eq!(ingredients.len(), 4);

        let tomato = &ingredients[0];
        assert_eq!(tomato.name, "tomato");
        assert_eq!(tomato.category.as_deref(), Some("grocery"));
        assert_eq!(tomato.quantity, 3);
        assert_eq!(tomato.unit.as_deref(), Some("pieces"));
        assert_eq!(tomato.expiry_date, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());

        let bread = &ingredients[3];
        assert_eq!(bread.expiry_date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn test_items_to_ingredients_skips_out_of_range_expiry() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let items = parse_items(
            r#"[{"name": "salt", "quantity": 1, "unit": "kg", "expiry_days": 999999999},
                {"name": "honey", "quantity": 1, "unit": "jar", "expiry_days": -999999999999},
                {"name": "rice", "quantity": 2, "unit": "kg", "expiry_days": 365}]"#,
        )
        .unwrap();
        let ingredients = items_to_ingredients(&items, today);
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0].name, "rice");
        assert_eq!(
            ingredients[0].expiry_date,
            NaiveDate::from_ymd_opt(2025, 6, 28).unwrap()
        );
    }

    #[test]
    fn test_items_to_ingredients_skips_missing_name_or_quantity() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let items = parse_items(
            r#"[{"name": "", "quantity": 2, "unit": "kg", "expiry_days": 3},
                {"name": "  ", "quantity": 2, "unit": "kg", "expiry_days": 3},
                {"name": "butter", "quantity": 0, "unit": "block", "expiry_days": 30},
                {"name": " cheese ", "quantity": 1, "unit": "", "expiry_days": 10}]"#,
        )
        .unwrap();
        let ingredients = items_to_ingredients(&items, today);
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0].name, "cheese");
        assert_eq!(ingredients[0].quantity, 1);
        assert_eq!(ingredients[0].unit, None);
    }

    #[tokio::test]
    async fn test_demo_extractor_returns_canned_items() {
        let extractor = DemoReceiptExtractor::new(Duration::ZERO);
        let items = extractor.extract("ignored").await.unwrap();
        let summary: Vec<(&str, i64, &str, i64)> = items
            .iter()
            .map(|i| (i.name.as_str(), i.quantity, i.unit.as_str(), i.expiry_days))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("tomato", 3, "pieces", 5),
                ("apple", 6, "pieces", 7),
                ("milk", 1, "bottle", 5),
                ("bread", 1, "loaf", 3),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_extractor_waits_before_answering() {
        let extractor = DemoReceiptExtractor::default();
        let started = tokio::time::Instant::now();
        extractor.extract("ignored").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
