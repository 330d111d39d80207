use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::path::Path;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};
use tracing::info;

use fridge_core::db::Database;
use fridge_core::models::Ingredient;
use fridge_core::receipt::{ExtractionError, ReceiptExtractor, ReceiptItem, items_to_ingredients};

use super::helpers::today;

#[derive(Serialize)]
struct ScanOutput {
    items: Vec<ReceiptItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    added: Vec<Ingredient>,
}

/// Read an image file into a base64 `data:` URL.
fn image_payload(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image: {}", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

pub(crate) async fn cmd_scan(
    db: &Database,
    extractor: &dyn ReceiptExtractor,
    image: &Path,
    add: bool,
    json: bool,
) -> Result<()> {
    let payload = image_payload(image)?;
    if !json {
        eprintln!("Analyzing receipt...");
    }
    let items = extractor.extract(&payload).await.map_err(|e| match e {
        ExtractionError::Unparseable => anyhow!("{e}. Try again, or use --demo for demo mode"),
        other => anyhow::Error::new(other),
    })?;
    info!(count = items.len(), "extracted receipt items");

    let mut added = Vec::new();
    if add {
        for new in items_to_ingredients(&items, today()) {
            added.push(
                db.insert_ingredient(&new)
                    .with_context(|| format!("Failed to add '{}'", new.name))?,
            );
        }
    }

    if json {
        let output = ScanOutput { items, added };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No food items found on the receipt.");
        return Ok(());
    }

    print_item_table(&items);
    if add {
        println!("Added {} items to your fridge.", added.len());
    } else {
        println!("Add them to your fridge with --add");
    }
    Ok(())
}

fn print_item_table(items: &[ReceiptItem]) {
    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Qty")]
        quantity: i64,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Keeps (days)")]
        expiry_days: i64,
    }

    let rows: Vec<ItemRow> = items
        .iter()
        .map(|i| ItemRow {
            name: i.name.clone(),
            quantity: i.quantity,
            unit: i.unit.clone(),
            expiry_days: i.expiry_days,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fridge_core::receipt::DemoReceiptExtractor;
    use std::io::Write;

    fn receipt_file(suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(b"\x89PNG fake receipt bytes").unwrap();
        file
    }

    #[test]
    fn test_image_payload_mime_from_extension() {
        let png = receipt_file(".PNG");
        let payload = image_payload(png.path()).unwrap();
        assert!(payload.starts_with("data:image/png;base64,"));

        let jpg = receipt_file(".jpg");
        let payload = image_payload(jpg.path()).unwrap();
        let encoded = payload.strip_prefix("data:image/jpeg;base64,").unwrap();
        assert_eq!(
            STANDARD.decode(encoded).unwrap(),
            b"\x89PNG fake receipt bytes"
        );
    }

    #[test]
    fn test_image_payload_missing_file() {
        let err = image_payload(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(err.to_string().contains("Failed to read image"));
    }

    #[tokio::test]
    async fn test_scan_demo_adds_grocery_items() {
        let db = Database::open_in_memory().unwrap();
        let file = receipt_file(".jpg");
        let extractor = DemoReceiptExtractor::new(std::time::Duration::ZERO);

        cmd_scan(&db, &extractor, file.path(), true, true)
            .await
            .unwrap();

        let stored = db.list_ingredients().unwrap();
        assert_eq!(stored.len(), 4);
        assert!(
            stored
                .iter()
                .all(|i| i.category.as_deref() == Some("grocery"))
        );
        // Sorted by expiry: bread (3 days) comes first.
        assert_eq!(stored[0].name, "bread");
        assert_eq!(
            stored[0].expiry_date,
            (today() + Duration::days(3)).format("%Y-%m-%d").to_string()
        );
    }

    #[tokio::test]
    async fn test_scan_without_add_leaves_inventory() {
        let db = Database::open_in_memory().unwrap();
        let file = receipt_file(".jpg");
        let extractor = DemoReceiptExtractor::new(std::time::Duration::ZERO);

        cmd_scan(&db, &extractor, file.path(), false, true)
            .await
            .unwrap();
        assert!(db.list_ingredients().unwrap().is_empty());
    }
}
